//! Metaclass/class pair generation.

use std::collections::HashSet;

use indexmap::IndexMap;

use objcgen_abi::{Constant, FieldType, Global, Linkage, names};

use crate::builder::{self, ClassFields, IvarEntry};
use crate::config::{AbiMode, EmitConfig};
use crate::descriptor::ClassDescriptor;
use crate::error::{EmitError, Result};
use crate::ivars::{self, OwnershipBitmaps};
use crate::symbols::Namespace;

/// A class and its metaclass as emitted into the unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassPair {
    pub name: String,
    pub class_symbol: String,
    pub metaclass_symbol: String,
    /// Published offset of each ivar, by ivar name.
    pub ivar_offsets: IndexMap<String, i64>,
}

impl ClassPair {
    pub fn ivar_offset(&self, ivar: &str) -> Option<i64> {
        self.ivar_offsets.get(ivar).copied()
    }
}

/// Reject descriptors the structures cannot represent, before anything is emitted.
pub fn check_class(desc: &ClassDescriptor, config: &EmitConfig) -> Result<()> {
    if desc.name.is_empty() {
        return Err(EmitError::malformed("<anonymous>", "class name is empty"));
    }
    if desc.instance_size < 0 {
        return Err(EmitError::malformed(
            &desc.name,
            format!("negative instance size {}", desc.instance_size),
        ));
    }

    let mut seen = HashSet::new();
    for ivar in &desc.ivars {
        if ivar.name.is_empty() {
            return Err(EmitError::malformed(&desc.name, "ivar name is empty"));
        }
        if !seen.insert(ivar.name.as_str()) {
            return Err(EmitError::malformed(
                &desc.name,
                format!("ivar `{}` declared twice", ivar.name),
            ));
        }
    }

    if config.abi == AbiMode::NonFragile {
        if desc.instance_size < desc.super_instance_size {
            return Err(EmitError::malformed(
                &desc.name,
                format!(
                    "instance size {} is smaller than superclass size {}",
                    desc.instance_size, desc.super_instance_size
                ),
            ));
        }
        if let Some(ivar) = desc.ivars.iter().find(|i| i.offset < desc.super_instance_size) {
            return Err(EmitError::malformed(
                &desc.name,
                format!("ivar `{}` lies inside the superclass", ivar.name),
            ));
        }
    }

    if !config.schema.supports_ivar_bitmaps() && OwnershipBitmaps::from_ivars(&desc.ivars).any_set() {
        return Err(EmitError::AbiMismatch {
            class: desc.name.clone(),
            feature: "strong/weak ivar bitmaps",
        });
    }

    Ok(())
}

/// Fail before the first definition if any name the pair publishes is
/// already strongly defined, so a rejected class leaves the namespace as it was.
fn check_published_names(
    ns: &Namespace,
    desc: &ClassDescriptor,
    class_symbol: &str,
    metaclass_symbol: &str,
) -> Result<()> {
    let ivar_symbols = desc.ivars.iter().flat_map(|ivar| {
        [
            names::ivar_offset_symbol(&desc.name, &ivar.name),
            names::ivar_offset_value_symbol(&desc.name, &ivar.name),
        ]
    });
    let published = [
        class_symbol.to_string(),
        metaclass_symbol.to_string(),
        names::class_name_sentinel(&desc.name),
    ];
    match published.into_iter().chain(ivar_symbols).find(|s| ns.is_defined(s)) {
        Some(symbol) => Err(EmitError::DuplicateSymbol(symbol)),
        None => Ok(()),
    }
}

/// Emit the metaclass, the class, and everything they point at.
pub fn generate_pair(
    ns: &mut Namespace,
    config: &EmitConfig,
    desc: &ClassDescriptor,
) -> Result<ClassPair> {
    check_class(desc, config)?;

    let class_symbol = names::class_symbol(&desc.name);
    let metaclass_symbol = names::metaclass_symbol(&desc.name);
    check_published_names(ns, desc, &class_symbol, &metaclass_symbol)?;

    // Metaclass: class-side methods only.
    let mut meta_fields = ClassFields::empty(desc.name.as_str());
    meta_fields.methods = builder::method_list(ns, &desc.class_methods);
    let (ty, init) = builder::class_structure(config.schema, &meta_fields, &config.target, true);
    ns.define(Global::define(metaclass_symbol.as_str(), Linkage::External, ty, init))?;

    // Ivars and both published forms of their offsets.
    let resolved: Vec<_> = desc
        .ivars
        .iter()
        .map(|ivar| ivars::resolve_offset(&desc.name, ivar, desc.super_instance_size, config.abi))
        .collect();
    let entries: Vec<_> = desc
        .ivars
        .iter()
        .zip(&resolved)
        .map(|(ivar, r)| IvarEntry {
            name: &ivar.name,
            type_encoding: &ivar.type_encoding,
            offset: r.offset,
        })
        .collect();
    let ivar_list = builder::ivar_list(ns, &entries);

    let mut ivar_offsets = IndexMap::new();
    let mut value_symbols = Vec::with_capacity(resolved.len());
    for (index, (ivar, r)) in desc.ivars.iter().zip(&resolved).enumerate() {
        ns.define(Global::define(
            r.value_symbol.as_str(),
            Linkage::External,
            FieldType::Int,
            Constant::Int(r.offset),
        ))?;
        if let Some(list) = &ivar_list {
            ns.define(Global::define(
                r.symbol.as_str(),
                Linkage::External,
                FieldType::Ptr,
                builder::ivar_offset_slot(list, index),
            ))?;
        }
        value_symbols.push(r.value_symbol.clone());
        ivar_offsets.insert(ivar.name.clone(), r.offset);
    }

    let mut fields = ClassFields::empty(desc.name.as_str());
    fields.isa = Constant::symbol(metaclass_symbol.as_str());
    fields.superclass = match desc.superclass_name() {
        Some(superclass) => Constant::cstr(superclass),
        None => Constant::Null,
    };
    fields.info = desc.info;
    fields.instance_size = ivars::published_instance_size(
        desc.instance_size,
        desc.super_instance_size,
        config.instance_size,
    );
    fields.ivars = ivar_list.map_or(Constant::Null, Constant::Symbol);
    fields.methods = builder::method_list(ns, &desc.instance_methods);
    fields.protocols = builder::protocol_list(ns, &desc.protocols);
    fields.ivar_offsets = builder::ivar_offset_table(ns, &value_symbols);
    fields.properties = builder::property_list(ns, &desc.properties);
    if config.schema.supports_ivar_bitmaps() {
        let bitmaps = OwnershipBitmaps::from_ivars(&desc.ivars);
        fields.strong_ivar_bitmap = builder::bitmap(ns, &bitmaps.strong, &config.target);
        fields.weak_ivar_bitmap = builder::bitmap(ns, &bitmaps.weak, &config.target);
    }

    let (ty, init) = builder::class_structure(config.schema, &fields, &config.target, false);
    ns.define(Global::define(class_symbol.as_str(), Linkage::External, ty, init))?;

    // Referencing this symbol from another unit turns a missing class into a link error.
    ns.define(Global::define(
        names::class_name_sentinel(&desc.name),
        Linkage::External,
        FieldType::Long,
        Constant::Int(0),
    ))?;

    tracing::debug!(
        class = %desc.name,
        superclass = desc.superclass_name().unwrap_or("-"),
        ivars = desc.ivars.len(),
        "class pair built"
    );

    Ok(ClassPair {
        name: desc.name.clone(),
        class_symbol,
        metaclass_symbol,
        ivar_offsets,
    })
}
