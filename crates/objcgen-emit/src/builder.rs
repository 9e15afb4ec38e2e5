//! Structure builder: class structures and the metadata lists they point at.
//!
//! One function lays out a class structure for either schema by walking the
//! schema's field list. The list helpers emit private globals and return the
//! address to store; an empty list is a null pointer.

use objcgen_abi::schema::{self, CLS_CLASS, CLS_META, CLS_NEW_ABI, PROTOCOL_VERSION};
use objcgen_abi::{ClassField, ClassSchema, Constant, FieldType, StructType, TargetData, names};

use crate::descriptor::{MethodDescription, MethodDescriptor, PropertyDescriptor};
use crate::symbols::Namespace;

/// Values of the non-constant slots of a class structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassFields {
    pub isa: Constant,
    pub superclass: Constant,
    pub name: String,
    /// Descriptor-supplied flag bits; the class/metaclass bit is added by the builder.
    pub info: i64,
    pub instance_size: i64,
    pub ivars: Constant,
    pub methods: Constant,
    pub protocols: Constant,
    pub ivar_offsets: Constant,
    pub properties: Constant,
    pub strong_ivar_bitmap: Constant,
    pub weak_ivar_bitmap: Constant,
}

impl ClassFields {
    /// All lists empty, no superclass.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            isa: Constant::Null,
            superclass: Constant::Null,
            name: name.into(),
            info: 0,
            instance_size: 0,
            ivars: Constant::Null,
            methods: Constant::Null,
            protocols: Constant::Null,
            ivar_offsets: Constant::Null,
            properties: Constant::Null,
            strong_ivar_bitmap: Constant::Null,
            weak_ivar_bitmap: Constant::Null,
        }
    }
}

/// Lay out a class (or metaclass) structure for `schema`.
///
/// A metaclass publishes the byte size of the class structure itself as its
/// instance size; the supplied one is ignored.
pub fn class_structure(
    schema: ClassSchema,
    fields: &ClassFields,
    target: &TargetData,
    is_meta: bool,
) -> (FieldType, Constant) {
    let ty = schema.struct_type();
    let kind_flag = if is_meta { CLS_META } else { CLS_CLASS };
    let instance_size = if is_meta {
        ty.size(target) as i64
    } else {
        fields.instance_size
    };

    let values = schema
        .fields()
        .iter()
        .map(|field| match field {
            ClassField::Isa => fields.isa.clone(),
            ClassField::SuperClass => fields.superclass.clone(),
            ClassField::Name => Constant::cstr(fields.name.as_str()),
            ClassField::Version => Constant::Int(0),
            ClassField::Info => Constant::Int(fields.info | kind_flag | CLS_NEW_ABI),
            ClassField::InstanceSize => Constant::Int(instance_size),
            ClassField::Ivars => fields.ivars.clone(),
            ClassField::Methods => fields.methods.clone(),
            ClassField::Protocols => fields.protocols.clone(),
            ClassField::AbiVersion => Constant::Int(schema.abi_version()),
            ClassField::IvarOffsets => fields.ivar_offsets.clone(),
            ClassField::Properties => fields.properties.clone(),
            ClassField::StrongIvarBitmap => fields.strong_ivar_bitmap.clone(),
            ClassField::WeakIvarBitmap => fields.weak_ivar_bitmap.clone(),
            // Filled in by the loader.
            ClassField::Cache
            | ClassField::DispatchTable
            | ClassField::SubclassList
            | ClassField::SiblingClass
            | ClassField::IvarLayout
            | ClassField::GcObjectType => Constant::Null,
        })
        .collect();

    (FieldType::Struct(ty), Constant::Struct(values))
}

pub fn method_list(ns: &mut Namespace, methods: &[MethodDescriptor]) -> Constant {
    if methods.is_empty() {
        return Constant::Null;
    }
    let entries = methods
        .iter()
        .map(|m| {
            Constant::Struct(vec![
                Constant::cstr(m.selector.as_str()),
                Constant::cstr(m.types.as_str()),
                Constant::symbol(m.imp.as_str()),
            ])
        })
        .collect();
    let init = Constant::Struct(vec![
        Constant::Null,
        Constant::Int(methods.len() as i64),
        Constant::Array(entries),
    ]);
    let name = ns.define_private(".objc_method_list", schema::method_list_type(methods.len()), init);
    Constant::Symbol(name)
}

pub fn method_description_list(ns: &mut Namespace, methods: &[MethodDescription]) -> Constant {
    if methods.is_empty() {
        return Constant::Null;
    }
    let entries = methods
        .iter()
        .map(|m| {
            Constant::Struct(vec![
                Constant::cstr(m.selector.as_str()),
                Constant::cstr(m.types.as_str()),
            ])
        })
        .collect();
    let init = Constant::Struct(vec![
        Constant::Int(methods.len() as i64),
        Constant::Array(entries),
    ]);
    let name = ns.define_private(
        ".objc_method_description_list",
        schema::method_description_list_type(methods.len()),
        init,
    );
    Constant::Symbol(name)
}

/// One ivar list entry: name, encoded type, published offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IvarEntry<'a> {
    pub name: &'a str,
    pub type_encoding: &'a str,
    pub offset: i64,
}

/// Emit an ivar list; returns the global's name so callers can address
/// individual offset slots.
pub fn ivar_list(ns: &mut Namespace, ivars: &[IvarEntry<'_>]) -> Option<String> {
    if ivars.is_empty() {
        return None;
    }
    let entries = ivars
        .iter()
        .map(|i| {
            Constant::Struct(vec![
                Constant::cstr(i.name),
                Constant::cstr(i.type_encoding),
                Constant::Int(i.offset),
            ])
        })
        .collect();
    let init = Constant::Struct(vec![
        Constant::Int(ivars.len() as i64),
        Constant::Array(entries),
    ]);
    Some(ns.define_private(".objc_ivar_list", schema::ivar_list_type(ivars.len()), init))
}

/// Address of the offset slot of entry `index` inside ivar list `list`.
pub fn ivar_offset_slot(list: &str, index: usize) -> Constant {
    Constant::gep(
        list,
        [schema::IVAR_LIST_ENTRIES, index as u32, schema::IVAR_ENTRY_OFFSET],
    )
}

/// Table of pointers to each ivar's published offset value.
pub fn ivar_offset_table(ns: &mut Namespace, value_symbols: &[String]) -> Constant {
    if value_symbols.is_empty() {
        return Constant::Null;
    }
    let entries = value_symbols
        .iter()
        .map(|s| Constant::symbol(s.as_str()))
        .collect();
    let name = ns.define_private(
        ".objc_ivar_offsets",
        FieldType::array(FieldType::Ptr, value_symbols.len()),
        Constant::Array(entries),
    );
    Constant::Symbol(name)
}

pub fn protocol_list(ns: &mut Namespace, protocols: &[String]) -> Constant {
    if protocols.is_empty() {
        return Constant::Null;
    }
    let entries = protocols
        .iter()
        .map(|p| Constant::Symbol(names::protocol_symbol(p)))
        .collect();
    let init = Constant::Struct(vec![
        Constant::Null,
        Constant::Int(protocols.len() as i64),
        Constant::Array(entries),
    ]);
    let name = ns.define_private(".objc_protocol_list", schema::protocol_list_type(protocols.len()), init);
    Constant::Symbol(name)
}

pub fn property_list(ns: &mut Namespace, properties: &[PropertyDescriptor]) -> Constant {
    if properties.is_empty() {
        return Constant::Null;
    }
    let opt = |s: &Option<String>| match s {
        Some(s) => Constant::cstr(s.as_str()),
        None => Constant::Null,
    };
    let entries = properties
        .iter()
        .map(|p| {
            Constant::Struct(vec![
                Constant::cstr(p.name.as_str()),
                Constant::Int(p.attributes),
                opt(&p.getter),
                opt(&p.getter_types),
                opt(&p.setter),
                opt(&p.setter_types),
            ])
        })
        .collect();
    let init = Constant::Struct(vec![
        Constant::Int(properties.len() as i64),
        Constant::Null,
        Constant::Array(entries),
    ]);
    let name = ns.define_private(
        ".objc_property_list",
        schema::property_list_type(properties.len()),
        init,
    );
    Constant::Symbol(name)
}

/// Encode an ivar ownership bitmap.
///
/// No bits set gives null. Short bitmaps are stored inline as
/// `(bits << 1) | 1`; longer ones go to a `{length, [words]}` global of
/// 32-bit words.
pub fn bitmap(ns: &mut Namespace, bits: &[bool], target: &TargetData) -> Constant {
    if !bits.iter().any(|&b| b) {
        return Constant::Null;
    }

    if bits.len() < (target.pointer_bits() - 1) as usize {
        let value = bits
            .iter()
            .enumerate()
            .filter(|&(_, &set)| set)
            .fold(1i64, |acc, (i, _)| acc | 1i64 << (i + 1));
        return Constant::Int(value);
    }

    let words: Vec<Constant> = bits
        .chunks(32)
        .map(|chunk| {
            let word = chunk
                .iter()
                .enumerate()
                .filter(|&(_, &set)| set)
                .fold(0u32, |acc, (i, _)| acc | 1u32 << i);
            Constant::Int(word as i64)
        })
        .collect();
    let ty = FieldType::Struct(StructType::new(vec![
        FieldType::Int,
        FieldType::array(FieldType::Int, words.len()),
    ]));
    let init = Constant::Struct(vec![Constant::Int(words.len() as i64), Constant::Array(words)]);
    Constant::Symbol(ns.define_private(".objc_bitfield", ty, init))
}

/// `{category_name, class_name, instance_methods, class_methods, protocols}`
pub fn category_structure(
    category: &str,
    class: &str,
    instance_methods: Constant,
    class_methods: Constant,
    protocols: Constant,
) -> (FieldType, Constant) {
    let init = Constant::Struct(vec![
        Constant::cstr(category),
        Constant::cstr(class),
        instance_methods,
        class_methods,
        protocols,
    ]);
    (schema::category_type(), init)
}

/// `{version, name, protocols, instance_methods, class_methods}`
pub fn protocol_structure(
    name: &str,
    protocols: Constant,
    instance_methods: Constant,
    class_methods: Constant,
) -> (FieldType, Constant) {
    let init = Constant::Struct(vec![
        Constant::Int(PROTOCOL_VERSION),
        Constant::cstr(name),
        protocols,
        instance_methods,
        class_methods,
    ]);
    (schema::protocol_type(), init)
}
