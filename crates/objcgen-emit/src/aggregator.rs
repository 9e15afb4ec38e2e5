//! Module aggregation.
//!
//! Collects the unit's classes, categories, and protocols while it
//! accumulates, then runs the finalization steps that build the statics
//! block, the selector list, the symbol table, and the module descriptor.

use indexmap::IndexMap;

use objcgen_abi::schema::{module_type, statics_type, symtab_type};
use objcgen_abi::{Constant, FieldType, Global, Linkage, PlaceholderId, names};
use objcgen_core::Interner;

use crate::builder;
use crate::class_pair::ClassPair;
use crate::config::EmitConfig;
use crate::error::{EmitError, Result};
use crate::ledger::Ledger;
use crate::symbols::Namespace;

/// Observable unit state.
///
/// Finalization consumes the unit, so the finalizing and emitted states
/// have no value of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    /// Nothing recorded yet; finalizing emits nothing.
    Empty,
    Accumulating,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ProtocolUse {
    defined: bool,
    /// Listed by a class, category, or protocol emitted in this unit.
    attached: bool,
}

/// Counts reported once a unit is finalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleSummary {
    pub classes: usize,
    pub categories: usize,
    pub selectors: usize,
    pub strings: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ModuleAggregator {
    classes: IndexMap<String, ClassPair>,
    /// Symbols of emitted category structures, in submission order.
    categories: Vec<String>,
    protocols: IndexMap<String, ProtocolUse>,
}

impl ModuleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, pair: ClassPair) {
        self.classes.insert(pair.name.clone(), pair);
    }

    pub fn class(&self, name: &str) -> Option<&ClassPair> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassPair> {
        self.classes.values()
    }

    pub fn add_category(&mut self, symbol: String) {
        self.categories.push(symbol);
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// A protocol named somewhere in the unit.
    pub fn note_protocol(&mut self, name: &str) {
        self.protocols.entry(name.to_string()).or_default();
    }

    pub fn note_protocol_defined(&mut self, name: &str) {
        self.protocols.entry(name.to_string()).or_default().defined = true;
    }

    pub fn is_protocol_defined(&self, name: &str) -> bool {
        self.protocols.get(name).is_some_and(|p| p.defined)
    }

    /// Protocols listed by an emitted structure.
    pub fn note_attached(&mut self, protocols: &[String]) {
        for name in protocols {
            self.protocols.entry(name.clone()).or_default().attached = true;
        }
    }

    /// Whether no class, category, or protocol was recorded.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.categories.is_empty() && self.protocols.is_empty()
    }

    /// Step 1: give every referenced-but-undefined protocol an empty
    /// structure, and collect protocols no structure lists into one holder
    /// category so the loader still registers them.
    pub fn emit_protocol_holder(&mut self, ns: &mut Namespace) -> Result<Option<String>> {
        for (name, _) in self.protocols.iter().filter(|(_, p)| !p.defined) {
            let (ty, init) =
                builder::protocol_structure(name, Constant::Null, Constant::Null, Constant::Null);
            ns.define(Global::define(names::protocol_symbol(name), Linkage::Private, ty, init))?;
        }

        let orphans: Vec<String> = self
            .protocols
            .iter()
            .filter(|(_, p)| !p.attached)
            .map(|(name, _)| name.clone())
            .collect();
        if orphans.is_empty() {
            return Ok(None);
        }

        let protocols = builder::protocol_list(ns, &orphans);
        let (ty, init) = builder::category_structure(
            names::PROTOCOL_HOLDER,
            names::PROTOCOL_HOLDER,
            Constant::Null,
            Constant::Null,
            protocols,
        );
        let symbol = ns.define_private(
            &format!(".objc_category_{0}{0}", names::PROTOCOL_HOLDER),
            ty,
            init,
        );
        self.note_attached(&orphans);
        tracing::debug!(protocols = orphans.len(), "protocol holder category built");
        self.categories.push(symbol.clone());
        Ok(Some(symbol))
    }

    /// Step 2: one constant-string object per interned literal, wrapped in
    /// the statics block. Null when the unit has no literals.
    pub fn emit_statics(
        &self,
        ns: &mut Namespace,
        strings: &Interner,
        config: &EmitConfig,
    ) -> Result<Constant> {
        if strings.is_empty() {
            return Ok(Constant::Null);
        }

        let mut objects = Vec::with_capacity(strings.len() + 1);
        for (sym, text) in strings.iter() {
            let name = constant_string_symbol(sym.index());
            let init = Constant::Struct(vec![
                Constant::cstr(config.constant_string_isa.as_str()),
                Constant::cstr(text),
                Constant::Int(text.len() as i64),
            ]);
            ns.define(Global::define(
                name.as_str(),
                Linkage::Private,
                objcgen_abi::schema::constant_string_type(),
                init,
            ))?;
            objects.push(Constant::Symbol(name));
        }
        objects.push(Constant::Null);

        let statics = ns.define_private(
            ".objc_statics",
            statics_type(strings.len()),
            Constant::Struct(vec![
                Constant::cstr(config.constant_string_class.as_str()),
                Constant::Array(objects),
            ]),
        );
        let statics_ptr = ns.define_private(
            ".objc_statics_ptr",
            FieldType::array(FieldType::Ptr, 2),
            Constant::Array(vec![Constant::Symbol(statics), Constant::Null]),
        );
        Ok(Constant::Symbol(statics_ptr))
    }

    /// Step 3: the NUL-terminated selector list, then every selector
    /// placeholder rewritten to the address of its entry.
    ///
    /// `placeholders[i]` belongs to the selector interned at index `i`.
    pub fn emit_selector_list(
        &self,
        ns: &mut Namespace,
        ledger: &mut Ledger,
        selectors: &Interner,
        placeholders: &[PlaceholderId],
    ) -> Result<String> {
        let mut entries: Vec<Constant> = selectors.iter().map(|(_, name)| Constant::cstr(name)).collect();
        entries.push(Constant::Null);

        let list = ns.define_private(
            ".objc_selector_list",
            FieldType::array(FieldType::Ptr, entries.len()),
            Constant::Array(entries),
        );

        for (index, &id) in placeholders.iter().enumerate() {
            ledger.resolve(id, Constant::gep(list.as_str(), [index as u32]), ns)?;
        }
        Ok(list)
    }

    /// Steps 4 and 5: the combined definitions array, the symbol table, and
    /// the module descriptor. Returns the descriptor's symbol.
    pub fn emit_module(
        &self,
        ns: &mut Namespace,
        config: &EmitConfig,
        source_path: &str,
        selector_count: usize,
        selector_list: &str,
        statics: Constant,
    ) -> Result<String> {
        let class_count = self.classes.len();
        let category_count = self.categories.len();
        if class_count > u16::MAX as usize {
            return Err(EmitError::TooManyClasses(class_count));
        }
        if category_count > u16::MAX as usize {
            return Err(EmitError::TooManyCategories(category_count));
        }

        // Classes, then categories, then statics, then a terminator.
        let mut defs: Vec<Constant> = Vec::with_capacity(class_count + category_count + 2);
        defs.extend(self.classes.values().map(|c| Constant::symbol(c.class_symbol.as_str())));
        defs.extend(self.categories.iter().map(|c| Constant::symbol(c.as_str())));
        defs.push(statics);
        defs.push(Constant::Null);

        let symtab = ns.define_private(
            ".objc_symtab",
            symtab_type(defs.len()),
            Constant::Struct(vec![
                Constant::Int(selector_count as i64),
                Constant::symbol(selector_list),
                Constant::Int(class_count as i64),
                Constant::Int(category_count as i64),
                Constant::Array(defs),
            ]),
        );

        let with_gc = config.has_gc_field();
        let ty = module_type(with_gc);
        let mut fields = vec![
            Constant::Int(config.runtime_version as i64),
            Constant::Int(ty.size(&config.target) as i64),
            Constant::cstr(source_path),
            Constant::Symbol(symtab),
        ];
        if with_gc {
            fields.push(Constant::Int(config.gc.encoding()));
        }

        Ok(ns.define_private(".objc_module_info", FieldType::Struct(ty), Constant::Struct(fields)))
    }
}

/// Name of the constant-string object for the literal interned at `index`.
pub fn constant_string_symbol(index: usize) -> String {
    format!(".objc_str.{index}")
}
