//! Per-compilation-unit emitter context.
//!
//! A `Unit` owns everything that lives for one compilation unit: the string
//! and selector pools, the forward-reference ledger, the symbol namespace,
//! and the module aggregator. Collaborators feed it descriptors and take
//! references from it in any order; `finalize` consumes it and produces the
//! unit's globals plus the registration thunk.

use std::collections::HashMap;

use objcgen_abi::{Constant, FieldType, Global, Linkage, LoadThunk, ObjectUnit, PlaceholderId, names};
use objcgen_core::Interner;

use crate::aggregator::{ModuleAggregator, ModuleSummary, UnitState, constant_string_symbol};
use crate::builder;
use crate::class_pair;
use crate::config::EmitConfig;
use crate::descriptor::{CategoryDescriptor, ClassDescriptor, ProtocolDescriptor};
use crate::error::{EmitError, Result};
use crate::ledger::{Ledger, PlaceholderKind, UseSite};
use crate::symbols::Namespace;

pub struct Unit {
    config: EmitConfig,
    source_path: String,
    strings: Interner,
    selectors: Interner,
    /// Indexed by selector symbol.
    selector_placeholders: Vec<PlaceholderId>,
    class_placeholders: HashMap<String, PlaceholderId>,
    /// Keyed by (class, ivar).
    ivar_placeholders: HashMap<(String, String), PlaceholderId>,
    ledger: Ledger,
    ns: Namespace,
    aggregator: ModuleAggregator,
}

impl Unit {
    pub fn new(config: EmitConfig, source_path: impl Into<String>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source_path: source_path.into(),
            strings: Interner::new(),
            selectors: Interner::new(),
            selector_placeholders: Vec::new(),
            class_placeholders: HashMap::new(),
            ivar_placeholders: HashMap::new(),
            ledger: Ledger::new(),
            ns: Namespace::new(),
            aggregator: ModuleAggregator::new(),
        })
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    pub fn state(&self) -> UnitState {
        if self.aggregator.is_empty() && self.strings.is_empty() && self.selectors.is_empty() {
            UnitState::Empty
        } else {
            UnitState::Accumulating
        }
    }

    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            classes: self.aggregator.classes().count(),
            categories: self.aggregator.category_count(),
            selectors: self.selectors.len(),
            strings: self.strings.len(),
        }
    }

    /// Reference to a selector. Every use of the same name shares one
    /// placeholder, rewritten to its selector list entry at finalization.
    pub fn selector(&mut self, name: &str) -> Constant {
        let sym = self.selectors.intern(name);
        if sym.index() == self.selector_placeholders.len() {
            let id = self.ledger.create(PlaceholderKind::Selector, name);
            self.selector_placeholders.push(id);
        }
        Constant::Placeholder(self.selector_placeholders[sym.index()])
    }

    /// Address of the constant-string object for `text`.
    pub fn constant_string(&mut self, text: &str) -> Constant {
        let sym = self.strings.intern(text);
        Constant::Symbol(constant_string_symbol(sym.index()))
    }

    /// Address of a class structure, possibly defined later in this unit or
    /// in another one.
    pub fn class_ref(&mut self, class: &str) -> Constant {
        let symbol = names::class_symbol(class);
        if self.ns.is_defined(&symbol) {
            return Constant::Symbol(symbol);
        }
        if let Some(&id) = self.class_placeholders.get(class) {
            return Constant::Placeholder(id);
        }
        self.ns.declare_forward(&symbol, FieldType::Struct(self.config.schema.struct_type()));
        let id = self.ledger.create(PlaceholderKind::Class, class);
        self.class_placeholders.insert(class.to_string(), id);
        Constant::Placeholder(id)
    }

    /// Published offset of `ivar`. A placeholder until `class` is built here.
    pub fn ivar_offset(&mut self, class: &str, ivar: &str) -> Result<Constant> {
        if let Some(pair) = self.aggregator.class(class) {
            return pair
                .ivar_offset(ivar)
                .map(Constant::Int)
                .ok_or_else(|| unresolved_ivar(class, ivar));
        }
        let key = (class.to_string(), ivar.to_string());
        if let Some(&id) = self.ivar_placeholders.get(&key) {
            return Ok(Constant::Placeholder(id));
        }
        let id = self
            .ledger
            .create(PlaceholderKind::IvarOffset, format!("{class}.{ivar}"));
        self.ivar_placeholders.insert(key, id);
        Ok(Constant::Placeholder(id))
    }

    /// Address of the `__objc_ivar_offset_<class>.<ivar>` slot. Declared
    /// weakly until the class is built, here or elsewhere.
    pub fn ivar_offset_symbol(&mut self, class: &str, ivar: &str) -> Result<Constant> {
        let symbol = names::ivar_offset_symbol(class, ivar);
        if let Some(pair) = self.aggregator.class(class) {
            if pair.ivar_offset(ivar).is_none() {
                return Err(unresolved_ivar(class, ivar));
            }
            return Ok(Constant::Symbol(symbol));
        }
        self.ns.declare_forward(&symbol, FieldType::Ptr);
        Ok(Constant::Symbol(symbol))
    }

    /// Address of a protocol structure; the protocol is registered with the
    /// loader even if nothing else lists it.
    pub fn protocol_ref(&mut self, protocol: &str) -> Constant {
        self.aggregator.note_protocol(protocol);
        Constant::Symbol(names::protocol_symbol(protocol))
    }

    pub fn define_protocol(&mut self, desc: &ProtocolDescriptor) -> Result<()> {
        if desc.name.is_empty() {
            return Err(EmitError::malformed("<anonymous>", "protocol name is empty"));
        }
        if self.aggregator.is_protocol_defined(&desc.name) {
            return Err(EmitError::DuplicateSymbol(names::protocol_symbol(&desc.name)));
        }

        let protocols = builder::protocol_list(&mut self.ns, &desc.protocols);
        let instance_methods = builder::method_description_list(&mut self.ns, &desc.instance_methods);
        let class_methods = builder::method_description_list(&mut self.ns, &desc.class_methods);
        let (ty, init) = builder::protocol_structure(&desc.name, protocols, instance_methods, class_methods);
        self.ns.define(Global::define(
            names::protocol_symbol(&desc.name),
            Linkage::Private,
            ty,
            init,
        ))?;

        self.aggregator.note_protocol_defined(&desc.name);
        for adopted in &desc.protocols {
            self.aggregator.note_protocol(adopted);
        }
        self.aggregator.note_attached(&desc.protocols);
        tracing::debug!(protocol = %desc.name, "protocol built");
        Ok(())
    }

    /// Define a collaborator-owned global. Placeholders inside `init` are
    /// recorded so finalization can rewrite them.
    pub fn define_global(
        &mut self,
        name: &str,
        linkage: Linkage,
        ty: FieldType,
        init: Constant,
    ) -> Result<()> {
        let uses = init.placeholders();
        for (id, _) in &uses {
            if self.ledger.kind(*id).is_none() {
                return Err(EmitError::UnknownPlaceholder(*id));
            }
        }

        let global = self.ns.define(Global::define(name, linkage, ty, init))?;
        for (id, path) in uses {
            self.ledger.record_use(id, UseSite { global, path }, &mut self.ns)?;
        }
        Ok(())
    }

    /// Build the metaclass/class pair for `desc` and rewrite every forward
    /// reference to it.
    pub fn generate_class(&mut self, desc: &ClassDescriptor) -> Result<()> {
        let pair = class_pair::generate_pair(&mut self.ns, &self.config, desc)?;

        if let Some(id) = self.class_placeholders.remove(&desc.name) {
            self.ledger
                .resolve(id, Constant::symbol(pair.class_symbol.as_str()), &mut self.ns)?;
        }

        let pending: Vec<_> = self
            .ivar_placeholders
            .keys()
            .filter(|(class, ivar)| class == &desc.name && pair.ivar_offset(ivar).is_some())
            .cloned()
            .collect();
        for key in pending {
            if let Some(id) = self.ivar_placeholders.remove(&key)
                && let Some(offset) = pair.ivar_offset(&key.1)
            {
                self.ledger.resolve(id, Constant::Int(offset), &mut self.ns)?;
            }
        }

        for protocol in &desc.protocols {
            self.aggregator.note_protocol(protocol);
        }
        self.aggregator.note_attached(&desc.protocols);
        self.aggregator.add_class(pair);
        Ok(())
    }

    pub fn generate_category(&mut self, desc: &CategoryDescriptor) -> Result<()> {
        if desc.class_name.is_empty() || desc.name.is_empty() {
            return Err(EmitError::malformed(
                format!("{}({})", desc.class_name, desc.name),
                "category and class names must not be empty",
            ));
        }

        let instance_methods = builder::method_list(&mut self.ns, &desc.instance_methods);
        let class_methods = builder::method_list(&mut self.ns, &desc.class_methods);
        let protocols = builder::protocol_list(&mut self.ns, &desc.protocols);
        let (ty, init) = builder::category_structure(
            &desc.name,
            &desc.class_name,
            instance_methods,
            class_methods,
            protocols,
        );
        let symbol = self.ns.define_private(
            &format!(".objc_category_{}{}", desc.class_name, desc.name),
            ty,
            init,
        );

        for protocol in &desc.protocols {
            self.aggregator.note_protocol(protocol);
        }
        self.aggregator.note_attached(&desc.protocols);
        self.aggregator.add_category(symbol);
        tracing::debug!(class = %desc.class_name, category = %desc.name, "category built");
        Ok(())
    }

    /// Build the unit's module descriptor and registration thunk.
    ///
    /// Returns `None` when nothing was ever recorded. Fails if an ivar offset
    /// was referenced but its class never provided it.
    pub fn finalize(mut self) -> Result<Option<ObjectUnit>> {
        if self.state() == UnitState::Empty {
            // Ivar offsets have no external fallback, even with nothing to register.
            if let Some(((class, ivar), _)) = self.ivar_placeholders.iter().min_by_key(|(_, id)| **id) {
                return Err(unresolved_ivar(class, ivar));
            }
            tracing::debug!(source = %self.source_path, "empty unit, nothing to register");
            return Ok(None);
        }
        let summary = self.summary();

        self.aggregator.emit_protocol_holder(&mut self.ns)?;

        let statics = self
            .aggregator
            .emit_statics(&mut self.ns, &self.strings, &self.config)?;

        let selector_list = self.aggregator.emit_selector_list(
            &mut self.ns,
            &mut self.ledger,
            &self.selectors,
            &self.selector_placeholders,
        )?;

        // Classes never built here live in another unit.
        let mut external: Vec<_> = self.class_placeholders.drain().collect();
        external.sort_by_key(|(_, id)| *id);
        for (class, id) in external {
            let symbol = names::class_symbol(&class);
            self.ledger.resolve(id, Constant::Symbol(symbol), &mut self.ns)?;
        }
        self.ledger.ensure_resolved()?;
        self.ns.externalize_forwards();

        let module = self.aggregator.emit_module(
            &mut self.ns,
            &self.config,
            &self.source_path,
            self.selectors.len(),
            &selector_list,
            statics,
        )?;

        tracing::debug!(
            source = %self.source_path,
            classes = summary.classes,
            categories = summary.categories,
            selectors = summary.selectors,
            strings = summary.strings,
            "unit finalized"
        );

        Ok(Some(ObjectUnit {
            source_path: self.source_path,
            globals: self.ns.into_globals(),
            load_thunk: LoadThunk::new(module),
        }))
    }
}

fn unresolved_ivar(class: &str, ivar: &str) -> EmitError {
    EmitError::UnresolvedReference {
        kind: PlaceholderKind::IvarOffset,
        name: format!("{class}.{ivar}"),
    }
}
