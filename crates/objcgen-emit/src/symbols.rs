//! Unit-scoped symbol namespace.
//!
//! Every global the unit emits lives here, in first-mention order. A name is
//! either a forward declaration (weak, no initializer yet) or a strong
//! definition. Defining a forward name promotes it in place, so its
//! `GlobalId` stays valid for use-sites recorded against it.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use objcgen_abi::{Constant, FieldType, Global, Linkage};

use crate::error::{EmitError, Result};

/// Stable index of a global inside the namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(u32);

impl GlobalId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// Definition strength of a namespace entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    /// Declared ahead of its definition; may still be replaced.
    Forward,
    /// Final definition; a second one is a duplicate.
    Strong,
}

#[derive(Clone, Debug)]
struct Entry {
    global: Global,
    state: EntryState,
}

#[derive(Clone, Debug, Default)]
pub struct Namespace {
    entries: IndexMap<String, Entry>,
    /// Next suffix per private base name.
    private_counters: HashMap<String, u32>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<(GlobalId, EntryState)> {
        let (index, _, entry) = self.entries.get_full(name)?;
        Some((GlobalId(index as u32), entry.state))
    }

    /// Whether `name` has a strong definition.
    pub fn is_defined(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some((_, EntryState::Strong)))
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.entries[id.index()].global
    }

    pub fn global_mut(&mut self, id: GlobalId) -> &mut Global {
        &mut self.entries[id.index()].global
    }

    /// Declare `name` weakly unless it is already known.
    pub fn declare_forward(&mut self, name: &str, ty: FieldType) -> GlobalId {
        if let Some((id, _)) = self.lookup(name) {
            return id;
        }
        let (index, _) = self.entries.insert_full(
            name.to_string(),
            Entry {
                global: Global::declare(name, Linkage::WeakAny, ty),
                state: EntryState::Forward,
            },
        );
        tracing::trace!(symbol = name, "forward declared");
        GlobalId(index as u32)
    }

    /// Lookup-or-insert a strong definition.
    ///
    /// A forward entry is overwritten in place and takes the new linkage; a
    /// second strong definition fails.
    pub fn define(&mut self, global: Global) -> Result<GlobalId> {
        match self.entries.get_full_mut(&global.name) {
            Some((_, _, entry)) if entry.state == EntryState::Strong => {
                Err(EmitError::DuplicateSymbol(global.name))
            }
            Some((index, name, entry)) => {
                tracing::trace!(symbol = %name, linkage = %global.linkage, "promoted forward declaration");
                entry.global = global;
                entry.state = EntryState::Strong;
                Ok(GlobalId(index as u32))
            }
            None => {
                let name = global.name.clone();
                let (index, _) = self.entries.insert_full(
                    name,
                    Entry {
                        global,
                        state: EntryState::Strong,
                    },
                );
                Ok(GlobalId(index as u32))
            }
        }
    }

    /// Define a private global under a name derived from `base` that is unique
    /// in this unit: `base` itself first, then `base.1`, `base.2`, ...
    pub fn define_private(&mut self, base: &str, ty: FieldType, init: Constant) -> String {
        let name = self.unique_name(base);
        let global = Global::define(name.clone(), Linkage::Private, ty, init);
        self.entries.insert(
            name.clone(),
            Entry {
                global,
                state: EntryState::Strong,
            },
        );
        name
    }

    fn unique_name(&mut self, base: &str) -> String {
        let counter = self.private_counters.entry(base.to_string()).or_insert(0);
        loop {
            let candidate = match *counter {
                0 => base.to_string(),
                n => format!("{base}.{n}"),
            };
            *counter += 1;
            if !self.entries.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Names of entries still waiting for a definition.
    pub fn forward_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.state == EntryState::Forward)
            .map(|(name, _)| name.as_str())
    }

    /// Turn every remaining forward declaration into an external reference.
    /// Returns how many were turned.
    pub fn externalize_forwards(&mut self) -> usize {
        let mut count = 0;
        for (name, entry) in self.entries.iter_mut() {
            if entry.state == EntryState::Forward {
                tracing::trace!(symbol = %name, "left external");
                entry.global.linkage = Linkage::External;
                count += 1;
            }
        }
        count
    }

    /// All globals in first-mention order.
    pub fn into_globals(self) -> Vec<Global> {
        self.entries.into_values().map(|e| e.global).collect()
    }
}
