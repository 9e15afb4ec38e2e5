//! Forward-reference ledger.
//!
//! Placeholders are handed out before their value exists and recorded
//! wherever they are stored. Resolution rewrites every recorded use-site in
//! one pass and retires the placeholder. The arena is index-keyed: a
//! `PlaceholderId` is its position in `entries`.

use std::fmt;

use objcgen_abi::{Constant, PlaceholderId};

use crate::error::{EmitError, Result};
use crate::symbols::{GlobalId, Namespace};

/// What a placeholder stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// Address of a selector list entry.
    Selector,
    /// Address of a class structure.
    Class,
    /// Published offset of an instance variable.
    IvarOffset,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaceholderKind::Selector => "selector",
            PlaceholderKind::Class => "class",
            PlaceholderKind::IvarOffset => "ivar offset",
        })
    }
}

/// A slot holding a placeholder: field path inside a global's initializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UseSite {
    pub global: GlobalId,
    pub path: Vec<u32>,
}

#[derive(Clone, Debug)]
enum PlaceholderState {
    Pending(Vec<UseSite>),
    /// Kept so use-sites recorded late can be patched on the spot.
    Resolved(Constant),
}

#[derive(Clone, Debug)]
struct PlaceholderEntry {
    kind: PlaceholderKind,
    /// What the placeholder refers to, for diagnostics.
    name: String,
    state: PlaceholderState,
}

#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: Vec<PlaceholderEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn create(&mut self, kind: PlaceholderKind, name: impl Into<String>) -> PlaceholderId {
        let id = PlaceholderId(self.entries.len() as u32);
        let name = name.into();
        tracing::debug!(%id, %kind, name = %name, "placeholder created");
        self.entries.push(PlaceholderEntry {
            kind,
            name,
            state: PlaceholderState::Pending(Vec::new()),
        });
        id
    }

    pub fn kind(&self, id: PlaceholderId) -> Option<PlaceholderKind> {
        self.entries.get(id.index()).map(|e| e.kind)
    }

    pub fn is_resolved(&self, id: PlaceholderId) -> bool {
        matches!(
            self.entries.get(id.index()).map(|e| &e.state),
            Some(PlaceholderState::Resolved(_))
        )
    }

    /// Record that `site` holds `id`.
    ///
    /// If `id` is already resolved the slot is patched immediately instead.
    pub fn record_use(&mut self, id: PlaceholderId, site: UseSite, ns: &mut Namespace) -> Result<()> {
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(EmitError::UnknownPlaceholder(id))?;
        match &mut entry.state {
            PlaceholderState::Pending(sites) => sites.push(site),
            PlaceholderState::Resolved(value) => patch(ns, &site, value.clone()),
        }
        Ok(())
    }

    /// Rewrite every recorded use of `id` to `value` and retire it.
    ///
    /// Returns the number of rewritten slots.
    pub fn resolve(&mut self, id: PlaceholderId, value: Constant, ns: &mut Namespace) -> Result<usize> {
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(EmitError::UnknownPlaceholder(id))?;
        let sites = match std::mem::replace(&mut entry.state, PlaceholderState::Resolved(value.clone())) {
            PlaceholderState::Pending(sites) => sites,
            resolved @ PlaceholderState::Resolved(_) => {
                entry.state = resolved;
                return Err(EmitError::PlaceholderResolvedTwice(id));
            }
        };
        tracing::debug!(%id, kind = %entry.kind, name = %entry.name, uses = sites.len(), "placeholder resolved");
        for site in &sites {
            patch(ns, site, value.clone());
        }
        Ok(sites.len())
    }

    /// Placeholders not yet resolved, in creation order.
    pub fn outstanding(&self) -> impl Iterator<Item = (PlaceholderId, PlaceholderKind, &str)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| match e.state {
            PlaceholderState::Pending(_) => Some((PlaceholderId(i as u32), e.kind, e.name.as_str())),
            PlaceholderState::Resolved(_) => None,
        })
    }

    /// Fail with the first placeholder that was never resolved.
    pub fn ensure_resolved(&self) -> Result<()> {
        match self.outstanding().next() {
            Some((_, kind, name)) => Err(EmitError::UnresolvedReference {
                kind,
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn patch(ns: &mut Namespace, site: &UseSite, value: Constant) {
    let global = ns.global_mut(site.global);
    let slot = global
        .init
        .as_mut()
        .and_then(|init| init.at_path_mut(&site.path));
    match slot {
        Some(slot) => *slot = value,
        None => panic!(
            "use-site {}{:?} of `{}` does not address a slot",
            site.global, site.path, global.name
        ),
    }
}
