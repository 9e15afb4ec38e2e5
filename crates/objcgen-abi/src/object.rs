//! The emitter's output: named globals plus the registration thunk.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constant::Constant;
use crate::names::{LOAD_FUNCTION, REGISTER_ENTRY};
use crate::types::FieldType;

/// Visibility of a global to the linker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Linkage {
    /// Unit-local, not in the symbol table.
    Private,
    /// Unit-local, named.
    Internal,
    /// Visible to other units; exactly one definition wins.
    External,
    /// Visible to other units; replaced by any strong definition.
    WeakAny,
}

impl Linkage {
    pub fn as_u8(self) -> u8 {
        match self {
            Linkage::Private => 0,
            Linkage::Internal => 1,
            Linkage::External => 2,
            Linkage::WeakAny => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Linkage::Private),
            1 => Some(Linkage::Internal),
            2 => Some(Linkage::External),
            3 => Some(Linkage::WeakAny),
            _ => None,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Linkage::Private => "private",
            Linkage::Internal => "internal",
            Linkage::External => "external",
            Linkage::WeakAny => "weak",
        })
    }
}

/// A named binary constant. `init == None` declares a symbol defined elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub linkage: Linkage,
    pub ty: FieldType,
    pub init: Option<Constant>,
}

impl Global {
    pub fn define(name: impl Into<String>, linkage: Linkage, ty: FieldType, init: Constant) -> Self {
        Self {
            name: name.into(),
            linkage,
            ty,
            init: Some(init),
        }
    }

    pub fn declare(name: impl Into<String>, linkage: Linkage, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            linkage,
            ty,
            init: None,
        }
    }

    pub fn is_definition(&self) -> bool {
        self.init.is_some()
    }
}

/// The only executable code the emitter produces: a no-argument function that
/// passes the module descriptor to the runtime's registration entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadThunk {
    pub name: String,
    pub entry: String,
    pub argument: String,
}

impl LoadThunk {
    pub fn new(argument: impl Into<String>) -> Self {
        Self {
            name: LOAD_FUNCTION.to_string(),
            entry: REGISTER_ENTRY.to_string(),
            argument: argument.into(),
        }
    }
}

/// Everything one compilation unit contributes, ready for encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectUnit {
    pub source_path: String,
    pub globals: Vec<Global>,
    pub load_thunk: LoadThunk,
}

impl ObjectUnit {
    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Global> {
        self.globals.iter().filter(|g| g.is_definition())
    }
}
