//! Already-resolved declarations handed to the emitter by its collaborators.
//!
//! Byte offsets, sizes, and type encodings are computed elsewhere; the
//! emitter only decides how to serialize and link them.

use serde::{Deserialize, Serialize};

/// Ownership qualifier of an instance variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ownership {
    #[default]
    None,
    Strong,
    Weak,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IvarDescriptor {
    pub name: String,
    /// Encoded type string.
    #[serde(rename = "type")]
    pub type_encoding: String,
    /// Byte offset from the start of the object.
    pub offset: i64,
    #[serde(default)]
    pub ownership: Ownership,
}

impl IvarDescriptor {
    pub fn new(name: impl Into<String>, type_encoding: impl Into<String>, offset: i64) -> Self {
        Self {
            name: name.into(),
            type_encoding: type_encoding.into(),
            offset,
            ownership: Ownership::None,
        }
    }

    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }
}

/// One method list entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub selector: String,
    pub types: String,
    /// Symbol of the implementation function.
    pub imp: String,
}

impl MethodDescriptor {
    pub fn new(selector: impl Into<String>, types: impl Into<String>, imp: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            types: types.into(),
            imp: imp.into(),
        }
    }
}

/// Method declared by a protocol; no implementation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescription {
    pub selector: String,
    pub types: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PropertyDescriptor {
    pub name: String,
    /// Attribute bits, stored as-is.
    pub attributes: i64,
    pub getter: Option<String>,
    pub getter_types: Option<String>,
    pub setter: Option<String>,
    pub setter_types: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClassDescriptor {
    pub name: String,
    /// `None` (or empty) for a root class.
    pub superclass: Option<String>,
    /// Extra `info` bits ORed into the class flags.
    pub info: i64,
    pub instance_size: i64,
    /// Instance size of the superclass; zero for a root class.
    pub super_instance_size: i64,
    pub ivars: Vec<IvarDescriptor>,
    pub instance_methods: Vec<MethodDescriptor>,
    /// Class-side methods; they land on the metaclass.
    pub class_methods: Vec<MethodDescriptor>,
    pub protocols: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Superclass name, treating the empty string as "no superclass".
    pub fn superclass_name(&self) -> Option<&str> {
        self.superclass.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CategoryDescriptor {
    pub class_name: String,
    pub name: String,
    pub instance_methods: Vec<MethodDescriptor>,
    pub class_methods: Vec<MethodDescriptor>,
    pub protocols: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProtocolDescriptor {
    pub name: String,
    /// Adopted protocols.
    pub protocols: Vec<String>,
    pub instance_methods: Vec<MethodDescription>,
    pub class_methods: Vec<MethodDescription>,
}
