//! Emitter configuration.

use serde::{Deserialize, Serialize};

use objcgen_abi::{ClassSchema, TargetData};

use crate::error::{EmitError, Result};

/// Ivar layout convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbiMode {
    /// Offsets are absolute and fixed at compile time.
    #[default]
    Fragile,
    /// Offsets are relative to the end of the superclass and patched at load time.
    NonFragile,
}

/// Memory management mode recorded in the module descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GcMode {
    #[default]
    None,
    RefCounted,
    GcOnly,
    Hybrid,
}

impl GcMode {
    /// Value of the module descriptor's GC field.
    pub fn encoding(self) -> i64 {
        match self {
            GcMode::None => 0,
            GcMode::RefCounted => 1,
            GcMode::GcOnly => 2,
            GcMode::Hybrid => 1,
        }
    }
}

/// What a class publishes as its instance size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceSizePolicy {
    /// The declared size, unchanged.
    #[default]
    Absolute,
    /// `-(size - super_size)`: the loader re-adds the real superclass size.
    RelativeSentinel,
}

/// First runtime version whose module descriptor carries the GC field.
pub const GC_FIELD_RUNTIME_VERSION: u32 = 10;

/// Configuration for one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmitConfig {
    pub abi: AbiMode,
    pub schema: ClassSchema,
    pub gc: GcMode,
    pub runtime_version: u32,
    pub instance_size: InstanceSizePolicy,
    pub target: TargetData,
    /// Class name tagging the constant-string statics block.
    pub constant_string_class: String,
    /// Symbol the `isa` slot of every constant string names.
    pub constant_string_isa: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            abi: AbiMode::Fragile,
            schema: ClassSchema::Legacy,
            gc: GcMode::None,
            runtime_version: 0,
            instance_size: InstanceSizePolicy::Absolute,
            target: TargetData::LP64,
            constant_string_class: "NSConstantString".to_string(),
            constant_string_isa: "_NSConstantStringClassReference".to_string(),
        }
    }
}

impl EmitConfig {
    /// Non-fragile ABI with the extended class schema.
    pub fn non_fragile() -> Self {
        Self {
            abi: AbiMode::NonFragile,
            schema: ClassSchema::Extended,
            runtime_version: GC_FIELD_RUNTIME_VERSION,
            instance_size: InstanceSizePolicy::RelativeSentinel,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: TargetData) -> Self {
        self.target = target;
        self
    }

    /// Whether the module descriptor carries the GC-mode field.
    pub fn has_gc_field(&self) -> bool {
        self.runtime_version >= GC_FIELD_RUNTIME_VERSION
    }

    /// Reject combinations that cannot be honored.
    pub fn validate(&self) -> Result<()> {
        if !self.target.is_supported() {
            return Err(EmitError::InvalidConfig(format!(
                "unsupported target: {}-byte pointers, {}-byte longs",
                self.target.pointer_size, self.target.long_size
            )));
        }
        if self.abi == AbiMode::Fragile && self.instance_size == InstanceSizePolicy::RelativeSentinel {
            return Err(EmitError::InvalidConfig(
                "relative instance sizes require the non-fragile ABI".to_string(),
            ));
        }
        if self.constant_string_class.is_empty() || self.constant_string_isa.is_empty() {
            return Err(EmitError::InvalidConfig(
                "constant string class names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
