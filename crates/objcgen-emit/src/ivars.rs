//! Ivar offset resolution.
//!
//! Fragile classes publish absolute offsets. Non-fragile classes publish
//! offsets relative to the end of the superclass, plus a negative instance
//! size the loader turns back into an absolute one.

use objcgen_abi::names;

use crate::config::{AbiMode, InstanceSizePolicy};
use crate::descriptor::{IvarDescriptor, Ownership};

/// An ivar's published offset and the two names it is published under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedIvar {
    pub offset: i64,
    /// `__objc_ivar_offset_<class>.<ivar>`: address of the offset slot.
    pub symbol: String,
    /// `__objc_ivar_offset_value_<class>.<ivar>`: the offset itself.
    pub value_symbol: String,
}

/// Offset to publish for `ivar` of `class`.
pub fn resolve_offset(
    class: &str,
    ivar: &IvarDescriptor,
    super_instance_size: i64,
    abi: AbiMode,
) -> ResolvedIvar {
    let offset = match abi {
        AbiMode::Fragile => ivar.offset,
        AbiMode::NonFragile => ivar.offset - super_instance_size,
    };
    ResolvedIvar {
        offset,
        symbol: names::ivar_offset_symbol(class, &ivar.name),
        value_symbol: names::ivar_offset_value_symbol(class, &ivar.name),
    }
}

/// Instance size a class structure publishes.
pub fn published_instance_size(
    instance_size: i64,
    super_instance_size: i64,
    policy: InstanceSizePolicy,
) -> i64 {
    match policy {
        InstanceSizePolicy::Absolute => instance_size,
        InstanceSizePolicy::RelativeSentinel => -(instance_size - super_instance_size),
    }
}

/// Per-ivar strong and weak ownership bits, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnershipBitmaps {
    pub strong: Vec<bool>,
    pub weak: Vec<bool>,
}

impl OwnershipBitmaps {
    pub fn from_ivars(ivars: &[IvarDescriptor]) -> Self {
        Self {
            strong: ivars.iter().map(|i| i.ownership == Ownership::Strong).collect(),
            weak: ivars.iter().map(|i| i.ownership == Ownership::Weak).collect(),
        }
    }

    pub fn any_set(&self) -> bool {
        self.strong.iter().chain(&self.weak).any(|&b| b)
    }
}
