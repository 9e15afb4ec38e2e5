//! Objective-C runtime metadata emitter.
//!
//! Turns class, category, and protocol descriptors into the constant globals
//! a GNU-style runtime loader consumes:
//! - `symbols` - per-unit namespace with forward declarations and unique private names
//! - `ledger` - forward references and their use-sites, backpatched on resolution
//! - `ivars` - ivar offset resolution for the fragile and non-fragile ABIs
//! - `builder` - class structures (legacy and extended schemas) and metadata lists
//! - `class_pair` - metaclass/class pair generation
//! - `aggregator` - module descriptor, symbol table, statics, and selector list
//! - `unit` - the per-unit context collaborators drive

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod aggregator;
pub mod builder;
pub mod class_pair;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod ivars;
pub mod ledger;
pub mod symbols;
pub mod unit;

#[cfg(test)]
mod aggregator_tests;
#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod class_pair_tests;
#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod ledger_tests;

pub use aggregator::{ModuleSummary, UnitState};
pub use class_pair::ClassPair;
pub use config::{AbiMode, EmitConfig, GcMode, InstanceSizePolicy};
pub use descriptor::{
    CategoryDescriptor, ClassDescriptor, IvarDescriptor, MethodDescription, MethodDescriptor,
    Ownership, PropertyDescriptor, ProtocolDescriptor,
};
pub use error::{EmitError, Result};
pub use ledger::PlaceholderKind;
pub use unit::Unit;
