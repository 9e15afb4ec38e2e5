//! Binary layout of Objective-C runtime metadata.
//!
//! This crate contains:
//! - Target layout and field types (`TargetData`, `FieldType`, `StructType`)
//! - Constant initializers with forward-reference slots (`Constant`)
//! - The two class structure schemas and the shapes of every metadata list
//! - Published symbol names the runtime loader matches on
//! - The emitter's output model (`ObjectUnit`) and its textual dump
//! - The relocatable metadata image (encoder, loader, dump)

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod constant;
pub mod dump;
pub mod image;
pub mod names;
pub mod object;
pub mod schema;
pub mod target;
pub mod types;


// Re-export commonly used items at crate root
pub use constant::{Constant, PlaceholderId};
pub use dump::dump;
pub use image::{EncodeError, Image, ImageError, dump_image, encode};
pub use object::{Global, Linkage, LoadThunk, ObjectUnit};
pub use schema::{ClassField, ClassSchema};
pub use target::TargetData;
pub use types::{FieldType, StructType};
