#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared building blocks for the objcgen metadata emitter.
//!
//! - [`Interner`]: content-deduplicating pool handing out stable [`Symbol`] identities.
//!   A compilation unit keeps one pool per namespace (constant strings, selectors).
//! - [`Colors`]: ANSI palette used by the textual dumps.

mod colors;
mod interner;


pub use colors::Colors;
pub use interner::{Interner, Symbol};
