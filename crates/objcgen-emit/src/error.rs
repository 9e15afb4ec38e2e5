//! Error types for metadata emission.

use objcgen_abi::PlaceholderId;

use crate::ledger::PlaceholderKind;

/// Error during metadata emission.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// A forward reference was never given a value.
    #[error("unresolved {kind} reference: {name}")]
    UnresolvedReference { kind: PlaceholderKind, name: String },

    #[error("forward reference {0} resolved twice")]
    PlaceholderResolvedTwice(PlaceholderId),

    #[error("unknown forward reference {0}")]
    UnknownPlaceholder(PlaceholderId),

    /// The descriptor needs a feature the configured class schema lacks.
    #[error("class `{class}` uses {feature}, which the configured class schema does not support")]
    AbiMismatch { class: String, feature: &'static str },

    /// Two strong definitions of the same published name.
    #[error("duplicate definition of symbol `{0}`")]
    DuplicateSymbol(String),

    #[error("malformed descriptor `{name}`: {reason}")]
    MalformedDescriptor { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Too many classes (exceeds u16 max).
    #[error("too many classes: {0} (max 65535)")]
    TooManyClasses(usize),

    /// Too many categories (exceeds u16 max).
    #[error("too many categories: {0} (max 65535)")]
    TooManyCategories(usize),
}

impl EmitError {
    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        EmitError::MalformedDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for emission.
pub type Result<T> = std::result::Result<T, EmitError>;
