use thiserror::Error;

use crate::domain::blocks::BlockId;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("domain invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}

/// Programming-level failures of the block document model.
///
/// These indicate a bug in the calling editor logic and are always returned to
/// the caller; the document is left untouched whenever one is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("anchor block `{0}` does not exist")]
    InvalidAnchor(BlockId),
    #[error("block `{0}` does not exist")]
    UnknownBlock(BlockId),
    #[error("block kind `{kind}` does not accept {keys:?}")]
    KindMismatch { kind: String, keys: Vec<String> },
    #[error("block kind `{0}` is not registered")]
    UnknownKind(String),
    #[error("invalid value for `{kind}.{prop}`: {reason}")]
    InvalidPropValue {
        kind: String,
        prop: String,
        reason: String,
    },
    #[error("block id `{0}` appears more than once")]
    DuplicateBlockId(BlockId),
    #[error("malformed block document: {0}")]
    Malformed(String),
}

impl DocumentError {
    pub fn kind_mismatch(kind: &str, keys: Vec<String>) -> Self {
        Self::KindMismatch {
            kind: kind.to_string(),
            keys,
        }
    }

    pub fn invalid_value(kind: &str, prop: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPropValue {
            kind: kind.to_string(),
            prop: prop.to_string(),
            reason: reason.into(),
        }
    }
}
