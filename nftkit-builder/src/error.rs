use nftkit_wire::{Kind, Operation};
use thiserror::Error;

/// Everything that can go wrong while turning a field bag into commands.
///
/// All variants are raised synchronously, before anything is appended to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("no recognized object in fields")]
    NoObject,
    #[error("ambiguous object: {candidates:?} share the highest priority")]
    AmbiguousObject { candidates: Vec<&'static str> },
    #[error("missing context `{field}`: {hint}")]
    MissingContext { field: &'static str, hint: &'static str },
    #[error("{kind} requires field `{field}`")]
    MissingField { kind: Kind, field: &'static str },
    #[error("`{field}` is out of range, expected {bound}")]
    Range { field: String, bound: String },
    #[error("`{field}` must be one of {allowed:?}")]
    InvalidEnum { field: String, allowed: Vec<&'static str> },
    #[error("cannot {operation} a {kind}, valid operations are {valid:?}")]
    UnsupportedOperation { operation: Operation, kind: Kind, valid: Vec<Operation> },
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

impl BuildError {
    pub(crate) fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField { field: field.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
