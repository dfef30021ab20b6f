use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),
    #[error("unknown object kind: {0:?}")]
    UnknownKind(String),
    #[error("unknown family: {0:?}")]
    UnknownFamily(String),
}

impl WireError {
    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed { what, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
