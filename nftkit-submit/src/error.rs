use std::{io, process::ExitStatus, time::Duration};

use nftkit_wire::WireError;
use thiserror::Error;

/// Why a submission failed. Submissions are never retried.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    #[error("nft exited with {status}: {stderr}")]
    NonZero { status: ExitStatus, stderr: String },
    /// The effect of the batch on the target is unknown.
    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
    #[error("submitter worker is gone")]
    WorkerClosed,
    /// The remote end received the batch but refused or failed to apply it.
    #[error("rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, SubmitError>;
