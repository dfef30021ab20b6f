#![doc(issue_tracker_base_url = "https://github.com/chainbound/nftkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Submission of serialized nftables batches.
//!
//! A [`Handler`] applies one [`SerializedBatch`](nftkit_wire::SerializedBatch) to some target:
//!
//! - [`NftHandler`] pipes it into a local `nft -j -f -`,
//! - [`StreamHandler`] ships it to a remote [`serve`] loop over any byte stream,
//! - [`CaptureHandler`] records it,
//! - [`AuditHandler`] logs around another handler.
//!
//! [`submit`] runs a handler once with a timeout. A [`Submitter`] owns a handler in a worker
//! task and applies concurrent submissions one at a time, in FIFO order.

mod audit;
mod capture;
mod error;
mod handler;
mod nft;
mod stream;
mod submitter;

pub mod sysctl;

pub use audit::AuditHandler;
pub use capture::CaptureHandler;
pub use error::{Result, SubmitError};
pub use handler::{Handler, Response};
pub use nft::{NftHandler, NftOptions};
pub use stream::{serve, StreamHandler};
pub use submitter::{submit, SubmitOptions, Submitter, SubmitterOptions};
