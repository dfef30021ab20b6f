#![doc(issue_tracker_base_url = "https://github.com/chainbound/nftkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Wire types for nftkit.
//!
//! Everything in here describes data as it crosses the boundary to the nftables JSON API:
//! the object taxonomy ([`Kind`], [`Operation`], [`Family`]), normalized [`Command`]s, the
//! serialized form of a batch ([`SerializedBatch`]), read-only [`Query`] documents, decoding of
//! `nft -j` output ([`response`]) and the length-prefixed [`frame`] codec used to ship payloads
//! over a byte stream.

mod command;
mod error;
mod kind;

pub mod batch;
pub mod frame;
pub mod query;
pub mod response;

pub use batch::SerializedBatch;
pub use command::{Command, Spec};
pub use error::{Result, WireError};
pub use kind::{Family, Kind, Operation};
pub use query::Query;

/// The top-level key of every document accepted and produced by `nft -j`.
pub const DOCUMENT_KEY: &str = "nftables";
