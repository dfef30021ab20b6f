#![doc(issue_tracker_base_url = "https://github.com/chainbound/nftkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Declarative, context-tracking construction of nftables batches.
//!
//! Every call hands the builder an unordered [`FieldBag`]. The builder works out which object the
//! bag targets, which of its fields are ambient scope, validates the rest against the
//! [`registry`] and appends one or more normalized [`Command`](nftkit_wire::Command)s:
//!
//! ```text
//!   FieldBag -> classify -> Context (merge) -> factory -> Batch::append + Context commit
//! ```
//!
//! Nothing here performs I/O. Hand the [`Batch::serialize`]d result to a submitter.

mod batch;
mod builder;
mod error;
mod factory;
mod value;

pub mod classify;
pub mod context;
pub mod expr;
pub mod registry;

pub use batch::Batch;
pub use builder::{BatchBuilder, BuilderOptions};
pub use classify::{classify, Classified};
pub use context::{Context, ContextFields};
pub use error::{BuildError, Result};
pub use expr::Expr;
pub use factory::build as build_commands;
pub use value::{FieldBag, FieldValue, RuleExpr};
