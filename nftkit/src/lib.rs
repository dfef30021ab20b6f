#![doc(issue_tracker_base_url = "https://github.com/chainbound/nftkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Declarative nftables batches.
//!
//! ```no_run
//! use nftkit::{expr::{ct, tcp, Expr}, fields, BatchBuilder, NftHandler, Submitter, SubmitterOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = BatchBuilder::new();
//! builder
//!     .flush_ruleset()
//!     .add(fields! { "table" => "filter", "family" => "inet" })?
//!     .add(fields! { "chain" => "input", "hook" => "input", "policy" => "drop" })?
//!     .add(fields! { "rules" => vec![
//!         Expr::new().with(ct::state(["established", "related"])).accept(),
//!         Expr::new().with(tcp::dport(22)).counter().accept(),
//!     ] })?;
//!
//! let submitter = Submitter::spawn(NftHandler::default(), SubmitterOptions::default());
//! submitter.submit(builder.serialize()).await?;
//! # Ok(())
//! # }
//! ```

pub use nftkit_builder::{
    classify, context, expr, fields, registry, Batch, BatchBuilder, BuildError, BuilderOptions,
    Classified, Context, ContextFields, Expr, FieldBag, FieldValue, RuleExpr,
};
pub use nftkit_submit::{
    serve, submit, sysctl, AuditHandler, CaptureHandler, Handler, NftHandler, NftOptions, Response,
    StreamHandler, SubmitError, SubmitOptions, Submitter, SubmitterOptions,
};
pub use nftkit_wire::{
    frame, query, response, Command, Family, Kind, Operation, Query, SerializedBatch, Spec,
    WireError,
};
