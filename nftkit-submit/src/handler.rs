use async_trait::async_trait;
use nftkit_wire::{response::Listing, SerializedBatch, WireError};

use crate::Result;

/// What a handler returns for an applied batch: the raw output of the target, if any.
///
/// Mutating batches usually answer with nothing, `list` queries with an `nft -j` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub output: String,
}

impl Response {
    pub fn new(output: impl Into<String>) -> Self {
        Self { output: output.into() }
    }

    /// Decodes the output as an `nft -j` listing.
    pub fn listing(&self) -> std::result::Result<Listing, WireError> {
        Listing::parse(&self.output)
    }
}

/// Applies serialized batches to some target.
///
/// Implementations decide what applying means: running `nft`, forwarding to a remote agent,
/// recording for a test, or any combination.
#[async_trait]
pub trait Handler: Send {
    async fn handle(&mut self, batch: &SerializedBatch) -> Result<Response>;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn handle(&mut self, batch: &SerializedBatch) -> Result<Response> {
        (**self).handle(batch).await
    }
}
