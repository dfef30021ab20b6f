use async_trait::async_trait;
use nftkit_wire::SerializedBatch;

use crate::{Handler, Response, Result};

/// Logs every batch before handing it to the inner handler, and the outcome after.
#[derive(Debug, Clone)]
pub struct AuditHandler<H> {
    inner: H,
}

impl<H> AuditHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

#[async_trait]
impl<H: Handler> Handler for AuditHandler<H> {
    async fn handle(&mut self, batch: &SerializedBatch) -> Result<Response> {
        tracing::info!(entries = batch.len(), %batch, "submitting batch");

        let result = self.inner.handle(batch).await;
        match &result {
            Ok(response) => tracing::info!(output_len = response.output.len(), "batch applied"),
            Err(e) => tracing::error!(error = %e, "batch failed"),
        }

        result
    }
}
