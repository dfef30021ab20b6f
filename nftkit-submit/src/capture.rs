use std::sync::Arc;

use async_trait::async_trait;
use nftkit_wire::SerializedBatch;
use parking_lot::Mutex;

use crate::{Handler, Response, Result};

/// Records every batch instead of applying it, answering with a fixed response.
///
/// Clones share the same record, so a clone can be kept for inspection while the original is
/// moved into a [`Submitter`](crate::Submitter).
#[derive(Debug, Clone, Default)]
pub struct CaptureHandler {
    captured: Arc<Mutex<Vec<SerializedBatch>>>,
    response: Response,
}

impl CaptureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = response;
        self
    }

    /// The batches handled so far, in order.
    pub fn captured(&self) -> Vec<SerializedBatch> {
        self.captured.lock().clone()
    }
}

#[async_trait]
impl Handler for CaptureHandler {
    async fn handle(&mut self, batch: &SerializedBatch) -> Result<Response> {
        self.captured.lock().push(batch.clone());
        Ok(self.response.clone())
    }
}
