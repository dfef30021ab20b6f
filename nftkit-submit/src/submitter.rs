use std::time::Duration;

use nftkit_wire::SerializedBatch;
use tokio::{
    sync::{mpsc, oneshot},
    time::{timeout_at, Instant},
};

use crate::{Handler, Response, Result, SubmitError};

/// Per-submission options.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// How long a submission may take in total, queueing included. Default: 5 seconds.
    pub timeout: Duration,
}

impl SubmitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(5) }
    }
}

/// Hands `batch` to `handler`, giving up after `options.timeout`.
///
/// After a timeout the effect of the batch on the target is unknown.
pub async fn submit<H: Handler + ?Sized>(
    batch: &SerializedBatch,
    handler: &mut H,
    options: &SubmitOptions,
) -> Result<Response> {
    let deadline = Instant::now() + options.timeout;
    timeout_at(deadline, handler.handle(batch))
        .await
        .map_err(|_| SubmitError::Timeout(options.timeout))?
}

#[derive(Debug, Clone)]
pub struct SubmitterOptions {
    /// Submissions that may wait for the worker before `submit` itself blocks. Default: 64.
    pub queue_size: usize,
    /// Used by [`Submitter::submit`].
    pub submit: SubmitOptions,
}

impl SubmitterOptions {
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.submit.timeout = timeout;
        self
    }
}

impl Default for SubmitterOptions {
    fn default() -> Self {
        Self { queue_size: 64, submit: SubmitOptions::default() }
    }
}

struct Request {
    batch: SerializedBatch,
    deadline: Instant,
    timeout: Duration,
    tx: oneshot::Sender<Result<Response>>,
}

/// A cloneable front for a single worker task owning a [`Handler`].
///
/// Concurrent submissions are applied one at a time, in the order they were queued. A
/// submission whose caller already gave up is skipped.
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: mpsc::Sender<Request>,
    options: SubmitOptions,
}

impl Submitter {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn<H: Handler + 'static>(handler: H, options: SubmitterOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.queue_size.max(1));
        tokio::spawn(worker(handler, rx));

        Self { tx, options: options.submit }
    }

    pub async fn submit(&self, batch: SerializedBatch) -> Result<Response> {
        self.submit_with(batch, &self.options).await
    }

    pub async fn submit_with(
        &self,
        batch: SerializedBatch,
        options: &SubmitOptions,
    ) -> Result<Response> {
        let deadline = Instant::now() + options.timeout;
        let (tx, rx) = oneshot::channel();
        let request = Request { batch, deadline, timeout: options.timeout, tx };

        let timed_out = || SubmitError::Timeout(options.timeout);

        timeout_at(deadline, self.tx.send(request))
            .await
            .map_err(|_| timed_out())?
            .map_err(|_| SubmitError::WorkerClosed)?;

        timeout_at(deadline, rx).await.map_err(|_| timed_out())?.map_err(|_| SubmitError::WorkerClosed)?
    }
}

async fn worker<H: Handler>(mut handler: H, mut rx: mpsc::Receiver<Request>) {
    while let Some(Request { batch, deadline, timeout, tx }) = rx.recv().await {
        if tx.is_closed() {
            tracing::debug!(entries = batch.len(), "caller gave up, skipping batch");
            continue;
        }

        tracing::debug!(entries = batch.len(), "dispatching batch");
        let result = timeout_at(deadline, handler.handle(&batch))
            .await
            .unwrap_or(Err(SubmitError::Timeout(timeout)));

        if let Err(e) = &result {
            tracing::warn!(error = %e, "submission failed");
        }

        let _ = tx.send(result);
    }

    tracing::debug!("all submitters dropped, worker exiting");
}
