use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use nftkit_builder::{fields, BatchBuilder};
use nftkit_submit::{
    submit, AuditHandler, CaptureHandler, Handler, Response, SubmitError, SubmitOptions, Submitter,
    SubmitterOptions,
};
use nftkit_wire::SerializedBatch;

fn table_batch(name: &str) -> SerializedBatch {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => name }).unwrap();
    builder.serialize()
}

/// Sleeps before answering, to expose ordering and timeouts.
struct Slow {
    delay: Duration,
    inner: CaptureHandler,
}

#[async_trait]
impl Handler for Slow {
    async fn handle(&mut self, batch: &SerializedBatch) -> nftkit_submit::Result<Response> {
        tokio::time::sleep(self.delay).await;
        self.inner.handle(batch).await
    }
}

#[tokio::test]
async fn submit_once() {
    let _ = tracing_subscriber::fmt::try_init();

    let capture = CaptureHandler::new().with_response(Response::new("ok"));
    let mut handler = AuditHandler::new(capture.clone());

    let batch = table_batch("filter");
    let response = submit(&batch, &mut handler, &SubmitOptions::default()).await.unwrap();

    assert_eq!(response.output, "ok");
    assert_eq!(capture.captured(), vec![batch]);
}

#[tokio::test]
async fn submit_times_out() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut handler = Slow { delay: Duration::from_secs(10), inner: CaptureHandler::new() };
    let options = SubmitOptions::default().with_timeout(Duration::from_millis(20));

    let err = submit(&table_batch("filter"), &mut handler, &options).await.unwrap_err();
    assert!(matches!(err, SubmitError::Timeout(d) if d == Duration::from_millis(20)));
}

#[tokio::test]
async fn concurrent_submissions_apply_in_fifo_order() {
    let _ = tracing_subscriber::fmt::try_init();

    let capture = CaptureHandler::new();
    let handler = Slow { delay: Duration::from_millis(5), inner: capture.clone() };
    let submitter = Submitter::spawn(handler, SubmitterOptions::default());

    let names: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();

    // join_all polls in order, so the submissions are queued in order before any completes.
    let results = join_all(names.iter().map(|name| submitter.submit(table_batch(name)))).await;
    assert!(results.iter().all(Result::is_ok));

    let applied: Vec<String> = capture
        .captured()
        .iter()
        .map(|b| b.commands().unwrap()[0].get_str("name").unwrap().to_string())
        .collect();
    assert_eq!(applied, names);
}

#[tokio::test]
async fn worker_timeout_is_reported() {
    let _ = tracing_subscriber::fmt::try_init();

    let handler = Slow { delay: Duration::from_secs(10), inner: CaptureHandler::new() };
    let submitter = Submitter::spawn(
        handler,
        SubmitterOptions::default().with_timeout(Duration::from_millis(20)),
    );

    let err = submitter.submit(table_batch("filter")).await.unwrap_err();
    assert!(matches!(err, SubmitError::Timeout(_)));
}
