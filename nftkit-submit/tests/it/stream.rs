use nftkit_builder::{expr::Expr, fields, BatchBuilder};
use nftkit_submit::{
    serve, CaptureHandler, Handler, Response, SubmitError, SubmitOptions, StreamHandler, Submitter,
    SubmitterOptions,
};
use nftkit_wire::{
    frame::{Codec, Frame, Status},
    SerializedBatch,
};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio_util::codec::Framed;

fn ruleset() -> SerializedBatch {
    let mut builder = BatchBuilder::new();
    builder
        .add(fields! { "table" => "filter" })
        .unwrap()
        .add(fields! { "chain" => "input", "hook" => "input", "policy" => "drop" })
        .unwrap()
        .add(fields! { "rule" => Expr::new().accept() })
        .unwrap();
    builder.serialize()
}

#[tokio::test]
async fn batches_reach_the_remote_handler() {
    let _ = tracing_subscriber::fmt::try_init();

    let (client, server) = tokio::io::duplex(1024);

    let capture = CaptureHandler::new().with_response(Response::new("applied"));
    let mut remote = capture.clone();
    let agent = tokio::spawn(async move { serve(server, &mut remote).await });

    let submitter = Submitter::spawn(StreamHandler::new(client), SubmitterOptions::default());

    let batch = ruleset();
    let response = submitter.submit(batch.clone()).await.unwrap();
    assert_eq!(response.output, "applied");

    // Dropping the only submitter closes the stream, which ends the agent.
    drop(submitter);
    agent.await.unwrap().unwrap();

    assert_eq!(capture.captured(), vec![batch]);
}

#[tokio::test]
async fn remote_errors_are_rejections() {
    let _ = tracing_subscriber::fmt::try_init();

    let (client, server) = tokio::io::duplex(1024);

    // A peer that refuses everything.
    let agent = tokio::spawn(async move {
        let mut framed = Framed::new(server, Codec::new());
        while let Some(Ok(frame)) = framed.next().await {
            let reply = Frame::new(frame.id(), Status::Err, Bytes::from_static(b"permission denied"));
            framed.send(reply).await.unwrap();
        }
    });

    let mut handler = StreamHandler::new(client);
    let err = nftkit_submit::submit(&ruleset(), &mut handler, &SubmitOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Rejected(msg) if msg == "permission denied"));

    drop(handler);
    agent.await.unwrap();
}

#[tokio::test]
async fn closed_stream_is_an_io_error() {
    let (client, server) = tokio::io::duplex(64);
    drop(server);

    let mut handler = StreamHandler::new(client);
    let err = handler.handle(&ruleset()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Io(_) | SubmitError::Wire(_)));
}
