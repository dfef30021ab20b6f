//! Shipping batches to a remote agent over any byte stream.
//!
//! Each batch travels as one request [`Frame`] carrying the `{"nftables": [...]}` document. The
//! agent answers with a frame echoing the request id, tagged [`Status::Ok`] with the handler
//! output, or [`Status::Err`] with an error description.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use nftkit_wire::{
    frame::{Codec, Frame, Status},
    SerializedBatch,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::{Handler, Response, Result, SubmitError};

/// The client side: a [`Handler`] that forwards batches to a remote [`serve`] loop.
#[derive(Debug)]
pub struct StreamHandler<S> {
    framed: Framed<S, Codec>,
    next_id: u32,
}

impl<S: AsyncRead + AsyncWrite + Unpin> StreamHandler<S> {
    pub fn new(stream: S) -> Self {
        Self { framed: Framed::new(stream, Codec::new()), next_id: 0 }
    }

    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Handler for StreamHandler<S> {
    async fn handle(&mut self, batch: &SerializedBatch) -> Result<Response> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let payload = Bytes::from(batch.to_document().to_string());
        self.framed.send(Frame::request(id, payload)).await?;

        loop {
            let Some(frame) = self.framed.next().await else {
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
            };
            let frame = frame?;

            // Answers to requests abandoned earlier (e.g. after a timeout).
            if frame.id() != id {
                tracing::warn!(expected = id, got = frame.id(), "discarding stale response");
                continue;
            }

            let output = String::from_utf8_lossy(frame.payload()).to_string();
            return match frame.status() {
                Status::Ok => Ok(Response::new(output)),
                Status::Err => Err(SubmitError::Rejected(output)),
            };
        }
    }
}

/// The agent side: applies every batch received on `stream` with `handler`, until the peer
/// closes the stream.
///
/// Handler failures are reported to the peer and do not end the loop. Transport and framing
/// errors do.
pub async fn serve<S, H>(stream: S, handler: &mut H) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: Handler + ?Sized,
{
    let mut framed = Framed::new(stream, Codec::new());

    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let id = frame.id();

        let result = match std::str::from_utf8(frame.payload()) {
            Ok(document) => match SerializedBatch::parse(document) {
                Ok(batch) => handler.handle(&batch).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(SubmitError::Rejected(format!("payload is not utf-8: {e}"))),
        };

        let response = match result {
            Ok(response) => Frame::new(id, Status::Ok, Bytes::from(response.output)),
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to apply batch");
                Frame::new(id, Status::Err, Bytes::from(e.to_string()))
            }
        };
        framed.send(response).await?;
    }

    tracing::debug!("peer closed the stream");
    Ok(())
}
