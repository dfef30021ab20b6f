//! Length-prefixed framing for shipping serialized payloads over a byte stream.
//!
//! ```text
//! ┌──────────────┬─────────────┬───────────────┬─────────────────────────┐
//! │  id (u32 BE) │ status (u8) │ size (u32 BE) │  payload (size bytes)   │
//! └──────────────┴─────────────┴───────────────┴─────────────────────────┘
//! ```
//!
//! Requests carry a serialized batch document; responses echo the request id and carry either
//! the handler output or an error description, tagged by [`Status`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::WireError;

/// Outcome carried by a response frame. Requests are always sent with [`Status::Ok`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    Err = 1,
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Err),
            _ => Err(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: Header,
    /// The frame payload.
    payload: Bytes,
}

impl Frame {
    /// Payloads over 4GiB are rejected when the frame is encoded.
    pub fn new(id: u32, status: Status, payload: Bytes) -> Self {
        let size = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        Self { header: Header { id, status, size }, payload }
    }

    pub fn request(id: u32, payload: Bytes) -> Self {
        Self::new(id, Status::Ok, payload)
    }

    pub fn id(&self) -> u32 {
        self.header.id
    }

    pub fn status(&self) -> Status {
        self.header.status
    }

    pub fn payload_size(&self) -> u32 {
        self.header.size
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The frame ID, echoed by the response.
    pub(crate) id: u32,
    pub(crate) status: Status,
    /// The size of the payload. Max 4GiB.
    pub(crate) size: u32,
}

impl Header {
    /// Returns the length of the header in bytes.
    #[inline]
    pub const fn len() -> usize {
        9
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Header,
    Payload(Header),
}

#[derive(Debug, Default)]
pub struct Codec {
    /// The current state of the decoder.
    state: State,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for Codec {
    type Item = Frame;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::Header => {
                    if src.len() < Header::len() {
                        return Ok(None);
                    }

                    let id = src.get_u32();
                    let status = Status::try_from(src.get_u8()).map_err(|s| {
                        WireError::malformed("frame header", format!("unknown status byte {s}"))
                    })?;
                    let size = src.get_u32();

                    self.state = State::Payload(Header { id, status, size });
                }
                State::Payload(header) => {
                    if src.len() < header.size as usize {
                        src.reserve(header.size as usize - src.len());
                        return Ok(None);
                    }

                    let payload = src.split_to(header.size as usize);
                    let frame = Frame { header, payload: payload.freeze() };

                    self.state = State::Header;
                    return Ok(Some(frame));
                }
            }
        }
    }
}

impl Encoder<Frame> for Codec {
    type Error = WireError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = payload_size(item.payload.len())?;
        dst.reserve(Header::len() + item.payload.len());

        dst.put_u32(item.header.id);
        dst.put_u8(item.header.status as u8);
        dst.put_u32(size);
        dst.put(item.payload);

        Ok(())
    }
}

fn payload_size(len: usize) -> Result<u32, WireError> {
    u32::try_from(len)
        .map_err(|_| WireError::malformed("frame", format!("payload of {len} bytes exceeds 4GiB")))
}
