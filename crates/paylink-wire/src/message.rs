//! Wire codec for transaction messages.
//!
//! Messages are UTF-8 JSON objects. With [`Framing::Raw`] (the default) every
//! transport read is taken as one whole message, with no delimiter and no
//! length prefix. [`Framing::LengthPrefixed`] is an opt-in where each message
//! is preceded by a 4-byte big-endian length header.

use bytes::{Buf, Bytes, BytesMut};
use paylink_types::config::Framing;
use paylink_types::transaction::{TransactionRequest, TransactionResponse};

use crate::connection::WireError;

/// Maximum single frame body (1 MB).
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

/// Length of the frame header.
const HEADER_LEN: usize = 4;

/// Wrap a JSON body in the configured framing.
pub fn encode_frame(body: &[u8], framing: Framing) -> Vec<u8> {
    match framing {
        Framing::LengthPrefixed => {
            let len = body.len() as u32;
            let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
            bytes.extend_from_slice(&len.to_be_bytes());
            bytes.extend_from_slice(body);
            bytes
        }
        Framing::Raw => body.to_vec(),
    }
}

/// Decode the length prefix from a 4-byte header.
pub fn decode_length(header: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*header)
}

/// Serialize a request into a ready-to-write frame.
pub fn encode_request(req: &TransactionRequest, framing: Framing) -> Result<Vec<u8>, WireError> {
    let json = serde_json::to_vec(req)?;
    Ok(encode_frame(&json, framing))
}

/// Serialize a response into a ready-to-write frame.
pub fn encode_response(
    resp: &TransactionResponse,
    framing: Framing,
) -> Result<Vec<u8>, WireError> {
    let json = serde_json::to_vec(resp)?;
    Ok(encode_frame(&json, framing))
}

/// Parse a frame body as a request.
pub fn decode_request(body: &[u8]) -> Result<TransactionRequest, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Parse a frame body as a response.
pub fn decode_response(body: &[u8]) -> Result<TransactionResponse, serde_json::Error> {
    serde_json::from_slice(body)
}

/// One item produced by [`FrameDecoder::push`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A complete message body.
    Frame(Bytes),
    /// Bytes that cannot start a frame. They have already been discarded and
    /// decoding resumes with the next read.
    Invalid(String),
}

/// Incremental frame splitter for one byte stream.
///
/// Feed it whatever each read returned; it hands back every frame body that
/// is now complete and keeps the remainder buffered for the next read.
#[derive(Debug)]
pub struct FrameDecoder {
    framing: Framing,
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buf: BytesMut::new(),
        }
    }

    /// Push one read's worth of bytes and drain what is complete.
    pub fn push(&mut self, data: &[u8]) -> Vec<Decoded> {
        match self.framing {
            Framing::Raw => {
                if data.is_empty() {
                    Vec::new()
                } else {
                    vec![Decoded::Frame(Bytes::copy_from_slice(data))]
                }
            }
            Framing::LengthPrefixed => {
                self.buf.extend_from_slice(data);
                let mut out = Vec::new();
                while self.buf.len() >= HEADER_LEN {
                    let header = [self.buf[0], self.buf[1], self.buf[2], self.buf[3]];
                    let len = decode_length(&header);
                    if len > MAX_FRAME_SIZE {
                        // Unframed or corrupt input: drop everything buffered
                        let err = WireError::FrameTooLarge {
                            size: len,
                            max: MAX_FRAME_SIZE,
                        };
                        self.buf.clear();
                        out.push(Decoded::Invalid(err.to_string()));
                        break;
                    }
                    if self.buf.len() < HEADER_LEN + len as usize {
                        break;
                    }
                    self.buf.advance(HEADER_LEN);
                    out.push(Decoded::Frame(self.buf.split_to(len as usize).freeze()));
                }
                out
            }
        }
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}
