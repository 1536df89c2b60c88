//! `tokio_util` codec adapter over the frame functions.
//!
//! Used with `FramedRead` / `FramedWrite` on either half of a TCP stream, so
//! the server and the client share one symmetric framing.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::protocol::frame::{self, MAX_FRAME_LEN};

/// Length-prefixed UTF-8 string codec with a configured size limit.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            max_frame_len: frame::effective_max(max_frame_len),
        }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, FrameError> {
        frame::decode_frame(src, self.max_frame_len)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, FrameError> {
        match self.decode(src)? {
            Some(s) => Ok(Some(s)),
            None if src.is_empty() => Ok(None),
            None => Err(frame::truncated(src)),
        }
    }
}

impl<'a> Encoder<&'a str> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), FrameError> {
        frame::encode_frame_into(item, self.max_frame_len, dst)
    }
}

impl Encoder<String> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), FrameError> {
        frame::encode_frame_into(&item, self.max_frame_len, dst)
    }
}
