//! Length-prefixed string frames (panic-free).
//!
//! Layout: `len: u16 (big-endian) | payload: [u8; len]`, payload is UTF-8.
//! Decoding is incremental: `Ok(None)` means "need more bytes".

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// Width of the length prefix.
pub const LEN_PREFIX_BYTES: usize = 2;

/// Hard ceiling imposed by the u16 prefix.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Configured limits above the prefix ceiling collapse to it.
pub fn effective_max(max_len: usize) -> usize {
    max_len.min(MAX_FRAME_LEN)
}

/// Encode one string into a standalone frame.
pub fn encode_frame(s: &str, max_len: usize) -> Result<Bytes, FrameError> {
    let mut dst = BytesMut::with_capacity(LEN_PREFIX_BYTES + s.len());
    encode_frame_into(s, max_len, &mut dst)?;
    Ok(dst.freeze())
}

/// Append one frame to `dst`. Over-limit strings are rejected at the sender.
pub fn encode_frame_into(s: &str, max_len: usize, dst: &mut BytesMut) -> Result<(), FrameError> {
    let max = effective_max(max_len);
    let len = s.len();
    if len > max {
        return Err(FrameError::TooLarge { len, max });
    }
    let prefix = u16::try_from(len).map_err(|_| FrameError::TooLarge { len, max })?;

    dst.reserve(LEN_PREFIX_BYTES + len);
    dst.put_u16(prefix);
    dst.put_slice(s.as_bytes());
    Ok(())
}

/// Peek the declared payload length without consuming anything.
pub fn peek_len(src: &[u8]) -> Option<usize> {
    let mut prefix = src.get(..LEN_PREFIX_BYTES)?;
    Some(prefix.get_u16() as usize)
}

/// Decode one frame from the front of `src`.
///
/// An over-limit prefix is rejected as soon as it is visible, before any
/// payload is buffered.
pub fn decode_frame(src: &mut BytesMut, max_len: usize) -> Result<Option<String>, FrameError> {
    let Some(len) = peek_len(src) else {
        return Ok(None);
    };

    let max = effective_max(max_len);
    if len > max {
        return Err(FrameError::TooLarge { len, max });
    }

    let total = LEN_PREFIX_BYTES + len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(LEN_PREFIX_BYTES);
    let payload = src.split_to(len);
    let s = std::str::from_utf8(&payload)?;
    Ok(Some(s.to_owned()))
}

/// Describe the partial frame left in `src` when the stream ended.
pub fn truncated(src: &[u8]) -> FrameError {
    let expected = match peek_len(src) {
        Some(len) => LEN_PREFIX_BYTES + len,
        None => LEN_PREFIX_BYTES,
    };
    FrameError::Truncated {
        expected,
        available: src.len(),
    }
}

/// Shorten `line` to fit one frame, cutting on a char boundary.
/// Returns true when anything was removed.
pub fn truncate_to_frame(line: &mut String, max_len: usize) -> bool {
    let max = effective_max(max_len);
    if line.len() <= max {
        return false;
    }
    let mut cut = max;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    line.truncate(cut);
    true
}
