// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Little-endian frame encoding and decoding.
//!
//! ```text
//!  0..8       timestamp, low u64
//!  8..16      timestamp, high u64
//! 16..18      path length L (u16)
//! 18..18+L    path, UTF-8, '/'-separated
//! 18+L..20+L  type tag (u16)
//! 20+L..      payload
//! ```

use super::payload::Payload;
use super::record::{Frame, FramePath, TypeTag};
use crate::error::{FrameError, Malformed};
use crate::time::Timestamp;

/// Fixed header bytes before the path: timestamp plus path length.
pub const HEADER_LEN: usize = 18;

/// Decodes one frame from a complete buffer.
///
/// # Errors
///
/// - [`FrameError::MalformedFrame`] if the buffer is shorter than the header,
///   the declared path length overruns the buffer, the type tag is missing,
///   the payload is shorter than its variant needs, or text is not UTF-8.
/// - [`FrameError::UnknownFrameType`] if the type tag is not recognized.
pub fn decode(bytes: &[u8]) -> Result<Frame, FrameError> {
    let truncated = || Malformed::TruncatedHeader { len: bytes.len() };
    let mut r = ByteReader::new(bytes);

    let low = r.read_u64().ok_or_else(truncated)?;
    let high = r.read_u64().ok_or_else(truncated)?;
    let path_len = usize::from(r.read_u16().ok_or_else(truncated)?);

    let path = r.read_bytes(path_len).ok_or(Malformed::PathOverrun {
        declared: path_len,
        available: r.remaining(),
    })?;
    let path = core::str::from_utf8(path).map_err(|_| Malformed::InvalidPathUtf8)?;

    let tag = TypeTag::try_from(r.read_u16().ok_or(Malformed::MissingTypeTag)?)?;
    let payload = Payload::decode(tag, r.rest())?;

    Ok(Frame::new(
        Timestamp::from_halves(low, high),
        FramePath::parse(path),
        payload,
    ))
}

/// Encodes `frame` into a new buffer.
///
/// # Errors
///
/// Returns [`FrameError::PathTooLong`] if the path text exceeds `u16::MAX`
/// bytes.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, FrameError> {
    let mut buf = Vec::with_capacity(frame.encoded_len());
    encode_into(frame, &mut buf)?;
    Ok(buf)
}

/// Appends the encoding of `frame` to `buf`.
///
/// On error `buf` is left unchanged.
///
/// # Errors
///
/// Returns [`FrameError::PathTooLong`] if the path text exceeds `u16::MAX`
/// bytes.
pub fn encode_into(frame: &Frame, buf: &mut Vec<u8>) -> Result<(), FrameError> {
    write_frame(buf, frame.timestamp(), frame.path(), frame.payload())
}

fn write_frame(
    buf: &mut Vec<u8>,
    timestamp: Timestamp,
    path: &FramePath,
    payload: &Payload,
) -> Result<(), FrameError> {
    let path_len = path.text_len();
    let path_len_u16 = u16::try_from(path_len).map_err(|_| FrameError::PathTooLong(path_len))?;

    let mut w = ByteWriter::new(buf);
    w.write_u64(timestamp.low());
    w.write_u64(timestamp.high());
    w.write_u16(path_len_u16);
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            w.write_u8(b'/');
        }
        w.write_bytes(segment.as_bytes());
    }
    w.write_u16(payload.type_tag().as_u16());
    payload.write_to(&mut w);
    Ok(())
}

/// Producer-side helper that stamps frames with a movable timeline cursor.
///
/// The cursor stays where it was last set, so a producer can emit several
/// frames for one instant and then advance.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    timeline: Timestamp,
    buf: Vec<u8>,
}

impl FrameEncoder {
    /// Creates an encoder with the cursor at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the timeline cursor.
    pub fn set_timeline(&mut self, timestamp: Timestamp) {
        self.timeline = timestamp;
    }

    /// Returns the timeline cursor.
    #[must_use]
    pub fn timeline(&self) -> Timestamp {
        self.timeline
    }

    /// Encodes `payload` for `path` at the current cursor. The returned slice
    /// is valid until the next call.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PathTooLong`] if the path text exceeds
    /// `u16::MAX` bytes.
    pub fn encode(&mut self, path: &str, payload: &Payload) -> Result<&[u8], FrameError> {
        self.buf.clear();
        write_frame(&mut self.buf, self.timeline, &FramePath::parse(path), payload)?;
        Ok(&self.buf)
    }
}

// ---------------------------------------------------------------------------
// Byte cursors
// ---------------------------------------------------------------------------

/// Bounds-checked little-endian reader over a byte slice.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Returns the next `n` bytes, or `None` without advancing if fewer
    /// remain.
    pub(crate) fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Some(out)
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_bytes(N)?.try_into().ok()
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    pub(crate) fn read_u16(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub(crate) fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    pub(crate) fn read_f64(&mut self) -> Option<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Consumes and returns everything left.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        out
    }
}

/// Little-endian writer appending to a byte vector.
#[derive(Debug)]
pub(crate) struct ByteWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> ByteWriter<'a> {
    pub(crate) fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }
}
