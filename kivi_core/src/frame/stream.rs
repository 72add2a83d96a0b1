// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoding sequences of frame buffers.
//!
//! Each buffer holds exactly one frame. A buffer that fails to decode is
//! dropped and reported as a [`RejectedFrame`]; the buffers after it are
//! still decoded.

use tracing::warn;

use super::codec::decode;
use super::record::Frame;
use crate::error::FrameError;

/// A buffer that could not be decoded, with its position in the input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("frame {index} rejected")]
pub struct RejectedFrame {
    /// Zero-based position of the buffer in the input sequence.
    pub index: usize,
    /// Why decoding failed.
    #[source]
    pub error: FrameError,
}

/// Iterator returned by [`decode_stream`].
#[derive(Debug)]
pub struct DecodeStream<I> {
    buffers: I,
    index: usize,
}

/// Decodes each buffer of `buffers` in order.
///
/// Failures are logged at `warn` and yielded as `Err` items without ending
/// the iteration.
pub fn decode_stream<I>(buffers: I) -> DecodeStream<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    DecodeStream {
        buffers: buffers.into_iter(),
        index: 0,
    }
}

impl<I> Iterator for DecodeStream<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = Result<Frame, RejectedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let buffer = self.buffers.next()?;
        let index = self.index;
        self.index += 1;
        Some(decode_indexed(index, buffer.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.buffers.size_hint()
    }
}

/// Decodes a slice of buffers, keeping input order.
pub fn decode_batch<B: AsRef<[u8]>>(buffers: &[B]) -> Vec<Result<Frame, RejectedFrame>> {
    decode_stream(buffers).collect()
}

/// Decodes a slice of buffers on the rayon thread pool, keeping input order.
///
/// Results are identical to [`decode_batch`].
#[cfg(feature = "parallel")]
pub fn decode_batch_parallel<B>(buffers: &[B]) -> Vec<Result<Frame, RejectedFrame>>
where
    B: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    buffers
        .par_iter()
        .enumerate()
        .map(|(index, buffer)| decode_indexed(index, buffer.as_ref()))
        .collect()
}

fn decode_indexed(index: usize, bytes: &[u8]) -> Result<Frame, RejectedFrame> {
    decode(bytes).map_err(|error| {
        warn!(index, len = bytes.len(), %error, "rejecting frame");
        RejectedFrame { index, error }
    })
}
