// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame records and their binary wire format.
//!
//! A [`Frame`] is one telemetry record: a [`Timestamp`](crate::time::Timestamp),
//! a [`FramePath`] naming a node in the scene, and a typed [`Payload`].
//! Frames arrive one per buffer; [`decode`] turns a buffer into a frame or a
//! [`FrameError`](crate::error::FrameError), never into a partial frame.
//!
//! # Wire layout
//!
//! ```text
//!  0..8       timestamp, low u64   (little-endian throughout)
//!  8..16      timestamp, high u64
//! 16..18      path length L (u16)
//! 18..18+L    path, UTF-8, '/'-separated
//! 18+L..20+L  type tag (u16), see TypeTag
//! 20+L..      payload, see Payload
//! ```

mod codec;
mod payload;
mod record;
mod stream;

pub use codec::{FrameEncoder, HEADER_LEN, decode, encode, encode_into};
pub use payload::{
    ARROW3_LEN, ARROW3_WITH_COLOR_LEN, Arrow3, MATRIX4_LEN, MESH_MATERIAL_LEN, Matrix4, Payload,
};
pub use record::{Frame, FramePath, TypeTag};
#[cfg(feature = "parallel")]
pub use stream::decode_batch_parallel;
pub use stream::{DecodeStream, RejectedFrame, decode_batch, decode_stream};
