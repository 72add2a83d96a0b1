// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame records: timestamp, scene path, and typed payload.

use core::fmt;

use super::codec;
use super::payload::Payload;
use crate::error::FrameError;
use crate::time::Timestamp;

/// The wire discriminant selecting a [`Payload`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TypeTag {
    /// Delete the node at the path.
    NullData = 0,
    /// Attach STL geometry named by an asset key.
    Stl = 1,
    /// Set the surface material.
    MeshMaterial = 2,
    /// Set the local pose from a 4×4 matrix.
    Matrix4 = 3,
    /// Upsert an arrow glyph.
    Arrow3 = 4,
}

impl TypeTag {
    /// Every known tag, in wire order.
    pub const ALL: [Self; 5] = [
        Self::NullData,
        Self::Stl,
        Self::MeshMaterial,
        Self::Matrix4,
        Self::Arrow3,
    ];

    /// Maps a raw wire value to a tag.
    #[must_use]
    pub const fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::NullData),
            1 => Some(Self::Stl),
            2 => Some(Self::MeshMaterial),
            3 => Some(Self::Matrix4),
            4 => Some(Self::Arrow3),
            _ => None,
        }
    }

    /// Returns the raw wire value.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for TypeTag {
    type Error = FrameError;

    fn try_from(raw: u16) -> Result<Self, FrameError> {
        Self::from_u16(raw).ok_or(FrameError::UnknownFrameType(raw))
    }
}

/// A `/`-separated location in the scene tree, stored as its non-empty
/// segments.
///
/// Parsing drops empty segments, so `"/a//b/"` and `"a/b"` are the same path.
/// The empty path addresses the scene root.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct FramePath {
    segments: Vec<Box<str>>,
}

impl FramePath {
    /// The empty path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Splits `text` on `/`, dropping empty segments.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            segments: text
                .split('/')
                .filter(|s| !s.is_empty())
                .map(Box::from)
                .collect(),
        }
    }

    /// Returns the segments, outermost first.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Box<str>] {
        &self.segments
    }

    /// Iterates the segments as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().map(|s| &**s)
    }

    /// Returns whether this is the empty path.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns whether there are no segments. Same as [`is_root`](Self::is_root).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns this path extended by the segments of `suffix`.
    #[must_use]
    pub fn join(&self, suffix: &str) -> Self {
        let mut joined = self.clone();
        joined.segments.extend(Self::parse(suffix).segments);
        joined
    }

    /// Byte length of the canonical `a/b/c` text form.
    pub(crate) fn text_len(&self) -> usize {
        let bytes: usize = self.segments.iter().map(|s| s.len()).sum();
        bytes + self.segments.len().saturating_sub(1)
    }
}

impl fmt::Display for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FramePath(\"{self}\")")
    }
}

impl From<&str> for FramePath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// One decoded telemetry record.
///
/// Frames are immutable values; the patch engine reads them and never keeps
/// references into them.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    timestamp: Timestamp,
    path: FramePath,
    payload: Payload,
}

impl Frame {
    /// Creates a frame.
    #[must_use]
    pub fn new(timestamp: Timestamp, path: impl Into<FramePath>, payload: Payload) -> Self {
        Self {
            timestamp,
            path: path.into(),
            payload,
        }
    }

    /// Decodes one frame from a complete buffer. See [`decode`](crate::frame::decode).
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        codec::decode(bytes)
    }

    /// Encodes this frame into a new buffer. See [`encode`](crate::frame::encode).
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        codec::encode(self)
    }

    /// Number of bytes [`encode`](Self::encode) produces.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        codec::HEADER_LEN + self.path.text_len() + 2 + self.payload.encoded_len()
    }

    /// Producer timeline position.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Target location in the scene.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FramePath {
        &self.path
    }

    /// Typed content.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Wire discriminant of the payload.
    #[inline]
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        self.payload.type_tag()
    }

    /// Splits the frame into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Timestamp, FramePath, Payload) {
        (self.timestamp, self.path, self.payload)
    }
}
