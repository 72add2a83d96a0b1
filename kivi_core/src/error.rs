// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame decoding and encoding errors.

use crate::frame::{HEADER_LEN, TypeTag};

/// Errors produced while decoding or encoding a single frame.
///
/// A frame that fails to decode is rejected whole; nothing partial is ever
/// handed to the scene.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The buffer does not follow the wire layout.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] Malformed),
    /// The type tag is not one of the known payload variants.
    #[error("unknown frame type tag {0}")]
    UnknownFrameType(u16),
    /// The path text does not fit the 16-bit length prefix.
    #[error("path is {0} bytes long, exceeding the {max}-byte limit", max = u16::MAX)]
    PathTooLong(usize),
}

/// The specific way a buffer violated the wire layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    /// Fewer bytes than the fixed timestamp + path-length header.
    #[error("buffer of {len} bytes is shorter than the {header}-byte header", header = HEADER_LEN)]
    TruncatedHeader {
        /// Total buffer length.
        len: usize,
    },
    /// The declared path length runs past the end of the buffer.
    #[error("declared path length {declared} overruns the {available} bytes after the header")]
    PathOverrun {
        /// Path length from the header.
        declared: usize,
        /// Bytes actually present after the header.
        available: usize,
    },
    /// The buffer ends before the two-byte type tag.
    #[error("buffer ends before the type tag")]
    MissingTypeTag,
    /// The payload is shorter than its variant's fixed layout.
    #[error("{tag:?} payload needs {expected} bytes, found {found}")]
    ShortPayload {
        /// Variant being decoded.
        tag: TypeTag,
        /// Bytes the layout requires.
        expected: usize,
        /// Bytes present.
        found: usize,
    },
    /// The path bytes are not UTF-8.
    #[error("path is not valid UTF-8")]
    InvalidPathUtf8,
    /// The asset key bytes of an STL payload are not UTF-8.
    #[error("asset key is not valid UTF-8")]
    InvalidKeyUtf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = FrameError::from(Malformed::TruncatedHeader { len: 3 });
        assert_eq!(
            e.to_string(),
            "malformed frame: buffer of 3 bytes is shorter than the 18-byte header"
        );
        assert_eq!(
            FrameError::UnknownFrameType(255).to_string(),
            "unknown frame type tag 255"
        );
        assert_eq!(
            FrameError::PathTooLong(70_000).to_string(),
            "path is 70000 bytes long, exceeding the 65535-byte limit"
        );
    }
}
