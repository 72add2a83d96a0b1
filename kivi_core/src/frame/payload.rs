// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed frame payloads and their fixed layouts.
//!
//! | Tag | Variant        | Layout (little-endian)                                   |
//! |-----|----------------|----------------------------------------------------------|
//! | 0   | `NullData`     | empty                                                    |
//! | 1   | `Stl`          | UTF-8 asset key, rest of buffer                          |
//! | 2   | `MeshMaterial` | `rgb: u8×3`, `roughness: f64` @3, `metalness: f64` @11   |
//! | 3   | `Matrix4`      | 16 × `f64`, row-major                                    |
//! | 4   | `Arrow3`       | `start: f64×3`, `end: f64×3`, optional `rgb: u8×3` @48   |

use super::codec::{ByteReader, ByteWriter};
use super::record::TypeTag;
use crate::error::{FrameError, Malformed};
use crate::scene::{Material, Rgb8};
use crate::transform::{Transform3d, Vec3};

/// Bytes in a `MeshMaterial` payload.
pub const MESH_MATERIAL_LEN: usize = 19;
/// Bytes in a `Matrix4` payload.
pub const MATRIX4_LEN: usize = 128;
/// Minimum bytes in an `Arrow3` payload (the two endpoints).
pub const ARROW3_LEN: usize = 48;
/// Bytes in an `Arrow3` payload that carries trailing color bytes.
pub const ARROW3_WITH_COLOR_LEN: usize = 51;

/// The typed content of a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Delete the target node and its subtree.
    NullData,
    /// Show the STL geometry named by this asset key.
    Stl(String),
    /// Set the surface material.
    MeshMaterial(Material),
    /// Set the local pose.
    Matrix4(Matrix4),
    /// Upsert an arrow glyph under the target node.
    Arrow3(Arrow3),
}

impl Payload {
    /// Wire discriminant of this variant.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::NullData => TypeTag::NullData,
            Self::Stl(_) => TypeTag::Stl,
            Self::MeshMaterial(_) => TypeTag::MeshMaterial,
            Self::Matrix4(_) => TypeTag::Matrix4,
            Self::Arrow3(_) => TypeTag::Arrow3,
        }
    }

    /// Bytes this payload occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::NullData => 0,
            Self::Stl(key) => key.len(),
            Self::MeshMaterial(_) => MESH_MATERIAL_LEN,
            Self::Matrix4(_) => MATRIX4_LEN,
            Self::Arrow3(arrow) if arrow.trailing_color.is_some() => ARROW3_WITH_COLOR_LEN,
            Self::Arrow3(_) => ARROW3_LEN,
        }
    }

    /// Decodes the payload bytes for `tag`.
    ///
    /// Fixed-size variants ignore bytes past their layout; `NullData`
    /// ignores the payload entirely.
    pub(crate) fn decode(tag: TypeTag, bytes: &[u8]) -> Result<Self, FrameError> {
        let short = |expected| Malformed::ShortPayload {
            tag,
            expected,
            found: bytes.len(),
        };
        let mut r = ByteReader::new(bytes);
        Ok(match tag {
            TypeTag::NullData => Self::NullData,
            TypeTag::Stl => {
                let key = core::str::from_utf8(bytes).map_err(|_| Malformed::InvalidKeyUtf8)?;
                Self::Stl(key.to_owned())
            }
            TypeTag::MeshMaterial => Self::MeshMaterial(
                read_material(&mut r).ok_or_else(|| short(MESH_MATERIAL_LEN))?,
            ),
            TypeTag::Matrix4 => {
                Self::Matrix4(read_matrix(&mut r).ok_or_else(|| short(MATRIX4_LEN))?)
            }
            TypeTag::Arrow3 => {
                let (start, end) = read_endpoints(&mut r).ok_or_else(|| short(ARROW3_LEN))?;
                let trailing_color = match bytes.get(ARROW3_LEN..ARROW3_WITH_COLOR_LEN) {
                    Some(&[red, green, blue]) => Some(Rgb8::new(red, green, blue)),
                    _ => None,
                };
                Self::Arrow3(Arrow3 {
                    start,
                    end,
                    trailing_color,
                })
            }
        })
    }

    pub(crate) fn write_to(&self, w: &mut ByteWriter<'_>) {
        match self {
            Self::NullData => {}
            Self::Stl(key) => w.write_bytes(key.as_bytes()),
            Self::MeshMaterial(m) => {
                w.write_bytes(&[m.color.r, m.color.g, m.color.b]);
                w.write_f64(m.roughness);
                w.write_f64(m.metalness);
            }
            Self::Matrix4(m) => {
                for v in m.rows.iter().flatten() {
                    w.write_f64(*v);
                }
            }
            Self::Arrow3(a) => {
                for v in [a.start, a.end] {
                    w.write_f64(v.x);
                    w.write_f64(v.y);
                    w.write_f64(v.z);
                }
                if let Some(c) = a.trailing_color {
                    w.write_bytes(&[c.r, c.g, c.b]);
                }
            }
        }
    }
}

fn read_material(r: &mut ByteReader<'_>) -> Option<Material> {
    let color = Rgb8::new(r.read_u8()?, r.read_u8()?, r.read_u8()?);
    Some(Material::new(color, r.read_f64()?, r.read_f64()?))
}

fn read_matrix(r: &mut ByteReader<'_>) -> Option<Matrix4> {
    let mut rows = [[0.0; 4]; 4];
    for v in rows.iter_mut().flatten() {
        *v = r.read_f64()?;
    }
    Some(Matrix4 { rows })
}

fn read_vec3(r: &mut ByteReader<'_>) -> Option<Vec3> {
    Some(Vec3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?))
}

fn read_endpoints(r: &mut ByteReader<'_>) -> Option<(Vec3, Vec3)> {
    Some((read_vec3(r)?, read_vec3(r)?))
}

/// A row-major 4×4 matrix as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    /// `rows[r][c]`.
    pub rows: [[f64; 4]; 4],
}

impl Matrix4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self::from_transform(Transform3d::IDENTITY);

    /// Wraps row-major values.
    #[inline]
    #[must_use]
    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Converts a column-major transform to wire order.
    #[must_use]
    pub const fn from_transform(transform: Transform3d) -> Self {
        Self {
            rows: transform.to_rows(),
        }
    }

    /// Converts to a column-major transform.
    #[must_use]
    pub const fn to_transform(self) -> Transform3d {
        Transform3d::from_rows(self.rows)
    }
}

/// An arrow from `start` to `end`.
///
/// The declared color lives at payload bytes 12..15, which overlap the
/// encoding of `start.y`; [`color`](Self::color) reproduces exactly that.
/// Producers actually write the intended color after the endpoints, which is
/// kept as [`trailing_color`](Self::trailing_color).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrow3 {
    /// Tail position.
    pub start: Vec3,
    /// Head position.
    pub end: Vec3,
    trailing_color: Option<Rgb8>,
}

impl Arrow3 {
    /// Creates an arrow whose encoding carries `color` after the endpoints.
    #[must_use]
    pub const fn new(start: Vec3, end: Vec3, color: Rgb8) -> Self {
        Self {
            start,
            end,
            trailing_color: Some(color),
        }
    }

    /// Creates an arrow that encodes to the bare 48-byte layout.
    #[must_use]
    pub const fn without_color(start: Vec3, end: Vec3) -> Self {
        Self {
            start,
            end,
            trailing_color: None,
        }
    }

    /// Color read from the declared offset (payload bytes 12..15).
    #[must_use]
    pub fn color(&self) -> Rgb8 {
        // Bytes 12..15 of the payload are bytes 4..7 of `start.y`.
        let b = self.start.y.to_le_bytes();
        Rgb8::new(b[4], b[5], b[6])
    }

    /// Color bytes following the endpoints, if the payload had them.
    #[inline]
    #[must_use]
    pub const fn trailing_color(&self) -> Option<Rgb8> {
        self.trailing_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, decode};
    use crate::time::Timestamp;

    fn payload_bytes(payload: &Payload) -> Vec<u8> {
        let mut buf = Vec::new();
        payload.write_to(&mut ByteWriter::new(&mut buf));
        buf
    }

    #[test]
    fn material_layout() {
        let payload = Payload::MeshMaterial(Material::new(Rgb8::new(10, 20, 30), 0.5, 0.25));
        let bytes = payload_bytes(&payload);
        assert_eq!(bytes.len(), MESH_MATERIAL_LEN);
        assert_eq!(&bytes[..3], &[10, 20, 30]);
        assert_eq!(&bytes[3..11], &0.5_f64.to_le_bytes());
        assert_eq!(&bytes[11..19], &0.25_f64.to_le_bytes());
        assert_eq!(Payload::decode(TypeTag::MeshMaterial, &bytes), Ok(payload));
    }

    #[test]
    fn matrix_is_row_major() {
        let mut rows = [[0.0; 4]; 4];
        for (i, v) in rows.iter_mut().flatten().enumerate() {
            *v = f64::from(u8::try_from(i).unwrap());
        }
        let bytes = payload_bytes(&Payload::Matrix4(Matrix4::from_rows(rows)));
        assert_eq!(bytes.len(), MATRIX4_LEN);
        // Element (row 0, col 3) is the 4th value.
        assert_eq!(&bytes[24..32], &3.0_f64.to_le_bytes());
        let Ok(Payload::Matrix4(m)) = Payload::decode(TypeTag::Matrix4, &bytes) else {
            panic!("expected a matrix");
        };
        assert_eq!(m.to_transform().col(3)[0], 3.0);
    }

    #[test]
    fn arrow_color_reads_declared_offset() {
        let start = Vec3::new(0.0, 1.5, 0.0);
        let arrow = Arrow3::new(start, Vec3::new(1.0, 1.0, 1.0), Rgb8::new(9, 8, 7));
        let bytes = payload_bytes(&Payload::Arrow3(arrow));
        assert_eq!(bytes.len(), ARROW3_WITH_COLOR_LEN);
        assert_eq!(&bytes[48..51], &[9, 8, 7]);

        let Ok(Payload::Arrow3(decoded)) = Payload::decode(TypeTag::Arrow3, &bytes) else {
            panic!("expected an arrow");
        };
        assert_eq!(decoded.color(), Rgb8::new(bytes[12], bytes[13], bytes[14]));
        assert_eq!(decoded.trailing_color(), Some(Rgb8::new(9, 8, 7)));
        assert_eq!(decoded, arrow);
    }

    #[test]
    fn bare_arrow_has_no_trailing_color() {
        let arrow = Arrow3::without_color(Vec3::ZERO, Vec3::X);
        let bytes = payload_bytes(&Payload::Arrow3(arrow));
        assert_eq!(bytes.len(), ARROW3_LEN);
        let decoded = Payload::decode(TypeTag::Arrow3, &bytes);
        assert_eq!(decoded, Ok(Payload::Arrow3(arrow)));
    }

    #[test]
    fn short_payloads_are_malformed() {
        let cases = [
            (TypeTag::MeshMaterial, MESH_MATERIAL_LEN),
            (TypeTag::Matrix4, MATRIX4_LEN),
            (TypeTag::Arrow3, ARROW3_LEN),
        ];
        for (tag, expected) in cases {
            let bytes = vec![0_u8; expected - 1];
            assert_eq!(
                Payload::decode(tag, &bytes),
                Err(FrameError::MalformedFrame(Malformed::ShortPayload {
                    tag,
                    expected,
                    found: expected - 1,
                })),
            );
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = payload_bytes(&Payload::MeshMaterial(Material::new(
            Rgb8::WHITE,
            1.0,
            0.0,
        )));
        bytes.extend_from_slice(&[0xff; 5]);
        assert!(matches!(
            Payload::decode(TypeTag::MeshMaterial, &bytes),
            Ok(Payload::MeshMaterial(_))
        ));
        assert_eq!(
            Payload::decode(TypeTag::NullData, &[1, 2, 3]),
            Ok(Payload::NullData)
        );
    }

    #[test]
    fn invalid_key_utf8_is_malformed() {
        assert_eq!(
            Payload::decode(TypeTag::Stl, &[0xff, 0xfe]),
            Err(FrameError::MalformedFrame(Malformed::InvalidKeyUtf8))
        );
    }

    #[test]
    fn full_frame_round_trip_for_each_variant() {
        let payloads = [
            Payload::NullData,
            Payload::Stl("meshes/base.stl".into()),
            Payload::MeshMaterial(Material::new(Rgb8::new(1, 2, 3), 0.1, 0.9)),
            Payload::Matrix4(Matrix4::IDENTITY),
            Payload::Arrow3(Arrow3::new(Vec3::X, Vec3::Y, Rgb8::WHITE)),
        ];
        for payload in payloads {
            let frame = Frame::new(Timestamp(1 << 70), "robot/arm", payload);
            let bytes = frame.encode().unwrap();
            assert_eq!(decode(&bytes), Ok(frame));
        }
    }
}
