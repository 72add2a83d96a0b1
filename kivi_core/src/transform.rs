// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 3-D math: vectors, unit quaternions, and a column-major 4×4 transform.
//!
//! Vectors and quaternions are `glam`'s double-precision types. [`Transform3d`]
//! keeps a plain column array so that wire matrices can be imported in `const`
//! contexts, and converts to [`DMat4`] for composition and decomposition.

use core::ops::Mul;

use glam::DMat4;
use tracing::debug;

/// A 3-component vector.
pub type Vec3 = glam::DVec3;

/// A rotation stored as a unit quaternion `(x, y, z, w)`.
pub type Quat = glam::DQuat;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix. Wire matrices arrive
/// row-major; use [`from_rows`](Self::from_rows) for those.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Creates a transform from a row-major 2-D array (`rows[r][c]`).
    #[must_use]
    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut cols = [[0.0_f64; 4]; 4];
        let mut c = 0;
        while c < 4 {
            let mut r = 0;
            while r < 4 {
                cols[c][r] = rows[r][c];
                r += 1;
            }
            c += 1;
        }
        Self { cols }
    }

    /// Returns the matrix as a row-major 2-D array.
    #[must_use]
    pub const fn to_rows(self) -> [[f64; 4]; 4] {
        // Transposition is its own inverse.
        Self::from_rows(self.cols).cols
    }

    /// Wraps a `glam` matrix.
    #[inline]
    #[must_use]
    pub fn from_mat4(m: DMat4) -> Self {
        Self {
            cols: m.to_cols_array_2d(),
        }
    }

    /// Converts to a `glam` matrix.
    #[inline]
    #[must_use]
    pub fn to_mat4(self) -> DMat4 {
        DMat4::from_cols_array_2d(&self.cols)
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        Self::from_mat4(DMat4::from_rotation_z(radians))
    }

    /// Creates a pure rotation from a unit quaternion.
    #[inline]
    #[must_use]
    pub fn from_rotation(q: Quat) -> Self {
        Self::from_mat4(DMat4::from_quat(q))
    }

    /// Rotation followed by translation (`T * R`).
    #[inline]
    #[must_use]
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self::from_mat4(DMat4::from_rotation_translation(rotation, translation))
    }

    /// Returns the translation column.
    #[inline]
    #[must_use]
    pub const fn translation(self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    /// Splits the transform into translation and orientation.
    ///
    /// Scale is divided out of the basis columns and discarded. Shear and
    /// projective terms are not representable and are lost. A mirrored basis
    /// (negative determinant) is folded into a negative X scale, so the
    /// reflection is dropped and only the remaining rotation is kept; this is
    /// logged at debug level. A degenerate basis yields the identity rotation.
    #[must_use]
    pub fn decompose(self) -> (Vec3, Quat) {
        let m = self.to_mat4();
        let det = m.determinant();
        if det < 0.0 {
            debug!(det, "mirrored transform decomposed; reflection dropped");
        }
        let (_scale, rotation, translation) = m.to_scale_rotation_translation();
        let rotation = if rotation.is_finite() {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        (translation, rotation)
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::from_mat4(self.to_mat4() * rhs.to_mat4())
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < EPS, "{a:?} != {b:?}");
    }

    // Either sign of the quaternion is the same rotation.
    fn assert_rotation_close(a: Quat, b: Quat) {
        assert!((a.dot(b).abs() - 1.0).abs() < EPS, "{a:?} != {b:?}");
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            assert_vec_close(a * axis, b * axis);
        }
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn translation_composition() {
        let a = Transform3d::from_translation(1.0, 0.0, 0.0);
        let b = Transform3d::from_translation(0.0, 2.0, 0.0);
        assert_eq!((a * b).col(3), [1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn rows_are_transposed_into_columns() {
        let rows = [
            [1.0, 0.0, 0.0, 7.0],
            [0.0, 1.0, 0.0, 8.0],
            [0.0, 0.0, 1.0, 9.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let t = Transform3d::from_rows(rows);
        assert_eq!(t, Transform3d::from_translation(7.0, 8.0, 9.0));
        assert_eq!(t.to_rows(), rows);
    }

    #[test]
    fn decompose_discards_scale() {
        let r = Transform3d::from_rotation_z(FRAC_PI_2);
        let t = Transform3d::from_translation(1.0, 2.0, 3.0) * r * Transform3d::from_scale(4.0, 5.0, 6.0);
        let (translation, rotation) = t.decompose();
        assert_vec_close(translation, Vec3::new(1.0, 2.0, 3.0));
        assert_rotation_close(rotation, Quat::from_rotation_z(FRAC_PI_2));
    }

    #[test]
    fn decompose_rotation_about_x() {
        let q = Quat::from_rotation_x(0.7);
        let t = Transform3d::from_translation_rotation(Vec3::new(-1.0, 4.0, 0.5), q)
            * Transform3d::from_scale(2.0, 2.0, 2.0);
        let (translation, rotation) = t.decompose();
        assert_vec_close(translation, Vec3::new(-1.0, 4.0, 0.5));
        assert_rotation_close(rotation, q);
    }

    #[test]
    fn decompose_rotation_about_y() {
        // Past a half turn, so w is small and the off-diagonal terms dominate.
        let q = Quat::from_rotation_y(2.8);
        let t = Transform3d::from_translation_rotation(Vec3::new(0.0, -3.0, 9.0), q)
            * Transform3d::from_scale(0.5, 3.0, 1.5);
        let (translation, rotation) = t.decompose();
        assert_vec_close(translation, Vec3::new(0.0, -3.0, 9.0));
        assert_rotation_close(rotation, q);
    }

    #[test]
    fn decompose_arbitrary_axis() {
        let axis = Vec3::new(1.0, 2.0, 3.0).normalize();
        for angle in [0.0, 0.3, FRAC_PI_2, 3.0, -2.5] {
            let q = Quat::from_axis_angle(axis, angle);
            let (_, back) = Transform3d::from_rotation(q).decompose();
            assert_rotation_close(back, q);
        }
    }

    #[test]
    fn decompose_mirror_keeps_rotation_only() {
        let (_, rotation) = Transform3d::from_scale(-1.0, 1.0, 1.0).decompose();
        assert_rotation_close(rotation, Quat::IDENTITY);

        let mirrored = Transform3d::from_rotation_z(0.4) * Transform3d::from_scale(1.0, 1.0, -2.0);
        let (_, rotation) = mirrored.decompose();
        assert!(rotation.is_finite(), "{rotation:?}");
        assert!((rotation.length() - 1.0).abs() < EPS, "{rotation:?}");
    }

    #[test]
    fn degenerate_basis_decomposes_to_identity() {
        let t = Transform3d::from_translation(1.0, 0.0, 0.0) * Transform3d::from_scale(0.0, 1.0, 1.0);
        let (translation, rotation) = t.decompose();
        assert_eq!(translation, Vec3::X);
        assert_eq!(rotation, Quat::IDENTITY);
    }

    #[test]
    fn rotate_vector() {
        let q = Quat::from_rotation_z(FRAC_PI_2);
        assert_vec_close(q * Vec3::X, Vec3::Y);
    }

    #[test]
    fn compose_translation_rotation() {
        let q = Quat::from_rotation_z(FRAC_PI_2);
        let t = Transform3d::from_translation_rotation(Vec3::new(1.0, 0.0, 0.0), q);
        let expected = Transform3d::from_translation(1.0, 0.0, 0.0) * Transform3d::from_rotation(q);
        for (a, b) in t.cols.iter().flatten().zip(expected.cols.iter().flatten()) {
            assert!((a - b).abs() < EPS, "{t:?} != {expected:?}");
        }
    }

    #[test]
    fn normalize_rejects_zero() {
        assert_eq!(Vec3::ZERO.try_normalize(), None);
        assert_vec_close(
            Vec3::new(0.0, 3.0, 4.0).try_normalize().unwrap(),
            Vec3::new(0.0, 0.6, 0.8),
        );
    }

    #[test]
    fn nan_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(Transform3d::IDENTITY.is_finite());
    }
}
