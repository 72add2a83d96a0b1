// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node visual state: pose, surface material, and vector glyphs.

use core::fmt;

use crate::transform::{Quat, Transform3d, Vec3};

/// An 8-bit-per-channel RGB color.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb8 {
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a color from its channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color as `0xRRGGBB`.
    #[inline]
    #[must_use]
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl fmt::Debug for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgb8(#{:06x})", self.to_hex())
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

/// Physically based surface parameters for a mesh node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Base color.
    pub color: Rgb8,
    /// Roughness, nominally in `0.0..=1.0`.
    pub roughness: f64,
    /// Metalness, nominally in `0.0..=1.0`.
    pub metalness: f64,
}

impl Material {
    /// Creates a material.
    #[inline]
    #[must_use]
    pub const fn new(color: Rgb8, roughness: f64, metalness: f64) -> Self {
        Self {
            color,
            roughness,
            metalness,
        }
    }
}

/// A node's local placement relative to its parent.
///
/// Only translation and orientation are kept; scale and shear from incoming
/// matrices are dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    /// Offset from the parent origin.
    pub translation: Vec3,
    /// Orientation relative to the parent.
    pub rotation: Quat,
}

impl Pose {
    /// No offset, no rotation.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a pose.
    #[inline]
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Keeps the translation and orientation of `transform`.
    #[must_use]
    pub fn from_transform(transform: Transform3d) -> Self {
        let (translation, rotation) = transform.decompose();
        Self {
            translation,
            rotation,
        }
    }

    /// Returns the equivalent rigid transform.
    #[must_use]
    pub fn to_transform(self) -> Transform3d {
        Transform3d::from_translation_rotation(self.translation, self.rotation)
    }
}

/// An arrow glyph anchored at a node.
///
/// `direction` is always unit length. A zero-length arrow points along +Z
/// with `length == 0.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalVector {
    /// Tail position.
    pub origin: Vec3,
    /// Unit direction from tail to head.
    pub direction: Vec3,
    /// Distance from tail to head.
    pub length: f64,
    /// Glyph color.
    pub color: Rgb8,
}

impl DirectionalVector {
    /// Builds the glyph spanning `start` to `end`.
    #[must_use]
    pub fn from_endpoints(start: Vec3, end: Vec3, color: Rgb8) -> Self {
        let delta = end - start;
        let (direction, length) = match delta.try_normalize() {
            Some(direction) => (direction, delta.length()),
            None => (Vec3::Z, 0.0),
        };
        Self {
            origin: start,
            direction,
            length,
            color,
        }
    }

    /// Returns the head position.
    #[must_use]
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.length
    }
}
