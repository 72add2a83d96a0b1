// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame timestamps and durations.
//!
//! [`Timestamp`] is the producer's timeline position in nanoseconds. On the
//! wire it is a 128-bit little-endian integer written as two `u64` halves
//! (low half first), which is why it carries [`from_halves`](Timestamp::from_halves)
//! and [`low`](Timestamp::low)/[`high`](Timestamp::high) accessors.
//!
//! [`Duration`] is the distance between two timestamps, in the same units.

use core::fmt;
use core::ops::{Add, Sub};

/// A point on a producer's timeline, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u128);

impl Timestamp {
    /// The start of the timeline.
    pub const ZERO: Self = Self(0);

    /// Combines the two little-endian wire halves into one timestamp.
    #[inline]
    #[must_use]
    pub const fn from_halves(low: u64, high: u64) -> Self {
        Self(((high as u128) << 64) | low as u128)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u128 {
        self.0
    }

    /// Returns the low 64 bits (first on the wire).
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "keeping only the low half is the point"
    )]
    pub const fn low(self) -> u64 {
        self.0 as u64
    }

    /// Returns the high 64 bits (second on the wire).
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the shifted value always fits in 64 bits"
    )]
    pub const fn high(self) -> u64 {
        (self.0 >> 64) as u64
    }

    /// Returns the duration between `self` and an earlier timestamp, or zero
    /// if `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ns)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// A span of timeline time, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u128);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u128 {
        self.0
    }

    /// Returns the duration in seconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "seconds are for display; sub-nanosecond precision is not needed"
    )]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1e9
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}ns)", self.0)
    }
}
