// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The scene uses multi-channel dirty tracking (via [`understory_dirty`]) so
//! that a frame touching one node only costs work for that node and, for
//! inherited state, its descendants.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent. A pose change on a node marks every descendant,
//!   because world transforms are inherited.
//! - **Local-only**: [`MATERIAL`], [`GEOMETRY`], and [`VECTOR`] mark just the
//!   node whose property changed.
//! - **Structural**: [`TOPOLOGY`] is marked on node creation and removal and
//!   triggers a traversal-order rebuild during evaluation.
//!
//! # Consumption
//!
//! [`SceneStore::evaluate`](crate::scene::SceneStore::evaluate) drains every
//! channel and reports the result as
//! [`SceneChanges`](crate::scene::SceneChanges), which a
//! [`Presenter`](crate::backend::Presenter) applies to the renderer.

use understory_dirty::Channel;

/// Local pose changed; world transforms of the node and its descendants need
/// recomputing.
pub const TRANSFORM: Channel = Channel::new(0);

/// Surface material changed.
pub const MATERIAL: Channel = Channel::new(1);

/// Attached geometry changed.
pub const GEOMETRY: Channel = Channel::new(2);

/// Arrow glyph changed.
pub const VECTOR: Channel = Channel::new(3);

/// Tree topology changed; triggers traversal order rebuild.
pub const TOPOLOGY: Channel = Channel::new(4);
