// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! A *node* is an element of the single rooted scene tree that frames patch.
//! Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is removed, so late asynchronous results can be recognized and
//!   dropped.
//! - A name, unique among its siblings. A frame path such as `robot/arm/tip`
//!   names a chain of nodes below the root.
//! - **Local properties** set by the patch engine: [`pose`](SceneStore::set_pose),
//!   [`material`](SceneStore::set_material),
//!   [`geometry`](SceneStore::set_geometry), and an arrow
//!   [`vector`](SceneStore::set_vector) glyph.
//! - A **computed** `world_transform` produced by
//!   [`evaluate`](SceneStore::evaluate).
//!
//! # Dirty tracking
//!
//! Setters mark the matching [`dirty`](crate::dirty) channel. Pose changes
//! propagate to descendants; the other visual channels stay local; creation
//! and removal mark TOPOLOGY.

mod evaluate;
mod id;
mod store;
mod traverse;
mod visual;

pub use evaluate::SceneChanges;
pub use id::{GeometryId, INVALID, NodeId};
pub use store::SceneStore;
pub use traverse::Children;
pub use visual::{DirectionalVector, Material, Pose, Rgb8};
