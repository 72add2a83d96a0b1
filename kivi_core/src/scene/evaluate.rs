// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene evaluation and change tracking.
//!
//! Evaluation drains each dirty channel in turn:
//!
//! 1. **TRANSFORM**: recompute `world_transform` as
//!    `parent_world * pose` for every affected node, parents first.
//! 2. **MATERIAL** / **GEOMETRY** / **VECTOR**: collect the touched nodes.
//!    Presenters read the current values from the store.
//! 3. **TOPOLOGY**: drain and discard (the traversal order was already
//!    rebuilt at the start of evaluation if needed).
//!
//! [`SceneChanges`] uses raw slot indices (`u32`) so presenters can index
//! straight into the store through the `*_at()` accessors (e.g.
//! [`world_transform_at`](super::SceneStore::world_transform_at)).

use super::id::{GeometryId, INVALID};
use super::store::SceneStore;
use crate::dirty;
use crate::transform::Transform3d;

/// The set of changes produced by a single [`SceneStore::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Nodes whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Nodes whose material changed.
    pub materials: Vec<u32>,
    /// Nodes whose geometry handle changed.
    pub geometry: Vec<u32>,
    /// Nodes whose arrow glyph changed.
    pub vectors: Vec<u32>,
    /// Nodes added since the last evaluate.
    pub added: Vec<u32>,
    /// Slots freed since the last evaluate.
    ///
    /// Presenters should process removals before additions, since a freed
    /// slot may already be reused by a node in `added`.
    pub removed: Vec<u32>,
    /// Geometry handles no longer referenced by any node.
    pub released_geometry: Vec<GeometryId>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.materials.clear();
        self.geometry.clear();
        self.vectors.clear();
        self.added.clear();
        self.removed.clear();
        self.released_geometry.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.materials.is_empty()
            && self.geometry.is_empty()
            && self.vectors.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.released_geometry.is_empty()
            && !self.topology_changed
    }
}

impl SceneStore {
    /// Evaluates the scene, recomputing world transforms and returning the
    /// set of changes since the previous call.
    pub fn evaluate(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let dirty_transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_transforms {
            let parent_idx = self.parent[idx as usize];
            let parent_world = if parent_idx == INVALID {
                Transform3d::IDENTITY
            } else {
                self.world_transform[parent_idx as usize]
            };
            self.world_transform[idx as usize] =
                parent_world * self.pose[idx as usize].to_transform();
        }
        changes.transforms = dirty_transforms;

        changes.materials = self
            .dirty
            .drain(dirty::MATERIAL)
            .deterministic()
            .run()
            .collect();
        changes.geometry = self
            .dirty
            .drain(dirty::GEOMETRY)
            .deterministic()
            .run()
            .collect();
        changes.vectors = self
            .dirty
            .drain(dirty::VECTOR)
            .deterministic()
            .run()
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        core::mem::swap(&mut self.pending_released, &mut changes.released_geometry);
    }

    /// Returns the current traversal order (depth-first pre-order from the
    /// root).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            self.traversal_order.push(idx);
            let first = stack.len();
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            stack[first..].reverse();
        }
    }
}
