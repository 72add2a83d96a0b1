// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays scene storage with named children, generational handles,
//! and dirty-marking property setters.

use hashbrown::HashMap;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{GeometryId, INVALID, NodeId};
use super::traverse::Children;
use super::visual::{DirectionalVector, Material, Pose};
use crate::dirty;
use crate::transform::Transform3d;

/// Struct-of-arrays storage for a single rooted scene tree.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; removed nodes are recycled through a free list and their
/// generation is bumped so old handles stop validating.
///
/// Every node except the root has a name that is unique among its siblings.
/// Children are kept both as an ordered sibling list (for stable iteration)
/// and in a per-parent name index (for path resolution).
#[derive(Debug)]
pub struct SceneStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) name: Vec<Box<str>>,
    pub(crate) child_index: Vec<HashMap<Box<str>, u32>>,

    // -- Local properties (set by callers) --
    pub(crate) pose: Vec<Pose>,
    pub(crate) material: Vec<Option<Material>>,
    pub(crate) geometry: Vec<Option<GeometryId>>,
    pub(crate) vector: Vec<Option<DirectionalVector>>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_transform: Vec<Transform3d>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) root: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
    pub(crate) pending_released: Vec<GeometryId>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// Creates a scene containing only the unnamed root node.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            name: Vec::new(),
            child_index: Vec::new(),
            pose: Vec::new(),
            material: Vec::new(),
            geometry: Vec::new(),
            vector: Vec::new(),
            world_transform: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_released: Vec::new(),
        };
        store.root = store.alloc_slot("");
        store.dirty.mark_with(store.root, dirty::TRANSFORM, &EagerPolicy);
        store
    }

    /// Returns the root node. The root is never removed.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId {
            idx: self.root,
            generation: self.generation[self.root as usize],
        }
    }

    /// Returns the number of live nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    // -- Topology API --

    /// Creates a new node named `name` as the last child of `parent`.
    ///
    /// The node starts with an identity pose and no material, geometry, or
    /// arrow glyph.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale or already has a child called `name`.
    pub fn create_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.validate(parent);
        let p = parent.idx;
        assert!(
            !self.child_index[p as usize].contains_key(name),
            "{parent:?} already has a child named `{name}`"
        );

        let c = self.alloc_slot(name);
        self.parent[c as usize] = p;
        let last = self.last_child[p as usize];
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
        self.last_child[p as usize] = c;
        self.child_index[p as usize].insert(name.into(), c);

        // Child depends on parent for TRANSFORM.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark(p, dirty::TOPOLOGY);

        NodeId {
            idx: c,
            generation: self.generation[c as usize],
        }
    }

    /// Looks up the child of `parent` called `name`.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.validate(parent);
        self.child_index[parent.idx as usize]
            .get(name)
            .map(|&idx| NodeId {
                idx,
                generation: self.generation[idx as usize],
            })
    }

    /// Returns the child of `parent` called `name`, creating it if needed.
    pub fn ensure_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.find_child(parent, name) {
            Some(id) => id,
            None => self.create_child(parent, name),
        }
    }

    /// Detaches `id` from its parent and frees it together with every
    /// descendant. Returns the number of nodes freed.
    ///
    /// Geometry held by the freed nodes is reported in the next
    /// [`SceneChanges::released_geometry`](super::SceneChanges::released_geometry).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or refers to the root.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        self.validate(id);
        assert!(id.idx != self.root, "cannot remove the scene root");

        let idx = id.idx;
        let p = self.parent[idx as usize];
        self.unlink_from_parent(idx);
        self.dirty.mark(p, dirty::TOPOLOGY);

        let mut stack = vec![idx];
        let mut freed = 0;
        while let Some(i) = stack.pop() {
            let mut child = self.first_child[i as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            self.free_slot(i);
            freed += 1;
        }
        freed
    }

    /// Removes every child subtree of `id`, keeping `id` itself. Returns the
    /// number of nodes freed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn clear_children(&mut self, id: NodeId) -> usize {
        let children: Vec<NodeId> = self.children(id).collect();
        children
            .into_iter()
            .map(|child| self.remove_subtree(child))
            .sum()
    }

    /// Returns the parent of a node; `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| NodeId {
            idx: p,
            generation: self.generation[p as usize],
        })
    }

    /// Returns an iterator over the direct children of a node, in creation
    /// order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children of a node.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.child_index[id.idx as usize].len()
    }

    /// Returns the node's name. The root's name is empty.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        self.validate(id);
        &self.name[id.idx as usize]
    }

    /// Returns the names from just below the root down to `id`.
    #[must_use]
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        self.validate(id);
        let mut segments = Vec::new();
        let mut idx = id.idx;
        while idx != self.root {
            segments.push(&*self.name[idx as usize]);
            idx = self.parent[idx as usize];
        }
        segments.reverse();
        segments
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local pose of a node.
    #[must_use]
    pub fn pose(&self, id: NodeId) -> Pose {
        self.validate(id);
        self.pose[id.idx as usize]
    }

    /// Returns the material of a node.
    #[must_use]
    pub fn material(&self, id: NodeId) -> Option<Material> {
        self.validate(id);
        self.material[id.idx as usize]
    }

    /// Returns the geometry shown by a node.
    #[must_use]
    pub fn geometry(&self, id: NodeId) -> Option<GeometryId> {
        self.validate(id);
        self.geometry[id.idx as usize]
    }

    /// Returns the arrow glyph of a node.
    #[must_use]
    pub fn vector(&self, id: NodeId) -> Option<DirectionalVector> {
        self.validate(id);
        self.vector[id.idx as usize]
    }

    /// Returns the computed world transform of a node.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Transform3d {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local pose of a node.
    ///
    /// Marks the TRANSFORM channel dirty with eager propagation to descendants.
    pub fn set_pose(&mut self, id: NodeId, pose: Pose) {
        self.validate(id);
        self.pose[id.idx as usize] = pose;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the surface material of a node.
    pub fn set_material(&mut self, id: NodeId, material: Option<Material>) {
        self.validate(id);
        self.material[id.idx as usize] = material;
        self.dirty.mark(id.idx, dirty::MATERIAL);
    }

    /// Sets the geometry shown by a node and returns the previous one.
    ///
    /// A replaced geometry handle is queued for release.
    pub fn set_geometry(
        &mut self,
        id: NodeId,
        geometry: Option<GeometryId>,
    ) -> Option<GeometryId> {
        self.validate(id);
        let previous = core::mem::replace(&mut self.geometry[id.idx as usize], geometry);
        if let Some(old) = previous
            && previous != geometry
        {
            self.pending_released.push(old);
        }
        self.dirty.mark(id.idx, dirty::GEOMETRY);
        previous
    }

    /// Sets the arrow glyph of a node.
    pub fn set_vector(&mut self, id: NodeId, vector: Option<DirectionalVector>) {
        self.validate(id);
        self.vector[id.idx as usize] = vector;
        self.dirty.mark(id.idx, dirty::VECTOR);
    }

    /// Queues a geometry handle that no node references for release.
    pub fn release_geometry(&mut self, geometry: GeometryId) {
        self.pending_released.push(geometry);
    }

    // -- Raw-index accessors for presenters --
    //
    // These accept raw slot indices (as found in `SceneChanges`) rather than
    // `NodeId` handles, skipping generation validation. Only use with indices
    // that came from `SceneChanges` or `traversal_order()`.

    /// Returns the name at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn name_at(&self, idx: u32) -> &str {
        self.check_slot(idx);
        &self.name[idx as usize]
    }

    /// Returns the parent slot of raw slot `idx`, `None` for the root or a
    /// freed slot.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn parent_at(&self, idx: u32) -> Option<u32> {
        self.check_slot(idx);
        let p = self.parent[idx as usize];
        (p != INVALID).then_some(p)
    }

    /// Returns the local pose at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn pose_at(&self, idx: u32) -> Pose {
        self.check_slot(idx);
        self.pose[idx as usize]
    }

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Transform3d {
        self.check_slot(idx);
        self.world_transform[idx as usize]
    }

    /// Returns the material at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn material_at(&self, idx: u32) -> Option<Material> {
        self.check_slot(idx);
        self.material[idx as usize]
    }

    /// Returns the geometry at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn geometry_at(&self, idx: u32) -> Option<GeometryId> {
        self.check_slot(idx);
        self.geometry[idx as usize]
    }

    /// Returns the arrow glyph at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn vector_at(&self, idx: u32) -> Option<DirectionalVector> {
        self.check_slot(idx);
        self.vector[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn check_slot(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    /// Takes a slot from the free list or grows the arrays. The slot is left
    /// unattached.
    fn alloc_slot(&mut self, name: &str) -> u32 {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.name[i] = name.into();
            self.pose[i] = Pose::IDENTITY;
            self.world_transform[i] = Transform3d::IDENTITY;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.name.push(name.into());
            self.child_index.push(HashMap::new());
            self.pose.push(Pose::IDENTITY);
            self.material.push(None);
            self.geometry.push(None);
            self.vector.push(None);
            self.world_transform.push(Transform3d::IDENTITY);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        idx
    }

    /// Frees a slot whose subtree is being torn down. Sibling and child links
    /// inside the doomed subtree are not maintained.
    fn free_slot(&mut self, idx: u32) {
        let i = idx as usize;
        self.dirty.remove_key(idx);
        if let Some(geometry) = self.geometry[i].take() {
            self.pending_released.push(geometry);
        }
        self.material[i] = None;
        self.vector[i] = None;
        self.child_index[i].clear();
        self.name[i] = "".into();
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.last_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;

        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.free_list.push(idx);

        // A node created and removed within one evaluation window was never
        // presented.
        if let Some(pos) = self.pending_added.iter().position(|&a| a == idx) {
            self.pending_added.swap_remove(pos);
        }
        self.pending_removed.push(idx);
        self.traversal_dirty = true;
    }

    /// Removes `idx` from its parent's child list and name index without
    /// touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i] as usize;
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev == INVALID {
            self.first_child[p] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }
        self.child_index[p].remove(&*self.name[i]);

        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Rgb8;
    use crate::transform::{Quat, Vec3};

    #[test]
    fn new_store_has_only_root() {
        let store = SceneStore::new();
        let root = store.root();
        assert!(store.is_alive(root));
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.name(root), "");
        assert_eq!(store.parent(root), None);
        assert!(store.children(root).next().is_none());
    }

    #[test]
    fn create_and_find_child() {
        let mut store = SceneStore::new();
        let root = store.root();
        let arm = store.create_child(root, "arm");
        let leg = store.create_child(root, "leg");

        assert_eq!(store.find_child(root, "arm"), Some(arm));
        assert_eq!(store.find_child(root, "leg"), Some(leg));
        assert_eq!(store.find_child(root, "head"), None);
        assert_eq!(store.parent(arm), Some(root));
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![arm, leg]);
        assert_eq!(store.child_count(root), 2);
    }

    #[test]
    fn ensure_child_reuses_existing() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.ensure_child(root, "a");
        let again = store.ensure_child(root, "a");
        assert_eq!(a, again);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    #[should_panic(expected = "already has a child named `a`")]
    fn duplicate_name_panics() {
        let mut store = SceneStore::new();
        let root = store.root();
        store.create_child(root, "a");
        store.create_child(root, "a");
    }

    #[test]
    fn same_name_under_different_parents() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.create_child(root, "a");
        let b = store.create_child(root, "b");
        let ax = store.create_child(a, "x");
        let bx = store.create_child(b, "x");
        assert_ne!(ax, bx);
        assert_eq!(store.path(bx), vec!["b", "x"]);
    }

    #[test]
    fn remove_subtree_frees_descendants() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.create_child(root, "a");
        let b = store.create_child(a, "b");
        let c = store.create_child(b, "c");
        let keep = store.create_child(root, "keep");

        assert_eq!(store.remove_subtree(a), 3);
        assert!(!store.is_alive(a));
        assert!(!store.is_alive(b));
        assert!(!store.is_alive(c));
        assert!(store.is_alive(keep));
        assert_eq!(store.find_child(root, "a"), None);
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![keep]);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn remove_middle_sibling_keeps_order() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.create_child(root, "a");
        let b = store.create_child(root, "b");
        let c = store.create_child(root, "c");
        store.remove_subtree(b);
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![a, c]);
        let d = store.create_child(root, "d");
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![a, c, d]);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = SceneStore::new();
        let root = store.root();
        let first = store.create_child(root, "a");
        store.remove_subtree(first);
        let second = store.create_child(root, "a");
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(!store.is_alive(first));
        assert!(store.is_alive(second));
    }

    #[test]
    fn clear_children_keeps_node() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.create_child(root, "a");
        store.create_child(a, "x");
        store.create_child(root, "b");
        assert_eq!(store.clear_children(root), 3);
        assert!(store.is_alive(root));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot remove the scene root")]
    fn removing_root_panics() {
        let mut store = SceneStore::new();
        let root = store.root();
        store.remove_subtree(root);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn removed_handle_panics_on_set_pose() {
        let mut store = SceneStore::new();
        let root = store.root();
        let id = store.create_child(root, "a");
        store.remove_subtree(id);
        store.set_pose(id, Pose::IDENTITY);
    }

    #[test]
    fn setters_store_values() {
        let mut store = SceneStore::new();
        let root = store.root();
        let id = store.create_child(root, "a");

        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.5));
        let material = Material::new(Rgb8::new(1, 2, 3), 0.25, 0.75);
        let vector = DirectionalVector::from_endpoints(Vec3::ZERO, Vec3::X, Rgb8::WHITE);
        store.set_pose(id, pose);
        store.set_material(id, Some(material));
        store.set_vector(id, Some(vector));
        assert_eq!(store.set_geometry(id, Some(GeometryId(9))), None);

        assert_eq!(store.pose(id), pose);
        assert_eq!(store.material(id), Some(material));
        assert_eq!(store.vector(id), Some(vector));
        assert_eq!(store.geometry(id), Some(GeometryId(9)));
    }

    #[test]
    fn replacing_geometry_queues_release() {
        let mut store = SceneStore::new();
        let root = store.root();
        let id = store.create_child(root, "a");
        store.set_geometry(id, Some(GeometryId(1)));
        assert_eq!(store.set_geometry(id, Some(GeometryId(2))), Some(GeometryId(1)));
        // Re-setting the same handle releases nothing.
        store.set_geometry(id, Some(GeometryId(2)));
        assert_eq!(store.pending_released, vec![GeometryId(1)]);
    }

    #[test]
    fn removal_releases_geometry() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.create_child(root, "a");
        let b = store.create_child(a, "b");
        store.set_geometry(a, Some(GeometryId(1)));
        store.set_geometry(b, Some(GeometryId(2)));
        store.remove_subtree(a);
        let mut released = store.pending_released.clone();
        released.sort_by_key(|g| g.0);
        assert_eq!(released, vec![GeometryId(1), GeometryId(2)]);
    }

    #[test]
    fn reused_slot_starts_clean() {
        let mut store = SceneStore::new();
        let root = store.root();
        let a = store.create_child(root, "a");
        store.set_material(a, Some(Material::new(Rgb8::WHITE, 0.0, 0.0)));
        store.create_child(a, "inner");
        store.remove_subtree(a);

        let b = store.create_child(root, "b");
        assert_eq!(store.material(b), None);
        assert_eq!(store.geometry(b), None);
        assert_eq!(store.pose(b), Pose::IDENTITY);
        assert_eq!(store.child_count(b), 0);
        assert_eq!(store.name(b), "b");
    }
}
