// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying frames to the scene.
//!
//! The [`PatchEngine`] owns a [`SceneStore`] and an [`AssetFetcher`]. Each
//! [`Frame`] is applied in full before the next one: its path is resolved
//! from the root, creating any missing nodes on the way, and the payload is
//! dispatched to the resolved node.
//!
//! | Payload          | Effect on the resolved node                              |
//! |------------------|----------------------------------------------------------|
//! | `NullData`       | Node and its subtree are removed.                        |
//! | `Stl`            | A geometry load is issued; the node updates on landing.  |
//! | `MeshMaterial`   | Material is replaced as a unit.                          |
//! | `Matrix4`        | Local pose is set to the matrix's translation/rotation.  |
//! | `Arrow3`         | The [`VECTOR_NODE_NAME`] child is created or updated.    |
//!
//! Geometry loads finish out of band. Their results wait in a channel until
//! [`PatchEngine::pump_completions`] or [`PatchEngine::wait_completion`]
//! lands them; a result is discarded if its node was removed or re-targeted
//! by a newer `Stl` frame in the meantime.

use tracing::{debug, trace, warn};

use crate::assets::{AssetFetcher, FetchCompletion, FetchError, FetchQueue, FetchTicket};
use crate::backend::Presenter;
use crate::clip::Clip;
use crate::error::FrameError;
use crate::frame::{self, Frame, FramePath, Payload};
use crate::scene::{DirectionalVector, GeometryId, NodeId, Pose, SceneChanges, SceneStore};
use crate::time::Timestamp;

/// Name of the auxiliary child that carries a node's arrow glyph.
///
/// Contains a `/`, so no decoded path segment can collide with it.
pub const VECTOR_NODE_NAME: &str = "/arrow3";

/// What to do with a frame whose path has no segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EmptyPathPolicy {
    /// Drop the frame.
    #[default]
    Ignore,
    /// Apply the payload to the scene root. A `NullData` frame clears the
    /// root's children; the root itself is never removed.
    Root,
}

/// Configuration for the [`PatchEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchConfig {
    /// Handling of empty-path frames.
    pub empty_path: EmptyPathPolicy,
    /// When set, a new `Stl` frame cancels any geometry request still
    /// outstanding for the same node, so only the newest one can land.
    pub latest_geometry_wins: bool,
}

impl PatchConfig {
    /// Default configuration: ignore empty paths, newest geometry wins.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            empty_path: EmptyPathPolicy::Ignore,
            latest_geometry_wins: true,
        }
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of applying one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The frame had an empty path and was dropped.
    Ignored,
    /// `node` was removed together with `removed - 1` descendants. For the
    /// root only its children go, and `node` stays alive.
    Removed {
        /// The resolved node.
        node: NodeId,
        /// Number of nodes freed.
        removed: usize,
    },
    /// A property of `node` was set. For `Arrow3` frames this is the glyph
    /// child, not the addressed node.
    Updated {
        /// The node that changed.
        node: NodeId,
    },
    /// A geometry load was handed to the fetcher.
    GeometryRequested {
        /// The resolved node.
        node: NodeId,
        /// Ticket of the new request.
        ticket: FetchTicket,
    },
}

/// Result of landing one geometry completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The node's geometry was replaced.
    Applied {
        /// The node that received the geometry.
        node: NodeId,
        /// The new geometry.
        geometry: GeometryId,
    },
    /// The node is gone or a newer request superseded this one. Any geometry
    /// carried by the completion is queued for release.
    Stale {
        /// The discarded request.
        ticket: FetchTicket,
    },
    /// The load failed; the node keeps its previous geometry.
    Failed {
        /// The failed request.
        ticket: FetchTicket,
        /// Why it failed.
        error: FetchError,
    },
}

/// Applies frames to a scene it owns.
///
/// Dropping the engine cancels every outstanding geometry request.
#[derive(Debug)]
pub struct PatchEngine<F> {
    scene: SceneStore,
    fetcher: F,
    config: PatchConfig,
    queue: FetchQueue,
    changes: SceneChanges,
}

impl<F: AssetFetcher> PatchEngine<F> {
    /// Creates an engine over an empty scene with the default configuration.
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, PatchConfig::new())
    }

    /// Creates an engine over an empty scene.
    pub fn with_config(fetcher: F, config: PatchConfig) -> Self {
        Self::with_scene(SceneStore::new(), fetcher, config)
    }

    /// Creates an engine that patches an existing scene.
    pub fn with_scene(scene: SceneStore, fetcher: F, config: PatchConfig) -> Self {
        Self {
            scene,
            fetcher,
            config,
            queue: FetchQueue::new(),
            changes: SceneChanges::default(),
        }
    }

    /// The scene being patched.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    /// The scene being patched, mutably.
    ///
    /// Nodes removed through this handle still have their outstanding
    /// geometry requests discarded when they complete.
    #[inline]
    pub fn scene_mut(&mut self) -> &mut SceneStore {
        &mut self.scene
    }

    /// The asset fetcher.
    #[inline]
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The asset fetcher, mutably.
    #[inline]
    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// The active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> PatchConfig {
        self.config
    }

    /// Decodes `bytes` and applies the frame.
    ///
    /// # Errors
    ///
    /// Returns the decode error. Nothing in the scene changes in that case,
    /// not even the nodes along the path.
    pub fn apply_bytes(&mut self, bytes: &[u8]) -> Result<ApplyOutcome, FrameError> {
        let frame = frame::decode(bytes)?;
        Ok(self.apply(&frame))
    }

    /// Applies one decoded frame. Path resolution never fails.
    #[tracing::instrument(level = "trace", skip_all, fields(path = %frame.path()))]
    pub fn apply(&mut self, frame: &Frame) -> ApplyOutcome {
        let Some(node) = self.resolve(frame.path()) else {
            return ApplyOutcome::Ignored;
        };

        match frame.payload() {
            Payload::NullData => {
                let removed = if node == self.scene.root() {
                    self.scene.clear_children(node)
                } else {
                    self.scene.remove_subtree(node)
                };
                let scene = &self.scene;
                let cancelled = self.queue.cancel_where(|t| !scene.is_alive(t.node()));
                debug!(removed, cancelled, "removed subtree");
                ApplyOutcome::Removed { node, removed }
            }
            Payload::Stl(key) => {
                if self.config.latest_geometry_wins {
                    let superseded = self.queue.cancel_where(|t| t.node() == node);
                    if superseded > 0 {
                        debug!(superseded, key = key.as_str(), "superseding geometry request");
                    }
                }
                let request = self.queue.issue(node, key);
                let ticket = request.ticket();
                self.fetcher.fetch_geometry(request);
                ApplyOutcome::GeometryRequested { node, ticket }
            }
            Payload::MeshMaterial(material) => {
                self.scene.set_material(node, Some(*material));
                ApplyOutcome::Updated { node }
            }
            Payload::Matrix4(matrix) => {
                self.scene
                    .set_pose(node, Pose::from_transform(matrix.to_transform()));
                ApplyOutcome::Updated { node }
            }
            Payload::Arrow3(arrow) => {
                let color = arrow.color();
                if let Some(trailing) = arrow.trailing_color()
                    && trailing != color
                {
                    debug!(%color, %trailing, "arrow color differs from trailing color bytes");
                }
                let glyph = self.scene.ensure_child(node, VECTOR_NODE_NAME);
                self.scene.set_vector(
                    glyph,
                    Some(DirectionalVector::from_endpoints(arrow.start, arrow.end, color)),
                );
                ApplyOutcome::Updated { node: glyph }
            }
        }
    }

    /// Applies, in clip order, every frame stamped at or before `until`.
    /// Returns how many frames were applied; ignored frames are not counted.
    pub fn replay(&mut self, clip: &Clip, until: Timestamp) -> usize {
        let mut applied = 0;
        for frame in clip.frames_until(until) {
            if self.apply(frame) != ApplyOutcome::Ignored {
                applied += 1;
            }
        }
        applied
    }

    /// Resolves `path` without creating anything. The empty path names the
    /// root.
    #[must_use]
    pub fn lookup(&self, path: &FramePath) -> Option<NodeId> {
        path.iter()
            .try_fold(self.scene.root(), |node, segment| {
                self.scene.find_child(node, segment)
            })
    }

    /// Returns the arrow glyph child of `node`, if it has one.
    #[must_use]
    pub fn vector_node(&self, node: NodeId) -> Option<NodeId> {
        self.scene.find_child(node, VECTOR_NODE_NAME)
    }

    /// Lands every completion that has arrived, in arrival order.
    pub fn pump_completions(&mut self) -> Vec<CompletionOutcome> {
        let mut outcomes = Vec::new();
        while let Some(completion) = self.queue.try_recv() {
            outcomes.push(self.land(completion));
        }
        outcomes
    }

    /// Blocks until one completion arrives or `timeout` passes, and lands it.
    pub fn wait_completion(&mut self, timeout: std::time::Duration) -> Option<CompletionOutcome> {
        let completion = self.queue.recv_timeout(timeout)?;
        Some(self.land(completion))
    }

    /// Number of geometry requests that may still land.
    #[must_use]
    pub fn pending_fetches(&self) -> usize {
        self.queue.pending_len()
    }

    /// Cancels every outstanding geometry request. Returns how many were
    /// cancelled.
    pub fn cancel_pending(&mut self) -> usize {
        let cancelled = self.queue.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "cancelled geometry requests");
        }
        cancelled
    }

    /// Evaluates the scene and returns the changes since the previous
    /// evaluation.
    pub fn evaluate(&mut self) -> SceneChanges {
        self.scene.evaluate()
    }

    /// Evaluates the scene and hands the changes to `presenter`.
    pub fn present<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        self.scene.evaluate_into(&mut self.changes);
        presenter.apply(&self.scene, &self.changes);
    }

    fn resolve(&mut self, path: &FramePath) -> Option<NodeId> {
        if path.is_empty() {
            return match self.config.empty_path {
                EmptyPathPolicy::Ignore => {
                    debug!("ignoring frame with empty path");
                    None
                }
                EmptyPathPolicy::Root => Some(self.scene.root()),
            };
        }
        let mut node = self.scene.root();
        for segment in path.iter() {
            node = match self.scene.find_child(node, segment) {
                Some(child) => child,
                None => {
                    let child = self.scene.create_child(node, segment);
                    trace!(segment, ?child, "created node");
                    child
                }
            };
        }
        Some(node)
    }

    fn land(&mut self, completion: FetchCompletion) -> CompletionOutcome {
        let FetchCompletion {
            ticket,
            key,
            result,
        } = completion;
        if !self.queue.claim(ticket) || !self.scene.is_alive(ticket.node()) {
            debug!(?ticket, key, "discarding stale geometry completion");
            if let Ok(geometry) = result {
                self.scene.release_geometry(geometry);
            }
            return CompletionOutcome::Stale { ticket };
        }
        match result {
            Ok(geometry) => {
                let node = ticket.node();
                self.scene.set_geometry(node, Some(geometry));
                CompletionOutcome::Applied { node, geometry }
            }
            Err(error @ FetchError::Cancelled) => {
                debug!(key, "geometry fetch abandoned by fetcher");
                CompletionOutcome::Failed { ticket, error }
            }
            Err(error) => {
                warn!(key, %error, "geometry fetch failed");
                CompletionOutcome::Failed { ticket, error }
            }
        }
    }
}

impl<F> Drop for PatchEngine<F> {
    fn drop(&mut self) {
        self.queue.cancel_all();
    }
}
