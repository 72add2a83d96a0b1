// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for the renderer that shows the scene.
//!
//! Kivi never draws anything itself. The [`SceneStore`] is the authoritative
//! model, and a renderer integration mirrors it by implementing
//! [`Presenter`]. The pieces fit together like this:
//!
//! - **Frames** arrive as byte buffers and are decoded by
//!   [`frame::decode`](crate::frame::decode).
//!
//! - **Patching** applies each frame to the store through a
//!   [`PatchEngine`](crate::patch::PatchEngine), which also issues geometry
//!   loads through an [`AssetFetcher`](crate::assets::AssetFetcher).
//!
//! - **Evaluation** drains the store's dirty channels into a
//!   [`SceneChanges`] set and recomputes world transforms.
//!
//! - **Presentation** hands that change set to the [`Presenter`], which
//!   updates the renderer's own objects (meshes, materials, arrow glyphs)
//!   and frees the geometry handles listed in
//!   [`SceneChanges::released_geometry`].
//!
//! # Crate boundaries
//!
//! `kivi_core` owns the data model, decoding, patching, and this contract.
//! Renderer crates depend on `kivi_core` and provide the glue. Application
//! code depends on both and wires them together in its update loop.

use crate::scene::{SceneChanges, SceneStore};

/// Applies evaluated scene changes to a renderer.
///
/// # Update loop pseudocode
///
/// ```rust,ignore
/// fn on_update(buffers: &[Vec<u8>]) {
///     // Patch: decode and apply every frame that arrived since last time
///     for result in decode_stream(buffers) {
///         match result {
///             Ok(frame) => { engine.apply(&frame); }
///             Err(rejected) => report(rejected),
///         }
///     }
///
///     // Land geometry that finished loading in the meantime
///     engine.pump_completions();
///
///     // Evaluate and present in one step
///     engine.present(&mut presenter);
/// }
/// ```
///
/// Implementations should handle [`SceneChanges::removed`] before
/// [`SceneChanges::added`], since a freed slot may already be reused.
pub trait Presenter {
    /// Applies the given [`SceneChanges`] to the renderer, reading current
    /// node state from `scene` as needed.
    fn apply(&mut self, scene: &SceneStore, changes: &SceneChanges);
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn apply(&mut self, scene: &SceneStore, changes: &SceneChanges) {
        (**self).apply(scene, changes);
    }
}
