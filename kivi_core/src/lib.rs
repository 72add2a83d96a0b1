// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame decoding, clip recording, and scene patching for streamed 3D
//! telemetry.
//!
//! A producer (a robot controller, a simulation) emits a stream of small
//! binary frames. Each frame addresses one node of a 3D scene by a
//! `/`-separated path and carries one update for it: a pose, a material, a
//! mesh to load, an arrow glyph, or a deletion. `kivi_core` decodes those
//! frames, records them into clips for later replay, and applies them to a
//! struct-of-arrays scene tree with generational handles.
//!
//! # Architecture
//!
//! ```text
//!   byte buffers
//!       │
//!       ▼
//!   frame::decode() ──► Frame ──► Clip::push()          (recording)
//!                         │
//!                         ▼
//!                PatchEngine::apply() ──► AssetFetcher   (STL loads)
//!                         │                    │
//!                         │     FetchCompletion│
//!                         │   ┌────────────────┘
//!                         ▼   ▼
//!                PatchEngine::pump_completions()
//!                         │
//!                         ▼
//!   SceneStore::evaluate() ──► SceneChanges ──► Presenter::apply()
//! ```
//!
//! **[`frame`]** — The [`Frame`](frame::Frame) record, its wire format, an
//! encoder for producers, and stream helpers that skip bad buffers.
//!
//! **[`clip`]** — Append-only timelines of frames with an observable length,
//! and a library of clips with a current selection.
//!
//! **[`scene`]** — Struct-of-arrays node tree with generational handles.
//! Node state (pose, material, geometry, arrow glyph) is set by the caller;
//! world transforms are computed by evaluation.
//!
//! **[`dirty`]** — Multi-channel dirty tracking via `understory_dirty`.
//! TRANSFORM propagates to descendants; MATERIAL, GEOMETRY, and VECTOR are
//! local-only; TOPOLOGY triggers a traversal rebuild.
//!
//! **[`patch`]** — The [`PatchEngine`](patch::PatchEngine): path resolution
//! with auto-vivification and per-payload dispatch.
//!
//! **[`assets`]** — The [`AssetFetcher`](assets::AssetFetcher) trait and
//! the request/completion plumbing for asynchronous geometry loads.
//!
//! **[`backend`]** — The [`Presenter`](backend::Presenter) trait that
//! renderer integrations implement.
//!
//! **[`transform`]** — 3D affine transform, vector, and quaternion types.
//!
//! **[`time`]** — 128-bit nanosecond timestamps.
//!
//! # Crate features
//!
//! - `parallel` (disabled by default): Enables
//!   [`decode_batch_parallel`](frame::decode_batch_parallel), which decodes
//!   independent buffers on the rayon thread pool.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod assets;
pub mod backend;
pub mod clip;
pub mod dirty;
pub mod error;
pub mod frame;
pub mod patch;
pub mod scene;
pub mod time;
pub mod transform;
