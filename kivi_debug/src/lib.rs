// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON export for kivi diagnostics.
//!
//! This crate provides inspection tools for development and post-mortem
//! analysis:
//!
//! - [`pretty::write_tree`] — indented dump of a scene, one node per line.
//! - [`pretty::PrettyPresenter`] — a [`Presenter`](kivi_core::backend::Presenter)
//!   that writes one line per scene change instead of rendering.
//! - [`json::export_clip`] — writes a clip's frames as JSON.
//! - [`json::scene_to_json`] — snapshots a scene tree as a JSON value.

pub mod json;
pub mod pretty;
