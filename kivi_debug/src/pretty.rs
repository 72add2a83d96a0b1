// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable scene output.
//!
//! [`write_tree`] dumps a whole scene. [`PrettyPresenter`] implements
//! [`Presenter`] and writes one line per change to a
//! [`Write`](std::io::Write) destination (default: stderr), which is handy
//! for watching a stream of frames land without a renderer attached.

use std::io::{self, Write};

use kivi_core::backend::Presenter;
use kivi_core::patch::VECTOR_NODE_NAME;
use kivi_core::scene::{NodeId, SceneChanges, SceneStore};
use kivi_core::transform::Vec3;

/// Writes the scene as an indented tree, one node per line, children in
/// insertion order.
pub fn write_tree(scene: &SceneStore, out: &mut dyn Write) -> io::Result<()> {
    let mut stack: Vec<(NodeId, usize)> = vec![(scene.root(), 0)];
    while let Some((id, depth)) = stack.pop() {
        let name = match scene.name(id) {
            "" => "<root>",
            name => display_name(name),
        };
        write!(out, "{:indent$}{name}", "", indent = depth * 2)?;

        let pose = scene.pose(id);
        if pose.translation != Vec3::ZERO {
            write!(out, " pos={}", vec3(pose.translation))?;
        }
        if let Some(material) = scene.material(id) {
            write!(
                out,
                " material={} r={:.2} m={:.2}",
                material.color, material.roughness, material.metalness
            )?;
        }
        if let Some(geometry) = scene.geometry(id) {
            write!(out, " geometry={geometry:?}")?;
        }
        if let Some(vector) = scene.vector(id) {
            write!(
                out,
                " arrow={}->{} {}",
                vec3(vector.origin),
                vec3(vector.end()),
                vector.color
            )?;
        }
        writeln!(out)?;

        let children: Vec<NodeId> = scene.children(id).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(())
}

/// Writes human-readable change lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPresenter<W: Write = Box<dyn Write>> {
    writer: W,
    presented: u64,
}

impl<W: Write> std::fmt::Debug for PrettyPresenter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPresenter")
            .field("presented", &self.presented)
            .finish_non_exhaustive()
    }
}

impl PrettyPresenter {
    /// Creates a presenter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Creates a presenter that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            presented: 0,
        }
    }
}

impl<W: Write> PrettyPresenter<W> {
    /// Creates a presenter that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            presented: 0,
        }
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for PrettyPresenter<W> {
    fn apply(&mut self, scene: &SceneStore, changes: &SceneChanges) {
        let index = self.presented;
        self.presented += 1;
        if changes.is_empty() {
            return;
        }
        let w = &mut self.writer;
        let _ = writeln!(
            w,
            "[present] #{index} added={} removed={} topology={}",
            changes.added.len(),
            changes.removed.len(),
            changes.topology_changed,
        );
        for &idx in &changes.removed {
            let _ = writeln!(w, "[removed] slot={idx}");
        }
        for &idx in &changes.added {
            let _ = writeln!(w, "[added] {}", slot_path(scene, idx));
        }
        for &idx in &changes.transforms {
            let world = scene.world_transform_at(idx);
            let _ = writeln!(
                w,
                "[transform] {} world={}",
                slot_path(scene, idx),
                vec3(world.translation()),
            );
        }
        for &idx in &changes.materials {
            let line = match scene.material_at(idx) {
                Some(m) => format!("{} r={:.2} m={:.2}", m.color, m.roughness, m.metalness),
                None => "none".into(),
            };
            let _ = writeln!(w, "[material] {} {line}", slot_path(scene, idx));
        }
        for &idx in &changes.geometry {
            let _ = writeln!(
                w,
                "[geometry] {} {:?}",
                slot_path(scene, idx),
                scene.geometry_at(idx),
            );
        }
        for &idx in &changes.vectors {
            let line = match scene.vector_at(idx) {
                Some(v) => format!("len={:.3} dir={} {}", v.length, vec3(v.direction), v.color),
                None => "none".into(),
            };
            let _ = writeln!(w, "[vector] {} {line}", slot_path(scene, idx));
        }
        for geometry in &changes.released_geometry {
            let _ = writeln!(w, "[release] {geometry:?}");
        }
    }
}

/// Slash-joined names from the root down to slot `idx`.
fn slot_path(scene: &SceneStore, idx: u32) -> String {
    let mut names = Vec::new();
    let mut cursor = Some(idx);
    while let Some(i) = cursor {
        let name = scene.name_at(i);
        if !name.is_empty() {
            names.push(display_name(name));
        }
        cursor = scene.parent_at(i);
    }
    if names.is_empty() {
        return "<root>".into();
    }
    names.reverse();
    names.join("/")
}

/// The reserved glyph child name starts with `/`, so it is shown as a
/// placeholder instead of producing an empty path segment.
fn display_name(name: &str) -> &str {
    if name == VECTOR_NODE_NAME {
        "<arrow>"
    } else {
        name
    }
}

fn vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kivi_core::scene::{DirectionalVector, GeometryId, Material, Pose, Rgb8};
    use kivi_core::transform::Quat;

    fn sample() -> SceneStore {
        let mut scene = SceneStore::new();
        let root = scene.root();
        let arm = scene.create_child(root, "arm");
        let hand = scene.create_child(arm, "hand");
        scene.create_child(root, "base");
        scene.set_pose(arm, Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY));
        scene.set_material(hand, Some(Material::new(Rgb8::new(0, 128, 255), 0.5, 0.0)));
        scene.set_geometry(hand, Some(GeometryId(3)));
        scene
    }

    #[test]
    fn tree_is_indented_in_preorder() {
        let mut out = Vec::new();
        write_tree(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "<root>",
                "  arm pos=(1.000, 0.000, 0.000)",
                "    hand material=#0080ff r=0.50 m=0.00 geometry=GeometryId(3)",
                "  base",
            ]
        );
    }

    #[test]
    fn presenter_writes_change_lines() {
        let mut scene = sample();
        let changes = scene.evaluate();
        let mut presenter = PrettyPresenter::with_writer(Vec::new());
        presenter.apply(&scene, &changes);
        let text = String::from_utf8(presenter.into_inner()).unwrap();

        assert!(text.starts_with("[present] #0 added=4 removed=0 topology=true\n"));
        assert!(text.contains("[added] arm/hand\n"));
        assert!(text.contains("[transform] arm/hand world=(1.000, 0.000, 0.000)\n"));
        assert!(text.contains("[material] arm/hand #0080ff r=0.50 m=0.00\n"));
        assert!(text.contains("[geometry] arm/hand Some(GeometryId(3))\n"));
    }

    #[test]
    fn presenter_skips_empty_change_sets() {
        let mut scene = sample();
        let mut presenter = PrettyPresenter::with_writer(Vec::new());
        let first = scene.evaluate();
        presenter.apply(&scene, &first);
        let second = scene.evaluate();
        assert!(second.is_empty());

        let before = presenter.writer.len();
        presenter.apply(&scene, &second);
        assert_eq!(presenter.writer.len(), before);
    }

    #[test]
    fn presenter_reports_removal_and_release() {
        let mut scene = sample();
        scene.evaluate();
        let arm = scene.find_child(scene.root(), "arm").unwrap();
        scene.remove_subtree(arm);
        let changes = scene.evaluate();

        let mut presenter = PrettyPresenter::with_writer(Vec::new());
        presenter.apply(&scene, &changes);
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(text.matches("[removed]").count(), 2);
        assert!(text.contains("[release] GeometryId(3)\n"));
    }

    #[test]
    fn glyph_child_prints_as_placeholder() {
        let mut scene = SceneStore::new();
        let sensor = scene.create_child(scene.root(), "sensor");
        let glyph = scene.create_child(sensor, VECTOR_NODE_NAME);
        scene.set_vector(
            glyph,
            Some(DirectionalVector::from_endpoints(Vec3::ZERO, Vec3::X, Rgb8::WHITE)),
        );
        let changes = scene.evaluate();

        let mut presenter = PrettyPresenter::with_writer(Vec::new());
        presenter.apply(&scene, &changes);
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(text.contains("[added] sensor/<arrow>\n"), "{text}");
        assert!(
            text.contains("[vector] sensor/<arrow> len=1.000 dir=(1.000, 0.000, 0.000) #ffffff\n"),
            "{text}"
        );
        assert!(!text.contains("//"), "{text}");

        let mut out = Vec::new();
        write_tree(&scene, &mut out).unwrap();
        let tree = String::from_utf8(out).unwrap();
        assert!(tree.contains("    <arrow> arrow="), "{tree}");
    }
}
