// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of clips and scene snapshots.
//!
//! Timestamps and durations are 128-bit nanosecond counts, which JSON numbers
//! cannot carry losslessly, so they are written as decimal strings.

use std::io::{self, Write};

use serde_json::{Value, json};

use kivi_core::clip::Clip;
use kivi_core::frame::{Frame, Payload};
use kivi_core::scene::{NodeId, SceneStore};
use kivi_core::transform::Vec3;

/// Converts one frame to a JSON object.
#[must_use]
pub fn frame_to_json(frame: &Frame) -> Value {
    json!({
        "timestamp": frame.timestamp().nanos().to_string(),
        "path": frame.path().to_string(),
        "type": format!("{:?}", frame.type_tag()),
        "payload": payload_to_json(frame.payload()),
    })
}

fn payload_to_json(payload: &Payload) -> Value {
    match payload {
        Payload::NullData => Value::Null,
        Payload::Stl(key) => json!({ "key": key }),
        Payload::MeshMaterial(m) => json!({
            "color": m.color.to_string(),
            "roughness": m.roughness,
            "metalness": m.metalness,
        }),
        Payload::Matrix4(m) => json!({ "rows": m.rows }),
        Payload::Arrow3(a) => json!({
            "start": vec3(a.start),
            "end": vec3(a.end),
            "color": a.color().to_string(),
            "trailing_color": a.trailing_color().map(|c| c.to_string()),
        }),
    }
}

/// Converts a clip, with its summary queries, to a JSON object.
#[must_use]
pub fn clip_to_json(clip: &Clip) -> Value {
    let frames: Vec<Value> = clip.frames().iter().map(frame_to_json).collect();
    json!({
        "name": clip.name(),
        "frame_count": clip.len(),
        "sorted": clip.is_timestamp_sorted(),
        "duration_ns": clip.duration().nanos().to_string(),
        "frames": frames,
    })
}

/// Writes a clip as pretty-printed JSON.
pub fn export_clip(clip: &Clip, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &clip_to_json(clip))?;
    Ok(())
}

/// Snapshots the scene tree, starting at the root, as nested JSON objects.
#[must_use]
pub fn scene_to_json(scene: &SceneStore) -> Value {
    node_to_json(scene, scene.root())
}

fn node_to_json(scene: &SceneStore, id: NodeId) -> Value {
    let pose = scene.pose(id);
    let children: Vec<Value> = scene
        .children(id)
        .map(|child| node_to_json(scene, child))
        .collect();
    json!({
        "name": scene.name(id),
        "translation": vec3(pose.translation),
        "rotation": [pose.rotation.x, pose.rotation.y, pose.rotation.z, pose.rotation.w],
        "material": scene.material(id).map(|m| json!({
            "color": m.color.to_string(),
            "roughness": m.roughness,
            "metalness": m.metalness,
        })),
        "geometry": scene.geometry(id).map(|g| g.0),
        "vector": scene.vector(id).map(|v| json!({
            "origin": vec3(v.origin),
            "direction": vec3(v.direction),
            "length": v.length,
            "color": v.color.to_string(),
        })),
        "children": children,
    })
}

fn vec3(v: Vec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kivi_core::frame::Arrow3;
    use kivi_core::scene::{GeometryId, Material, Rgb8};
    use kivi_core::time::Timestamp;

    fn clip() -> Clip {
        let mut clip = Clip::new("bench");
        clip.push(Frame::new(
            Timestamp(5),
            "robot/arm",
            Payload::Stl("arm.stl".into()),
        ));
        clip.push(Frame::new(
            Timestamp(u128::from(u64::MAX) + 30),
            "robot/arm",
            Payload::Arrow3(Arrow3::new(
                Vec3::ZERO,
                Vec3::X,
                Rgb8::new(255, 0, 0),
            )),
        ));
        clip
    }

    #[test]
    fn clip_export_parses() {
        let mut out = Vec::new();
        export_clip(&clip(), &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed["name"], "bench");
        assert_eq!(parsed["frame_count"], 2);
        assert_eq!(parsed["sorted"], true);
        assert_eq!(parsed["duration_ns"], "18446744073709551640");

        let frames = parsed["frames"].as_array().unwrap();
        assert_eq!(frames[0]["timestamp"], "5");
        assert_eq!(frames[0]["path"], "robot/arm");
        assert_eq!(frames[0]["type"], "Stl");
        assert_eq!(frames[0]["payload"]["key"], "arm.stl");
        assert_eq!(frames[1]["payload"]["trailing_color"], "#ff0000");
        assert_eq!(frames[1]["payload"]["end"], json!([1.0, 0.0, 0.0]));
    }

    #[test]
    fn null_data_payload_is_null() {
        let frame = Frame::new(Timestamp(1), "a", Payload::NullData);
        assert_eq!(frame_to_json(&frame)["payload"], Value::Null);
    }

    #[test]
    fn scene_snapshot_nests_children() {
        let mut scene = SceneStore::new();
        let root = scene.root();
        let a = scene.create_child(root, "a");
        let b = scene.create_child(a, "b");
        scene.set_geometry(b, Some(GeometryId(11)));
        scene.set_material(a, Some(Material::new(Rgb8::WHITE, 1.0, 0.0)));

        let snapshot = scene_to_json(&scene);
        assert_eq!(snapshot["name"], "");
        let a_json = &snapshot["children"][0];
        assert_eq!(a_json["name"], "a");
        assert_eq!(a_json["material"]["color"], "#ffffff");
        assert_eq!(a_json["geometry"], Value::Null);
        assert_eq!(a_json["children"][0]["geometry"], 11);
        assert_eq!(a_json["children"][0]["rotation"], json!([0.0, 0.0, 0.0, 1.0]));
    }
}
