//! Scene tree to text

use crate::foundation::math::{quat_to_xyzw, Transform, Vec3};
use crate::format::TextWriter;
use crate::scene::decode::{EMBEDDED_RECORD, ROOT_RECORD};
use crate::scene::{Node, Payload, Renderable, SceneNodeTree, ScriptRef, Sprite};

/// Write a tree back to the block/field format
///
/// The root record comes first, then embedded records in tree order. Scale is
/// only written when it differs from one.
pub(crate) fn encode_tree(tree: &SceneNodeTree) -> String {
    let mut writer = TextWriter::new();
    for node in tree {
        match &node.payload {
            Payload::Script(script) => write_component(&mut writer, node, script),
            Payload::Renderable(renderable) => write_embedded(&mut writer, node, renderable),
        }
    }
    writer.finish()
}

fn write_component(writer: &mut TextWriter, node: &Node, script: &ScriptRef) {
    writer.begin_block(ROOT_RECORD);
    writer.string("id", &node.id);
    writer.string("component", &script.component_path);
    write_position_rotation(writer, &node.transform);
    for property in &script.properties {
        writer.begin_block("properties");
        writer.string("id", &property.id);
        writer.string("value", &property.value);
        writer.ident("type", property.kind.token());
        writer.end_block();
    }
    write_scale(writer, &node.transform);
    writer.end_block();
}

fn write_embedded(writer: &mut TextWriter, node: &Node, renderable: &Renderable) {
    writer.begin_block(EMBEDDED_RECORD);
    writer.string("id", &node.id);
    writer.string("type", renderable.kind());
    match renderable {
        Renderable::Sprite(sprite) => writer.string("data", &sprite_data(sprite)),
        Renderable::Opaque { data, .. } => writer.string("data", data),
    }
    write_position_rotation(writer, &node.transform);
    write_scale(writer, &node.transform);
    writer.end_block();
}

fn sprite_data(sprite: &Sprite) -> String {
    let mut data = TextWriter::new();
    data.string("tile_set", &sprite.tile_set);
    data.string("default_animation", &sprite.default_animation);
    data.string("material", &sprite.material);
    data.ident("blend_mode", sprite.blend_mode.token());
    data.finish()
}

fn write_position_rotation(writer: &mut TextWriter, transform: &Transform) {
    write_vector(writer, "position", &transform.position);

    let [x, y, z, w] = quat_to_xyzw(&transform.rotation);
    writer.begin_block("rotation");
    writer.float("x", x);
    writer.float("y", y);
    writer.float("z", z);
    writer.float("w", w);
    writer.end_block();
}

fn write_scale(writer: &mut TextWriter, transform: &Transform) {
    if transform.scale != Vec3::repeat(1.0) {
        write_vector(writer, "scale", &transform.scale);
    }
}

fn write_vector(writer: &mut TextWriter, name: &str, v: &Vec3) {
    writer.begin_block(name);
    writer.float("x", v.x);
    writer.float("y", v.y);
    writer.float("z", v.z);
    writer.end_block();
}
