//! Mapping from parsed records onto scene nodes

use crate::format::{parse_document, Block, Field, Scalar, Value};
use crate::foundation::math::{quaternion_from_xyzw, Transform, Vec3};
use crate::scene::{
    BlendMode, Node, ParseError, ParseOptions, Payload, PropertyOverride, PropertyType, Renderable,
    SceneNodeTree, ScriptRef, Sprite, DEFAULT_SPRITE_MATERIAL,
};

/// Record name of the root script component
pub(crate) const ROOT_RECORD: &str = "components";

/// Record name of embedded renderable components
pub(crate) const EMBEDDED_RECORD: &str = "embedded_components";

/// Decode a whole document into a validated tree
pub(crate) fn decode_document(src: &str, options: &ParseOptions) -> Result<SceneNodeTree, ParseError> {
    let records = parse_document(src)?;
    let mut nodes = Vec::with_capacity(records.len());
    let mut root_seen = false;

    for (index, field) in records.iter().enumerate() {
        let record = RecordContext { index, options };
        match field.name.as_str() {
            ROOT_RECORD => {
                if root_seen {
                    return Err(record.malformed(field.line, "more than one root `components` record"));
                }
                nodes.push((index, decode_component(&record, field)?));
                root_seen = true;
            }
            EMBEDDED_RECORD => {
                if !root_seen {
                    return Err(record.malformed(
                        field.line,
                        "`embedded_components` record declared before the root `components` record",
                    ));
                }
                nodes.push((index, decode_embedded(&record, field)?));
            }
            _ => record.unknown(field, None)?,
        }
    }

    if !root_seen {
        return Err(ParseError::MalformedBlock {
            record: records.len(),
            line: src.lines().count().max(1),
            reason: "document has no root `components` record".to_string(),
        });
    }

    SceneNodeTree::from_validated(nodes, Transform::identity(), options.clone())
}

/// Apply the parse-time renderable rules to a renderable built in code
///
/// Opaque sprite data is decoded the same way a parsed `data` field is;
/// errors report line 0.
pub(crate) fn canonical_renderable(
    index: usize,
    options: &ParseOptions,
    renderable: Renderable,
) -> Result<Renderable, ParseError> {
    match renderable {
        Renderable::Opaque { kind, data } => decode_renderable(&RecordContext { index, options }, kind, data, 0),
        sprite @ Renderable::Sprite(_) => Ok(sprite),
    }
}

/// Error context and field helpers for one top-level record
struct RecordContext<'a> {
    index: usize,
    options: &'a ParseOptions,
}

impl RecordContext<'_> {
    fn malformed(&self, line: usize, reason: impl Into<String>) -> ParseError {
        ParseError::MalformedBlock {
            record: self.index,
            line,
            reason: reason.into(),
        }
    }

    /// Reject an unknown field in strict mode, skip it otherwise
    fn unknown(&self, field: &Field, parent: Option<&str>) -> Result<(), ParseError> {
        let path = match parent {
            Some(parent) => format!("{parent}.{}", field.name),
            None => field.name.clone(),
        };

        if self.options.strict {
            return Err(ParseError::UnknownFieldInStrictMode {
                record: self.index,
                line: field.line,
                field: path,
            });
        }

        log::debug!("record {}: skipping unknown field `{path}` on line {}", self.index, field.line);
        Ok(())
    }

    fn block<'f>(&self, field: &'f Field) -> Result<&'f Block, ParseError> {
        match &field.value {
            Value::Block(block) => Ok(block),
            Value::Scalar(scalar) => Err(self.malformed(
                field.line,
                format!("field `{}` must be a block, found a {}", field.name, scalar.kind()),
            )),
        }
    }

    fn scalar<'f>(&self, field: &'f Field) -> Result<&'f Scalar, ParseError> {
        match &field.value {
            Value::Scalar(scalar) => Ok(scalar),
            Value::Block(_) => Err(self.malformed(
                field.line,
                format!("field `{}` must be a value, found a block", field.name),
            )),
        }
    }

    fn string(&self, field: &Field) -> Result<String, ParseError> {
        let scalar = self.scalar(field)?;
        scalar.as_str().map(str::to_string).ok_or_else(|| {
            self.malformed(
                field.line,
                format!("field `{}` must be a string, found a {}", field.name, scalar.kind()),
            )
        })
    }

    fn ident<'f>(&self, field: &'f Field) -> Result<&'f str, ParseError> {
        let scalar = self.scalar(field)?;
        scalar.as_ident().ok_or_else(|| {
            self.malformed(
                field.line,
                format!("field `{}` must be an enum token, found a {}", field.name, scalar.kind()),
            )
        })
    }

    fn set_once<T>(&self, slot: &mut Option<T>, field: &Field, value: T) -> Result<(), ParseError> {
        if slot.is_some() {
            return Err(self.malformed(field.line, format!("field `{}` given more than once", field.name)));
        }
        *slot = Some(value);
        Ok(())
    }

    fn required<T>(&self, slot: Option<T>, line: usize, name: &str) -> Result<T, ParseError> {
        slot.ok_or_else(|| self.malformed(line, format!("missing required field `{name}`")))
    }

    /// Read a fixed set of numeric components from a block
    ///
    /// Components not present keep their default.
    fn components<const N: usize>(
        &self,
        field: &Field,
        names: [&str; N],
        defaults: [f32; N],
    ) -> Result<[f32; N], ParseError> {
        let block = self.block(field)?;
        let mut values = defaults;
        let mut seen = [false; N];

        for component in &block.fields {
            let Some(slot) = names.iter().position(|name| *name == component.name) else {
                self.unknown(component, Some(&field.name))?;
                continue;
            };
            if seen[slot] {
                return Err(self.malformed(
                    component.line,
                    format!("field `{}.{}` given more than once", field.name, component.name),
                ));
            }

            let value = match &component.value {
                Value::Scalar(scalar) => scalar.as_f32(),
                Value::Block(_) => None,
            };
            values[slot] = value.ok_or_else(|| ParseError::InvalidTransform {
                record: self.index,
                field: format!("{}.{}", field.name, component.name),
                reason: "expected a number".to_string(),
            })?;
            seen[slot] = true;
        }

        Ok(values)
    }
}

/// Position, rotation and scale blocks shared by both record kinds
#[derive(Default)]
struct Placement {
    position: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

impl Placement {
    /// Consume `field` if it is a transform block; returns false otherwise
    fn read(&mut self, record: &RecordContext<'_>, field: &Field) -> Result<bool, ParseError> {
        match field.name.as_str() {
            "position" => {
                let value = record.components(field, ["x", "y", "z"], [0.0; 3])?;
                record.set_once(&mut self.position, field, value)?;
            }
            "rotation" => {
                let value = record.components(field, ["x", "y", "z", "w"], [0.0, 0.0, 0.0, 1.0])?;
                record.set_once(&mut self.rotation, field, value)?;
            }
            "scale" => {
                let value = record.components(field, ["x", "y", "z"], [1.0; 3])?;
                record.set_once(&mut self.scale, field, value)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(self, record: &RecordContext<'_>) -> Result<Transform, ParseError> {
        let [px, py, pz] = self.position.unwrap_or([0.0; 3]);
        let [rx, ry, rz, rw] = self.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
        let [sx, sy, sz] = self.scale.unwrap_or([1.0; 3]);

        record.options.validate_transform(
            record.index,
            Vec3::new(px, py, pz),
            quaternion_from_xyzw(rx, ry, rz, rw),
            Vec3::new(sx, sy, sz),
        )
    }
}

fn decode_component(record: &RecordContext<'_>, record_field: &Field) -> Result<Node, ParseError> {
    let block = record.block(record_field)?;
    let mut id = None;
    let mut component = None;
    let mut properties = Vec::new();
    let mut placement = Placement::default();

    for field in &block.fields {
        match field.name.as_str() {
            "id" => record.set_once(&mut id, field, record.string(field)?)?,
            "component" => record.set_once(&mut component, field, record.string(field)?)?,
            "properties" => properties.push(decode_property(record, field)?),
            _ => {
                if !placement.read(record, field)? {
                    record.unknown(field, None)?;
                }
            }
        }
    }

    let id = record.required(id, record_field.line, "id")?;
    let component_path = record.required(component, record_field.line, "component")?;
    let transform = placement.finish(record)?;

    Ok(Node::new(
        id,
        transform,
        Payload::Script(ScriptRef { component_path, properties }),
    ))
}

fn decode_property(record: &RecordContext<'_>, property_field: &Field) -> Result<PropertyOverride, ParseError> {
    let block = record.block(property_field)?;
    let mut id = None;
    let mut value = None;
    let mut kind = None;

    for field in &block.fields {
        match field.name.as_str() {
            "id" => record.set_once(&mut id, field, record.string(field)?)?,
            "value" => record.set_once(&mut value, field, record.string(field)?)?,
            "type" => {
                let token = record.ident(field)?;
                let parsed = PropertyType::from_token(token)
                    .ok_or_else(|| record.malformed(field.line, format!("unknown property type `{token}`")))?;
                record.set_once(&mut kind, field, parsed)?;
            }
            _ => record.unknown(field, Some("properties"))?,
        }
    }

    Ok(PropertyOverride {
        id: record.required(id, property_field.line, "properties.id")?,
        value: record.required(value, property_field.line, "properties.value")?,
        kind: record.required(kind, property_field.line, "properties.type")?,
    })
}

fn decode_embedded(record: &RecordContext<'_>, record_field: &Field) -> Result<Node, ParseError> {
    let block = record.block(record_field)?;
    let mut id = None;
    let mut kind = None;
    let mut data = None;
    let mut data_line = record_field.line;
    let mut placement = Placement::default();

    for field in &block.fields {
        match field.name.as_str() {
            "id" => record.set_once(&mut id, field, record.string(field)?)?,
            "type" => record.set_once(&mut kind, field, record.string(field)?)?,
            "data" => {
                record.set_once(&mut data, field, record.string(field)?)?;
                data_line = field.line;
            }
            _ => {
                if !placement.read(record, field)? {
                    record.unknown(field, None)?;
                }
            }
        }
    }

    let id = record.required(id, record_field.line, "id")?;
    let kind = record.required(kind, record_field.line, "type")?;
    let renderable = decode_renderable(record, kind, data.unwrap_or_default(), data_line)?;
    let transform = placement.finish(record)?;

    Ok(Node::new(id, transform, Payload::Renderable(renderable)))
}

/// Turn a `type`/`data` pair into a typed renderable
///
/// Kinds other than sprites stay opaque. Sprite data that does not decode is
/// an error in strict mode and stays opaque in lenient mode, so nothing in the
/// source is lost either way.
fn decode_renderable(
    record: &RecordContext<'_>,
    kind: String,
    data: String,
    line: usize,
) -> Result<Renderable, ParseError> {
    if kind != Sprite::KIND {
        return Ok(Renderable::Opaque { kind, data });
    }

    match decode_sprite(record, &data, line) {
        Ok(sprite) => Ok(Renderable::Sprite(sprite)),
        Err(err) if !record.options.strict => {
            log::debug!("record {}: keeping sprite data opaque: {err}", record.index);
            Ok(Renderable::Opaque { kind, data })
        }
        Err(err) => Err(err),
    }
}

/// Decode the nested sprite record carried in a `data` string
///
/// Errors are reported against `line`, the line of the `data` field.
fn decode_sprite(record: &RecordContext<'_>, data: &str, line: usize) -> Result<Sprite, ParseError> {
    let mut fields = parse_document(data)
        .map_err(|e| record.malformed(line, format!("sprite data line {}: {}", e.line, e.reason)))?;
    for field in &mut fields {
        field.line = line;
    }

    let mut tile_set = None;
    let mut default_animation = None;
    let mut material = None;
    let mut blend_mode = None;

    for field in &fields {
        match field.name.as_str() {
            "tile_set" => record.set_once(&mut tile_set, field, record.string(field)?)?,
            "default_animation" => record.set_once(&mut default_animation, field, record.string(field)?)?,
            "material" => record.set_once(&mut material, field, record.string(field)?)?,
            "blend_mode" => {
                let token = record.ident(field)?;
                let mode = BlendMode::from_token(token)
                    .ok_or_else(|| record.malformed(line, format!("unknown blend mode `{token}`")))?;
                record.set_once(&mut blend_mode, field, mode)?;
            }
            other => {
                return Err(ParseError::UnknownFieldInStrictMode {
                    record: record.index,
                    line,
                    field: format!("data.{other}"),
                })
            }
        }
    }

    Ok(Sprite {
        tile_set: record.required(tile_set, line, "data.tile_set")?,
        default_animation: record.required(default_animation, line, "data.default_animation")?,
        material: material.unwrap_or_else(|| DEFAULT_SPRITE_MATERIAL.to_string()),
        blend_mode: blend_mode.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use crate::scene::RotationPolicy;
    use approx::assert_relative_eq;

    const ROOT: &str = r#"components {
  id: "script"
  component: "/background/small_planets.script"
}
"#;

    fn with_root(rest: &str) -> String {
        format!("{ROOT}{rest}")
    }

    fn parse(src: &str) -> Result<SceneNodeTree, ParseError> {
        decode_document(src, &ParseOptions::default())
    }

    fn parse_lenient(src: &str) -> Result<SceneNodeTree, ParseError> {
        decode_document(src, &ParseOptions::lenient())
    }

    #[test]
    fn test_root_only() {
        let tree = parse(ROOT).unwrap();
        assert_eq!(tree.len(), 1);
        let root = tree.root();
        assert_eq!(root.id, "script");
        assert_eq!(root.as_script().unwrap().component_path, "/background/small_planets.script");
        assert_eq!(root.local_position(), &Vec3::zeros());
        assert_eq!(root.local_rotation(), &Quat::identity());
    }

    #[test]
    fn test_sprite_data_decoded() {
        let tree = parse(&with_root(
            r#"embedded_components {
  id: "sprite4"
  type: "sprite"
  data: "tile_set: \"/background/background.atlas\"\ndefault_animation: \"ring_planet\"\nmaterial: \"/builtins/materials/sprite.material\"\nblend_mode: BLEND_MODE_ADD\n"
  position {
    x: 249.6802
    y: 307.51465
    z: 0.0
  }
}
"#,
        ))
        .unwrap();

        let node = tree.get("sprite4").unwrap();
        let sprite = node.as_renderable().and_then(Renderable::as_sprite).unwrap();
        assert_eq!(sprite.tile_set, "/background/background.atlas");
        assert_eq!(sprite.default_animation, "ring_planet");
        assert_eq!(sprite.blend_mode, BlendMode::Add);
        assert_relative_eq!(*node.local_position(), Vec3::new(249.6802, 307.51465, 0.0));
    }

    #[test]
    fn test_sprite_defaults_applied() {
        let tree = parse(&with_root(
            "embedded_components { id: \"s\" type: \"sprite\" data: \"tile_set: \\\"/a.atlas\\\" default_animation: \\\"idle\\\"\" }\n",
        ))
        .unwrap();
        let sprite = tree.get("s").unwrap().as_renderable().and_then(Renderable::as_sprite).unwrap().clone();
        assert_eq!(sprite, Sprite::new("/a.atlas", "idle"));
    }

    #[test]
    fn test_other_kinds_stay_opaque() {
        let tree = parse(&with_root(
            "embedded_components { id: \"l\" type: \"label\" data: \"text: \\\"hi\\\"\\n\" }\n",
        ))
        .unwrap();
        assert_eq!(
            tree.get("l").unwrap().as_renderable(),
            Some(&Renderable::Opaque { kind: "label".into(), data: "text: \"hi\"\n".into() })
        );
    }

    #[test]
    fn test_script_properties() {
        let tree = parse(
            r#"components {
  id: "script"
  component: "/main/ship.script"
  properties {
    id: "speed"
    value: "2.5"
    type: PROPERTY_TYPE_NUMBER
  }
  properties {
    id: "target"
    value: "/enemy"
    type: PROPERTY_TYPE_URL
  }
}
"#,
        )
        .unwrap();
        let script = tree.script().unwrap();
        assert_eq!(
            script,
            &ScriptRef::new("/main/ship.script")
                .with_property("speed", "2.5", PropertyType::Number)
                .with_property("target", "/enemy", PropertyType::Url)
        );
    }

    #[test]
    fn test_scale_block() {
        let tree = parse(&with_root(
            "embedded_components { id: \"s\" type: \"label\" data: \"\" scale { x: 2.0 y: 3.0 } }\n",
        ))
        .unwrap();
        assert_eq!(tree.get("s").unwrap().local_scale(), &Vec3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn test_missing_rotation_components_use_defaults() {
        let tree = parse(
            "components { id: \"script\" component: \"/a.script\" rotation { z: 0.0 } }\n",
        )
        .unwrap();
        assert_eq!(tree.root().local_rotation(), &Quat::identity());
    }

    #[test]
    fn test_duplicate_id() {
        let err = parse(&with_root(
            "embedded_components { id: \"script\" type: \"label\" data: \"\" }\n",
        ))
        .unwrap_err();
        assert_eq!(err, ParseError::DuplicateId { record: 1, id: "script".into() });
    }

    #[test]
    fn test_zero_rotation_invalid() {
        let err = parse(
            "components { id: \"script\" component: \"/a.script\" rotation { x: 0.0 y: 0.0 z: 0.0 w: 0.0 } }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidTransform { record: 0, ref field, .. } if field == "rotation"));
    }

    #[test]
    fn test_non_finite_rotation_invalid() {
        let err = parse("components { id: \"script\" component: \"/a.script\" rotation { x: nan } }\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTransform { .. }));

        let err = parse("components { id: \"script\" component: \"/a.script\" rotation { w: \"one\" } }\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTransform { ref field, .. } if field == "rotation.w"));
    }

    #[test]
    fn test_normalize_policy_repairs_rotation() {
        let src = "components { id: \"script\" component: \"/a.script\" rotation { w: 2.0 } }\n";
        assert!(parse(src).is_err());

        let options = ParseOptions::default().with_rotation_policy(RotationPolicy::Normalize);
        let tree = decode_document(src, &options).unwrap();
        assert_relative_eq!(*tree.root().local_rotation(), Quat::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_field_strict_and_lenient() {
        let src = with_root("embedded_components { id: \"s\" type: \"label\" data: \"\" layer: \"bg\" }\n");
        let err = parse(&src).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownFieldInStrictMode { record: 1, line: 5, field: "layer".into() }
        );

        let tree = parse_lenient(&src).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_unknown_record_strict_and_lenient() {
        let src = with_root("collision_objects { id: \"c\" }\n");
        assert!(matches!(
            parse(&src),
            Err(ParseError::UnknownFieldInStrictMode { record: 1, ref field, .. }) if field == "collision_objects"
        ));
        assert_eq!(parse_lenient(&src).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_transform_component_path() {
        let err = parse("components { id: \"script\" component: \"/a.script\" position { q: 1.0 } }\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownFieldInStrictMode { ref field, .. } if field == "position.q"));
    }

    #[test]
    fn test_unknown_sprite_field_strict_vs_lenient() {
        let src = with_root(
            "embedded_components { id: \"s\" type: \"sprite\" data: \"tile_set: \\\"/a.atlas\\\" default_animation: \\\"a\\\" size_mode: SIZE_MODE_AUTO\" }\n",
        );
        assert!(matches!(
            parse(&src),
            Err(ParseError::UnknownFieldInStrictMode { ref field, .. }) if field == "data.size_mode"
        ));

        let tree = parse_lenient(&src).unwrap();
        match tree.get("s").unwrap().as_renderable().unwrap() {
            Renderable::Opaque { kind, data } => {
                assert_eq!(kind, "sprite");
                assert!(data.contains("size_mode"));
            }
            other => panic!("expected opaque fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_blend_mode() {
        let src = with_root(
            "embedded_components { id: \"s\" type: \"sprite\" data: \"tile_set: \\\"/a\\\" default_animation: \\\"a\\\" blend_mode: BLEND_MODE_XOR\" }\n",
        );
        let err = parse(&src).unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { record: 1, ref reason, .. } if reason.contains("BLEND_MODE_XOR")));
    }

    #[test]
    fn test_sprite_missing_tile_set() {
        let src = with_root("embedded_components { id: \"s\" type: \"sprite\" data: \"default_animation: \\\"a\\\"\" }\n");
        let err = parse(&src).unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { ref reason, .. } if reason.contains("data.tile_set")));
    }

    #[test]
    fn test_malformed_sprite_data_reports_data_line() {
        let src = with_root("embedded_components {\n  id: \"s\"\n  type: \"sprite\"\n  data: \"tile_set {\"\n}\n");
        let err = parse(&src).unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { record: 1, line: 8, .. }), "{err:?}");
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse("components { id: \"script\" }\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { ref reason, .. } if reason.contains("`component`")));

        let err = parse(&with_root("embedded_components { id: \"s\" data: \"\" }\n")).unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { ref reason, .. } if reason.contains("`type`")));
    }

    #[test]
    fn test_repeated_field() {
        let err = parse("components { id: \"a\" id: \"b\" component: \"/a.script\" }\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { ref reason, .. } if reason.contains("more than once")));
    }

    #[test]
    fn test_wrong_value_kinds() {
        let err = parse("components { id: 3 component: \"/a.script\" }\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { ref reason, .. } if reason.contains("must be a string")));

        let err = parse("components: \"flat\"\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { ref reason, .. } if reason.contains("must be a block")));
    }

    #[test]
    fn test_root_ordering_rules() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlock { record: 0, ref reason, .. } if reason.contains("no root")));

        let embedded_first = format!(
            "embedded_components {{ id: \"s\" type: \"label\" data: \"\" }}\n{ROOT}"
        );
        assert!(matches!(parse(&embedded_first), Err(ParseError::MalformedBlock { record: 0, .. })));

        let two_roots = format!("{ROOT}{}", ROOT.replace("\"script\"", "\"script2\""));
        assert!(matches!(parse(&two_roots), Err(ParseError::MalformedBlock { record: 1, .. })));
    }
}
