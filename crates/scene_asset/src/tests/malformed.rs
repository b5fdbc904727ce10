//! Broken variants of the planets scene

use crate::scene::{ParseError, ParseOptions, SceneNodeTree};

use super::small_planets::SMALL_PLANETS;

#[test]
fn test_missing_closing_brace() {
    let truncated = SMALL_PLANETS.trim_end().strip_suffix('}').unwrap();
    let err = SceneNodeTree::parse(truncated).unwrap_err();
    assert!(matches!(err, ParseError::MalformedBlock { record: 4, .. }), "{err:?}");
}

#[test]
fn test_repeated_sprite_id() {
    let text = SMALL_PLANETS.replace("id: \"sprite3\"", "id: \"sprite2\"");
    let err = SceneNodeTree::parse(&text).unwrap_err();
    assert_eq!(err, ParseError::DuplicateId { record: 2, id: "sprite2".to_string() });
}

#[test]
fn test_zero_root_rotation() {
    let text = SMALL_PLANETS.replacen("w: 1.0", "w: 0.0", 1);
    let err = SceneNodeTree::parse(&text).unwrap_err();
    assert!(matches!(
        err,
        ParseError::InvalidTransform { record: 0, ref field, .. } if field == "rotation"
    ));
}

#[test]
fn test_unknown_field_on_last_sprite() {
    let text = SMALL_PLANETS.replace("id: \"sprite5\"\n", "id: \"sprite5\"\n  layer: \"background\"\n");

    let err = SceneNodeTree::parse(&text).unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnknownFieldInStrictMode { record: 4, ref field, .. } if field == "layer"
    ));

    let tree = SceneNodeTree::parse_with(&text, &ParseOptions::lenient()).unwrap();
    assert_eq!(tree.len(), 5);
    assert!(tree.get("sprite5").is_some());
}

#[test]
fn test_root_must_lead() {
    let (root, rest) = SMALL_PLANETS.split_at(SMALL_PLANETS.find("embedded_components").unwrap());
    let reordered = format!("{rest}{root}");
    let err = SceneNodeTree::parse(&reordered).unwrap_err();
    assert!(matches!(err, ParseError::MalformedBlock { record: 0, .. }));

    let err = SceneNodeTree::parse(rest).unwrap_err();
    assert!(matches!(err, ParseError::MalformedBlock { record: 0, .. }));
}

#[test]
fn test_deep_nesting_is_malformed() {
    let text = format!(
        "components {{ id: \"script\" component: \"/a.script\" {} }}",
        "a {".repeat(200_000)
    );
    let err = SceneNodeTree::parse(&text).unwrap_err();
    assert!(matches!(
        err,
        ParseError::MalformedBlock { record: 0, ref reason, .. } if reason.contains("nested too deeply")
    ));
}
