//! Scene node trees
//!
//! A scene asset holds one root node, which references a behavior script, and
//! any number of embedded nodes parented to it. Embedded nodes never nest, so
//! every tree is exactly two levels deep.
//!
//! Trees are validated on construction and immutable afterwards:
//!
//! - Node ids are unique, root included
//! - Every rotation is a finite unit quaternion within the configured tolerance
//! - Positions and scales are finite
//!
//! [`SceneNodeTree::parse`] and [`SceneNodeTree::serialize`] convert between a
//! tree and text; [`SceneNodeTreeBuilder`] assembles or edits trees in code.

mod decode;
mod encode;
mod error;
mod node;
mod options;
mod tree;

pub use error::ParseError;
pub use node::{
    BlendMode, Node, Payload, PropertyOverride, PropertyType, Renderable, ScriptRef, Sprite,
    DEFAULT_SPRITE_MATERIAL,
};
pub use options::{ParseOptions, RotationPolicy};
pub use tree::{SceneNodeTree, SceneNodeTreeBuilder};
