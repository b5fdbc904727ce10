//! # Scene Asset
//!
//! Loader, validator and writer for text-format game object scene assets.
//!
//! A scene asset describes one game object: a root component that references a
//! behavior script, followed by any number of embedded components (sprites and
//! other renderables), each with a local position and rotation.
//!
//! ## Features
//!
//! - **Text Format**: Lexer, record parser and writer for the block/field format
//! - **Typed Payloads**: Closed sum types for scripts, sprites and unknown kinds
//! - **Validation**: Unique ids, unit rotations, strict or lenient field handling
//! - **Transforms**: World transform resolution through the containment chain
//! - **Round-Trip**: `parse(serialize(tree))` reproduces the tree within epsilon
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_asset::prelude::*;
//!
//! let text = r#"
//! components {
//!   id: "script"
//!   component: "/background/small_planets.script"
//! }
//! embedded_components {
//!   id: "sprite"
//!   type: "sprite"
//!   data: "tile_set: \"/background/background.atlas\"\ndefault_animation: \"ice_planet\"\n"
//!   position { x: 10.0 y: 20.0 z: 0.0 }
//! }
//! "#;
//!
//! let tree = SceneNodeTree::parse(text)?;
//! assert_eq!(tree.len(), 2);
//!
//! let world = tree.resolve_world_transform("sprite").unwrap();
//! assert_eq!(world.position, Vec3::new(10.0, 20.0, 0.0));
//! # Ok::<(), ParseError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod format;
pub mod scene;
pub mod assets;

#[cfg(test)]
mod tests;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        assets::{Asset, AssetError, SceneLoader},
        config::{Config, ConfigError},
        foundation::math::{Quat, Transform, Vec3, DEFAULT_EPSILON},
        scene::{
            BlendMode, Node, ParseError, ParseOptions, Payload, PropertyOverride, PropertyType,
            Renderable, RotationPolicy, SceneNodeTree, SceneNodeTreeBuilder, ScriptRef, Sprite,
        },
    };
}
