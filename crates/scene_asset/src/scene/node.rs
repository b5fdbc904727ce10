//! Scene nodes and their payloads

use std::fmt;

use approx::AbsDiffEq;

use crate::foundation::math::{Quat, Transform, Vec3, DEFAULT_EPSILON};

/// Material assigned to sprites that do not name one
pub const DEFAULT_SPRITE_MATERIAL: &str = "/builtins/materials/sprite.material";

/// Named entity with a local transform and a typed payload
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identifier, unique within its tree
    pub id: String,

    /// Transform relative to the parent space
    pub transform: Transform,

    /// What the node carries
    pub payload: Payload,
}

impl Node {
    /// Create a node
    pub fn new(id: impl Into<String>, transform: Transform, payload: Payload) -> Self {
        Self {
            id: id.into(),
            transform,
            payload,
        }
    }

    /// Position relative to the parent space
    pub fn local_position(&self) -> &Vec3 {
        &self.transform.position
    }

    /// Rotation relative to the parent space
    pub fn local_rotation(&self) -> &Quat {
        &self.transform.rotation
    }

    /// Scale relative to the parent space
    pub fn local_scale(&self) -> &Vec3 {
        &self.transform.scale
    }

    /// The script reference, if this is the root node
    pub fn as_script(&self) -> Option<&ScriptRef> {
        match &self.payload {
            Payload::Script(script) => Some(script),
            Payload::Renderable(_) => None,
        }
    }

    /// The renderable descriptor, if this is an embedded node
    pub fn as_renderable(&self) -> Option<&Renderable> {
        match &self.payload {
            Payload::Renderable(renderable) => Some(renderable),
            Payload::Script(_) => None,
        }
    }
}

impl AbsDiffEq for Node {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        DEFAULT_EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.id == other.id
            && self.payload == other.payload
            && self.transform.abs_diff_eq(&other.transform, epsilon)
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Reference to external behavior logic; carried by the root only
    Script(ScriptRef),
    /// Something the host engine draws
    Renderable(Renderable),
}

/// Reference to a behavior script, opaque to the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRef {
    /// Asset path of the script
    pub component_path: String,

    /// Script property overrides in declaration order
    pub properties: Vec<PropertyOverride>,
}

impl ScriptRef {
    /// Reference a script with no property overrides
    pub fn new(component_path: impl Into<String>) -> Self {
        Self {
            component_path: component_path.into(),
            properties: Vec::new(),
        }
    }

    /// Builder pattern: Add a property override
    #[must_use]
    pub fn with_property(mut self, id: impl Into<String>, value: impl Into<String>, kind: PropertyType) -> Self {
        self.properties.push(PropertyOverride {
            id: id.into(),
            value: value.into(),
            kind,
        });
        self
    }
}

/// Override of a script property's declared default
///
/// The value keeps its source text; interpreting it is the script runtime's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyOverride {
    /// Property name
    pub id: String,
    /// Value as written
    pub value: String,
    /// Declared type
    pub kind: PropertyType,
}

/// Script property types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Floating-point number
    Number,
    /// Hashed string
    Hash,
    /// Address of another component or object
    Url,
    /// Three-component vector
    Vector3,
    /// Four-component vector
    Vector4,
    /// Quaternion
    Quat,
    /// Boolean
    Boolean,
}

impl PropertyType {
    const ALL: [Self; 7] = [
        Self::Number,
        Self::Hash,
        Self::Url,
        Self::Vector3,
        Self::Vector4,
        Self::Quat,
        Self::Boolean,
    ];

    /// Enum token used by the text format
    pub const fn token(self) -> &'static str {
        match self {
            Self::Number => "PROPERTY_TYPE_NUMBER",
            Self::Hash => "PROPERTY_TYPE_HASH",
            Self::Url => "PROPERTY_TYPE_URL",
            Self::Vector3 => "PROPERTY_TYPE_VECTOR3",
            Self::Vector4 => "PROPERTY_TYPE_VECTOR4",
            Self::Quat => "PROPERTY_TYPE_QUAT",
            Self::Boolean => "PROPERTY_TYPE_BOOLEAN",
        }
    }

    /// Look up a type by its enum token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Renderable descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    /// Atlas-backed sprite
    Sprite(Sprite),

    /// Renderable kind this crate does not model, kept verbatim
    Opaque {
        /// Kind tag, e.g. `"label"`
        kind: String,
        /// Raw descriptor text
        data: String,
    },
}

impl Renderable {
    /// Kind tag written to the `type` field
    pub fn kind(&self) -> &str {
        match self {
            Self::Sprite(_) => Sprite::KIND,
            Self::Opaque { kind, .. } => kind.as_str(),
        }
    }

    /// The sprite descriptor, if this is a sprite
    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            Self::Sprite(sprite) => Some(sprite),
            Self::Opaque { .. } => None,
        }
    }
}

/// Sprite drawn from a texture atlas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    /// Atlas or tile source path
    pub tile_set: String,
    /// Animation played on spawn
    pub default_animation: String,
    /// Material path
    pub material: String,
    /// Compositing mode
    pub blend_mode: BlendMode,
}

impl Sprite {
    /// Kind tag of sprite components
    pub const KIND: &'static str = "sprite";

    /// Create a sprite with the default material and alpha blending
    pub fn new(tile_set: impl Into<String>, default_animation: impl Into<String>) -> Self {
        Self {
            tile_set: tile_set.into(),
            default_animation: default_animation.into(),
            material: DEFAULT_SPRITE_MATERIAL.to_string(),
            blend_mode: BlendMode::default(),
        }
    }

    /// Builder pattern: Set material
    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    /// Builder pattern: Set blend mode
    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}

/// Compositing function used when drawing a renderable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Standard alpha blending
    #[default]
    Alpha,
    /// Additive blending
    Add,
    /// Additive blending weighted by source alpha
    AddAlpha,
    /// Multiplicative blending
    Mult,
    /// Screen blending
    Screen,
}

impl BlendMode {
    const ALL: [Self; 5] = [Self::Alpha, Self::Add, Self::AddAlpha, Self::Mult, Self::Screen];

    /// Enum token used by the text format
    pub const fn token(self) -> &'static str {
        match self {
            Self::Alpha => "BLEND_MODE_ALPHA",
            Self::Add => "BLEND_MODE_ADD",
            Self::AddAlpha => "BLEND_MODE_ADD_ALPHA",
            Self::Mult => "BLEND_MODE_MULT",
            Self::Screen => "BLEND_MODE_SCREEN",
        }
    }

    /// Look up a blend mode by its enum token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.token() == token)
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
