//! Parse options
//!
//! Options are plain serde data so a project can keep them next to its assets
//! in a `.toml` or `.ron` file and load them with [`Config`].

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::{Quat, Quaternion, Transform, Vec3, DEFAULT_EPSILON};
use crate::scene::ParseError;

/// What to do with a rotation whose magnitude is not close to 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Fail with [`ParseError::InvalidTransform`]
    #[default]
    Reject,
    /// Re-normalize; zero-length rotations still fail
    Normalize,
}

/// Options controlling parsing and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Reject unknown records and fields instead of skipping them
    pub strict: bool,

    /// Handling of non-unit rotations
    pub rotation_policy: RotationPolicy,

    /// Allowed distance of a rotation's magnitude from 1
    pub rotation_tolerance: f32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: true,
            rotation_policy: RotationPolicy::Reject,
            rotation_tolerance: DEFAULT_EPSILON,
        }
    }
}

impl Config for ParseOptions {}

impl ParseOptions {
    /// Options that skip unknown fields and keep unrecognised renderables opaque
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Builder pattern: Set rotation policy
    #[must_use]
    pub fn with_rotation_policy(mut self, policy: RotationPolicy) -> Self {
        self.rotation_policy = policy;
        self
    }

    /// Check a raw quaternion against the rotation policy
    ///
    /// Rotations within tolerance are kept exactly as given.
    pub fn validate_rotation(&self, raw: Quaternion<f32>) -> Result<Quat, String> {
        if !raw.coords.iter().all(|v| v.is_finite()) {
            return Err("rotation components must be finite".to_string());
        }

        let magnitude = raw.norm();
        if (magnitude - 1.0).abs() <= self.rotation_tolerance {
            return Ok(Quat::new_unchecked(raw));
        }

        match self.rotation_policy {
            RotationPolicy::Normalize if magnitude > f32::EPSILON => Ok(Quat::new_normalize(raw)),
            RotationPolicy::Normalize => Err("zero-length rotation cannot be normalized".to_string()),
            RotationPolicy::Reject => Err(format!(
                "rotation magnitude {magnitude} is not within {} of 1",
                self.rotation_tolerance
            )),
        }
    }

    /// Validate the parts of a local transform for the node at `record`
    pub(crate) fn validate_transform(
        &self,
        record: usize,
        position: Vec3,
        rotation: Quaternion<f32>,
        scale: Vec3,
    ) -> Result<Transform, ParseError> {
        let invalid = |field: &str, reason: String| ParseError::InvalidTransform {
            record,
            field: field.to_string(),
            reason,
        };

        if !position.iter().all(|v| v.is_finite()) {
            return Err(invalid("position", "position components must be finite".to_string()));
        }
        if !scale.iter().all(|v| v.is_finite()) {
            return Err(invalid("scale", "scale components must be finite".to_string()));
        }
        let rotation = self
            .validate_rotation(rotation)
            .map_err(|reason| invalid("rotation", reason))?;

        Ok(Transform::from_position_rotation(position, rotation).with_scale(scale))
    }
}
