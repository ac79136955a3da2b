//! Simulation tunables. Loaded from JSON; every field falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound accepted for the box slot capacity.
pub const MAX_BOX_SLOTS: usize = 256;

/// Errors from loading or validating a [`Tuning`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Flight, box and orbit constants.
///
/// Per-frame quantities (steps, speeds) are expressed per rendered frame, not
/// per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Heading degrees advanced per frame at full speed.
    pub max_speed: f32,
    pub max_height: f32,
    /// Height of a landed helicopter.
    pub min_height: f32,
    /// Lowest height a descent may reach while moving forward.
    pub min_movement_height: f32,
    /// Tilt degrees per unit of speed.
    pub incline_multiplier: f32,
    pub height_change: f32,
    pub speed_change: f32,
    /// Rotor degrees per frame while airborne.
    pub propeller_base_speed: f32,
    /// Extra rotor degrees per frame while climbing or descending.
    pub propeller_climb_bonus: f32,
    /// Distance of the flight path from the city centre.
    pub orbit_radius: f32,

    /// Per-frame growth factor of a box's fall speed (> 1).
    pub gravitational_acceleration: f32,
    /// Per-frame decay factor of a box's drift speed (< 1).
    pub air_friction: f32,
    pub min_box_height: f32,
    /// Minimum helicopter height for a release.
    pub release_min_height: f32,
    /// Vertical offset below the helicopter where a box appears.
    pub release_drop: f32,
    pub initial_box_speed: f32,
    pub box_lifetime_ms: u64,
    pub max_boxes: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_speed: 1.5,
            max_height: 35.0,
            min_height: 3.0 / 40.0,
            min_movement_height: 1.5,
            incline_multiplier: 20.0,
            height_change: 0.2,
            speed_change: 0.05,
            propeller_base_speed: 30.0,
            propeller_climb_bonus: 15.0,
            orbit_radius: 30.0,
            gravitational_acceleration: 1.1,
            air_friction: 0.9,
            min_box_height: 1.5,
            release_min_height: 4.0,
            release_drop: 1.5,
            initial_box_speed: 0.1,
            box_lifetime_ms: 5000,
            max_boxes: 10,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&data)?;
        tracing::info!("tuning loaded from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !(self.min_height >= 0.0 && self.min_height < self.max_height) {
            return Err(invalid("min_height", "must be non-negative and below max_height"));
        }
        if !(self.min_height..=self.max_height).contains(&self.min_movement_height) {
            return Err(invalid(
                "min_movement_height",
                "must lie between min_height and max_height",
            ));
        }
        if self.max_speed <= 0.0 {
            return Err(invalid("max_speed", "must be positive"));
        }
        if self.height_change <= 0.0 {
            return Err(invalid("height_change", "must be positive"));
        }
        if self.speed_change <= 0.0 {
            return Err(invalid("speed_change", "must be positive"));
        }
        if self.propeller_base_speed <= 0.0 {
            return Err(invalid("propeller_base_speed", "must be positive"));
        }
        if self.gravitational_acceleration <= 1.0 {
            return Err(invalid("gravitational_acceleration", "must be greater than 1"));
        }
        if !(self.air_friction > 0.0 && self.air_friction < 1.0) {
            return Err(invalid("air_friction", "must lie strictly between 0 and 1"));
        }
        // A box is 2 * min_box_height tall; its top must clear the skids.
        if self.release_drop < self.min_box_height {
            return Err(invalid("release_drop", "must be at least min_box_height"));
        }
        if self.initial_box_speed <= 0.0 {
            return Err(invalid("initial_box_speed", "must be positive"));
        }
        if self.max_boxes > MAX_BOX_SLOTS {
            return Err(invalid(
                "max_boxes",
                format!("must not exceed {MAX_BOX_SLOTS}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let t = Tuning::default();
        assert!(t.validate().is_ok());
        assert_eq!(t.max_speed, 1.5);
        assert_eq!(t.min_height, 0.075);
        assert_eq!(t.box_lifetime_ms, 5000);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let t = Tuning::from_json_str(r#"{ "max_boxes": 3, "max_height": 20.0 }"#).unwrap();
        assert_eq!(t.max_boxes, 3);
        assert_eq!(t.max_height, 20.0);
        assert_eq!(t.speed_change, Tuning::default().speed_change);
    }

    #[test]
    fn empty_object_is_default() {
        let t = Tuning::from_json_str("{}").unwrap();
        assert_eq!(t, Tuning::default());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Tuning::from_json_str("{ max_boxes: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn friction_out_of_range_is_rejected() {
        let err = Tuning::from_json_str(r#"{ "air_friction": 1.2 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "air_friction", .. }));
    }

    #[test]
    fn inverted_height_bounds_are_rejected() {
        let t = Tuning {
            min_height: 40.0,
            ..Tuning::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn release_drop_must_clear_the_box_half_height() {
        let err = Tuning::from_json_str(r#"{ "release_drop": 0.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "release_drop", .. }));
        let t = Tuning::default();
        assert!(t.release_drop >= t.min_box_height);
    }

    #[test]
    fn json_round_trip() {
        let t = Tuning {
            max_boxes: 7,
            ..Tuning::default()
        };
        let json = t.to_json_pretty().unwrap();
        assert_eq!(Tuning::from_json_str(&json).unwrap(), t);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Tuning::load("/nonexistent/helicity/tuning.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
