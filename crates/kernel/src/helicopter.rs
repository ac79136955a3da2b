use glam::{Mat4, Vec3};
use helicity_common::TransformStack;
use serde::{Deserialize, Serialize};

use crate::config::Tuning;

/// Model units to world units.
pub const MODEL_SCALE: f32 = 0.2;
/// Lift (model units) that puts the bottom of the skids on the helicopter origin.
pub const SKID_LIFT: f32 = 14.5;
/// The model's nose points down -X; this turn lines it up with the direction of flight.
pub const FACING_OFFSET_DEG: f32 = -90.0;

/// Held vertical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalIntent {
    Ascend,
    Descend,
    #[default]
    Hold,
}

impl VerticalIntent {
    /// +1 ascending, -1 descending, 0 holding.
    pub fn sign(self) -> f32 {
        match self {
            Self::Ascend => 1.0,
            Self::Descend => -1.0,
            Self::Hold => 0.0,
        }
    }
}

/// Intents held by the pilot between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlightIntent {
    pub vertical: VerticalIntent,
    pub moving: bool,
}

/// Helicopter flight state. Advanced once per frame by [`Helicopter::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Helicopter {
    pub height: f32,
    pub speed: f32,
    /// Position along the circular flight path, degrees in `[0, 360)`.
    pub heading_deg: f32,
    /// Forward lean, always `speed * incline_multiplier`.
    pub tilt_deg: f32,
    /// Main rotor angle, degrees in `[0, 360)`.
    pub propeller_deg: f32,
    pub propeller_speed: f32,
    /// World-space origin captured at the end of the last step.
    pub position: Vec3,
}

impl Helicopter {
    /// A landed, stationary helicopter at heading 0.
    pub fn landed(tuning: &Tuning) -> Self {
        let mut heli = Self {
            height: tuning.min_height,
            speed: 0.0,
            heading_deg: 0.0,
            tilt_deg: 0.0,
            propeller_deg: 0.0,
            propeller_speed: 0.0,
            position: Vec3::ZERO,
        };
        heli.capture_position(tuning);
        heli
    }

    pub fn is_grounded(&self, tuning: &Tuning) -> bool {
        self.height <= tuning.min_height
    }

    /// Advance one frame. The order of the updates matters: heading uses the
    /// speed of the previous frame, and the propeller reads the new height.
    pub fn step(&mut self, intent: FlightIntent, tuning: &Tuning) {
        self.heading_deg = (self.heading_deg + self.speed).rem_euclid(360.0);

        match intent.vertical {
            VerticalIntent::Ascend => {
                self.height = (self.height + tuning.height_change).min(tuning.max_height);
            }
            VerticalIntent::Descend => {
                let floor = if intent.moving {
                    // Never lifts a helicopter that is already lower.
                    tuning.min_movement_height.min(self.height)
                } else {
                    tuning.min_height
                };
                self.height = (self.height - tuning.height_change).max(floor);
            }
            VerticalIntent::Hold => {}
        }
        self.height = self.height.clamp(tuning.min_height, tuning.max_height);

        self.speed = if intent.moving {
            (self.speed + tuning.speed_change).min(tuning.max_speed)
        } else {
            (self.speed - tuning.speed_change).max(0.0)
        };

        self.propeller_speed = if self.is_grounded(tuning) {
            0.0
        } else {
            tuning.propeller_base_speed + tuning.propeller_climb_bonus * intent.vertical.sign().abs()
        };
        self.propeller_deg = (self.propeller_deg + self.propeller_speed).rem_euclid(360.0);

        self.tilt_deg = self.speed * tuning.incline_multiplier;

        self.capture_position(tuning);
    }

    /// Heading rotation, orbit radius and height: the helicopter's origin frame.
    pub fn compose_orbit(&self, stack: &mut TransformStack, tuning: &Tuning) {
        stack.rotate_y(self.heading_deg);
        stack.translate(Vec3::new(tuning.orbit_radius, self.height, 0.0));
    }

    /// Facing, tilt, model scale and skid lift, applied under the orbit frame.
    pub fn compose_body(&self, stack: &mut TransformStack) {
        stack.rotate_y(FACING_OFFSET_DEG);
        stack.rotate_z(self.tilt_deg);
        stack.scale(Vec3::splat(MODEL_SCALE));
        stack.translate(Vec3::new(0.0, SKID_LIFT, 0.0));
    }

    /// Full model matrix of the helicopter in world space.
    pub fn model_matrix(&self, tuning: &Tuning) -> Mat4 {
        let mut stack = TransformStack::new();
        self.compose_orbit(&mut stack, tuning);
        self.compose_body(&mut stack);
        stack.current()
    }

    fn capture_position(&mut self, tuning: &Tuning) {
        let mut stack = TransformStack::new();
        self.compose_orbit(&mut stack, tuning);
        self.position = stack.origin();
    }
}
