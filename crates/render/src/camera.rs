use glam::{Mat4, Vec3};
use helicity_kernel::World;
use serde::{Deserialize, Serialize};

use crate::city::CITY_WIDTH;

/// Cockpit point in helicopter model units, just ahead of the cabin.
const COCKPIT: Vec3 = Vec3::new(-12.0, -5.0, 0.0);
/// The model's nose direction.
const MODEL_FORWARD: Vec3 = Vec3::NEG_X;
const FIRST_PERSON_FOV_DEG: f32 = 60.0;
const FIRST_PERSON_NEAR: f32 = 0.1;

pub const DEFAULT_GAMMA_DEG: f32 = 30.0;
pub const DEFAULT_THETA_DEG: f32 = -30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedView {
    Front,
    Top,
    Right,
}

impl FixedView {
    pub fn view_matrix(self) -> Mat4 {
        let w = CITY_WIDTH;
        match self {
            Self::Front => Mat4::look_at_rh(Vec3::new(0.0, 0.0, w), Vec3::ZERO, Vec3::Y),
            Self::Top => Mat4::look_at_rh(Vec3::new(0.0, w, 0.0), Vec3::ZERO, Vec3::NEG_Z),
            Self::Right => Mat4::look_at_rh(Vec3::new(w, 0.0, 0.0), Vec3::ZERO, Vec3::Y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    Axonometric,
    Fixed(FixedView),
    FirstPerson,
}

impl CameraMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Axonometric => "axonometric",
            Self::Fixed(FixedView::Front) => "front",
            Self::Fixed(FixedView::Top) => "top",
            Self::Fixed(FixedView::Right) => "right",
            Self::FirstPerson => "first-person",
        }
    }
}

/// Active camera mode plus the axonometric angles, which persist across
/// mode switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    mode: CameraMode,
    gamma_deg: f32,
    theta_deg: f32,
    /// View of the last selected fixed mode, computed at selection.
    fixed_view: Mat4,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            mode: CameraMode::Axonometric,
            gamma_deg: DEFAULT_GAMMA_DEG,
            theta_deg: DEFAULT_THETA_DEG,
            fixed_view: FixedView::Front.view_matrix(),
        }
    }
}

impl CameraState {
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn gamma_deg(&self) -> f32 {
        self.gamma_deg
    }

    pub fn theta_deg(&self) -> f32 {
        self.theta_deg
    }

    pub fn select(&mut self, mode: CameraMode) {
        if let CameraMode::Fixed(view) = mode {
            self.fixed_view = view.view_matrix();
        }
        if self.mode != mode {
            tracing::info!(mode = mode.label(), "camera selected");
        }
        self.mode = mode;
    }

    /// Set the axonometric elevation angle and switch to axonometric.
    pub fn set_gamma(&mut self, degrees: f32) {
        self.gamma_deg = degrees;
        self.select(CameraMode::Axonometric);
    }

    /// Set the axonometric azimuth angle and switch to axonometric.
    pub fn set_theta(&mut self, degrees: f32) {
        self.theta_deg = degrees;
        self.select(CameraMode::Axonometric);
    }

    /// View matrix for the current mode, derived from the post-step world.
    pub fn view_matrix(&self, world: &World) -> Mat4 {
        match self.mode {
            CameraMode::Axonometric => axonometric(self.gamma_deg, self.theta_deg),
            CameraMode::Fixed(_) => self.fixed_view,
            CameraMode::FirstPerson => first_person(world),
        }
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        let w = CITY_WIDTH;
        match self.mode {
            CameraMode::FirstPerson => Mat4::perspective_rh(
                FIRST_PERSON_FOV_DEG.to_radians(),
                aspect,
                FIRST_PERSON_NEAR,
                6.0 * w,
            ),
            _ => Mat4::orthographic_rh(-w * aspect, w * aspect, -w, w, -3.0 * w, 3.0 * w),
        }
    }
}

fn axonometric(gamma_deg: f32, theta_deg: f32) -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 0.0, CITY_WIDTH), Vec3::ZERO, Vec3::Y)
        * Mat4::from_rotation_x(gamma_deg.to_radians())
        * Mat4::from_rotation_y(theta_deg.to_radians())
}

/// Camera riding in the cockpit. The model matrix carries heading, scale,
/// facing offset and tilt, so the view pitches with the helicopter.
fn first_person(world: &World) -> Mat4 {
    let model = world.helicopter().model_matrix(world.tuning());
    let eye = model.transform_point3(COCKPIT);
    let target = model.transform_point3(COCKPIT + MODEL_FORWARD);
    let up = model.transform_vector3(Vec3::Y).normalize();
    Mat4::look_at_rh(eye, target, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helicity_kernel::VerticalIntent;
    use std::time::Duration;

    fn flying_world() -> World {
        let mut w = World::default();
        w.set_vertical_intent(VerticalIntent::Ascend);
        w.set_moving(true);
        for _ in 0..60 {
            w.step(Duration::from_millis(16));
        }
        w
    }

    #[test]
    fn axonometric_with_zero_angles_is_front_view() {
        let cam = CameraState::default();
        let front = FixedView::Front.view_matrix();
        assert!(axonometric(0.0, 0.0).abs_diff_eq(front, 1e-6));
        assert_eq!(cam.mode(), CameraMode::Axonometric);
    }

    #[test]
    fn sliders_force_axonometric_and_angles_persist() {
        let w = World::default();
        let mut cam = CameraState::default();
        cam.select(CameraMode::Fixed(FixedView::Top));
        cam.set_gamma(10.0);
        assert_eq!(cam.mode(), CameraMode::Axonometric);
        cam.set_theta(20.0);
        cam.select(CameraMode::FirstPerson);
        cam.select(CameraMode::Axonometric);
        assert_eq!(cam.gamma_deg(), 10.0);
        assert_eq!(cam.theta_deg(), 20.0);
        assert!(cam.view_matrix(&w).abs_diff_eq(axonometric(10.0, 20.0), 1e-6));
    }

    #[test]
    fn top_view_looks_down() {
        let w = World::default();
        let mut cam = CameraState::default();
        cam.select(CameraMode::Fixed(FixedView::Top));
        let view = cam.view_matrix(&w);
        // A point above the origin is closer to the camera, i.e. less negative z.
        let high = view.transform_point3(Vec3::new(0.0, 10.0, 0.0));
        let low = view.transform_point3(Vec3::ZERO);
        assert!(high.z > low.z);
        // -Z in the world is up on screen.
        assert!(view.transform_point3(Vec3::new(0.0, 0.0, -10.0)).y > 0.0);
    }

    #[test]
    fn fixed_view_is_cached_at_selection() {
        let mut cam = CameraState::default();
        cam.select(CameraMode::Fixed(FixedView::Right));
        let a = cam.view_matrix(&World::default());
        let b = cam.view_matrix(&flying_world());
        assert_eq!(a, b);
        assert_eq!(a, FixedView::Right.view_matrix());
    }

    #[test]
    fn first_person_eye_is_ahead_of_helicopter() {
        let w = flying_world();
        let mut cam = CameraState::default();
        cam.select(CameraMode::FirstPerson);
        let view = cam.view_matrix(&w);

        let eye = view.inverse().transform_point3(Vec3::ZERO);
        let heli = w.helicopter();
        assert!(eye.distance(heli.position) < 5.0);

        // Points along the flight direction are in front of the camera (-Z in view space).
        let heading = heli.heading_deg.to_radians();
        let tangent = Vec3::new(-heading.sin(), 0.0, -heading.cos());
        let ahead = view.transform_point3(heli.position + tangent * 20.0);
        assert!(ahead.z < 0.0);
    }

    #[test]
    fn switching_camera_leaves_world_untouched() {
        let w = flying_world();
        let before = w.state_hash();
        let mut cam = CameraState::default();
        for mode in [
            CameraMode::Fixed(FixedView::Front),
            CameraMode::Fixed(FixedView::Top),
            CameraMode::Fixed(FixedView::Right),
            CameraMode::FirstPerson,
            CameraMode::Axonometric,
        ] {
            cam.select(mode);
            let _ = cam.view_matrix(&w);
        }
        assert_eq!(w.state_hash(), before);
    }

    #[test]
    fn orthographic_projection_spans_city() {
        let cam = CameraState::default();
        let p = cam.projection(2.0);
        let corner = p.transform_point3(Vec3::new(2.0 * CITY_WIDTH, CITY_WIDTH, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, corner.z), 1e-5));
    }
}
