use glam::Mat4;
use helicity_common::{FillMode, ShapeKind, TransformStack};
use helicity_kernel::World;
use std::time::Duration;

use crate::camera::CameraState;
use crate::city;
use crate::models;
use crate::registry::PrimitiveRegistry;
use crate::scene::{DriveParams, SceneNode};

pub const MIN_TIME_SCALE: f32 = 0.1;
pub const MAX_TIME_SCALE: f32 = 8.0;

/// Presentation state owned by the front end: camera, fill mode and pacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub camera: CameraState,
    pub fill: FillMode,
    /// Viewport width over height.
    pub aspect: f32,
    /// While set, frames are drawn but the world does not advance.
    pub paused: bool,
    /// Simulation steps per rendered frame, in `[MIN_TIME_SCALE, MAX_TIME_SCALE]`.
    pub time_scale: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            camera: CameraState::default(),
            fill: FillMode::Solid,
            aspect: 16.0 / 9.0,
            paused: false,
            time_scale: 1.0,
        }
    }
}

impl ViewState {
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        tracing::info!(paused = self.paused, "animation toggled");
        self.paused
    }

    /// Multiply the time scale by `factor`, clamped to the allowed range.
    pub fn scale_time(&mut self, factor: f32) -> f32 {
        self.time_scale = (self.time_scale * factor).clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
        self.time_scale
    }
}

/// What the back end needs besides the draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub frame: u64,
    pub view: Mat4,
    pub projection: Mat4,
}

impl FrameInfo {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Owns the scene trees and the transform stack; renders one frame per call.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    city: SceneNode,
    helicopter: SceneNode,
    cargo: SceneNode,
    stack: TransformStack,
    /// Fractional simulation steps carried over between frames.
    step_budget: f32,
}

impl FrameDriver {
    /// Build the scene trees. The heliport is placed where the helicopter lands.
    pub fn new(world: &World) -> Self {
        Self {
            city: city::city(world.tuning().orbit_radius),
            helicopter: models::helicopter(),
            cargo: models::cargo_box(),
            stack: TransformStack::new(),
            step_budget: 0.0,
        }
    }

    /// Initialise every primitive kind the scene uses.
    pub fn init_primitives<R: PrimitiveRegistry + ?Sized>(&self, registry: &mut R) {
        for kind in ShapeKind::ALL {
            registry.init_primitive(kind);
        }
    }

    /// Advance the world, derive the camera and draw the scene.
    ///
    /// Each frame adds `time_scale` to a step budget and runs one world step
    /// of length `dt` per whole unit in it. A paused view steps nothing.
    pub fn render_frame<R: PrimitiveRegistry + ?Sized>(
        &mut self,
        world: &mut World,
        view: &ViewState,
        dt: Duration,
        registry: &mut R,
    ) -> FrameInfo {
        if !view.paused {
            self.step_budget += view.time_scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
            while self.step_budget >= 1.0 {
                world.step(dt);
                self.step_budget -= 1.0;
            }
        }
        let info = FrameInfo {
            frame: world.frame(),
            view: view.camera.view_matrix(world),
            projection: view.camera.projection(view.aspect),
        };
        registry.begin_frame();
        self.draw_scene(world, view.fill, registry);
        info
    }

    /// Draw city, helicopter and boxes for the current world state.
    pub fn draw_scene<R: PrimitiveRegistry + ?Sized>(
        &mut self,
        world: &World,
        fill: FillMode,
        registry: &mut R,
    ) {
        let Self {
            city,
            helicopter,
            cargo,
            stack,
            ..
        } = self;
        stack.reset(Mat4::IDENTITY);
        let heli = world.helicopter();
        let tuning = world.tuning();
        let params = DriveParams::from_helicopter(heli);

        city.draw(stack, &params, fill, registry);

        stack.scoped(|s| {
            heli.compose_orbit(s, tuning);
            heli.compose_body(s);
            helicopter.draw(s, &params, fill, registry);
        });

        for (_, b) in world.boxes().iter() {
            stack.scoped(|s| {
                s.translate(b.position());
                // Keep the box aligned with the path it drifts along.
                s.rotate_y(b.heading_at_release + b.drift_distance);
                cargo.draw(s, &params, fill, registry);
            });
        }
        debug_assert_eq!(stack.depth(), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DrawList;
    use glam::Vec3;
    use helicity_kernel::{ReleaseOutcome, VerticalIntent};

    const FRAME: Duration = Duration::from_millis(16);

    fn setup() -> (World, FrameDriver, DrawList) {
        let world = World::default();
        let driver = FrameDriver::new(&world);
        let mut list = DrawList::new();
        driver.init_primitives(&mut list);
        (world, driver, list)
    }

    #[test]
    fn render_frame_steps_once_and_draws_everything() {
        let (mut world, mut driver, mut list) = setup();
        let info = driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);
        assert_eq!(info.frame, 1);
        assert_eq!(world.frame(), 1);
        assert_eq!(
            list.len(),
            driver.city.leaf_count() + driver.helicopter.leaf_count()
        );
        assert_eq!(list.skipped(), 0);
    }

    #[test]
    fn each_frame_replaces_the_previous_draws() {
        let (mut world, mut driver, mut list) = setup();
        driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);
        let first = list.len();
        driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);
        assert_eq!(list.len(), first);
    }

    #[test]
    fn boxes_are_drawn_at_their_positions() {
        let (mut world, mut driver, mut list) = setup();
        world.set_vertical_intent(VerticalIntent::Ascend);
        for _ in 0..40 {
            driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);
        }
        assert!(matches!(world.release_box(), ReleaseOutcome::Released { .. }));
        driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);

        let base = driver.city.leaf_count() + driver.helicopter.leaf_count();
        assert_eq!(list.len(), base + 1);
        let (_, b) = world.boxes().iter().next().unwrap();
        let drawn = list.commands()[base].model.transform_point3(Vec3::ZERO);
        assert!(drawn.abs_diff_eq(b.position(), 1e-4));
    }

    #[test]
    fn released_box_starts_clear_of_the_cabin() {
        let (mut world, mut driver, mut list) = setup();
        world.set_vertical_intent(VerticalIntent::Ascend);
        for _ in 0..60 {
            driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);
        }
        assert!(matches!(world.release_box(), ReleaseOutcome::Released { .. }));
        list.begin_frame();
        driver.draw_scene(&world, FillMode::Solid, &mut list);

        let first_part = driver.city.leaf_count();
        // main rotor hub and blades come first, then the cabin
        let cabin = list.commands()[first_part + 4];
        assert_eq!(cabin.kind, ShapeKind::Sphere);
        let cabin_bottom = cabin.model.transform_point3(Vec3::new(0.0, -0.5, 0.0)).y;
        let cargo = list.commands()[first_part + driver.helicopter.leaf_count()];
        let box_top = cargo.model.transform_point3(Vec3::new(0.0, 0.5, 0.0)).y;
        assert!(box_top <= cabin_bottom + 1e-4, "{box_top} > {cabin_bottom}");
    }

    #[test]
    fn paused_view_draws_without_stepping() {
        let (mut world, mut driver, mut list) = setup();
        let mut view = ViewState::default();
        world.set_vertical_intent(VerticalIntent::Ascend);
        assert!(view.toggle_pause());
        let before = world.state_hash();
        for _ in 0..10 {
            driver.render_frame(&mut world, &view, FRAME, &mut list);
        }
        assert_eq!(world.frame(), 0);
        assert_eq!(world.state_hash(), before);
        assert!(!list.is_empty());

        assert!(!view.toggle_pause());
        driver.render_frame(&mut world, &view, FRAME, &mut list);
        assert_eq!(world.frame(), 1);
    }

    #[test]
    fn time_scale_sets_steps_per_frame() {
        let (mut world, mut driver, mut list) = setup();
        let fast = ViewState {
            time_scale: 2.0,
            ..ViewState::default()
        };
        for _ in 0..5 {
            driver.render_frame(&mut world, &fast, FRAME, &mut list);
        }
        assert_eq!(world.frame(), 10);
        assert_eq!(world.clock(), FRAME * 10);

        let slow = ViewState {
            time_scale: 0.5,
            ..ViewState::default()
        };
        for _ in 0..6 {
            driver.render_frame(&mut world, &slow, FRAME, &mut list);
        }
        assert_eq!(world.frame(), 13);
    }

    #[test]
    fn time_scale_is_clamped() {
        let mut view = ViewState::default();
        for _ in 0..100 {
            view.scale_time(1.1);
        }
        assert_eq!(view.time_scale, MAX_TIME_SCALE);
        for _ in 0..100 {
            view.scale_time(1.0 / 1.1);
        }
        assert_eq!(view.time_scale, MIN_TIME_SCALE);
    }

    #[test]
    fn wireframe_reaches_every_draw() {
        let (mut world, mut driver, mut list) = setup();
        let view = ViewState {
            fill: FillMode::Wireframe,
            ..ViewState::default()
        };
        driver.render_frame(&mut world, &view, FRAME, &mut list);
        assert!(list.commands().iter().all(|c| c.fill == FillMode::Wireframe));
    }

    #[test]
    fn helicopter_is_drawn_around_its_origin() {
        let (mut world, mut driver, mut list) = setup();
        world.set_vertical_intent(VerticalIntent::Ascend);
        world.set_moving(true);
        for _ in 0..20 {
            driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut list);
        }
        let origin = world.helicopter().position;
        let first_part = driver.city.leaf_count();
        let hub = list.commands()[first_part].model.transform_point3(Vec3::ZERO);
        assert!(hub.distance(origin) < 4.0);
    }

    #[test]
    fn uninitialised_registry_draws_nothing() {
        let (mut world, mut driver, _) = setup();
        let mut bare = DrawList::new();
        driver.render_frame(&mut world, &ViewState::default(), FRAME, &mut bare);
        assert!(bare.is_empty());
        assert!(bare.skipped() > 0);
    }
}
