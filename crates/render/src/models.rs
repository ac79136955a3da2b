//! Helicopter and cargo box trees.
//!
//! The helicopter is modelled in its own units with the nose along -X and the
//! bottom of the skids at `y = -SKID_LIFT`; the kernel's body transform scales
//! and places it.

use helicity_common::{Axis, Color, ShapeKind};

use crate::scene::{Driver, SceneNode};

const MAIN_BLADES: usize = 3;
const TAIL_BLADES: usize = 2;
/// Side of the cargo box in world units. Twice the resting height, so a landed
/// box sits on the ground.
pub const BOX_SIZE: f32 = 3.0;

const FUSELAGE: Color = Color::rgb(0.8, 0.15, 0.1);
const TAIL: Color = Color::rgb(0.7, 0.12, 0.08);
const ROTOR_HUB: Color = Color::rgb(0.25, 0.25, 0.25);
const BLADE: Color = Color::rgb(0.15, 0.15, 0.15);
const GEAR: Color = Color::rgb(0.6, 0.6, 0.6);
const CARGO: Color = Color::rgb(0.7, 0.5, 0.25);

pub fn helicopter() -> SceneNode {
    SceneNode::group(vec![main_rotor(), fuselage(), tail_rotor(), landing_gear()])
}

/// A single cube leaf sized [`BOX_SIZE`].
pub fn cargo_box() -> SceneNode {
    SceneNode::leaf(ShapeKind::Cube, CARGO).scale(BOX_SIZE, BOX_SIZE, BOX_SIZE)
}

fn main_rotor() -> SceneNode {
    let mut blades = Vec::with_capacity(MAIN_BLADES);
    for i in 0..MAIN_BLADES {
        blades.push(
            SceneNode::leaf(ShapeKind::Sphere, BLADE)
                .rotate(Axis::Y, i as f32 * 360.0 / MAIN_BLADES as f32)
                .translate(8.0, 0.0, 0.0)
                .scale(16.0, 1.0, 1.0),
        );
    }
    SceneNode::group(vec![
        SceneNode::leaf(ShapeKind::Cylinder, ROTOR_HUB).scale(2.0 / 3.0, 2.5, 2.0 / 3.0),
        SceneNode::group(blades).translate(0.0, 0.5, 0.0),
    ])
    .translate(0.0, -0.5, 0.0)
    .spin(Axis::Y, Driver::MainRotor)
}

fn fuselage() -> SceneNode {
    SceneNode::group(vec![
        // cabin
        SceneNode::leaf(ShapeKind::Sphere, FUSELAGE)
            .translate(-1.0, -6.5, 0.0)
            .scale(20.0, 10.0, 10.0),
        // tail boom
        SceneNode::leaf(ShapeKind::Sphere, FUSELAGE)
            .translate(14.0, -5.0, 0.0)
            .scale(20.0, 3.0, 2.0),
        // fin
        SceneNode::leaf(ShapeKind::Sphere, TAIL)
            .translate(23.0, -3.5, 0.0)
            .rotate(Axis::Z, 70.0)
            .scale(5.0, 3.0, 2.0),
    ])
}

fn tail_rotor() -> SceneNode {
    let mut blades = Vec::with_capacity(TAIL_BLADES);
    for i in 0..TAIL_BLADES {
        let side = if i % 2 == 0 { 1.5 } else { -1.5 };
        blades.push(
            SceneNode::leaf(ShapeKind::Sphere, BLADE)
                .translate(side, 0.0, 0.0)
                .scale(3.5, 0.5, 0.5),
        );
    }
    SceneNode::group(vec![
        SceneNode::leaf(ShapeKind::Cylinder, ROTOR_HUB).scale(2.0 / 3.0, 1.5, 2.0 / 3.0),
        SceneNode::group(blades).translate(0.0, 0.5, 0.0),
    ])
    .translate(23.0, -3.5, 1.0)
    .spin(Axis::Z, Driver::TailRotor)
    .rotate(Axis::X, 90.0)
}

fn landing_gear() -> SceneNode {
    let mut parts = Vec::with_capacity(6);
    for (x, lean) in [(-5.0, -15.0), (3.0, 15.0)] {
        for z in [4.0_f32, -4.0] {
            parts.push(
                SceneNode::leaf(ShapeKind::Cube, GEAR)
                    .translate(x, -12.0, z)
                    .rotate(Axis::X, -20.0 * z.signum())
                    .rotate(Axis::Z, lean)
                    .scale(2.0 / 3.0, 5.0, 2.0 / 3.0),
            );
        }
    }
    for z in [4.8, -4.8] {
        parts.push(
            SceneNode::leaf(ShapeKind::Cylinder, GEAR)
                .translate(0.0, -14.0, z)
                .rotate(Axis::Z, 90.0)
                .scale(1.0, 20.0, 1.0),
        );
    }
    SceneNode::group(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DrawList;
    use crate::scene::DriveParams;
    use glam::Vec3;
    use helicity_common::{FillMode, TransformStack};
    use helicity_kernel::helicopter::SKID_LIFT;

    fn draw(node: &SceneNode, params: &DriveParams) -> DrawList {
        let mut stack = TransformStack::new();
        let mut list = DrawList::with_all_primitives();
        node.draw(&mut stack, params, FillMode::Solid, &mut list);
        list
    }

    #[test]
    fn helicopter_part_count() {
        // rotor hub + 3 blades, 3 body parts, tail hub + 2 blades, 4 legs + 2 skids
        assert_eq!(helicopter().leaf_count(), 4 + 3 + 3 + 6);
    }

    #[test]
    fn skids_touch_the_model_floor() {
        let list = draw(&landing_gear(), &DriveParams::default());
        let skid = list.commands()[4];
        assert_eq!(skid.kind, ShapeKind::Cylinder);
        // Local -X turns into -Y under the 90 degree roll.
        let bottom = skid.model.transform_point3(Vec3::new(-0.5, 0.0, 0.0));
        assert!((bottom.y + SKID_LIFT).abs() < 1e-4, "{bottom:?}");
    }

    #[test]
    fn main_blades_are_evenly_spaced_and_spin() {
        let still = draw(&main_rotor(), &DriveParams::default());
        let spun = draw(
            &main_rotor(),
            &DriveParams {
                main_rotor_deg: 90.0,
                tail_rotor_deg: 0.0,
            },
        );
        let tip = |list: &DrawList, i: usize| list.commands()[1 + i].model.transform_point3(Vec3::ZERO);

        assert!(tip(&still, 0).abs_diff_eq(Vec3::new(8.0, 0.0, 0.0), 1e-4));
        let r1 = tip(&still, 1);
        assert!((r1.x + 4.0).abs() < 1e-3 && (r1.z + 8.0 * 60f32.to_radians().sin()).abs() < 1e-3);
        assert!(tip(&spun, 0).abs_diff_eq(Vec3::new(0.0, 0.0, -8.0), 1e-4));
    }

    #[test]
    fn tail_rotor_ignores_main_rotor_angle() {
        let params = DriveParams {
            main_rotor_deg: 45.0,
            tail_rotor_deg: 0.0,
        };
        let a = draw(&tail_rotor(), &params);
        let b = draw(&tail_rotor(), &DriveParams::default());
        assert_eq!(a.commands(), b.commands());
    }

    #[test]
    fn cargo_box_rests_on_ground_at_min_box_height() {
        let list = draw(&cargo_box(), &DriveParams::default());
        let bottom = list.commands()[0]
            .model
            .transform_point3(Vec3::new(0.0, -0.5, 0.0));
        let resting = helicity_kernel::Tuning::default().min_box_height;
        assert!((bottom.y + resting).abs() < 1e-6);
    }
}
