//! The static city: ground, roads, sidewalks, buildings, houses, trees and the
//! heliport the helicopter takes off from.
//!
//! Every repeated element comes from a loop over a compile-time count.

use helicity_common::{Axis, Color, ShapeKind};

use crate::scene::SceneNode;

/// Half the side of the square city, in world units.
pub const CITY_WIDTH: f32 = 50.0;

const ROAD_WIDTH: f32 = 6.0;
/// The east arm of the east-west road stops short of the heliport plaza.
const ROAD_EAST_END: f32 = 18.0;
const LANE_STRIPES: usize = 10;

const BLOCK_INNER: f32 = 4.0;
const BLOCK_OUTER: f32 = 49.0;
const SIDEWALK_TILES_PER_SIDE: usize = 12;
const SIDEWALK_DEPTH: f32 = 2.0;

const WINDOW_ROWS: usize = 6;
const WINDOW_COLUMNS: usize = 3;

const TREE_TIERS: usize = 3;
const ORNAMENTS_PER_RING: usize = 6;

const GRASS: Color = Color::rgb(0.25, 0.5, 0.2);
const ASPHALT: Color = Color::rgb(0.2, 0.2, 0.22);
const STRIPE: Color = Color::rgb(0.95, 0.95, 0.85);
const PAVEMENT_LIGHT: Color = Color::rgb(0.7, 0.7, 0.68);
const PAVEMENT_DARK: Color = Color::rgb(0.55, 0.55, 0.53);
const WINDOW: Color = Color::rgb(0.95, 0.9, 0.5);
const HOUSE_WALL: Color = Color::rgb(0.9, 0.85, 0.7);
const ROOF_TILE: Color = Color::rgb(0.6, 0.2, 0.15);
const DOOR: Color = Color::rgb(0.4, 0.25, 0.1);
const PAD: Color = Color::rgb(0.3, 0.3, 0.3);
const PAD_RING: Color = Color::rgb(0.95, 0.8, 0.1);
const PAD_MARK: Color = Color::WHITE;
const TRUNK: Color = Color::rgb(0.45, 0.3, 0.15);
const NEEDLES: Color = Color::rgb(0.1, 0.45, 0.15);
const STAR: Color = Color::rgb(1.0, 0.85, 0.0);
const ORNAMENTS: [Color; 3] = [
    Color::rgb(0.9, 0.1, 0.1),
    Color::rgb(0.1, 0.3, 0.9),
    Color::rgb(0.95, 0.95, 0.95),
];

struct Building {
    x: f32,
    z: f32,
    width: f32,
    height: f32,
    color: Color,
}

struct House {
    x: f32,
    z: f32,
    yaw: f32,
}

#[rustfmt::skip]
const BUILDINGS: [Building; 6] = [
    Building { x: -12.0, z: -12.0, width: 8.0, height: 18.0, color: Color::rgb(0.55, 0.6, 0.7) },
    Building { x: -40.0, z: -14.0, width: 7.0, height: 12.0, color: Color::rgb(0.7, 0.55, 0.5) },
    Building { x: -14.0, z: -40.0, width: 7.0, height: 14.0, color: Color::rgb(0.6, 0.6, 0.6) },
    Building { x: 12.0, z: 12.0, width: 8.0, height: 22.0, color: Color::rgb(0.45, 0.5, 0.6) },
    Building { x: 40.0, z: 14.0, width: 7.0, height: 10.0, color: Color::rgb(0.75, 0.7, 0.6) },
    Building { x: 14.0, z: 40.0, width: 7.0, height: 16.0, color: Color::rgb(0.5, 0.55, 0.5) },
];

#[rustfmt::skip]
const HOUSES: [House; 6] = [
    House { x: -12.0, z: 12.0, yaw: 0.0 },
    House { x: -40.0, z: 14.0, yaw: 90.0 },
    House { x: -14.0, z: 40.0, yaw: 180.0 },
    House { x: -38.0, z: 40.0, yaw: 180.0 },
    House { x: 12.0, z: -12.0, yaw: 0.0 },
    House { x: 40.0, z: -40.0, yaw: -90.0 },
];

const TREES: [(f32, f32); 4] = [(12.0, -40.0), (38.0, -14.0), (-28.0, 28.0), (28.0, -28.0)];

/// Build the whole city with the heliport centred at `(heliport_x, 0, 0)`.
pub fn city(heliport_x: f32) -> SceneNode {
    let mut children = vec![ground()];
    children.extend(roads());
    for qx in [-1.0, 1.0] {
        for qz in [-1.0, 1.0] {
            children.push(sidewalk_ring(qx, qz));
        }
    }
    children.extend(BUILDINGS.iter().map(building));
    children.extend(HOUSES.iter().map(house));
    children.extend(TREES.iter().map(|&(x, z)| christmas_tree(x, z)));
    children.push(heliport(heliport_x));
    SceneNode::group(children)
}

fn ground() -> SceneNode {
    SceneNode::leaf(ShapeKind::Cube, GRASS)
        .translate(0.0, -0.5, 0.0)
        .scale(2.0 * CITY_WIDTH, 1.0, 2.0 * CITY_WIDTH)
}

fn roads() -> Vec<SceneNode> {
    let ew_length = ROAD_EAST_END + CITY_WIDTH;
    let ew_centre = (ROAD_EAST_END - CITY_WIDTH) / 2.0;
    let ns_length = 2.0 * CITY_WIDTH;

    let mut east_west = vec![SceneNode::leaf(ShapeKind::Cube, ASPHALT).scale(ew_length, 0.1, ROAD_WIDTH)];
    let spacing = ew_length / LANE_STRIPES as f32;
    for i in 0..LANE_STRIPES {
        let x = -ew_length / 2.0 + (i as f32 + 0.5) * spacing;
        east_west.push(
            SceneNode::leaf(ShapeKind::Cube, STRIPE)
                .translate(x, 0.06, 0.0)
                .scale(spacing * 0.5, 0.02, 0.3),
        );
    }

    let mut north_south = vec![SceneNode::leaf(ShapeKind::Cube, ASPHALT).scale(ROAD_WIDTH, 0.1, ns_length)];
    let spacing = ns_length / LANE_STRIPES as f32;
    for i in 0..LANE_STRIPES {
        let z = -ns_length / 2.0 + (i as f32 + 0.5) * spacing;
        north_south.push(
            SceneNode::leaf(ShapeKind::Cube, STRIPE)
                .translate(0.0, 0.06, z)
                .scale(0.3, 0.02, spacing * 0.5),
        );
    }

    vec![
        SceneNode::group(east_west).translate(ew_centre, 0.05, 0.0),
        // Slightly higher so the crossing does not z-fight.
        SceneNode::group(north_south).translate(0.0, 0.06, 0.0),
    ]
}

/// Tiles along the four edges of one block; `qx`/`qz` pick the quadrant.
fn sidewalk_ring(qx: f32, qz: f32) -> SceneNode {
    let half = (BLOCK_OUTER - BLOCK_INNER) / 2.0;
    let centre = BLOCK_INNER + half;
    let tile = 2.0 * half / SIDEWALK_TILES_PER_SIDE as f32;

    let mut sides = Vec::with_capacity(4);
    for side in 0..4 {
        let mut tiles = Vec::with_capacity(SIDEWALK_TILES_PER_SIDE);
        for i in 0..SIDEWALK_TILES_PER_SIDE {
            let color = if (i + side) % 2 == 0 { PAVEMENT_LIGHT } else { PAVEMENT_DARK };
            tiles.push(
                SceneNode::leaf(ShapeKind::Cube, color)
                    .translate(-half + (i as f32 + 0.5) * tile, 0.15, half - SIDEWALK_DEPTH / 2.0)
                    .scale(tile * 0.95, 0.3, SIDEWALK_DEPTH),
            );
        }
        sides.push(SceneNode::group(tiles).rotate(Axis::Y, side as f32 * 90.0));
    }
    SceneNode::group(sides).translate(qx * centre, 0.0, qz * centre)
}

fn building(b: &Building) -> SceneNode {
    let (w, h) = (b.width, b.height);
    let mut parts = vec![
        SceneNode::leaf(ShapeKind::Cube, b.color)
            .translate(0.0, h / 2.0, 0.0)
            .scale(w, h, w),
        SceneNode::leaf(ShapeKind::Cube, b.color.scaled(0.6))
            .translate(0.0, h + 0.25, 0.0)
            .scale(w * 1.05, 0.5, w * 1.05),
    ];

    let column_step = w / WINDOW_COLUMNS as f32;
    let row_step = h / (WINDOW_ROWS + 1) as f32;
    for side in 0..4 {
        let mut windows = Vec::with_capacity(WINDOW_ROWS * WINDOW_COLUMNS);
        for row in 0..WINDOW_ROWS {
            for col in 0..WINDOW_COLUMNS {
                windows.push(
                    SceneNode::leaf(ShapeKind::Cube, WINDOW)
                        .translate(
                            -w / 2.0 + (col as f32 + 0.5) * column_step,
                            (row + 1) as f32 * row_step,
                            w / 2.0 + 0.05,
                        )
                        .scale(column_step * 0.5, row_step * 0.5, 0.1),
                );
            }
        }
        parts.push(SceneNode::group(windows).rotate(Axis::Y, side as f32 * 90.0));
    }
    SceneNode::group(parts).translate(b.x, 0.0, b.z)
}

fn house(h: &House) -> SceneNode {
    SceneNode::group(vec![
        SceneNode::leaf(ShapeKind::Cube, HOUSE_WALL)
            .translate(0.0, 2.0, 0.0)
            .scale(6.0, 4.0, 5.0),
        SceneNode::leaf(ShapeKind::Pyramid, ROOF_TILE)
            .translate(0.0, 5.5, 0.0)
            .scale(7.0, 3.0, 6.0),
        SceneNode::leaf(ShapeKind::Cube, DOOR)
            .translate(0.0, 1.2, 2.55)
            .scale(1.2, 2.4, 0.1),
        SceneNode::leaf(ShapeKind::Cube, WINDOW)
            .translate(-1.8, 2.5, 2.55)
            .scale(1.0, 1.0, 0.1),
        SceneNode::leaf(ShapeKind::Cube, WINDOW)
            .translate(1.8, 2.5, 2.55)
            .scale(1.0, 1.0, 0.1),
    ])
    .translate(h.x, 0.0, h.z)
    .rotate(Axis::Y, h.yaw)
}

fn christmas_tree(x: f32, z: f32) -> SceneNode {
    const TRUNK_HEIGHT: f32 = 2.0;
    const TIER_RISE: f32 = 2.2;
    const TIER_HEIGHT: f32 = 3.0;

    let mut parts = vec![
        SceneNode::leaf(ShapeKind::Cylinder, TRUNK)
            .translate(0.0, TRUNK_HEIGHT / 2.0, 0.0)
            .scale(0.8, TRUNK_HEIGHT, 0.8),
    ];
    for tier in 0..TREE_TIERS {
        let base = TRUNK_HEIGHT + tier as f32 * TIER_RISE;
        let size = 5.0 - tier as f32 * 1.3;
        parts.push(
            SceneNode::leaf(ShapeKind::Pyramid, NEEDLES)
                .translate(0.0, base + TIER_HEIGHT / 2.0, 0.0)
                .scale(size, TIER_HEIGHT, size),
        );
        for i in 0..ORNAMENTS_PER_RING {
            let angle = (i as f32 + tier as f32 * 0.5) * 360.0 / ORNAMENTS_PER_RING as f32;
            parts.push(
                SceneNode::leaf(ShapeKind::Sphere, ORNAMENTS[(i + tier) % ORNAMENTS.len()])
                    .rotate(Axis::Y, angle)
                    .translate(size * 0.45, base + 0.3, 0.0)
                    .scale(0.5, 0.5, 0.5),
            );
        }
    }
    let top = TRUNK_HEIGHT + (TREE_TIERS - 1) as f32 * TIER_RISE + TIER_HEIGHT;
    parts.push(
        SceneNode::leaf(ShapeKind::Sphere, STAR)
            .translate(0.0, top, 0.0)
            .scale(0.8, 0.8, 0.8),
    );
    SceneNode::group(parts).translate(x, 0.0, z)
}

fn heliport(x: f32) -> SceneNode {
    SceneNode::group(vec![
        SceneNode::leaf(ShapeKind::Cylinder, PAD)
            .translate(0.0, 0.1, 0.0)
            .scale(8.0, 0.2, 8.0),
        SceneNode::leaf(ShapeKind::Cylinder, PAD_RING)
            .translate(0.0, 0.11, 0.0)
            .scale(7.0, 0.22, 7.0),
        SceneNode::leaf(ShapeKind::Cylinder, PAD)
            .translate(0.0, 0.12, 0.0)
            .scale(6.2, 0.24, 6.2),
        // the "H"
        SceneNode::leaf(ShapeKind::Cube, PAD_MARK)
            .translate(-1.2, 0.25, 0.0)
            .scale(0.6, 0.02, 3.6),
        SceneNode::leaf(ShapeKind::Cube, PAD_MARK)
            .translate(1.2, 0.25, 0.0)
            .scale(0.6, 0.02, 3.6),
        SceneNode::leaf(ShapeKind::Cube, PAD_MARK)
            .translate(0.0, 0.25, 0.0)
            .scale(1.8, 0.02, 0.6),
    ])
    .translate(x, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DrawList;
    use crate::scene::DriveParams;
    use glam::Vec3;
    use helicity_common::{FillMode, TransformStack};

    fn draw(node: &SceneNode) -> DrawList {
        let mut stack = TransformStack::new();
        let mut list = DrawList::with_all_primitives();
        node.draw(&mut stack, &DriveParams::default(), FillMode::Solid, &mut list);
        assert_eq!(stack.depth(), 0);
        list
    }

    #[test]
    fn leaf_count_follows_loop_counts() {
        let roads = 2 * (1 + LANE_STRIPES);
        let sidewalks = 4 * 4 * SIDEWALK_TILES_PER_SIDE;
        let buildings = BUILDINGS.len() * (2 + 4 * WINDOW_ROWS * WINDOW_COLUMNS);
        let houses = HOUSES.len() * 5;
        let trees = TREES.len() * (1 + TREE_TIERS * (1 + ORNAMENTS_PER_RING) + 1);
        let heliport = 6;
        let expected = 1 + roads + sidewalks + buildings + houses + trees + heliport;

        let c = city(30.0);
        assert_eq!(c.leaf_count(), expected);
        assert_eq!(draw(&c).len(), expected);
    }

    #[test]
    fn everything_stays_inside_the_city() {
        let list = draw(&city(30.0));
        for cmd in list.commands() {
            let p = cmd.model.transform_point3(Vec3::ZERO);
            assert!(p.x.abs() <= CITY_WIDTH && p.z.abs() <= CITY_WIDTH, "{p:?}");
            assert!(p.y >= -0.5);
        }
    }

    #[test]
    fn heliport_pad_sits_at_requested_x() {
        let list = draw(&heliport(30.0));
        let pad = list.commands()[0];
        assert_eq!(pad.kind, ShapeKind::Cylinder);
        assert!(pad.model.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(30.0, 0.1, 0.0), 1e-5));
    }

    #[test]
    fn building_windows_sit_on_all_four_faces() {
        let b = &BUILDINGS[0];
        let list = draw(&building(b));
        let windows: Vec<Vec3> = list
            .commands()
            .iter()
            .filter(|c| c.color == WINDOW)
            .map(|c| c.model.transform_point3(Vec3::ZERO) - Vec3::new(b.x, 0.0, b.z))
            .collect();
        assert_eq!(windows.len(), 4 * WINDOW_ROWS * WINDOW_COLUMNS);
        let face = b.width / 2.0 + 0.05;
        for w in windows {
            let on_face = (w.x.abs() - face).abs() < 1e-3 || (w.z.abs() - face).abs() < 1e-3;
            assert!(on_face, "{w:?}");
        }
    }
}
