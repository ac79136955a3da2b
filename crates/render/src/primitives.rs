//! Procedural unit geometry for every [`ShapeKind`].
//!
//! Each mesh fits inside `[-0.5, 0.5]³`, is centred on the origin and carries
//! two index lists: triangles for solid fill and line pairs for wireframe.

use glam::Vec3;
use helicity_common::ShapeKind;
use std::f32::consts::{PI, TAU};

const SPHERE_LATITUDES: u16 = 12;
const SPHERE_LONGITUDES: u16 = 24;
const CYLINDER_SEGMENTS: u16 = 24;

/// CPU-side mesh ready for upload.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub triangles: Vec<u16>,
    pub lines: Vec<u16>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn push(&mut self, position: Vec3, normal: Vec3) -> u16 {
        let index = self.positions.len() as u16;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        index
    }
}

/// Build the mesh for `kind`.
pub fn mesh(kind: ShapeKind) -> Mesh {
    match kind {
        ShapeKind::Sphere => sphere(SPHERE_LATITUDES, SPHERE_LONGITUDES),
        ShapeKind::Cube => cube(),
        ShapeKind::Cylinder => cylinder(CYLINDER_SEGMENTS),
        ShapeKind::Pyramid => pyramid(),
    }
}

fn sphere(latitudes: u16, longitudes: u16) -> Mesh {
    let mut mesh = Mesh::default();
    let row = longitudes + 1;
    for lat in 0..=latitudes {
        let theta = lat as f32 * PI / latitudes as f32;
        for lon in 0..=longitudes {
            let phi = lon as f32 * TAU / longitudes as f32;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            mesh.push(n * 0.5, n);
        }
    }
    for lat in 0..latitudes {
        for lon in 0..longitudes {
            let first = lat * row + lon;
            let second = first + row;
            mesh.triangles
                .extend_from_slice(&[first, first + 1, second, second, first + 1, second + 1]);
            // meridian segment
            mesh.lines.extend_from_slice(&[first, second]);
            if lat > 0 {
                mesh.lines.extend_from_slice(&[first, first + 1]);
            }
        }
    }
    mesh
}

fn cube() -> Mesh {
    let mut mesh = Mesh::default();
    #[rustfmt::skip]
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (Vec3::Z, [Vec3::new(-0.5, -0.5, 0.5), Vec3::new(0.5, -0.5, 0.5), Vec3::new(0.5, 0.5, 0.5), Vec3::new(-0.5, 0.5, 0.5)]),
        (Vec3::NEG_Z, [Vec3::new(0.5, -0.5, -0.5), Vec3::new(-0.5, -0.5, -0.5), Vec3::new(-0.5, 0.5, -0.5), Vec3::new(0.5, 0.5, -0.5)]),
        (Vec3::X, [Vec3::new(0.5, -0.5, 0.5), Vec3::new(0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, -0.5), Vec3::new(0.5, 0.5, 0.5)]),
        (Vec3::NEG_X, [Vec3::new(-0.5, -0.5, -0.5), Vec3::new(-0.5, -0.5, 0.5), Vec3::new(-0.5, 0.5, 0.5), Vec3::new(-0.5, 0.5, -0.5)]),
        (Vec3::Y, [Vec3::new(-0.5, 0.5, 0.5), Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.5, 0.5, -0.5), Vec3::new(-0.5, 0.5, -0.5)]),
        (Vec3::NEG_Y, [Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, -0.5, -0.5), Vec3::new(0.5, -0.5, 0.5), Vec3::new(-0.5, -0.5, 0.5)]),
    ];
    for (normal, corners) in faces {
        let base = mesh.positions.len() as u16;
        for corner in corners {
            mesh.push(corner, normal);
        }
        mesh.triangles
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    // Twelve edges: the +Z loop (0..4), the -Z loop (4..8) and four connectors.
    #[rustfmt::skip]
    let edges: [u16; 24] = [
        0, 1, 1, 2, 2, 3, 3, 0,
        4, 5, 5, 6, 6, 7, 7, 4,
        0, 5, 1, 4, 2, 7, 3, 6,
    ];
    mesh.lines.extend_from_slice(&edges);
    mesh
}

fn cylinder(segments: u16) -> Mesh {
    let mut mesh = Mesh::default();
    let ring = |i: u16| {
        let a = i as f32 * TAU / segments as f32;
        Vec3::new(a.cos(), 0.0, a.sin())
    };

    // side
    let side = mesh.positions.len() as u16;
    for i in 0..=segments {
        let n = ring(i);
        mesh.push(n * 0.5 - Vec3::Y * 0.5, n);
        mesh.push(n * 0.5 + Vec3::Y * 0.5, n);
    }
    for i in 0..segments {
        let b0 = side + 2 * i;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        mesh.triangles.extend_from_slice(&[b0, t0, b1, b1, t0, t1]);
        mesh.lines.extend_from_slice(&[b0, b1, t0, t1, b0, t0]);
    }

    // caps
    for (y, normal) in [(-0.5, Vec3::NEG_Y), (0.5, Vec3::Y)] {
        let centre = mesh.push(Vec3::new(0.0, y, 0.0), normal);
        for i in 0..=segments {
            mesh.push(ring(i) * 0.5 + Vec3::new(0.0, y, 0.0), normal);
        }
        for i in 0..segments {
            let a = centre + 1 + i;
            mesh.triangles.extend_from_slice(&[centre, a, a + 1]);
        }
    }
    mesh
}

fn pyramid() -> Mesh {
    let mut mesh = Mesh::default();
    let apex = Vec3::new(0.0, 0.5, 0.0);
    let base = [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(-0.5, -0.5, 0.5),
    ];

    let floor = mesh.positions.len() as u16;
    for corner in base {
        mesh.push(corner, Vec3::NEG_Y);
    }
    mesh.triangles
        .extend_from_slice(&[floor, floor + 1, floor + 2, floor + 2, floor + 3, floor]);
    for i in 0..4 {
        mesh.lines.extend_from_slice(&[floor + i, floor + (i + 1) % 4]);
    }

    for i in 0..4 {
        let a = base[i];
        let b = base[(i + 1) % 4];
        let mut normal = (b - a).cross(apex - a).normalize();
        if normal.dot((a + b + apex) / 3.0) < 0.0 {
            normal = -normal;
        }
        let ia = mesh.push(a, normal);
        let ib = mesh.push(b, normal);
        let ic = mesh.push(apex, normal);
        mesh.triangles.extend_from_slice(&[ia, ib, ic]);
        mesh.lines.extend_from_slice(&[ia, ic]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mesh_is_unit_sized() {
        for kind in ShapeKind::ALL {
            let m = mesh(kind);
            for p in &m.positions {
                for c in p {
                    assert!(c.abs() <= 0.5 + 1e-5, "{} vertex {:?} out of bounds", kind.name(), p);
                }
            }
        }
    }

    #[test]
    fn indices_are_in_range_and_well_formed() {
        for kind in ShapeKind::ALL {
            let m = mesh(kind);
            let n = m.vertex_count() as u16;
            assert_eq!(m.triangles.len() % 3, 0);
            assert_eq!(m.lines.len() % 2, 0);
            assert!(!m.triangles.is_empty());
            assert!(!m.lines.is_empty());
            assert!(m.triangles.iter().chain(&m.lines).all(|&i| i < n));
            assert_eq!(m.normals.len(), m.positions.len());
        }
    }

    #[test]
    fn normals_are_unit_length() {
        for kind in ShapeKind::ALL {
            for n in mesh(kind).normals {
                assert!((Vec3::from_array(n).length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn cube_has_twelve_edges() {
        let m = mesh(ShapeKind::Cube);
        assert_eq!(m.lines.len(), 24);
        assert_eq!(m.triangles.len(), 36);
    }

    #[test]
    fn pyramid_side_normals_point_outwards() {
        let m = mesh(ShapeKind::Pyramid);
        for (p, n) in m.positions.iter().zip(&m.normals).skip(4) {
            let p = Vec3::from_array(*p);
            let n = Vec3::from_array(*n);
            assert!(n.y > 0.0);
            assert!(n.dot(Vec3::new(p.x, 0.0, p.z)) >= 0.0);
        }
    }
}
