use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// The closed set of drawable primitive shapes.
///
/// Every primitive is unit-sized: it fits inside the cube `[-0.5, 0.5]³`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere,
    Cube,
    Cylinder,
    Pyramid,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Sphere,
        ShapeKind::Cube,
        ShapeKind::Cylinder,
        ShapeKind::Pyramid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Cube => "cube",
            Self::Cylinder => "cylinder",
            Self::Pyramid => "pyramid",
        }
    }
}

/// How a primitive is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Filled triangles.
    #[default]
    Solid,
    /// Edge lines only.
    Wireframe,
}

/// Linear RGB color in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Multiply every channel by `factor`, clamped to `[0, 1]`.
    pub fn scaled(self, factor: f32) -> Self {
        Self::rgb(
            (self.r * factor).clamp(0.0, 1.0),
            (self.g * factor).clamp(0.0, 1.0),
            (self.b * factor).clamp(0.0, 1.0),
        )
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A coordinate axis for rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Rotation matrix of `degrees` about this axis.
    pub fn rotation(self, degrees: f32) -> Mat4 {
        let radians = degrees.to_radians();
        match self {
            Self::X => Mat4::from_rotation_x(radians),
            Self::Y => Mat4::from_rotation_y(radians),
            Self::Z => Mat4::from_rotation_z(radians),
        }
    }
}

/// One local transform step of a scene graph node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LocalTransform {
    Translate(Vec3),
    /// Non-uniform scale.
    Scale(Vec3),
    /// Rotation in degrees about an axis.
    Rotate(Axis, f32),
}

impl LocalTransform {
    pub fn to_mat4(self) -> Mat4 {
        match self {
            Self::Translate(offset) => Mat4::from_translation(offset),
            Self::Scale(factors) => Mat4::from_scale(factors),
            Self::Rotate(axis, degrees) => axis.rotation(degrees),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn color_from_rgb8() {
        let c = Color::from_rgb8(255, 0, 51);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn color_scaled_clamps() {
        let c = Color::rgb(0.8, 0.5, 0.1).scaled(2.0);
        assert_eq!(c, Color::rgb(1.0, 1.0, 0.2));
    }

    #[test]
    fn rotation_about_y_turns_x_into_minus_z() {
        let m = Axis::Y.rotation(90.0);
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn translate_moves_points() {
        let m = LocalTransform::Translate(Vec3::new(1.0, 2.0, 3.0)).to_mat4();
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn fill_mode_default_is_solid() {
        assert_eq!(FillMode::default(), FillMode::Solid);
    }

    #[test]
    fn shape_names_are_distinct() {
        let names: BTreeSet<&str> = ShapeKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ShapeKind::ALL.len());
        assert_eq!(ShapeKind::ALL.len(), 4);
    }
}
