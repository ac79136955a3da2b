//! Scene graph: a tree of transform lists ending in primitive leaves.
//!
//! Trees are built once and traversed every frame. Traversal reads animation
//! angles from [`DriveParams`] and never touches simulation state.

use glam::Vec3;
use helicity_common::{Axis, Color, FillMode, LocalTransform, ShapeKind, TransformStack};
use helicity_kernel::Helicopter;

use crate::registry::PrimitiveRegistry;

/// Source of a per-frame rotation angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    MainRotor,
    TailRotor,
}

/// Angles read by [`Op::Spin`] during one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveParams {
    pub main_rotor_deg: f32,
    pub tail_rotor_deg: f32,
}

impl DriveParams {
    pub fn from_helicopter(heli: &Helicopter) -> Self {
        Self {
            main_rotor_deg: heli.propeller_deg,
            tail_rotor_deg: heli.propeller_deg,
        }
    }

    pub fn angle(&self, driver: Driver) -> f32 {
        match driver {
            Driver::MainRotor => self.main_rotor_deg,
            Driver::TailRotor => self.tail_rotor_deg,
        }
    }
}

/// One step of a node's local transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Static(LocalTransform),
    /// Rotation about `axis` by the angle currently held by `driver`.
    Spin { axis: Axis, driver: Driver },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf { shape: ShapeKind, color: Color },
    Group(Vec<SceneNode>),
}

/// A scene node: local ops applied in order, then a leaf draw or children.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub ops: Vec<Op>,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn leaf(shape: ShapeKind, color: Color) -> Self {
        Self {
            ops: Vec::new(),
            kind: NodeKind::Leaf { shape, color },
        }
    }

    pub fn group(children: Vec<SceneNode>) -> Self {
        Self {
            ops: Vec::new(),
            kind: NodeKind::Group(children),
        }
    }

    pub fn translate(mut self, x: f32, y: f32, z: f32) -> Self {
        self.ops
            .push(Op::Static(LocalTransform::Translate(Vec3::new(x, y, z))));
        self
    }

    pub fn scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.ops
            .push(Op::Static(LocalTransform::Scale(Vec3::new(x, y, z))));
        self
    }

    pub fn rotate(mut self, axis: Axis, degrees: f32) -> Self {
        self.ops
            .push(Op::Static(LocalTransform::Rotate(axis, degrees)));
        self
    }

    pub fn spin(mut self, axis: Axis, driver: Driver) -> Self {
        self.ops.push(Op::Spin { axis, driver });
        self
    }

    /// Draw this subtree under the stack's current matrix.
    pub fn draw<R: PrimitiveRegistry + ?Sized>(
        &self,
        stack: &mut TransformStack,
        params: &DriveParams,
        fill: FillMode,
        registry: &mut R,
    ) {
        stack.scoped(|s| {
            for op in &self.ops {
                match *op {
                    Op::Static(local) => s.compose(local),
                    Op::Spin { axis, driver } => {
                        s.compose(LocalTransform::Rotate(axis, params.angle(driver)))
                    }
                }
            }
            match &self.kind {
                NodeKind::Leaf { shape, color } => {
                    registry.set_color(*color);
                    registry.upload_model(&s.current());
                    registry.draw(*shape, fill);
                }
                NodeKind::Group(children) => {
                    for child in children {
                        child.draw(s, params, fill, registry);
                    }
                }
            }
        });
    }

    /// Number of primitive draws one traversal issues.
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { .. } => 1,
            NodeKind::Group(children) => children.iter().map(SceneNode::leaf_count).sum(),
        }
    }
}
