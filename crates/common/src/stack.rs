use glam::{Mat4, Vec3};

use crate::types::{Axis, LocalTransform};

/// Cumulative model transform kept as a stack of 4x4 matrices.
///
/// The stack always has a current matrix (the top). `push` duplicates it,
/// `compose` right-multiplies it by a local transform, `pop` restores the
/// previous one. A child drawn under a parent therefore ends up with
/// `parent * child_local`.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Mat4,
    saved: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    /// Create a stack whose current matrix is the identity.
    pub fn new() -> Self {
        Self::with_base(Mat4::IDENTITY)
    }

    pub fn with_base(base: Mat4) -> Self {
        Self {
            current: base,
            saved: Vec::with_capacity(16),
        }
    }

    /// Drop every pushed level and start again from `base`.
    pub fn reset(&mut self, base: Mat4) {
        self.saved.clear();
        self.current = base;
    }

    /// The matrix visible to draws.
    pub fn current(&self) -> Mat4 {
        self.current
    }

    /// Number of pushes not yet popped.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restore the matrix saved by the matching `push`.
    ///
    /// # Panics
    /// Panics when nothing has been pushed. An unmatched pop is a scene
    /// authoring bug and would corrupt every sibling drawn after it.
    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(previous) => self.current = previous,
            None => panic!("TransformStack::pop called on an empty stack"),
        }
    }

    /// Run `f` between a push and its pop.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.depth();
        self.push();
        let result = f(self);
        debug_assert_eq!(self.depth(), depth + 1, "unbalanced push/pop inside scope");
        self.pop();
        result
    }

    pub fn compose(&mut self, local: LocalTransform) {
        self.current *= local.to_mat4();
    }

    /// Right-multiply by an arbitrary matrix.
    pub fn multiply(&mut self, m: Mat4) {
        self.current *= m;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.compose(LocalTransform::Translate(offset));
    }

    pub fn scale(&mut self, factors: Vec3) {
        self.compose(LocalTransform::Scale(factors));
    }

    pub fn rotate_x(&mut self, degrees: f32) {
        self.compose(LocalTransform::Rotate(Axis::X, degrees));
    }

    pub fn rotate_y(&mut self, degrees: f32) {
        self.compose(LocalTransform::Rotate(Axis::Y, degrees));
    }

    pub fn rotate_z(&mut self, degrees: f32) {
        self.compose(LocalTransform::Rotate(Axis::Z, degrees));
    }

    /// Where the local origin of the current matrix lands.
    pub fn origin(&self) -> Vec3 {
        self.current.transform_point3(Vec3::ZERO)
    }
}
