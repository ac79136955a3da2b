//! Shared types for the helicity workspace.
//!
//! # Invariants
//! - Every `push` on a [`TransformStack`] is matched by exactly one `pop`.
//! - Rotations are expressed in degrees at every public boundary.

pub mod stack;
pub mod types;

pub use stack::TransformStack;
pub use types::{Axis, Color, FillMode, LocalTransform, ShapeKind};
