//! wgpu render backend for helicity.
//!
//! Consumes the per-frame [`helicity_render::DrawList`], groups its commands
//! per primitive and fill mode, and issues one instanced draw per group.
//!
//! # Invariants
//! - The backend never sees the world; it only reads recorded draws.
//! - Only primitives initialised on the draw list are uploaded and drawn.

mod gpu;
mod shaders;

pub use gpu::{Batch, InstanceData, WgpuRenderer, batch_commands};
