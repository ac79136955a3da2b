//! Rendering Adapter: scene graph traversal, camera derivation and frame driving.
//!
//! # Invariants
//! - Nothing in this crate mutates the world except [`FrameDriver::render_frame`],
//!   which steps the world (once per frame at unit time scale, never while
//!   paused) before drawing.
//! - Scene traversal leaves the transform stack at the depth it found it.
//! - Drawing goes through the [`PrimitiveRegistry`] seam; no GPU types leak in here.

pub mod camera;
pub mod city;
pub mod frame;
pub mod models;
pub mod primitives;
pub mod registry;
pub mod renderer;
pub mod scene;

pub use camera::{CameraMode, CameraState, FixedView};
pub use frame::{FrameDriver, FrameInfo, MAX_TIME_SCALE, MIN_TIME_SCALE, ViewState};
pub use primitives::{Mesh, mesh};
pub use registry::{DrawCommand, DrawList, PrimitiveRegistry};
pub use renderer::{DebugTextRenderer, FrameSnapshot, Renderer};
pub use scene::{DriveParams, Driver, NodeKind, Op, SceneNode};
