//! Simulation kernel: helicopter flight, falling boxes, per-frame stepping.
//!
//! # Invariants
//! - The world is mutated only through explicit operations and `World::step`.
//! - A step is a pure function of the previous state, the held intents and
//!   the frame delta; nothing here reads a wall clock.
//! - Helicopter height stays within `[min_height, max_height]` and speed within
//!   `[0, max_speed]` after every step.

pub mod boxes;
pub mod config;
pub mod helicopter;
pub mod world;

pub use boxes::{BoxSlots, FallingBox, ReleaseOutcome};
pub use config::{ConfigError, Tuning};
pub use helicopter::{FlightIntent, Helicopter, VerticalIntent};
pub use world::{World, WorldEvent};
