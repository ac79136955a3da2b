//! Control-state mutator: discrete input events mapped to state changes.
//!
//! # Invariants
//! - Key presses are suppressed while a text field has focus; releases are not.
//! - Unknown keys and non-finite values are ignored, never errors.
//! - Input only mutates state; it never steps the world or draws.

pub mod action;
pub mod controls;
pub mod event;

pub use action::Action;
pub use controls::{Controls, TIME_SCALE_STEP};
pub use event::{Control, ControlEvent, Key};
