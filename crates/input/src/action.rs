use helicity_common::FillMode;
use helicity_kernel::{ReleaseOutcome, VerticalIntent};
use helicity_render::CameraMode;

/// The state change an input event produced.
///
/// Returned by [`Controls::apply`](crate::Controls::apply) so callers can log
/// or assert on it; applying has already happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    SetVertical(VerticalIntent),
    SetMoving(bool),
    Release(ReleaseOutcome),
    SelectCamera(CameraMode),
    SetFill(FillMode),
    SetGamma(f32),
    SetTheta(f32),
    SetMaxBoxes(usize),
    SetFocus(bool),
    SetPaused(bool),
    SetTimeScale(f32),
    /// A bound key with nothing to do on this edge (e.g. `Enter`, or `+`
    /// while paused).
    Noop,
    /// Suppressed by the focus gate, or not a usable value.
    Ignored,
}

impl Action {
    /// Whether the event changed (or attempted to change) any state.
    pub fn is_effective(&self) -> bool {
        !matches!(self, Self::Noop | Self::Ignored)
    }
}
