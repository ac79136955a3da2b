use helicity_common::FillMode;
use helicity_kernel::{VerticalIntent, World};
use helicity_render::{CameraMode, FixedView, ViewState};

/// Factor applied to the time scale by `+` and removed by `-`.
pub const TIME_SCALE_STEP: f32 = 1.1;

use crate::action::Action;
use crate::event::{Control, ControlEvent, Key};

/// Input-side state: whether a text field currently owns the keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    focused: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Apply one event to the world and view, returning what it did.
    pub fn apply(&mut self, event: ControlEvent, world: &mut World, view: &mut ViewState) -> Action {
        let action = match event {
            ControlEvent::FocusChanged(focused) => {
                self.focused = focused;
                Action::SetFocus(focused)
            }
            // Releases still end held intents while a field has focus.
            ControlEvent::KeyDown(_) if self.focused => Action::Ignored,
            ControlEvent::KeyDown(key) => key_down(key, world, view),
            ControlEvent::KeyUp(key) => key_up(key, world),
            ControlEvent::ValueChanged(control, value) => value_changed(control, value, world, view),
        };
        if action == Action::Ignored {
            tracing::debug!(?event, "input ignored");
        }
        action
    }
}

fn key_down(key: Key, world: &mut World, view: &mut ViewState) -> Action {
    match key {
        Key::ArrowUp => {
            world.set_vertical_intent(VerticalIntent::Ascend);
            Action::SetVertical(VerticalIntent::Ascend)
        }
        Key::ArrowDown => {
            world.set_vertical_intent(VerticalIntent::Descend);
            Action::SetVertical(VerticalIntent::Descend)
        }
        Key::ArrowLeft => {
            world.set_moving(true);
            Action::SetMoving(true)
        }
        Key::Space => Action::Release(world.release_box()),
        Key::Digit(n) => {
            let mode = match n {
                1 => CameraMode::Axonometric,
                2 => CameraMode::Fixed(FixedView::Front),
                3 => CameraMode::Fixed(FixedView::Top),
                4 => CameraMode::Fixed(FixedView::Right),
                5 => CameraMode::FirstPerson,
                _ => return Action::Ignored,
            };
            view.camera.select(mode);
            Action::SelectCamera(mode)
        }
        Key::W => {
            view.fill = FillMode::Wireframe;
            Action::SetFill(FillMode::Wireframe)
        }
        Key::S => {
            view.fill = FillMode::Solid;
            Action::SetFill(FillMode::Solid)
        }
        Key::Enter => Action::Noop,
        Key::P => Action::SetPaused(view.toggle_pause()),
        Key::Plus | Key::Minus if view.paused => Action::Noop,
        Key::Plus => Action::SetTimeScale(view.scale_time(TIME_SCALE_STEP)),
        Key::Minus => Action::SetTimeScale(view.scale_time(1.0 / TIME_SCALE_STEP)),
    }
}

fn key_up(key: Key, world: &mut World) -> Action {
    match key {
        Key::ArrowUp | Key::ArrowDown => {
            world.set_vertical_intent(VerticalIntent::Hold);
            Action::SetVertical(VerticalIntent::Hold)
        }
        Key::ArrowLeft => {
            world.set_moving(false);
            Action::SetMoving(false)
        }
        _ => Action::Noop,
    }
}

fn value_changed(control: Control, value: f32, world: &mut World, view: &mut ViewState) -> Action {
    if !value.is_finite() {
        return Action::Ignored;
    }
    match control {
        Control::Gamma => {
            view.camera.set_gamma(value);
            Action::SetGamma(value)
        }
        Control::Theta => {
            view.camera.set_theta(value);
            Action::SetTheta(value)
        }
        Control::MaxBoxes => {
            world.set_max_boxes(value.max(0.0).round() as usize);
            Action::SetMaxBoxes(world.tuning().max_boxes)
        }
    }
}
