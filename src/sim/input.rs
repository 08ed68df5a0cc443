//! Input mapping
//!
//! Raw key/button events become edge events on three controls. The mapper
//! keeps the last known state per control; the tick samples it once.

use serde::{Deserialize, Serialize};

/// Discrete gameplay controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Left,
    Right,
    Plunger,
}

/// An edge on one control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEvent {
    pub control: Control,
    pub pressed: bool,
}

/// One-shot actions forwarded by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Start from the menu, or restart after game over
    Start,
}

/// Last-known boolean state of every control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub left: bool,
    pub right: bool,
    pub plunger: bool,
}

impl ControlState {
    pub fn apply(&mut self, event: ControlEvent) {
        let slot = match event.control {
            Control::Left => &mut self.left,
            Control::Right => &mut self.right,
            Control::Plunger => &mut self.plunger,
        };
        *slot = event.pressed;
    }
}

/// Translate a DOM `KeyboardEvent.key` value into a control
pub fn control_for_key(key: &str) -> Option<Control> {
    match key {
        "ArrowLeft" | "a" | "A" | "z" | "Z" => Some(Control::Left),
        "ArrowRight" | "d" | "D" | "/" => Some(Control::Right),
        " " | "ArrowDown" | "s" | "S" => Some(Control::Plunger),
        _ => None,
    }
}

/// Translate a key into a one-shot action (key down only)
pub fn action_for_key(key: &str) -> Option<Action> {
    match key {
        "Enter" => Some(Action::Start),
        _ => None,
    }
}

/// Tracks control state from raw key events
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    state: ControlState,
    pending_actions: Vec<Action>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a key down/up; returns the edge it produced, if any
    ///
    /// Auto-repeat key downs for an already-held control produce no edge.
    pub fn key(&mut self, key: &str, pressed: bool) -> Option<ControlEvent> {
        if pressed {
            if let Some(action) = action_for_key(key) {
                self.pending_actions.push(action);
                return None;
            }
        }

        let control = control_for_key(key)?;
        let event = ControlEvent { control, pressed };
        if self.is_pressed(control) == pressed {
            return None;
        }
        self.state.apply(event);
        Some(event)
    }

    /// Feed an already-decoded edge (touch buttons, gamepad)
    pub fn event(&mut self, event: ControlEvent) {
        self.state.apply(event);
    }

    pub fn action(&mut self, action: Action) {
        self.pending_actions.push(action);
    }

    pub fn is_pressed(&self, control: Control) -> bool {
        match control {
            Control::Left => self.state.left,
            Control::Right => self.state.right,
            Control::Plunger => self.state.plunger,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Release everything (focus lost)
    pub fn release_all(&mut self) {
        self.state = ControlState::default();
    }

    /// Take queued one-shot actions
    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }
}
