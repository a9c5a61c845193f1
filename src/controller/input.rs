/// Platform-agnostic input handling system
use std::collections::HashSet;

/// Platform-independent input events.
///
/// Keys are physical key codes as strings (`"KeyW"`, `"Space"`, ...): the
/// DOM `KeyboardEvent.code` values, which match winit's `KeyCode` names.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseClick { button: MouseButton, is_down: bool },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Directional and jump flags read by the player controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Input state owned by the frame driver. Events only flip flags and
/// accumulate deltas here; nothing is recomputed until the next tick.
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    /// Captured mouse samples in arrival order, replayed one by one so
    /// the pitch clamp applies per sample.
    pub look_samples: Vec<(f32, f32)>,
    pub pointer_locked: bool,
    /// Keys that went down since the last `consume_presses`, repeats excluded.
    pub just_pressed: Vec<String>,
    /// Pending capture change for the platform layer: `Some(true)` to grab.
    pub pointer_lock_request: Option<bool>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                // At most one pending edge per key, so the list stays bounded
                // when nobody ticks.
                if self.pressed_keys.insert(key.clone()) && !self.just_pressed.contains(key) {
                    self.just_pressed.push(key.clone());
                }
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key.as_str());
            }
            InputEvent::MouseMove { dx, dy } => {
                // Relative deltas only mean anything while captured
                if self.pointer_locked {
                    self.look_samples.push((*dx, *dy));
                }
            }
            InputEvent::MouseClick { button: MouseButton::Left, is_down: true } => {
                if !self.pointer_locked {
                    self.pointer_lock_request = Some(true);
                }
            }
            InputEvent::MouseClick { .. } => {}
            InputEvent::FocusLost => {
                self.clear_keys();
            }
            InputEvent::VisibilityChanged { visible: _ } => {
                self.clear_keys();
            }
            InputEvent::PointerLockChanged { locked } => {
                tracing::debug!(locked, "pointer lock changed");
                self.pointer_locked = *locked;
                if !locked {
                    self.look_samples.clear();
                }
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
        self.just_pressed.clear();
    }

    pub fn consume_look(&mut self) -> Vec<(f32, f32)> {
        std::mem::take(&mut self.look_samples)
    }

    pub fn consume_presses(&mut self) -> Vec<String> {
        std::mem::take(&mut self.just_pressed)
    }

    /// Ask the platform to release the cursor. No-op when not captured.
    pub fn request_pointer_release(&mut self) {
        if self.pointer_locked {
            self.pointer_lock_request = Some(false);
        }
    }

    pub fn take_pointer_lock_request(&mut self) -> Option<bool> {
        self.pointer_lock_request.take()
    }
}

/// Key mapping configuration. Bindings are fixed; there is no remapping UI.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub jump: String,
    pub toggle_view: String,
    pub escape: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "KeyW".to_string(),
            backward: "KeyS".to_string(),
            left: "KeyA".to_string(),
            right: "KeyD".to_string(),
            jump: "Space".to_string(),
            toggle_view: "KeyV".to_string(),
            escape: "Escape".to_string(),
        }
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.forward) || input.is_key_pressed("ArrowUp")
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.backward) || input.is_key_pressed("ArrowDown")
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.left) || input.is_key_pressed("ArrowLeft")
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.right) || input.is_key_pressed("ArrowRight")
    }

    pub fn is_jumping(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.jump)
    }

    pub fn key_state(&self, input: &InputState) -> KeyState {
        KeyState {
            forward: self.is_moving_forward(input),
            backward: self.is_moving_backward(input),
            left: self.is_moving_left(input),
            right: self.is_moving_right(input),
            jump: self.is_jumping(input),
        }
    }

    pub fn wants_to_toggle_view(&self, key: &str) -> bool {
        key == self.bindings.toggle_view
    }

    pub fn is_escape(&self, key: &str) -> bool {
        key == self.bindings.escape
    }

    /// Codes whose browser default (scrolling, find-as-you-type) should be
    /// suppressed while playing.
    pub fn is_game_key(&self, key: &str) -> bool {
        let b = &self.bindings;
        [&b.forward, &b.backward, &b.left, &b.right, &b.jump, &b.toggle_view]
            .iter()
            .any(|k| k.as_str() == key)
            || matches!(key, "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight")
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::{ElementState, MouseButton as WinitButton};
    use winit::keyboard::{KeyCode, PhysicalKey};

    /// winit key codes print as their DOM `code` names (`KeyW`, `Space`).
    pub fn key_to_input(key: PhysicalKey, state: ElementState) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = key else { return None };
        let name = key_code_name(code);
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(name),
            ElementState::Released => InputEvent::KeyUp(name),
        })
    }

    pub fn key_code_name(code: KeyCode) -> String {
        format!("{code:?}")
    }

    pub fn mouse_button_to_input(button: WinitButton, state: ElementState) -> Option<InputEvent> {
        let button = match button {
            WinitButton::Left => MouseButton::Left,
            WinitButton::Right => MouseButton::Right,
            WinitButton::Middle => MouseButton::Middle,
            _ => return None,
        };
        Some(InputEvent::MouseClick { button, is_down: state == ElementState::Pressed })
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let code = e.code();
        if is_down {
            InputEvent::KeyDown(code)
        } else {
            InputEvent::KeyUp(code)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }

    pub fn mouse_click_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        InputEvent::MouseClick {
            button: MouseButton::from_web_button(e.button()),
            is_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(state: &mut InputState, key: &str) {
        state.process_event(&InputEvent::KeyDown(key.to_string()));
    }

    #[test]
    fn test_key_state_mapping() {
        let mut input = InputState::new();
        let processor = InputProcessor::default();
        press(&mut input, "KeyW");
        press(&mut input, "ArrowRight");
        press(&mut input, "Space");

        let keys = processor.key_state(&input);
        assert_eq!(
            keys,
            KeyState { forward: true, backward: false, left: false, right: true, jump: true }
        );

        input.process_event(&InputEvent::KeyUp("Space".to_string()));
        assert!(!processor.key_state(&input).jump);
    }

    #[test]
    fn test_mouse_ignored_without_pointer_lock() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseMove { dx: 10.0, dy: 5.0 });
        assert!(input.consume_look().is_empty());

        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::MouseMove { dx: 10.0, dy: 5.0 });
        input.process_event(&InputEvent::MouseMove { dx: 2.0, dy: -1.0 });
        assert_eq!(input.consume_look(), vec![(10.0, 5.0), (2.0, -1.0)], "samples kept in order");
        assert!(input.consume_look().is_empty(), "look samples are consumed");
    }

    #[test]
    fn test_unconsumed_presses_stay_bounded() {
        let mut input = InputState::new();
        for _ in 0..100 {
            press(&mut input, "KeyV");
            input.process_event(&InputEvent::KeyUp("KeyV".to_string()));
        }
        assert_eq!(input.just_pressed.len(), 1, "one pending edge per key");

        press(&mut input, "KeyW");
        input.process_event(&InputEvent::FocusLost);
        assert!(input.consume_presses().is_empty(), "focus loss drops pending presses");
    }

    #[test]
    fn test_repeats_are_not_new_presses() {
        let mut input = InputState::new();
        press(&mut input, "KeyV");
        press(&mut input, "KeyV");
        assert_eq!(input.consume_presses(), vec!["KeyV".to_string()]);
        assert!(input.consume_presses().is_empty());
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let mut input = InputState::new();
        press(&mut input, "KeyW");
        input.process_event(&InputEvent::FocusLost);
        assert!(!InputProcessor::default().key_state(&input).forward);
    }

    #[test]
    fn test_click_and_release_request_capture_changes() {
        let mut input = InputState::new();
        input.request_pointer_release();
        assert_eq!(input.take_pointer_lock_request(), None, "nothing to release yet");

        input.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: true });
        assert_eq!(input.take_pointer_lock_request(), Some(true));

        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.request_pointer_release();
        assert_eq!(input.take_pointer_lock_request(), Some(false));
        assert_eq!(input.take_pointer_lock_request(), None);
    }

    #[test]
    fn test_game_keys() {
        let processor = InputProcessor::default();
        assert!(processor.is_game_key("Space"));
        assert!(processor.is_game_key("ArrowUp"));
        assert!(!processor.is_game_key("KeyQ"));
        assert!(processor.wants_to_toggle_view("KeyV"));
        assert!(processor.is_escape("Escape"));
    }
}
