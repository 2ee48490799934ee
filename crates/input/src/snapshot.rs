use glam::Vec2;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Default)]
struct State {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    pointer: Vec2,
    pointer_delta: Vec2,
}

/// Shared input state.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    state: Arc<RwLock<State>>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_key_down(&self, key: PhysicalKey) -> bool {
        match key {
            PhysicalKey::Code(code) => self.state.read().keys.contains(&code),
            PhysicalKey::Unidentified(native) => {
                tracing::error!(?native, "queried an unidentified key");
                false
            }
        }
    }

    /// Shorthand for `is_key_down(PhysicalKey::Code(code))`.
    pub fn is_code_down(&self, code: KeyCode) -> bool {
        self.is_key_down(PhysicalKey::Code(code))
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.state.read().buttons.contains(&button)
    }

    pub fn pointer_position(&self) -> Vec2 {
        self.state.read().pointer
    }

    /// Movement between the last two pointer positions.
    pub fn pointer_delta(&self) -> Vec2 {
        self.state.read().pointer_delta
    }

    pub fn set_key(&self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            tracing::trace!(?key, "ignoring unidentified key event");
            return;
        };
        let mut s = self.state.write();
        match state {
            ElementState::Pressed => s.keys.insert(code),
            ElementState::Released => s.keys.remove(&code),
        };
    }

    pub fn set_button(&self, button: MouseButton, state: ElementState) {
        let mut s = self.state.write();
        match state {
            ElementState::Pressed => s.buttons.insert(button),
            ElementState::Released => s.buttons.remove(&button),
        };
    }

    pub fn set_pointer(&self, position: Vec2) {
        let mut s = self.state.write();
        s.pointer_delta = position - s.pointer;
        s.pointer = position;
    }

    /// Release every key and button. The pointer position is kept.
    pub fn clear(&self) {
        let mut s = self.state.write();
        s.keys.clear();
        s.buttons.clear();
        s.pointer_delta = Vec2::ZERO;
    }

    /// Feed one window event. Returns whether it was an input event.
    pub fn handle_window_event(&self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if !event.repeat {
                    self.set_key(event.physical_key, event.state);
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.set_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.set_pointer(Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::Focused(false) => {
                tracing::debug!("focus lost, releasing held input");
                self.clear();
                true
            }
            _ => false,
        }
    }
}
