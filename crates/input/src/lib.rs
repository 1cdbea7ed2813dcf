//! Input handling for keyboard and mouse.
//!
//! Window events are folded into an [`InputState`] that the tick loop reads:
//! held movement keys, an accumulated pointer delta, whether the primary
//! button is held (drag-to-look), a queued jump and a queued "enter portal"
//! action.

use glam::Vec2;
use std::collections::HashSet;

/// Boolean movement key map read by the player physics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub w: bool,
    pub a: bool,
    pub s: bool,
    pub d: bool,
    pub shift: bool,
}

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Motion received since the last `begin_frame`.
    accumulated_delta: Vec2,
    /// Primary mouse button held.
    pointer_held: bool,

    /// Jump requested and not yet consumed by the physics step.
    jump_queued: bool,
    /// Enter-portal action requested and not yet consumed.
    enter_portal_queued: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the pointer motion for this frame. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key) {
                    match key {
                        KeyCode::Space => self.jump_queued = true,
                        KeyCode::Enter | KeyCode::NumpadEnter => self.enter_portal_queued = true,
                        _ => {}
                    }
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Convenience for scripted input: press and hold a key.
    pub fn press(&mut self, key: KeyCode) {
        self.process_keyboard(key, ElementState::Pressed);
    }

    /// Process a mouse button event. Only the primary button is tracked.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.pointer_held = state == ElementState::Pressed;
        }
    }

    /// Process mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Whether the primary button is held (drag-to-look without pointer lock).
    pub fn is_pointer_held(&self) -> bool {
        self.pointer_held
    }

    /// Current movement key map.
    pub fn movement_keys(&self) -> MovementKeys {
        MovementKeys {
            w: self.is_key_held(KeyCode::KeyW),
            a: self.is_key_held(KeyCode::KeyA),
            s: self.is_key_held(KeyCode::KeyS),
            d: self.is_key_held(KeyCode::KeyD),
            shift: self.is_sprinting(),
        }
    }

    /// Check if sprint is held (Shift).
    pub fn is_sprinting(&self) -> bool {
        self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight)
    }

    /// Drop every held key and pending pointer motion. Used when input is locked.
    pub fn clear_movement(&mut self) {
        self.keys_held.clear();
        self.pointer_held = false;
        self.mouse_delta = Vec2::ZERO;
        self.accumulated_delta = Vec2::ZERO;
    }

    pub fn queue_jump(&mut self) {
        self.jump_queued = true;
    }

    /// Take the queued jump, clearing it. Returns whether one was queued.
    pub fn consume_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_queued)
    }

    pub fn queue_enter_portal(&mut self) {
        self.enter_portal_queued = true;
    }

    /// Take the queued enter-portal action, clearing it.
    pub fn consume_enter_portal(&mut self) -> bool {
        std::mem::take(&mut self.enter_portal_queued)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
