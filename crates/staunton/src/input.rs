//! Keyboard and mouse input.
//!
//! The window layer never calls into game logic directly. It translates each
//! winit event into an [`InputEvent`] and pushes it onto the [`EventQueue`];
//! the viewer drains the queue once at the top of every frame, in arrival
//! order, before anything is updated or drawn.
//!
//! ```text
//! winit ──► WindowEvent ──► InputEvent ──► EventQueue
//!                                              │  drain (frame start)
//!                                              ▼
//!                                         Controller
//! ```
//!
//! [`Input`] tracks which buttons are currently held, which is all the
//! controller needs to know whether the camera is being dragged.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// A single input occurrence, in window pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    CursorMoved { x: f32, y: f32 },
    /// Raw pointer motion, used while the OS has locked the cursor in place.
    MouseMotion { dx: f32, dy: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    /// Vertical scroll in lines; positive scrolls away from the user.
    Scroll { delta: f32 },
    Key { code: KeyCode, pressed: bool },
}

/// FIFO of input events waiting for the next frame.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

/// Tracks the held state of a set of inputs (keys or mouse buttons).
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if any of the inputs is held down.
    pub fn any_pressed(&self, inputs: &[T]) -> bool {
        inputs.iter().any(|input| self.pressed(*input))
    }

    /// Record a press. Returns `false` for a repeat of an already-held input.
    pub fn press(&mut self, input: T) -> bool {
        self.pressed.insert(input)
    }

    /// Record a release. Returns `false` if the input wasn't held.
    pub fn release(&mut self, input: T) -> bool {
        self.pressed.remove(&input)
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_arrival_order() {
        let mut queue = EventQueue::new();
        queue.push(InputEvent::CursorMoved { x: 1.0, y: 2.0 });
        queue.push(InputEvent::Scroll { delta: 1.0 });
        queue.push(InputEvent::Key {
            code: KeyCode::KeyU,
            pressed: true,
        });

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], InputEvent::CursorMoved { x: 1.0, y: 2.0 });
        assert_eq!(drained[1], InputEvent::Scroll { delta: 1.0 });
        assert_eq!(queue.drain().count(), 0, "drain should empty the queue");
    }

    #[test]
    fn held_state_follows_press_and_release() {
        let mut buttons = Input::new();
        assert!(buttons.press(MouseButton::Middle));
        assert!(!buttons.press(MouseButton::Middle), "repeat press is not new");
        assert!(buttons.pressed(MouseButton::Middle));
        assert!(buttons.any_pressed(&[MouseButton::Right, MouseButton::Middle]));

        assert!(buttons.release(MouseButton::Middle));
        assert!(!buttons.pressed(MouseButton::Middle));
        assert!(!buttons.release(MouseButton::Middle));
    }
}
