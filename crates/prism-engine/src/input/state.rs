use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Current input state for the window.
///
/// Holds "is down" information and the last known pointer position. Updated
/// synchronously while events are polled; never touched from callbacks.
#[derive(Debug, Default)]
pub struct InputState {
    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Focused(true) => {}
            InputEvent::Focused(false) => {
                // Release everything on focus loss; the matching release
                // events go to whichever window gained focus.
                self.keys_down.clear();
                self.buttons_down.clear();
            }

            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    self.keys_down.insert(*key);
                }
                KeyState::Released => {
                    self.keys_down.remove(key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    self.buttons_down.insert(*button);
                }
                MouseButtonState::Released => {
                    self.buttons_down.remove(button);
                }
            },
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            repeat: false,
        }
    }

    #[test]
    fn press_and_release_tracks_held_keys() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::ArrowLeft, KeyState::Pressed));
        assert!(s.key_down(Key::ArrowLeft));

        s.apply_event(&key(Key::ArrowLeft, KeyState::Released));
        assert!(!s.key_down(Key::ArrowLeft));
    }

    #[test]
    fn repeat_press_keeps_key_held() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::ArrowUp, KeyState::Pressed));
        s.apply_event(&InputEvent::Key {
            key: Key::ArrowUp,
            state: KeyState::Pressed,
            repeat: true,
        });
        assert!(s.key_down(Key::ArrowUp));
        assert_eq!(s.keys_down.len(), 1);
    }

    #[test]
    fn focus_loss_clears_held_input() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::Focused(true));
        s.apply_event(&key(Key::ArrowDown, KeyState::Pressed));
        s.apply_event(&InputEvent::PointerButton {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
        });

        s.apply_event(&InputEvent::Focused(false));
        assert!(s.keys_down.is_empty());
        assert!(s.buttons_down.is_empty());
    }

    #[test]
    fn pointer_position_follows_moves_and_clears_on_leave() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::PointerMoved { x: 12.0, y: 34.5 });
        assert_eq!(s.pointer_pos, Some((12.0, 34.5)));

        s.apply_event(&InputEvent::PointerLeft);
        assert_eq!(s.pointer_pos, None);
    }
}
