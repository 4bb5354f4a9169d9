use glam::Vec3;

use crate::device::{Context, GpuDevice};
use crate::window::WindowSystem;

use super::state::InputState;
use super::types::{Key, MouseButton};

/// Units the model-view moves per frame while a direction key is held.
pub const DEFAULT_STEP: f32 = 0.01;

/// Held state of the four direction keys.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DirectionKeys {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Input sampled once per frame.
///
/// Rebuilt from `InputState` every time it is sampled; it carries no identity
/// between frames.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub keys: DirectionKeys,

    /// Last cursor position in logical pixels, `None` outside the window.
    pub cursor: Option<(f32, f32)>,

    pub primary_button: bool,
}

impl InputSnapshot {
    pub fn from_state(state: &InputState) -> Self {
        Self {
            keys: DirectionKeys {
                left: state.key_down(Key::ArrowLeft),
                right: state.key_down(Key::ArrowRight),
                up: state.key_down(Key::ArrowUp),
                down: state.key_down(Key::ArrowDown),
            },
            cursor: state.pointer_pos,
            primary_button: state.button_down(MouseButton::Left),
        }
    }
}

/// Samples the context's input state as of the last `poll_events`.
pub fn sample<W: WindowSystem, G: GpuDevice>(ctx: &Context<W, G>) -> InputSnapshot {
    InputSnapshot::from_state(ctx.input())
}

/// Maps held direction keys to a per-frame translation.
///
/// Left/right drive X, up/down drive Z. When both keys of a pair are held the
/// first one checked wins (left over right, up over down). No time scaling:
/// each held key contributes `step` per frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InputMapper {
    pub step: f32,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self { step: DEFAULT_STEP }
    }
}

impl InputMapper {
    pub fn new(step: f32) -> Self {
        Self { step }
    }

    pub fn to_translation_delta(&self, snapshot: &InputSnapshot) -> Vec3 {
        let keys = &snapshot.keys;

        let x = if keys.left {
            self.step
        } else if keys.right {
            -self.step
        } else {
            0.0
        };

        let z = if keys.up {
            self.step
        } else if keys.down {
            -self.step
        } else {
            0.0
        };

        Vec3::new(x, 0.0, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, KeyState};

    fn held(left: bool, right: bool, up: bool, down: bool) -> InputSnapshot {
        InputSnapshot {
            keys: DirectionKeys {
                left,
                right,
                up,
                down,
            },
            ..Default::default()
        }
    }

    #[test]
    fn no_keys_means_no_motion() {
        let m = InputMapper::default();
        assert_eq!(m.to_translation_delta(&InputSnapshot::default()), Vec3::ZERO);
    }

    #[test]
    fn single_keys_map_to_axes() {
        let m = InputMapper::default();
        let cases = [
            (held(true, false, false, false), Vec3::new(0.01, 0.0, 0.0)),
            (held(false, true, false, false), Vec3::new(-0.01, 0.0, 0.0)),
            (held(false, false, true, false), Vec3::new(0.0, 0.0, 0.01)),
            (held(false, false, false, true), Vec3::new(0.0, 0.0, -0.01)),
        ];
        for (snapshot, expected) in cases {
            assert_eq!(m.to_translation_delta(&snapshot), expected);
        }
    }

    #[test]
    fn left_beats_right_and_up_beats_down() {
        let m = InputMapper::default();
        assert_eq!(
            m.to_translation_delta(&held(true, true, true, true)),
            Vec3::new(0.01, 0.0, 0.01)
        );
    }

    #[test]
    fn left_then_right_cancel() {
        let m = InputMapper::default();
        let sum = m.to_translation_delta(&held(true, false, false, false))
            + m.to_translation_delta(&held(false, true, false, false));
        assert_eq!(sum, Vec3::ZERO);
    }

    #[test]
    fn custom_step_scales_delta() {
        let m = InputMapper::new(0.5);
        assert_eq!(
            m.to_translation_delta(&held(false, false, false, true)),
            Vec3::new(0.0, 0.0, -0.5)
        );
    }

    #[test]
    fn snapshot_reads_keys_cursor_and_button() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::Key {
            key: Key::ArrowRight,
            state: KeyState::Pressed,
            repeat: false,
        });
        state.apply_event(&InputEvent::Key {
            key: Key::Unknown(62),
            state: KeyState::Pressed,
            repeat: false,
        });
        state.apply_event(&InputEvent::PointerMoved { x: 3.0, y: 4.0 });

        let snap = InputSnapshot::from_state(&state);
        assert_eq!(
            snap.keys,
            DirectionKeys {
                right: true,
                ..Default::default()
            }
        );
        assert_eq!(snap.cursor, Some((3.0, 4.0)));
        assert!(!snap.primary_button);
    }
}
