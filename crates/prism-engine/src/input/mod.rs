//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The window runtime translates platform events into `InputEvent`s; the render
//! loop samples an `InputSnapshot` per frame and maps it to a translation.

mod mapper;
mod state;
mod types;

pub use mapper::{sample, DirectionKeys, InputMapper, InputSnapshot, DEFAULT_STEP};
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};
