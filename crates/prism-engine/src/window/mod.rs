//! Window + event pumping.
//!
//! Owns the `winit` EventLoop and Window. The render loop drives it through
//! the `WindowSystem` trait one poll per frame.

mod runtime;
mod system;

pub use runtime::{RuntimeConfig, WinitWindowSystem};
pub use system::WindowSystem;
