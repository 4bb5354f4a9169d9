//! Prism engine crate.
//!
//! A single-mesh real-time renderer: window + GPU context lifecycle, static
//! geometry buffers, a WGSL program with a model-view-projection uniform, and
//! a render loop that moves the model-view with the arrow keys.

pub mod core;
pub mod device;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod shader;
pub mod transform;
pub mod window;
