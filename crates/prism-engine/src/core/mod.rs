//! Render loop controller.
//!
//! Ties the subsystems together: setup phases that each hand their result to
//! the next, the per-frame state machine and reverse-order teardown.

mod error;
mod render_loop;
mod scene;

pub use error::CoreError;
pub use render_loop::{run_scene, LoopState, RenderLoop, RunSummary};
pub use scene::{Scene, MVP_UNIFORM};
