//! Transform pipeline: camera, fixed projection and per-frame MVP.
//!
//! Column-major `glam` matrices throughout; the composed matrix is
//! `projection * model_view`.

mod math;
mod state;

pub use math::{apply_translation, build_projection, compose_model_view_projection, look_at};
pub use state::{CameraConfig, TransformState};
