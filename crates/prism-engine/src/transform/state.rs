use glam::{Mat4, Vec3};

use super::math::{apply_translation, build_projection, compose_model_view_projection, look_at};

/// Camera placement and lens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 60.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

/// Model-view, fixed projection and the accumulated translation.
///
/// The projection is built once; the model-view carries every delta applied
/// since setup. Nothing here clamps the translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    model_view: Mat4,
    projection: Mat4,
    translation: Vec3,
    mvp: Mat4,
}

impl TransformState {
    pub fn new(camera: &CameraConfig, aspect: f32) -> Self {
        let projection = build_projection(camera.fov_y_degrees, aspect, camera.near, camera.far);
        let model_view = look_at(camera.eye, camera.target, camera.up);

        Self {
            model_view,
            projection,
            translation: Vec3::ZERO,
            mvp: compose_model_view_projection(projection, model_view),
        }
    }

    /// Applies this frame's delta and recomposes the MVP.
    pub fn update(&mut self, delta: Vec3) -> Mat4 {
        self.model_view = apply_translation(self.model_view, delta);
        self.translation += delta;
        self.mvp = compose_model_view_projection(self.projection, self.model_view);
        self.mvp
    }

    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Sum of every delta applied so far.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn mvp(&self) -> Mat4 {
        self.mvp
    }
}
