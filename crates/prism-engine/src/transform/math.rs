use glam::{Mat4, Vec3};

/// Right-handed perspective projection with a [0, 1] depth range.
pub fn build_projection(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far)
}

/// Right-handed view matrix looking from `eye` at `target`.
///
/// Precondition: `target - eye` must not be parallel to `up`. The basis is
/// undefined then; the call logs a warning and returns a non-finite matrix
/// rather than failing.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    if (target - eye).cross(up).length_squared() <= f32::EPSILON {
        log::warn!("look_at: view direction {:?} is parallel to up {up:?}", target - eye);
    }
    Mat4::look_at_rh(eye, target, up)
}

/// `projection * model_view`, the matrix uploaded to the shader.
pub fn compose_model_view_projection(projection: Mat4, model_view: Mat4) -> Mat4 {
    projection * model_view
}

/// Post-multiplies a translation: the offset is applied in model space.
pub fn apply_translation(model_view: Mat4, delta: Vec3) -> Mat4 {
    model_view * Mat4::from_translation(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    /// Direction the view matrix looks along, in world space.
    fn forward_axis(view: &Mat4) -> Vec3 {
        // Row 2 of the rotation part is -forward for a right-handed view.
        -Vec3::new(view.x_axis.z, view.y_axis.z, view.z_axis.z)
    }

    #[test]
    fn view_from_plus_z_looks_down_minus_z() {
        let view = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert!(forward_axis(&view).abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn degenerate_view_does_not_panic() {
        let view = look_at(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert!(!view.is_finite());
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let view = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let eye_in_view = view.transform_point3(Vec3::new(0.0, 0.0, 5.0));
        assert!(eye_in_view.abs_diff_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn identity_model_view_yields_projection() {
        let p = build_projection(60.0, 640.0 / 480.0, 0.3, 1000.0);
        assert!(compose_model_view_projection(p, Mat4::IDENTITY).abs_diff_eq(p, EPS));
    }

    #[test]
    fn composition_is_projection_times_model_view() {
        let p = build_projection(45.0, 1.0, 0.1, 100.0);
        let mv = look_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y);
        let point = Vec3::new(0.5, -0.25, 0.0);

        let composed = compose_model_view_projection(p, mv).project_point3(point);
        let staged = p.project_point3(mv.transform_point3(point));
        assert!(composed.abs_diff_eq(staged, EPS));
    }

    #[test]
    fn repeated_small_translations_equal_one_large() {
        let start = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        for n in [0u32, 1, 7, 100] {
            let mut stepped = start;
            for _ in 0..n {
                stepped = apply_translation(stepped, Vec3::new(0.01, 0.0, 0.0));
            }
            let once = apply_translation(start, Vec3::new(0.01 * n as f32, 0.0, 0.0));
            assert!(stepped.abs_diff_eq(once, 1e-4), "n = {n}");
        }
    }

    #[test]
    fn opposite_translations_cancel() {
        let start = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let there = apply_translation(start, Vec3::new(0.01, 0.0, 0.0));
        let back = apply_translation(there, Vec3::new(-0.01, 0.0, 0.0));
        assert!(back.abs_diff_eq(start, EPS));
    }

    #[test]
    fn projection_maps_near_plane_to_depth_zero() {
        let p = build_projection(60.0, 1.0, 0.3, 1000.0);
        let on_near = p.project_point3(Vec3::new(0.0, 0.0, -0.3));
        assert!((on_near.z - 0.0).abs() < EPS);
        let on_far = p.project_point3(Vec3::new(0.0, 0.0, -1000.0));
        assert!((on_far.z - 1.0).abs() < 1e-4);
    }
}
