use crate::geometry::VertexData;
use crate::shader::ShaderSources;
use crate::transform::CameraConfig;

/// Name of the composed-matrix uniform the vertex shader declares.
pub const MVP_UNIFORM: &str = "modelview_projection";

/// Everything the render loop draws: one mesh, one program, one camera.
#[derive(Debug, Clone)]
pub struct Scene {
    pub vertices: VertexData,
    pub indices: Vec<u16>,
    pub shaders: ShaderSources,
    pub camera: CameraConfig,
    /// Uniform that receives `projection * model_view` every frame.
    pub mvp_uniform: String,
    pub clear_color: [f32; 4],
}

impl Scene {
    /// Scene with the default camera, a black background and the
    /// `modelview_projection` uniform.
    pub fn new(vertices: VertexData, indices: Vec<u16>, shaders: ShaderSources) -> Self {
        Self {
            vertices,
            indices,
            shaders,
            camera: CameraConfig::default(),
            mvp_uniform: MVP_UNIFORM.to_string(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }
}
