use glam::Mat4;

use crate::device::{Context, GpuDevice, ResourceError, ResourceId, ResourceKind, ShaderError};
use crate::window::WindowSystem;

use super::link::{LinkedProgram, UniformInfo, UniformLocation};

/// A linked shader program resident on the GPU.
///
/// Owns the program object until `destroy`. Uniform names resolve against
/// the reflection captured at link time, so lookups never touch the device.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ResourceId,
    uniforms: Vec<UniformInfo>,
    released: bool,
}

impl ShaderProgram {
    /// Compiles, links and creates the program.
    ///
    /// Compile and link problems are reported before any GPU object exists,
    /// so a failure here leaves nothing to clean up.
    pub fn compile_and_link<W: WindowSystem, G: GpuDevice>(
        ctx: &mut Context<W, G>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        if !ctx.gpu().is_current() {
            return Err(ShaderError::ContextNotCurrent);
        }

        let linked = LinkedProgram::build(vertex_source, fragment_source)?;
        let id = ctx.gpu_mut().create_program(&linked)?;
        ctx.acquire(id, ResourceKind::Program);

        log::debug!(
            "program {} linked ({} -> {}, {} uniform(s))",
            id.raw(),
            linked.vertex_entry_point(),
            linked.fragment_entry_point(),
            linked.uniforms().len()
        );

        Ok(Self {
            id,
            uniforms: linked.uniforms().to_vec(),
            released: false,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    /// Makes this the program subsequent draws and uniform uploads use.
    pub fn use_program<W: WindowSystem, G: GpuDevice>(&self, ctx: &mut Context<W, G>) {
        if self.released {
            log::warn!("use of destroyed program {}", self.id.raw());
            return;
        }
        ctx.gpu_mut().use_program(self.id);
    }

    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation, ShaderError> {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.location)
            .ok_or_else(|| ShaderError::NotFound(name.to_string()))
    }

    /// Like `uniform_location`, but also requires the uniform to be a
    /// `mat4x4<f32>` so `set_mat4_uniform` can never write a mismatched size.
    pub fn mat4_location(&self, name: &str) -> Result<UniformLocation, ShaderError> {
        let info = self
            .uniforms
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| ShaderError::NotFound(name.to_string()))?;

        if !info.is_mat4 {
            return Err(ShaderError::NotMat4(name.to_string()));
        }
        Ok(info.location)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Deletes the program object. A second call is rejected.
    pub fn destroy<W: WindowSystem, G: GpuDevice>(
        &mut self,
        ctx: &mut Context<W, G>,
    ) -> Result<(), ResourceError> {
        if self.released {
            log::warn!("program {} destroyed twice", self.id.raw());
            return Err(ResourceError::AlreadyReleased("shader program"));
        }
        self.released = true;

        if ctx.release(self.id) {
            ctx.gpu_mut().delete_program(self.id);
        }
        Ok(())
    }
}

/// Uploads `matrix` (column-major) to the program in use.
pub fn set_mat4_uniform<W: WindowSystem, G: GpuDevice>(
    ctx: &mut Context<W, G>,
    location: UniformLocation,
    matrix: &Mat4,
) {
    ctx.gpu_mut()
        .set_uniform_mat4(location, &matrix.to_cols_array());
}
