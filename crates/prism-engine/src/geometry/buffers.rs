use crate::device::{
    AttributePointer, BufferTarget, Context, GpuDevice, ResourceError, ResourceId, ResourceKind,
    UploadError, VertexArrayLayout,
};
use crate::window::WindowSystem;

use super::vertex::{VertexData, COLOR_COMPONENTS};

/// Shader input location of the position attribute.
pub const POSITION_SLOT: u32 = 0;
/// Shader input location of the color attribute.
pub const COLOR_SLOT: u32 = 1;

/// One vertex array with its vertex and index stores.
#[derive(Debug)]
pub struct BufferSet {
    vertex_array: ResourceId,
    vertex_buffer: ResourceId,
    index_buffer: ResourceId,
    index_count: u32,
    released: bool,
}

impl BufferSet {
    /// Copies `vertices` and `indices` into write-once GPU stores and records
    /// the attribute layout.
    ///
    /// Slot 0 is the position block at offset 0, slot 1 the color block right
    /// after it. If any allocation fails, the objects already created are
    /// deleted before the error is returned.
    pub fn upload<W: WindowSystem, G: GpuDevice>(
        ctx: &mut Context<W, G>,
        vertices: &VertexData,
        indices: &[u16],
    ) -> Result<Self, UploadError> {
        if !ctx.gpu().is_current() {
            return Err(UploadError::ContextNotCurrent);
        }
        vertices.validate_indices(indices)?;

        let mut acquired = Vec::with_capacity(3);
        let result = Self::allocate(ctx, vertices, indices, &mut acquired);

        if let Err(e) = &result {
            log::debug!("upload failed ({e}); deleting {} partial object(s)", acquired.len());
            for (id, kind) in acquired.into_iter().rev() {
                if ctx.release(id) {
                    match kind {
                        ResourceKind::VertexArray => ctx.gpu_mut().delete_vertex_array(id),
                        _ => ctx.gpu_mut().delete_buffer(id),
                    }
                }
            }
        }

        result
    }

    fn allocate<W: WindowSystem, G: GpuDevice>(
        ctx: &mut Context<W, G>,
        vertices: &VertexData,
        indices: &[u16],
        acquired: &mut Vec<(ResourceId, ResourceKind)>,
    ) -> Result<Self, UploadError> {
        let vertex_array = ctx.gpu_mut().create_vertex_array()?;
        ctx.acquire(vertex_array, ResourceKind::VertexArray);
        acquired.push((vertex_array, ResourceKind::VertexArray));

        let vertex_buffer = ctx
            .gpu_mut()
            .create_buffer(BufferTarget::Vertex, bytemuck::cast_slice(vertices.as_slice()))?;
        ctx.acquire(vertex_buffer, ResourceKind::Buffer);
        acquired.push((vertex_buffer, ResourceKind::Buffer));

        let index_buffer = ctx
            .gpu_mut()
            .create_buffer(BufferTarget::Index, bytemuck::cast_slice(indices))?;
        ctx.acquire(index_buffer, ResourceKind::Buffer);
        acquired.push((index_buffer, ResourceKind::Buffer));

        let layout = VertexArrayLayout {
            vertex_buffer,
            index_buffer,
            attributes: vec![
                AttributePointer {
                    slot: POSITION_SLOT,
                    components: vertices.position_components(),
                    stride: 0,
                    offset: 0,
                },
                AttributePointer {
                    slot: COLOR_SLOT,
                    components: COLOR_COMPONENTS,
                    stride: 0,
                    offset: vertices.color_offset_bytes(),
                },
            ],
        };
        ctx.gpu_mut().configure_vertex_array(vertex_array, &layout);

        log::debug!(
            "uploaded {} vertices / {} indices (vertex array {})",
            vertices.vertex_count(),
            indices.len(),
            vertex_array.raw()
        );

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            released: false,
        })
    }

    /// Binds the vertex array and enables both attribute slots.
    pub fn bind<W: WindowSystem, G: GpuDevice>(&self, ctx: &mut Context<W, G>) {
        if self.released {
            log::warn!("bind of released vertex array {}", self.vertex_array.raw());
            return;
        }
        let gpu = ctx.gpu_mut();
        gpu.bind_vertex_array(self.vertex_array);
        gpu.enable_attribute(POSITION_SLOT);
        gpu.enable_attribute(COLOR_SLOT);
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_array(&self) -> ResourceId {
        self.vertex_array
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Deletes the index store, vertex store and vertex array, newest first.
    /// A second call is rejected.
    pub fn release<W: WindowSystem, G: GpuDevice>(
        &mut self,
        ctx: &mut Context<W, G>,
    ) -> Result<(), ResourceError> {
        if self.released {
            log::warn!("buffer set {} released twice", self.vertex_array.raw());
            return Err(ResourceError::AlreadyReleased("buffer set"));
        }
        self.released = true;

        for id in [self.index_buffer, self.vertex_buffer] {
            if ctx.release(id) {
                ctx.gpu_mut().delete_buffer(id);
            }
        }
        if ctx.release(self.vertex_array) {
            ctx.gpu_mut().delete_vertex_array(self.vertex_array);
        }
        Ok(())
    }
}
