use crate::shader::{LinkedProgram, UniformLocation};

use super::error::{ShaderError, UploadError};

/// Opaque id for a GPU-side object (vertex array, buffer, program).
///
/// Ids are issued by the backend and never reused within one backend instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(u32);

impl ResourceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Binding point of a data store.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Where one vertex attribute lives inside the vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributePointer {
    /// Shader input location.
    pub slot: u32,
    /// Number of `f32` components (2, 3 or 4).
    pub components: u32,
    /// Byte distance between consecutive elements; 0 means tightly packed.
    pub stride: u64,
    /// Byte offset of the first element.
    pub offset: u64,
}

impl AttributePointer {
    /// Effective stride in bytes (resolves the tightly-packed 0).
    pub fn effective_stride(&self) -> u64 {
        if self.stride == 0 {
            u64::from(self.components) * std::mem::size_of::<f32>() as u64
        } else {
            self.stride
        }
    }
}

/// Attribute-binding descriptor contents.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexArrayLayout {
    pub vertex_buffer: ResourceId,
    pub index_buffer: ResourceId,
    pub attributes: Vec<AttributePointer>,
}

/// Primitive GPU operations consumed by the core.
///
/// The contract mirrors a current-context graphics API: binds and the program
/// in use are implicit state that later calls (`enable_attribute`,
/// `set_uniform_mat4`, `draw_indexed_triangles`) act on. Resource ids handed
/// to delete calls must not be used afterwards.
pub trait GpuDevice {
    /// Whether GPU calls on this thread reach a live context.
    fn is_current(&self) -> bool;

    fn create_vertex_array(&mut self) -> Result<ResourceId, UploadError>;

    /// Allocates a write-once data store initialised with `contents`.
    fn create_buffer(
        &mut self,
        target: BufferTarget,
        contents: &[u8],
    ) -> Result<ResourceId, UploadError>;

    fn configure_vertex_array(&mut self, vao: ResourceId, layout: &VertexArrayLayout);

    fn bind_vertex_array(&mut self, vao: ResourceId);

    /// Enables an attribute slot on the bound vertex array. Idempotent.
    fn enable_attribute(&mut self, slot: u32);

    fn delete_vertex_array(&mut self, vao: ResourceId);

    fn delete_buffer(&mut self, buffer: ResourceId);

    fn create_program(&mut self, program: &LinkedProgram) -> Result<ResourceId, ShaderError>;

    fn use_program(&mut self, program: ResourceId);

    /// Writes a column-major 4x4 matrix to a uniform of the program in use.
    fn set_uniform_mat4(&mut self, location: UniformLocation, columns: &[f32; 16]);

    fn delete_program(&mut self, program: ResourceId);

    /// Starts a frame by clearing the color and depth targets.
    fn clear(&mut self, color: [f32; 4]);

    /// Indexed triangle-list draw of `index_count` indices from offset 0.
    fn draw_indexed_triangles(&mut self, index_count: u32);

    /// Presents the frame (buffer swap).
    fn present(&mut self);

    /// Reconfigures the drawable after a framebuffer resize.
    fn resize(&mut self, width: u32, height: u32);
}
