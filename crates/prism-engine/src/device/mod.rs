//! Context lifecycle + GPU device management.
//!
//! This module is responsible for:
//! - opening the window and creating the wgpu device/surface (`Context::initialize`)
//! - the `GpuDevice` seam every GPU call goes through
//! - tracking live GPU objects so teardown runs in reverse acquisition order
//! - the setup error taxonomy

mod backend;
mod context;
mod error;
mod gpu;
mod surface;

pub use backend::{AttributePointer, BufferTarget, GpuDevice, ResourceId, VertexArrayLayout};
pub use context::{Context, NativeContext, ResourceKind};
pub use error::{
    InitError, ResourceError, ShaderError, ShaderStage, SurfaceErrorAction, UploadError,
};
pub use gpu::{GpuInit, WgpuDevice};
