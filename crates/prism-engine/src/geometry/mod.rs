//! Geometry buffer store: block-layout vertex data and its GPU buffers.

mod buffers;
mod vertex;

pub use buffers::{BufferSet, COLOR_SLOT, POSITION_SLOT};
pub use vertex::{VertexData, COLOR_COMPONENTS};
