//! Shader program binding.
//!
//! WGSL sources are compiled and validated with naga, linked (entry points,
//! stage interface, uniform agreement) and only then handed to the device.

mod compile;
mod link;
mod loader;
mod program;

pub use link::{LinkedProgram, UniformInfo, UniformLocation};
pub use loader::{load_shader_pair, ShaderSources};
pub use program::{set_mat4_uniform, ShaderProgram};
