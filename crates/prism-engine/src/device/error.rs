use thiserror::Error;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM). The frame is dropped; the loop keeps running
    /// until the window system asks to close.
    Fatal,
}

/// Window/context creation failures. Fatal: setup never reaches the render loop.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("windowing backend failed to start: {0}")]
    BackendInitFailed(String),
    #[error("window or graphics context could not be created: {0}")]
    ContextCreationFailed(String),
}

/// Geometry upload failures.
#[derive(Debug, Error, PartialEq)]
pub enum UploadError {
    #[error("no graphics context is current on this thread")]
    ContextNotCurrent,
    #[error("geometry has no vertices or no indices")]
    EmptyGeometry,
    #[error("vertex data length {len} is not a multiple of the {stride} floats per vertex")]
    MalformedVertexData { len: usize, stride: usize },
    #[error("positions must have 2 or 3 components, got {0}")]
    UnsupportedPositionComponents(u32),
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u16,
        vertex_count: usize,
    },
    #[error("GPU buffer allocation failed: {0}")]
    AllocationFailed(String),
}

/// Shader stage tag carried by compile diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader program failures: compile, link and uniform resolution.
#[derive(Debug, Error, PartialEq)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{message}")]
    Compile { stage: ShaderStage, message: String },
    #[error("program failed to link: {0}")]
    Link(String),
    #[error("uniform `{0}` not found in linked program")]
    NotFound(String),
    #[error("uniform `{0}` is not a mat4x4<f32>")]
    NotMat4(String),
    #[error("no graphics context is current on this thread")]
    ContextNotCurrent,
}

/// Lifecycle misuse of an owned GPU resource.
#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("{0} was already released")]
    AlreadyReleased(&'static str),
}
