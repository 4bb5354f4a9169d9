use thiserror::Error;

use crate::device::{InitError, ShaderError, UploadError};

/// Any failure on the way from an empty process to a running loop.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
}
