use thiserror::Error;

/// Errors raised while encoding or decoding a Draco bitstream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DracoError {
    #[error("General error: {0}")]
    DracoError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("Bitstream version unsupported")]
    BitstreamVersionUnsupported,
    #[error("Buffer decode error: {0}")]
    BufferError(String),
}

pub type Status = Result<(), DracoError>;

pub fn error_status(msg: impl Into<String>) -> DracoError {
    DracoError::DracoError(msg.into())
}
