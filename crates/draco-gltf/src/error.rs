use std::io;

use thiserror::Error;

/// Errors raised while importing or exporting glTF documents.
#[derive(Error, Debug)]
pub enum GltfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GLB: {0}")]
    InvalidGlb(String),

    #[error("Invalid glTF: {0}")]
    InvalidGltf(String),

    #[error("Invalid reference to {kind} {index}")]
    InvalidReference { kind: &'static str, index: usize },

    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),

    #[error("Invalid attribute layout: {0}")]
    InvalidAttributeLayout(String),

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    #[error("Draco decode error: {0}")]
    DracoDecode(String),

    #[error("Draco encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Cannot open {0}")]
    CannotOpen(String),

    #[error("Cannot create {0}")]
    CannotCreate(String),

    #[error("Unable to copy {0}")]
    CopyFailed(String),

    #[error("Tried to copy missing file {0}")]
    MissingSource(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

pub type Result<T> = std::result::Result<T, GltfError>;

impl GltfError {
    pub(crate) fn reference(kind: &'static str, index: usize) -> Self {
        GltfError::InvalidReference { kind, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GltfError::reference("bufferView", 4).to_string(),
            "Invalid reference to bufferView 4"
        );
        assert_eq!(
            GltfError::MissingSource("a.bin".into()).to_string(),
            "Tried to copy missing file a.bin"
        );
        let io_err: GltfError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io_err, GltfError::Io(_)));
    }
}
