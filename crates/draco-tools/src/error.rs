use std::path::PathBuf;

use draco_gltf::GltfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Gltf(#[from] GltfError),

    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Messages collected by the export passes, one per failure.
    #[error("{}", .0.join("\n"))]
    Export(Vec<String>),
}

impl ToolError {
    /// One line per error, in the order they were recorded.
    pub fn lines(&self) -> Vec<String> {
        match self {
            ToolError::Export(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
