use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::accessors::AccessorTable;
use crate::assets::{Image, Texture, TextureSampler};
use crate::buffers::{Buffer, BufferViewTable};
use crate::config::ImportOptions;
use crate::mesh_parser::Mesh;

/// Everything loaded from one glTF document.
///
/// The context owns its JSON tree and binary data; nothing is shared with
/// other contexts.
#[derive(Debug, Clone)]
pub struct GltfContext {
    pub filename: PathBuf,
    pub base_dir: PathBuf,
    pub json: Value,
    pub buffers: Vec<Buffer>,
    pub buffer_views: BufferViewTable,
    pub accessors: AccessorTable,
    pub images: Vec<Image>,
    pub samplers: Vec<TextureSampler>,
    pub textures: Vec<Texture>,
    pub meshes: Vec<Mesh>,
    /// Local files referenced by buffers and images.
    pub local_files: Vec<PathBuf>,
    pub options: ImportOptions,
}

impl GltfContext {
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Bytes of buffer `index`, including GLB BIN chunk data.
    pub fn buffer_data(&self, index: usize) -> Option<&[u8]> {
        self.buffers.get(index).map(|b| &b.data[..])
    }
}
