//! Loading of `.gltf` and `.glb` documents into a [`GltfContext`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::accessors::AccessorTable;
use crate::assets;
use crate::buffers::{self, BufferViewTable};
use crate::config::ImportOptions;
use crate::context::GltfContext;
use crate::error::{GltfError, Result};
use crate::glb;
use crate::keys;
use crate::mesh_parser::MeshParser;
use crate::schema::Document;
use crate::uri::{self, UriKind};

const SUPPORTED_EXTENSIONS: &[&str] = &[
    keys::KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION,
    keys::KEY_KDAB_ASSET_KEY_EXTENSION,
    "KHR_texture_transform",
    "KHR_materials_unlit",
    "KHR_lights_punctual",
];

#[derive(Debug, Clone, Default)]
pub struct GltfImporter {
    options: ImportOptions,
}

impl GltfImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Reads and parses a `.gltf` or `.glb` file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<GltfContext> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            warn!("Failed to open {}: {}", path.display(), e);
            GltfError::CannotOpen(path.display().to_string())
        })?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let context = self.load_bytes(&data, &base_dir, path)?;
        info!(
            "Loaded {} ({} meshes, {} buffers)",
            path.display(),
            context.meshes.len(),
            context.buffers.len()
        );
        Ok(context)
    }

    /// Parses document bytes. Relative uris resolve against `base_dir`.
    pub fn load_bytes(&self, data: &[u8], base_dir: &Path, filename: &Path) -> Result<GltfContext> {
        let (json_bytes, bin) = if glb::is_glb(data) {
            let chunks = glb::parse_glb(data)?;
            (chunks.json, chunks.bin)
        } else {
            (data, None)
        };
        let json: Value = serde_json::from_slice(json_bytes)?;
        if !json.is_object() {
            return Err(GltfError::InvalidGltf("document root is not an object".into()));
        }
        let document = Document::deserialize(&json)?;
        let version = document
            .asset
            .as_ref()
            .map(|asset| asset.version.as_str())
            .ok_or_else(|| GltfError::InvalidGltf("missing asset".into()))?;
        if !version.starts_with("2.") {
            return Err(GltfError::InvalidGltf(format!("unsupported version {}", version)));
        }
        for extension in &document.extensions_required {
            if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
                return Err(GltfError::InvalidGltf(format!(
                    "required extension {} is not supported",
                    extension
                )));
            }
        }

        let resource_root = self.options.resource_root.as_deref();
        let mut local_files = Vec::new();
        for buffer in &document.buffers {
            if let Some(u) = buffer.uri.as_deref().filter(|u| uri::kind(u) == UriKind::Path) {
                let path = uri::local_file(u, base_dir);
                local_files.push(uri::resolve_resource(&path, resource_root));
            }
        }

        let buffers = buffers::parse_buffers(&document.buffers, base_dir, bin, resource_root)?;
        let buffer_views = BufferViewTable::parse(&document.buffer_views, &buffers)?;
        let accessors = AccessorTable::parse(&document.accessors)?;
        let images = assets::parse_images(
            &document.images,
            base_dir,
            &buffer_views,
            resource_root,
            &mut local_files,
        )?;
        let samplers = assets::parse_samplers(&document.samplers)?;
        let textures = assets::parse_textures(&document.textures, &images, &samplers)?;
        let meshes =
            MeshParser::new(&buffer_views, &accessors, &self.options).parse(&document.meshes)?;

        Ok(GltfContext {
            filename: filename.to_path_buf(),
            base_dir: base_dir.to_path_buf(),
            json,
            buffers,
            buffer_views,
            accessors,
            images,
            samplers,
            textures,
            meshes,
            local_files,
            options: self.options.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load_json(value: Value) -> Result<GltfContext> {
        GltfImporter::default().load_bytes(
            value.to_string().as_bytes(),
            Path::new("."),
            Path::new("scene.gltf"),
        )
    }

    #[test]
    fn test_requires_asset() {
        assert!(matches!(load_json(json!({ "meshes": [] })), Err(GltfError::InvalidGltf(_))));
        assert!(load_json(json!({ "asset": { "version": "1.0" } })).is_err());
        assert!(load_json(json!({
            "asset": { "version": "2.0" },
            "extensionsRequired": ["EXT_unknown"]
        }))
        .is_err());
        let context = load_json(json!({ "asset": { "version": "2.0" } })).unwrap();
        assert!(context.meshes.is_empty());
    }

    #[test]
    fn test_glb_document() {
        let positions: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let document = json!({
            "asset": { "version": "2.0" },
            "buffers": [{ "byteLength": 36 }],
            "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }],
            "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 } }] }]
        });
        let data = glb::build_glb(document.to_string().as_bytes(), Some(&positions));
        let context = GltfImporter::default()
            .load_bytes(&data, Path::new("."), Path::new("tri.glb"))
            .unwrap();
        assert_eq!(context.buffers[0].byte_length(), 36);
        let primitive = &context.meshes[0].primitives[0];
        assert_eq!(primitive.attribute_info[0].name, "vertexPosition");
        assert_eq!(primitive.geometry.vertex_count(), 3);
        assert!(context.local_files.is_empty());
    }
}
