use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use draco_core::{EncoderOptions, GeometryAttributeType};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const MAX_LEVEL: i32 = 10;

/// Attribute classes with their own quantization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeshAttribute {
    Position,
    Normal,
    Color,
    TextureCoordinate,
    Generic,
}

impl MeshAttribute {
    pub const ALL: [MeshAttribute; 5] = [
        MeshAttribute::Position,
        MeshAttribute::Normal,
        MeshAttribute::Color,
        MeshAttribute::TextureCoordinate,
        MeshAttribute::Generic,
    ];

    pub fn draco_type(self) -> GeometryAttributeType {
        match self {
            MeshAttribute::Position => GeometryAttributeType::Position,
            MeshAttribute::Normal => GeometryAttributeType::Normal,
            MeshAttribute::Color => GeometryAttributeType::Color,
            MeshAttribute::TextureCoordinate => GeometryAttributeType::TexCoord,
            MeshAttribute::Generic => GeometryAttributeType::Generic,
        }
    }
}

/// How external assets end up in the exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Embed {
    /// Embedded data stays embedded, files are copied.
    #[default]
    Keep,
    /// Everything is written to separate files.
    None,
    /// Everything is embedded as base64 data uris.
    All,
}

/// Settings for [`Exporter`](crate::exporter::Exporter).
///
/// Speeds and quantization levels live in `0..=10`; setters ignore values
/// outside that range.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfiguration {
    encoding_speed: i32,
    decoding_speed: i32,
    quantization: BTreeMap<MeshAttribute, i32>,
    mesh_compression: bool,
    embedding: Embed,
}

impl ExportConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON configuration file. Out-of-range values fall back to
    /// their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let raw: ExportConfiguration = serde_json::from_slice(&data)?;
        let mut conf = ExportConfiguration::new();
        conf.set_mesh_encoding_speed(raw.encoding_speed);
        conf.set_mesh_decoding_speed(raw.decoding_speed);
        for (attribute, level) in raw.quantization {
            conf.set_attribute_quantization_level(attribute, level);
        }
        conf.set_mesh_compression_enabled(raw.mesh_compression);
        conf.set_embedding(raw.embedding);
        Ok(conf)
    }

    pub fn mesh_encoding_speed(&self) -> i32 {
        self.encoding_speed
    }

    pub fn set_mesh_encoding_speed(&mut self, speed: i32) {
        if (0..=MAX_LEVEL).contains(&speed) {
            self.encoding_speed = speed;
        }
    }

    pub fn mesh_decoding_speed(&self) -> i32 {
        self.decoding_speed
    }

    pub fn set_mesh_decoding_speed(&mut self, speed: i32) {
        if (0..=MAX_LEVEL).contains(&speed) {
            self.decoding_speed = speed;
        }
    }

    pub fn attribute_quantization_level(&self, attribute: MeshAttribute) -> i32 {
        self.quantization.get(&attribute).copied().unwrap_or(0)
    }

    pub fn set_attribute_quantization_level(&mut self, attribute: MeshAttribute, level: i32) {
        if (0..=MAX_LEVEL).contains(&level) {
            self.quantization.insert(attribute, level);
        }
    }

    pub fn mesh_compression_enabled(&self) -> bool {
        self.mesh_compression
    }

    pub fn set_mesh_compression_enabled(&mut self, enabled: bool) {
        self.mesh_compression = enabled;
    }

    pub fn embedding(&self) -> Embed {
        self.embedding
    }

    pub fn set_embedding(&mut self, embedding: Embed) {
        self.embedding = embedding;
    }

    /// Codec options: speeds passed through, quantization only for
    /// classes with a positive level.
    pub fn encoder_options(&self) -> EncoderOptions {
        let mut options = EncoderOptions::new();
        options.set_speed_options(self.encoding_speed, self.decoding_speed);
        for attribute in MeshAttribute::ALL {
            let level = self.attribute_quantization_level(attribute);
            if level > 0 {
                options.set_attribute_quantization(attribute.draco_type(), level);
            }
        }
        options
    }
}

/// Settings for [`GltfImporter`](crate::importer::GltfImporter).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Generate flat normals for triangle primitives without `NORMAL`.
    pub generate_normals: bool,
    /// Generate tangents for primitives with normals and `TEXCOORD_0` but
    /// no `TANGENT`.
    pub generate_tangents: bool,
    /// Accessors whose data starts past this many bytes into their buffer
    /// get a zero-offset copy of their data.
    pub large_offset_threshold: Option<usize>,
    /// Directory standing in for `:/` resource paths.
    pub resource_root: Option<PathBuf>,
}
