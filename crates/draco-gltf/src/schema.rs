//! Serde view of the glTF JSON objects the importer reads.
//!
//! Only the members used by the import pipeline are declared; everything
//! else is ignored. The exporter works on the raw `serde_json::Value` tree
//! instead so that unknown members survive.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Document {
    pub asset: Option<Asset>,
    #[serde(default)]
    pub buffers: Vec<RawBuffer>,
    #[serde(default)]
    pub buffer_views: Vec<RawBufferView>,
    #[serde(default)]
    pub accessors: Vec<RawAccessor>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub samplers: Vec<RawSampler>,
    #[serde(default)]
    pub textures: Vec<RawTexture>,
    #[serde(default)]
    pub meshes: Vec<RawMesh>,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Asset {
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawBuffer {
    pub uri: Option<String>,
    pub byte_length: usize,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawBufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    #[serde(default)]
    pub byte_stride: usize,
    pub name: Option<String>,
    pub extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAccessor {
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: Option<u32>,
    #[serde(default)]
    pub normalized: bool,
    pub count: Option<usize>,
    #[serde(rename = "type")]
    pub accessor_type: Option<String>,
    #[serde(default)]
    pub min: Vec<f64>,
    #[serde(default)]
    pub max: Vec<f64>,
    pub sparse: Option<RawSparse>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSparse {
    pub count: usize,
    pub indices: RawSparseIndices,
    pub values: RawSparseValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSparseIndices {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSparseValues {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawImage {
    pub uri: Option<String>,
    pub buffer_view: Option<usize>,
    pub mime_type: Option<String>,
    pub name: Option<String>,
    pub extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSampler {
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: Option<u32>,
    pub wrap_t: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTexture {
    pub sampler: Option<usize>,
    pub source: Option<usize>,
    pub name: Option<String>,
    pub extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMesh {
    #[serde(default)]
    pub primitives: Vec<RawPrimitive>,
    #[serde(default)]
    pub weights: Vec<f32>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPrimitive {
    #[serde(default)]
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub mode: Option<u32>,
    pub material: Option<usize>,
    #[serde(default)]
    pub targets: Vec<BTreeMap<String, usize>>,
    pub extensions: Option<Value>,
}

impl RawPrimitive {
    /// The `KHR_draco_mesh_compression` object, if any.
    pub fn draco_extension(&self) -> Option<serde_json::Result<RawDracoExtension>> {
        let ext = self
            .extensions
            .as_ref()?
            .get(crate::keys::KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION)?;
        Some(RawDracoExtension::deserialize(ext))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDracoExtension {
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub attributes: BTreeMap<String, u32>,
}
