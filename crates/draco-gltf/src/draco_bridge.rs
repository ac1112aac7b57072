//! Conversion between glTF primitive geometry and the Draco codec.

use std::collections::BTreeMap;

use draco_core::{DataType, GeometryAttributeType, Mesh as DracoMesh, PointAttribute};
use log::{debug, warn};

use crate::config::ExportConfiguration;
use crate::error::{GltfError, Result};
use crate::geometry::*;

/// Attributes decoded from a Draco payload, keyed by glTF semantic.
#[derive(Debug, Default)]
pub struct DecodedPrimitive {
    pub attributes: BTreeMap<String, GeometryAttribute>,
    /// `None` for point clouds.
    pub indices: Option<GeometryAttribute>,
}

fn vertex_base_type(data_type: DataType) -> Option<VertexBaseType> {
    match data_type {
        DataType::Int8 => Some(VertexBaseType::Byte),
        DataType::Uint8 => Some(VertexBaseType::UnsignedByte),
        DataType::Int16 => Some(VertexBaseType::Short),
        DataType::Uint16 => Some(VertexBaseType::UnsignedShort),
        DataType::Int32 => Some(VertexBaseType::Int),
        DataType::Uint32 => Some(VertexBaseType::UnsignedInt),
        DataType::Float32 => Some(VertexBaseType::Float),
        DataType::Float64 => Some(VertexBaseType::Double),
        _ => None,
    }
}

fn draco_data_type(base_type: VertexBaseType) -> Option<DataType> {
    match base_type {
        VertexBaseType::Byte => Some(DataType::Int8),
        VertexBaseType::UnsignedByte => Some(DataType::Uint8),
        VertexBaseType::Short => Some(DataType::Int16),
        VertexBaseType::UnsignedShort => Some(DataType::Uint16),
        VertexBaseType::Int => Some(DataType::Int32),
        VertexBaseType::UnsignedInt => Some(DataType::Uint32),
        VertexBaseType::Float => Some(DataType::Float32),
        VertexBaseType::Double => Some(DataType::Float64),
        VertexBaseType::HalfFloat => None,
    }
}

/// Draco attribute class for a standard attribute name.
pub fn draco_attribute_type(name: &str) -> GeometryAttributeType {
    match name {
        POSITION_ATTRIBUTE_NAME => GeometryAttributeType::Position,
        NORMAL_ATTRIBUTE_NAME => GeometryAttributeType::Normal,
        COLOR_ATTRIBUTE_NAME => GeometryAttributeType::Color,
        TEXCOORD_ATTRIBUTE_NAME | TEXCOORD1_ATTRIBUTE_NAME | TEXCOORD2_ATTRIBUTE_NAME => {
            GeometryAttributeType::TexCoord
        }
        _ => GeometryAttributeType::Generic,
    }
}

/// Decodes a `KHR_draco_mesh_compression` payload.
///
/// `attributes` maps glTF semantics to Draco unique ids. Every id must be
/// present in the stream; attributes of an unsupported data type are
/// skipped with a warning, and the decode fails when none is left.
pub fn decode_draco_primitive(
    data: &[u8],
    attributes: &BTreeMap<String, u32>,
) -> Result<DecodedPrimitive> {
    draco_core::get_encoded_geometry_type(data)
        .map_err(|e| GltfError::UnsupportedGeometryType(e.to_string()))?;
    let mesh = draco_core::decode_geometry(data)
        .map_err(|e| GltfError::DracoDecode(e.to_string()))?;

    let mut decoded = DecodedPrimitive::default();
    for (semantic, &id) in attributes {
        let attribute = mesh.attribute_by_unique_id(id).ok_or_else(|| {
            GltfError::DracoDecode(format!("No attribute with id {} for {}", id, semantic))
        })?;
        let Some(base_type) = vertex_base_type(attribute.data_type()) else {
            warn!(
                "Skipping Draco attribute {} of unsupported type {:?}",
                semantic,
                attribute.data_type()
            );
            continue;
        };
        let mut geometry_attribute = GeometryAttribute::packed(
            semantic.clone(),
            AttributeKind::Vertex,
            base_type,
            attribute.num_components() as usize,
            attribute.data().to_vec(),
        )
        .with_semantic(semantic.clone());
        geometry_attribute.normalized = attribute.normalized();
        decoded.attributes.insert(semantic.clone(), geometry_attribute);
    }

    if decoded.attributes.is_empty() {
        return Err(GltfError::DracoDecode("no decodable attribute".into()));
    }

    if mesh.num_faces() > 0 {
        let indices: Vec<u8> = mesh
            .faces()
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        decoded.indices = Some(GeometryAttribute::packed(
            crate::keys::KEY_INDICES,
            AttributeKind::Index,
            VertexBaseType::UnsignedInt,
            1,
            indices,
        ));
    }
    debug!(
        "Decoded Draco primitive: {} points, {} faces",
        mesh.num_points(),
        mesh.num_faces()
    );
    Ok(decoded)
}

/// Output of [`compress_mesh`].
#[derive(Debug, Clone)]
pub struct CompressedMesh {
    pub encoded_buffer: Vec<u8>,
    /// (glTF semantic, Draco unique id) for each encoded attribute.
    pub attributes: Vec<(String, u32)>,
}

/// Encodes a triangle list primitive with the configured options.
///
/// Non indexed geometry is encoded with consecutive faces. Half float
/// attributes are left out with a warning.
pub fn compress_mesh(geometry: &Geometry, config: &ExportConfiguration) -> Result<CompressedMesh> {
    if geometry.primitive_type != PrimitiveType::Triangles {
        return Err(GltfError::EncodingFailed(format!(
            "{:?} primitives cannot be compressed",
            geometry.primitive_type
        )));
    }
    let vertex_count = geometry.vertex_count();
    let indices = match geometry.index_attribute() {
        Some(index) => index.read_indices()?,
        None => (0..vertex_count as u32).collect(),
    };
    if indices.is_empty() || indices.len() % 3 != 0 {
        return Err(GltfError::EncodingFailed(format!(
            "{} indices do not form triangles",
            indices.len()
        )));
    }

    let mut mesh = DracoMesh::new();
    let mut attributes = Vec::new();
    for attribute in geometry.vertex_attributes() {
        let Some(data_type) = draco_data_type(attribute.base_type) else {
            warn!("Skipping half float attribute {} during compression", attribute.name);
            continue;
        };
        if attribute.count != vertex_count {
            return Err(GltfError::EncodingFailed(format!(
                "{} has {} elements for {} vertices",
                attribute.name, attribute.count, vertex_count
            )));
        }
        let num_components = u8::try_from(attribute.vertex_size).map_err(|_| {
            GltfError::EncodingFailed(format!("{} has too many components", attribute.name))
        })?;
        let mut point_attribute = PointAttribute::new(
            draco_attribute_type(&attribute.name),
            data_type,
            num_components,
            attribute.normalized,
        );
        point_attribute.set_data(attribute.packed_bytes()?);
        let id = mesh.add_attribute(point_attribute);
        let semantic = attribute
            .semantic
            .clone()
            .unwrap_or_else(|| attribute.name.clone());
        attributes.push((semantic, id as u32));
    }
    if attributes.is_empty() {
        return Err(GltfError::EncodingFailed("no attribute to encode".into()));
    }
    mesh.set_num_points(vertex_count);
    for face in indices.chunks_exact(3) {
        mesh.add_face([face[0], face[1], face[2]]);
    }

    let buffer = draco_core::encode_mesh_to_buffer(&mesh, &config.encoder_options())
        .map_err(|e| GltfError::EncodingFailed(e.to_string()))?;
    debug!(
        "Compressed {} vertices and {} faces into {} bytes",
        vertex_count,
        mesh.num_faces(),
        buffer.size()
    );
    Ok(CompressedMesh {
        encoded_buffer: buffer.into_data(),
        attributes,
    })
}
