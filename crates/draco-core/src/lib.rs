//! Draco Core Library
//!
//! Sequential Draco compression and decompression of triangle meshes and
//! point clouds. Streams use bitstream version 2.2 for meshes and 2.3 for
//! point clouds; Edgebreaker, KD-tree and metadata streams are rejected.

#![allow(clippy::needless_range_loop)]

// =============================================================================
// Core modules - always available
// =============================================================================

pub mod ans;
pub mod compression_config;
pub mod decoder_buffer;
pub mod draco_types;
pub mod encoder_buffer;
pub mod geometry_attribute;
pub mod mesh;
pub mod point_cloud;
pub mod prediction_scheme;
pub mod prediction_scheme_delta;
pub mod prediction_scheme_wrap;
pub mod quantization_utils;
pub mod rans_symbol_coding;
pub mod rans_symbol_decoder;
pub mod rans_symbol_encoder;
pub mod status;
pub mod symbol_encoding;
pub mod version;

// =============================================================================
// Decoder-only modules
// =============================================================================

#[cfg(feature = "decoder")]
pub mod mesh_decoder;
#[cfg(feature = "decoder")]
pub mod point_cloud_decoder;
#[cfg(feature = "decoder")]
pub mod sequential_attribute_decoder;
#[cfg(feature = "decoder")]
pub mod sequential_integer_attribute_decoder;

// =============================================================================
// Encoder-only modules
// =============================================================================

#[cfg(feature = "encoder")]
pub mod encoder_options;
#[cfg(feature = "encoder")]
pub mod mesh_encoder;
#[cfg(feature = "encoder")]
pub mod point_cloud_encoder;
#[cfg(feature = "encoder")]
pub mod sequential_attribute_encoder;
#[cfg(feature = "encoder")]
pub mod sequential_integer_attribute_encoder;

// =============================================================================
// Core re-exports - always available
// =============================================================================

pub use compression_config::EncodedGeometryType;
pub use decoder_buffer::DecoderBuffer;
pub use draco_types::DataType;
pub use encoder_buffer::EncoderBuffer;
pub use geometry_attribute::{AttributeValue, GeometryAttributeType, PointAttribute};
pub use mesh::{Face, Mesh};
pub use point_cloud::PointCloud;
pub use status::{DracoError, Status};

// =============================================================================
// Decoder re-exports
// =============================================================================

#[cfg(feature = "decoder")]
pub use mesh_decoder::MeshDecoder;
#[cfg(feature = "decoder")]
pub use point_cloud_decoder::{DracoHeader, PointCloudDecoder};

// =============================================================================
// Encoder re-exports
// =============================================================================

#[cfg(feature = "encoder")]
pub use encoder_options::EncoderOptions;
#[cfg(feature = "encoder")]
pub use mesh_encoder::MeshEncoder;
#[cfg(feature = "encoder")]
pub use point_cloud_encoder::PointCloudEncoder;

// =============================================================================
// Convenience entry points
// =============================================================================

/// Reads the geometry type stored in the header of `data`.
pub fn get_encoded_geometry_type(data: &[u8]) -> Result<EncodedGeometryType, DracoError> {
    let mut buffer = DecoderBuffer::new(data);
    #[cfg(feature = "decoder")]
    {
        Ok(DracoHeader::parse(&mut buffer)?.encoder_type)
    }
    #[cfg(not(feature = "decoder"))]
    {
        let magic = buffer.decode_slice(5)?;
        if magic != b"DRACO" {
            return Err(DracoError::DracoError("Not a Draco file".to_string()));
        }
        buffer.advance(2)?;
        EncodedGeometryType::try_from(buffer.decode_u8()?)
    }
}

#[cfg(feature = "decoder")]
pub fn decode_mesh(data: &[u8]) -> Result<Mesh, DracoError> {
    let mut mesh = Mesh::new();
    MeshDecoder::new().decode(&mut DecoderBuffer::new(data), &mut mesh)?;
    Ok(mesh)
}

/// Decodes any supported stream as a point cloud. Faces of mesh streams
/// are dropped.
#[cfg(feature = "decoder")]
pub fn decode_point_cloud(data: &[u8]) -> Result<PointCloud, DracoError> {
    let mut pc = PointCloud::new();
    PointCloudDecoder::new().decode(&mut DecoderBuffer::new(data), &mut pc)?;
    Ok(pc)
}

/// Decodes a mesh or point cloud stream. Point clouds come back as meshes
/// without faces.
#[cfg(feature = "decoder")]
pub fn decode_geometry(data: &[u8]) -> Result<Mesh, DracoError> {
    match get_encoded_geometry_type(data)? {
        EncodedGeometryType::TriangularMesh => decode_mesh(data),
        EncodedGeometryType::PointCloud => decode_point_cloud(data).map(Mesh::from),
    }
}

#[cfg(feature = "encoder")]
pub fn encode_mesh_to_buffer(
    mesh: &Mesh,
    options: &EncoderOptions,
) -> Result<EncoderBuffer, DracoError> {
    let mut buffer = EncoderBuffer::new();
    mesh_encoder::encode_mesh(mesh, options, &mut buffer)?;
    Ok(buffer)
}

#[cfg(feature = "encoder")]
pub fn encode_point_cloud_to_buffer(
    pc: &PointCloud,
    options: &EncoderOptions,
) -> Result<EncoderBuffer, DracoError> {
    let mut buffer = EncoderBuffer::new();
    point_cloud_encoder::encode_point_cloud(pc, options, &mut buffer)?;
    Ok(buffer)
}
