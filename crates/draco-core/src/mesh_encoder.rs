use crate::compression_config::{EncodedGeometryType, SequentialConnectivityMethod};
use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::mesh::Mesh;
use crate::point_cloud_encoder::{encode_attributes, encode_header, validate_point_cloud};
use crate::status::{DracoError, Status};
use crate::symbol_encoding::{encode_symbols, SymbolEncodingOptions};
use crate::version::DEFAULT_MESH_VERSION;

/// Sequential mesh encoder: connectivity followed by the attribute block.
#[derive(Debug, Default)]
pub struct MeshEncoder {
    mesh: Option<Mesh>,
}

impl MeshEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = Some(mesh);
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn encode(&self, options: &EncoderOptions, out_buffer: &mut EncoderBuffer) -> Status {
        let mesh = self
            .mesh
            .as_ref()
            .ok_or_else(|| DracoError::DracoError("Mesh not set".to_string()))?;
        encode_mesh(mesh, options, out_buffer)
    }
}

/// Encodes `mesh` with the sequential method.
pub fn encode_mesh(
    mesh: &Mesh,
    options: &EncoderOptions,
    out_buffer: &mut EncoderBuffer,
) -> Status {
    validate_point_cloud(mesh)?;
    let num_points = mesh.num_points();
    if let Some(face) = mesh
        .faces()
        .iter()
        .find(|face| face.iter().any(|&v| v as usize >= num_points))
    {
        return Err(DracoError::InvalidParameter(format!(
            "Face {:?} references a point outside 0..{}",
            face, num_points
        )));
    }

    encode_header(
        out_buffer,
        EncodedGeometryType::TriangularMesh,
        DEFAULT_MESH_VERSION,
    );
    encode_connectivity(mesh, options, out_buffer)?;
    encode_attributes(mesh, options, out_buffer)
}

fn encode_connectivity(
    mesh: &Mesh,
    options: &EncoderOptions,
    out_buffer: &mut EncoderBuffer,
) -> Status {
    let num_points = mesh.num_points();
    out_buffer.encode_varint(mesh.num_faces() as u64);
    out_buffer.encode_varint(num_points as u64);

    if options.use_built_in_compression() {
        out_buffer.encode_u8(SequentialConnectivityMethod::Compressed as u8);
        // Signed difference to the previous index, sign in the lowest bit.
        let mut last_index = 0i64;
        let mut symbols = Vec::with_capacity(mesh.num_faces() * 3);
        for face in mesh.faces() {
            for &index in face {
                let diff = index as i64 - last_index;
                symbols.push(((diff.unsigned_abs() << 1) | (diff < 0) as u64) as u32);
                last_index = index as i64;
            }
        }
        encode_symbols(&symbols, 1, &SymbolEncodingOptions::default(), out_buffer)?;
    } else {
        out_buffer.encode_u8(SequentialConnectivityMethod::Uncompressed as u8);
        let indices = mesh.faces().iter().flatten().copied();
        if num_points < 256 {
            indices.for_each(|i| out_buffer.encode_u8(i as u8));
        } else if num_points < (1 << 16) {
            indices.for_each(|i| out_buffer.encode_u16(i as u16));
        } else if num_points < (1 << 21) {
            indices.for_each(|i| out_buffer.encode_varint(i as u64));
        } else {
            indices.for_each(|i| out_buffer.encode_u32(i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};

    fn triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_attribute(PointAttribute::from_values(
            GeometryAttributeType::Position,
            3,
            false,
            &[0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        ));
        mesh.add_face([0, 1, 2]);
        mesh
    }

    #[test]
    fn test_raw_connectivity_layout() {
        let mut options = EncoderOptions::new();
        options.set_speed_options(10, 10);
        let mut encoder = MeshEncoder::new();
        encoder.set_mesh(triangle());
        let mut buffer = EncoderBuffer::new();
        encoder.encode(&options, &mut buffer).unwrap();
        let data = buffer.data();
        assert_eq!(&data[..11], b"DRACO\x02\x02\x01\x00\x00\x00");
        // 1 face, 3 points, raw method, u8 indices.
        assert_eq!(&data[11..17], &[1, 3, 1, 0, 1, 2]);
    }

    #[test]
    fn test_out_of_range_face_rejected() {
        let mut mesh = triangle();
        mesh.add_face([0, 1, 3]);
        let mut encoder = MeshEncoder::new();
        encoder.set_mesh(mesh);
        let mut buffer = EncoderBuffer::new();
        assert!(encoder.encode(&EncoderOptions::new(), &mut buffer).is_err());
    }
}
