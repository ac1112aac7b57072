use crate::compression_config::{EncodedGeometryType, SequentialConnectivityMethod};
use crate::decoder_buffer::DecoderBuffer;
use crate::mesh::Mesh;
use crate::point_cloud_decoder::{decode_attributes, DracoHeader};
use crate::status::{DracoError, Status};
use crate::symbol_encoding::decode_symbols;
use crate::version::{version_at_least, VERSION_VARINT_RAW_INDICES};

/// Sequential mesh decoder.
#[derive(Debug, Default)]
pub struct MeshDecoder {
    header: Option<DracoHeader>,
}

impl MeshDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<&DracoHeader> {
        self.header.as_ref()
    }

    pub fn decode(&mut self, in_buffer: &mut DecoderBuffer, out_mesh: &mut Mesh) -> Status {
        let header = DracoHeader::parse(in_buffer)?;
        if header.encoder_type != EncodedGeometryType::TriangularMesh {
            return Err(DracoError::DracoError(
                "Input is not a mesh".to_string(),
            ));
        }
        header.validate()?;
        in_buffer.set_version(header.version_major, header.version_minor);
        self.header = Some(header);

        *out_mesh = decode_mesh_body(in_buffer)?;
        Ok(())
    }
}

/// Decodes connectivity and attributes following a validated mesh header.
pub(crate) fn decode_mesh_body(in_buffer: &mut DecoderBuffer) -> Result<Mesh, DracoError> {
    let mut mesh = Mesh::new();
    let num_faces = in_buffer.decode_varint_u32()? as usize;
    let num_points = in_buffer.decode_varint_u32()? as usize;
    if num_faces > (u32::MAX / 3) as usize {
        return Err(DracoError::DracoError(format!(
            "Invalid number of faces: {}",
            num_faces
        )));
    }
    // Every connectivity symbol takes at least one bit of the remaining input.
    if num_faces * 3 > in_buffer.remaining_size().saturating_mul(8) {
        return Err(DracoError::DracoError(format!(
            "Number of faces {} exceeds the remaining input",
            num_faces
        )));
    }
    mesh.set_num_points(num_points);

    let method = in_buffer.decode_u8()?;
    let indices = if method == SequentialConnectivityMethod::Compressed as u8 {
        decode_compressed_indices(num_faces * 3, num_points, in_buffer)?
    } else if method == SequentialConnectivityMethod::Uncompressed as u8 {
        decode_raw_indices(num_faces * 3, num_points, in_buffer)?
    } else {
        return Err(DracoError::DracoError(format!(
            "Unsupported sequential connectivity method: {}",
            method
        )));
    };
    for face in indices.chunks_exact(3) {
        mesh.add_face([face[0], face[1], face[2]]);
    }

    decode_attributes(&mut mesh, in_buffer)?;
    Ok(mesh)
}

fn decode_compressed_indices(
    num_indices: usize,
    num_points: usize,
    in_buffer: &mut DecoderBuffer,
) -> Result<Vec<u32>, DracoError> {
    let symbols = decode_symbols(num_indices, 1, in_buffer)?;
    let mut last_index = 0i64;
    let mut indices = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let magnitude = (symbol >> 1) as i64;
        let diff = if symbol & 1 != 0 { -magnitude } else { magnitude };
        let index = last_index + diff;
        if index < 0 || index as usize >= num_points {
            return Err(DracoError::DracoError(format!(
                "Point index {} out of range",
                index
            )));
        }
        indices.push(index as u32);
        last_index = index;
    }
    Ok(indices)
}

fn decode_raw_indices(
    num_indices: usize,
    num_points: usize,
    in_buffer: &mut DecoderBuffer,
) -> Result<Vec<u32>, DracoError> {
    let (major, minor) = in_buffer.version();
    if num_indices > in_buffer.remaining_size() {
        return Err(DracoError::DracoError(format!(
            "{} raw indices do not fit in {} bytes",
            num_indices,
            in_buffer.remaining_size()
        )));
    }
    let mut indices = Vec::with_capacity(num_indices.min(in_buffer.remaining_size()));
    for _ in 0..num_indices {
        let index = if num_points < 256 {
            in_buffer.decode_u8()? as u32
        } else if num_points < (1 << 16) {
            in_buffer.decode_u16()? as u32
        } else if num_points < (1 << 21)
            && version_at_least(major, minor, VERSION_VARINT_RAW_INDICES)
        {
            in_buffer.decode_varint_u32()?
        } else {
            in_buffer.decode_u32()?
        };
        if index as usize >= num_points {
            return Err(DracoError::DracoError(format!(
                "Point index {} out of range",
                index
            )));
        }
        indices.push(index);
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_cloud_stream_rejected() {
        let data = b"DRACO\x02\x03\x00\x00\x00\x00\x01\x00\x00\x00\x00";
        let mut mesh = Mesh::new();
        let result = MeshDecoder::new().decode(&mut DecoderBuffer::new(data), &mut mesh);
        assert!(result.is_err());
    }

    #[test]
    fn test_raw_triangle() {
        let mut data = b"DRACO\x02\x02\x01\x00\x00\x00".to_vec();
        // One face over three points, raw u8 indices, no attributes.
        data.extend_from_slice(&[1, 3, 1, 2, 1, 0, 0]);
        let mut mesh = Mesh::new();
        MeshDecoder::new()
            .decode(&mut DecoderBuffer::new(&data), &mut mesh)
            .unwrap();
        assert_eq!(mesh.faces(), &[[2, 1, 0]]);
        assert_eq!(mesh.num_points(), 3);
        assert_eq!(mesh.num_attributes(), 0);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut data = b"DRACO\x02\x02\x01\x00\x00\x00".to_vec();
        data.extend_from_slice(&[1, 3, 1, 0, 1, 3, 0]);
        let mut mesh = Mesh::new();
        assert!(MeshDecoder::new()
            .decode(&mut DecoderBuffer::new(&data), &mut mesh)
            .is_err());
    }
}
