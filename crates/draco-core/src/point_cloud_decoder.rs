use crate::compression_config::{EncodedGeometryType, SequentialAttributeEncoderType};
use crate::decoder_buffer::DecoderBuffer;
use crate::draco_types::DataType;
use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::point_cloud::PointCloud;
use crate::sequential_attribute_decoder::SequentialAttributeDecoder;
use crate::status::{DracoError, Status};
use crate::version::{is_supported_version, DEFAULT_MESH_VERSION, DEFAULT_POINT_CLOUD_VERSION};

const METADATA_FLAG_MASK: u16 = 0x8000;

/// Fixed header at the start of every Draco stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DracoHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub encoder_type: EncodedGeometryType,
    pub encoder_method: u8,
    pub flags: u16,
}

impl DracoHeader {
    /// Reads the header without checking whether the stream can be decoded.
    pub fn parse(buffer: &mut DecoderBuffer) -> Result<Self, DracoError> {
        let magic = buffer.decode_slice(5)?;
        if magic != b"DRACO" {
            return Err(DracoError::DracoError("Not a Draco file".to_string()));
        }
        let version_major = buffer.decode_u8()?;
        let version_minor = buffer.decode_u8()?;
        let encoder_type = EncodedGeometryType::try_from(buffer.decode_u8()?)?;
        let encoder_method = buffer.decode_u8()?;
        let flags = buffer.decode_u16()?;
        Ok(Self {
            version_major,
            version_minor,
            encoder_type,
            encoder_method,
            flags,
        })
    }

    /// Rejects versions and features this decoder does not implement.
    pub fn validate(&self) -> Status {
        let latest = match self.encoder_type {
            EncodedGeometryType::PointCloud => DEFAULT_POINT_CLOUD_VERSION,
            EncodedGeometryType::TriangularMesh => DEFAULT_MESH_VERSION,
        };
        if !is_supported_version(self.version_major, self.version_minor, latest) {
            return Err(DracoError::UnsupportedVersion(format!(
                "{}.{}",
                self.version_major, self.version_minor
            )));
        }
        if self.encoder_method != 0 {
            let name = match self.encoder_type {
                EncodedGeometryType::PointCloud => "KD-tree point cloud encoding",
                EncodedGeometryType::TriangularMesh => "Edgebreaker mesh encoding",
            };
            return Err(DracoError::UnsupportedFeature(name.to_string()));
        }
        if self.flags & METADATA_FLAG_MASK != 0 {
            return Err(DracoError::UnsupportedFeature("Metadata".to_string()));
        }
        Ok(())
    }
}

/// Decodes point clouds. Mesh streams are accepted too; their faces are
/// dropped.
#[derive(Debug, Default)]
pub struct PointCloudDecoder {
    header: Option<DracoHeader>,
}

impl PointCloudDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<&DracoHeader> {
        self.header.as_ref()
    }

    pub fn decode(&mut self, in_buffer: &mut DecoderBuffer, out_pc: &mut PointCloud) -> Status {
        let header = DracoHeader::parse(in_buffer)?;
        header.validate()?;
        in_buffer.set_version(header.version_major, header.version_minor);
        self.header = Some(header);

        match header.encoder_type {
            EncodedGeometryType::PointCloud => {
                let num_points = in_buffer.decode_i32()?;
                if num_points < 0 {
                    return Err(DracoError::DracoError(format!(
                        "Invalid number of points: {}",
                        num_points
                    )));
                }
                out_pc.set_num_points(num_points as usize);
                decode_attributes(out_pc, in_buffer)
            }
            EncodedGeometryType::TriangularMesh => {
                let mesh = crate::mesh_decoder::decode_mesh_body(in_buffer)?;
                *out_pc = mesh.into_point_cloud();
                Ok(())
            }
        }
    }
}

/// Reads the attribute block written after the geometry data.
pub(crate) fn decode_attributes(pc: &mut PointCloud, in_buffer: &mut DecoderBuffer) -> Status {
    let num_decoders = in_buffer.decode_u8()?;
    let num_points = pc.num_points();
    for _ in 0..num_decoders {
        let num_attributes = in_buffer.decode_varint_u32()? as usize;
        if num_attributes == 0 {
            return Err(DracoError::DracoError(
                "Attribute decoder without attributes".to_string(),
            ));
        }

        let mut att_ids = Vec::new();
        for _ in 0..num_attributes {
            let attribute_type = GeometryAttributeType::try_from(in_buffer.decode_u8()?)?;
            let data_type = DataType::try_from(in_buffer.decode_u8()?)?;
            let num_components = in_buffer.decode_u8()?;
            let normalized = in_buffer.decode_u8()? > 0;
            let unique_id = in_buffer.decode_varint_u32()?;
            if data_type == DataType::Invalid || num_components == 0 {
                return Err(DracoError::DracoError(format!(
                    "Invalid attribute descriptor: {:?} x {}",
                    data_type, num_components
                )));
            }
            let mut att =
                PointAttribute::new(attribute_type, data_type, num_components, normalized);
            att.set_unique_id(unique_id);
            att_ids.push(pc.push_decoded_attribute(att));
        }

        let mut decoders = Vec::with_capacity(att_ids.len());
        for _ in &att_ids {
            let decoder_type = SequentialAttributeEncoderType::try_from(in_buffer.decode_u8()?)?;
            decoders.push(SequentialAttributeDecoder::new(decoder_type)?);
        }

        for (&att_id, decoder) in att_ids.iter().zip(decoders.iter_mut()) {
            decoder.decode_values(pc.attribute_mut(att_id), num_points, in_buffer)?;
        }
        for (&att_id, decoder) in att_ids.iter().zip(decoders.iter_mut()) {
            decoder.decode_data_needed_by_portable_transform(pc.attribute_mut(att_id), in_buffer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(major: u8, minor: u8, geometry: u8, method: u8, flags: u16) -> Vec<u8> {
        let mut data = b"DRACO".to_vec();
        data.extend_from_slice(&[major, minor, geometry, method]);
        data.extend_from_slice(&flags.to_le_bytes());
        data
    }

    #[test]
    fn test_header_validation() {
        let parse = |data: &[u8]| DracoHeader::parse(&mut DecoderBuffer::new(data));

        assert!(parse(&header_bytes(2, 2, 1, 0, 0)).unwrap().validate().is_ok());
        assert!(parse(&header_bytes(2, 3, 0, 0, 0)).unwrap().validate().is_ok());
        assert!(matches!(
            parse(&header_bytes(2, 3, 1, 0, 0)).unwrap().validate(),
            Err(DracoError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse(&header_bytes(1, 3, 1, 0, 0)).unwrap().validate(),
            Err(DracoError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse(&header_bytes(2, 2, 1, 1, 0)).unwrap().validate(),
            Err(DracoError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            parse(&header_bytes(2, 2, 1, 0, 0x8000)).unwrap().validate(),
            Err(DracoError::UnsupportedFeature(_))
        ));
        assert!(parse(b"DRACU\x02\x02\x01\x00\x00\x00").is_err());
        assert!(parse(b"DRA").is_err());
    }
}
