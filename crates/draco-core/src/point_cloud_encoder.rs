use crate::compression_config::EncodedGeometryType;
use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::point_cloud::PointCloud;
use crate::sequential_attribute_encoder::SequentialAttributeEncoder;
use crate::status::{DracoError, Status};
use crate::version::DEFAULT_POINT_CLOUD_VERSION;

/// Sequential point cloud encoder.
#[derive(Debug, Default)]
pub struct PointCloudEncoder {
    point_cloud: Option<PointCloud>,
}

impl PointCloudEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_cloud(&self) -> Option<&PointCloud> {
        self.point_cloud.as_ref()
    }

    pub fn set_point_cloud(&mut self, pc: PointCloud) {
        self.point_cloud = Some(pc);
    }

    pub fn encode(&self, options: &EncoderOptions, out_buffer: &mut EncoderBuffer) -> Status {
        let pc = self
            .point_cloud
            .as_ref()
            .ok_or_else(|| DracoError::DracoError("Point cloud not set".to_string()))?;
        encode_point_cloud(pc, options, out_buffer)
    }
}

/// Encodes `pc` with the sequential method.
pub fn encode_point_cloud(
    pc: &PointCloud,
    options: &EncoderOptions,
    out_buffer: &mut EncoderBuffer,
) -> Status {
    validate_point_cloud(pc)?;
    encode_header(
        out_buffer,
        EncodedGeometryType::PointCloud,
        DEFAULT_POINT_CLOUD_VERSION,
    );
    out_buffer.encode_i32(pc.num_points() as i32);
    encode_attributes(pc, options, out_buffer)
}

pub(crate) fn encode_header(
    buffer: &mut EncoderBuffer,
    geometry_type: EncodedGeometryType,
    version: (u8, u8),
) {
    buffer.encode_data(b"DRACO");
    buffer.encode_u8(version.0);
    buffer.encode_u8(version.1);
    buffer.encode_u8(geometry_type as u8);
    // Sequential method, no flags.
    buffer.encode_u8(0);
    buffer.encode_u16(0);
}

/// Checks that the geometry has points and that every attribute holds
/// exactly one entry per point.
pub(crate) fn validate_point_cloud(pc: &PointCloud) -> Status {
    let num_points = pc.num_points();
    if num_points == 0 {
        return Err(DracoError::InvalidParameter(
            "Cannot encode geometry without points".to_string(),
        ));
    }
    if num_points > i32::MAX as usize {
        return Err(DracoError::InvalidParameter(format!(
            "Too many points: {}",
            num_points
        )));
    }
    for (id, att) in pc.attributes().iter().enumerate() {
        if att.num_components() == 0 || att.data().len() != num_points * att.byte_stride() {
            return Err(DracoError::InvalidParameter(format!(
                "Attribute {} holds {} bytes, expected {} entries of {} bytes",
                id,
                att.data().len(),
                num_points,
                att.byte_stride()
            )));
        }
    }
    Ok(())
}

/// Writes the attribute block shared by meshes and point clouds: one
/// sequential encoder describing every attribute.
pub(crate) fn encode_attributes(
    pc: &PointCloud,
    options: &EncoderOptions,
    out_buffer: &mut EncoderBuffer,
) -> Status {
    if pc.num_attributes() == 0 {
        out_buffer.encode_u8(0);
        return Ok(());
    }
    out_buffer.encode_u8(1);

    let encoders = pc
        .attributes()
        .iter()
        .map(|att| SequentialAttributeEncoder::new(att, options))
        .collect::<Result<Vec<_>, _>>()?;

    out_buffer.encode_varint(pc.num_attributes() as u64);
    for att in pc.attributes() {
        out_buffer.encode_u8(att.attribute_type() as u8);
        out_buffer.encode_u8(att.data_type() as u8);
        out_buffer.encode_u8(att.num_components());
        out_buffer.encode_u8(att.normalized() as u8);
        out_buffer.encode_varint(att.unique_id() as u64);
    }
    for encoder in &encoders {
        out_buffer.encode_u8(encoder.encoder_type() as u8);
    }

    for (att, encoder) in pc.attributes().iter().zip(&encoders) {
        encoder.encode_values(att, options, out_buffer)?;
    }
    for encoder in &encoders {
        encoder.encode_data_needed_by_portable_transform(out_buffer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};

    #[test]
    fn test_header_layout() {
        let mut pc = PointCloud::new();
        pc.add_attribute(PointAttribute::from_values(
            GeometryAttributeType::Generic,
            1,
            false,
            &[1u8, 2],
        ));
        let mut encoder = PointCloudEncoder::new();
        encoder.set_point_cloud(pc);
        let mut buffer = EncoderBuffer::new();
        encoder.encode(&EncoderOptions::new(), &mut buffer).unwrap();
        assert_eq!(&buffer.data()[..11], b"DRACO\x02\x03\x00\x00\x00\x00");
        assert_eq!(&buffer.data()[11..15], &2i32.to_le_bytes());
    }

    #[test]
    fn test_empty_point_cloud_rejected() {
        let mut encoder = PointCloudEncoder::new();
        encoder.set_point_cloud(PointCloud::new());
        let mut buffer = EncoderBuffer::new();
        assert!(matches!(
            encoder.encode(&EncoderOptions::new(), &mut buffer),
            Err(DracoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_attribute_size_mismatch_rejected() {
        let mut pc = PointCloud::new();
        pc.add_attribute(PointAttribute::from_values(
            GeometryAttributeType::Position,
            3,
            false,
            &[0.0f32; 9],
        ));
        pc.add_attribute(PointAttribute::from_values(
            GeometryAttributeType::Normal,
            3,
            false,
            &[0.0f32; 6],
        ));
        assert!(validate_point_cloud(&pc).is_err());
    }
}
