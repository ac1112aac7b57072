use crate::compression_config::SequentialAttributeEncoderType;
use crate::draco_types::DataType;
use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::geometry_attribute::PointAttribute;
use crate::quantization_utils::AttributeQuantization;
use crate::sequential_integer_attribute_encoder::encode_integer_values;
use crate::status::{DracoError, Status};

/// Sequential coder chosen for a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum SequentialAttributeEncoder {
    /// Raw entry bytes.
    Generic,
    /// Integer values up to 32 bits with delta prediction.
    Integer,
    /// Float values quantized to integers, then coded as `Integer`.
    Quantization(AttributeQuantization),
}

impl SequentialAttributeEncoder {
    /// Picks the coder for `att`. Float attributes are quantized only when
    /// the options request bits for their type.
    pub fn new(att: &PointAttribute, options: &EncoderOptions) -> Result<Self, DracoError> {
        let data_type = att.data_type();
        if data_type == DataType::Float32 {
            if let Some(bits) = options.quantization_bits(att.attribute_type()) {
                let values = float_values(att)?;
                let quantization =
                    AttributeQuantization::compute(&values, att.num_components() as usize, bits)?;
                return Ok(Self::Quantization(quantization));
            }
            return Ok(Self::Generic);
        }
        if data_type.is_integer_up_to_32_bits() {
            return Ok(Self::Integer);
        }
        Ok(Self::Generic)
    }

    pub fn encoder_type(&self) -> SequentialAttributeEncoderType {
        match self {
            Self::Generic => SequentialAttributeEncoderType::Generic,
            Self::Integer => SequentialAttributeEncoderType::Integer,
            Self::Quantization(_) => SequentialAttributeEncoderType::Quantization,
        }
    }

    pub fn encode_values(
        &self,
        att: &PointAttribute,
        options: &EncoderOptions,
        out_buffer: &mut EncoderBuffer,
    ) -> Status {
        let num_components = att.num_components() as usize;
        match self {
            Self::Generic => {
                out_buffer.encode_data(att.data());
                Ok(())
            }
            Self::Integer => {
                let values = portable_integer_values(att)?;
                encode_integer_values(&values, num_components, options, out_buffer)
            }
            Self::Quantization(quantization) => {
                let values = quantization.quantize(&float_values(att)?);
                encode_integer_values(&values, num_components, options, out_buffer)
            }
        }
    }

    /// Writes whatever the decoder needs to map portable values back.
    pub fn encode_data_needed_by_portable_transform(&self, out_buffer: &mut EncoderBuffer) {
        if let Self::Quantization(quantization) = self {
            quantization.encode(out_buffer);
        }
    }
}

fn float_values(att: &PointAttribute) -> Result<Vec<f32>, DracoError> {
    att.values::<f32>()
        .ok_or_else(|| DracoError::InvalidParameter("Attribute values are not float".to_string()))
}

/// Converts integer components to i32 the way a C cast would, so unsigned
/// 32-bit values wrap into the negative range.
fn portable_integer_values(att: &PointAttribute) -> Result<Vec<i32>, DracoError> {
    let data = att.data();
    let values = match att.data_type() {
        DataType::Int8 => data.iter().map(|&b| b as i8 as i32).collect(),
        DataType::Uint8 | DataType::Bool => data.iter().map(|&b| b as i32).collect(),
        DataType::Int16 => data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as i32)
            .collect(),
        DataType::Uint16 => data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as i32)
            .collect(),
        DataType::Int32 | DataType::Uint32 => data
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        other => {
            return Err(DracoError::InvalidParameter(format!(
                "{:?} is not an integer attribute",
                other
            )))
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_attribute::GeometryAttributeType;

    #[test]
    fn test_coder_selection() {
        let mut options = EncoderOptions::new();
        let pos =
            PointAttribute::from_values(GeometryAttributeType::Position, 3, false, &[0.0f32; 9]);
        let uv = PointAttribute::from_values(GeometryAttributeType::TexCoord, 2, false, &[0u16; 6]);
        let big = PointAttribute::from_values(GeometryAttributeType::Generic, 1, false, &[0f64; 3]);

        assert_eq!(
            SequentialAttributeEncoder::new(&pos, &options).unwrap(),
            SequentialAttributeEncoder::Generic
        );
        options.set_attribute_quantization(GeometryAttributeType::Position, 11);
        assert_eq!(
            SequentialAttributeEncoder::new(&pos, &options).unwrap().encoder_type(),
            SequentialAttributeEncoderType::Quantization
        );
        assert_eq!(
            SequentialAttributeEncoder::new(&uv, &options).unwrap(),
            SequentialAttributeEncoder::Integer
        );
        assert_eq!(
            SequentialAttributeEncoder::new(&big, &options).unwrap(),
            SequentialAttributeEncoder::Generic
        );
    }

    #[test]
    fn test_unsigned_cast() {
        let att =
            PointAttribute::from_values(GeometryAttributeType::Generic, 1, false, &[u32::MAX, 7]);
        assert_eq!(portable_integer_values(&att).unwrap(), vec![-1, 7]);
    }
}
