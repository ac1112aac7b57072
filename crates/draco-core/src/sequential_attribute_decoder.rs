use crate::compression_config::SequentialAttributeEncoderType;
use crate::decoder_buffer::DecoderBuffer;
use crate::draco_types::DataType;
use crate::geometry_attribute::PointAttribute;
use crate::quantization_utils::AttributeQuantization;
use crate::sequential_integer_attribute_decoder::decode_integer_values;
use crate::status::{DracoError, Status};

/// Decodes the values of one attribute. Quantized attributes keep their
/// portable integers until the quantization parameters are read.
#[derive(Debug)]
pub struct SequentialAttributeDecoder {
    decoder_type: SequentialAttributeEncoderType,
    portable_values: Vec<i32>,
}

impl SequentialAttributeDecoder {
    pub fn new(decoder_type: SequentialAttributeEncoderType) -> Result<Self, DracoError> {
        if decoder_type == SequentialAttributeEncoderType::Normals {
            return Err(DracoError::UnsupportedFeature(
                "Octahedral normal attributes".to_string(),
            ));
        }
        Ok(Self {
            decoder_type,
            portable_values: Vec::new(),
        })
    }

    pub fn decoder_type(&self) -> SequentialAttributeEncoderType {
        self.decoder_type
    }

    pub fn decode_values(
        &mut self,
        att: &mut PointAttribute,
        num_points: usize,
        in_buffer: &mut DecoderBuffer,
    ) -> Status {
        let num_components = att.num_components() as usize;
        let num_values = num_points * num_components;
        match self.decoder_type {
            SequentialAttributeEncoderType::Generic => {
                let bytes = in_buffer.decode_slice(num_points * att.byte_stride())?;
                att.set_data(bytes.to_vec());
            }
            SequentialAttributeEncoderType::Integer => {
                if !att.data_type().is_integer_up_to_32_bits() {
                    return Err(DracoError::DracoError(format!(
                        "Integer coder used for {:?} attribute",
                        att.data_type()
                    )));
                }
                let values = decode_integer_values(num_values, num_components, in_buffer)?;
                att.set_data(store_integer_values(att.data_type(), &values));
            }
            SequentialAttributeEncoderType::Quantization => {
                if att.data_type() != DataType::Float32 {
                    return Err(DracoError::DracoError(format!(
                        "Quantization coder used for {:?} attribute",
                        att.data_type()
                    )));
                }
                self.portable_values =
                    decode_integer_values(num_values, num_components, in_buffer)?;
            }
            SequentialAttributeEncoderType::Normals => {
                return Err(DracoError::UnsupportedFeature(
                    "Octahedral normal attributes".to_string(),
                ))
            }
        }
        Ok(())
    }

    pub fn decode_data_needed_by_portable_transform(
        &mut self,
        att: &mut PointAttribute,
        in_buffer: &mut DecoderBuffer,
    ) -> Status {
        if self.decoder_type != SequentialAttributeEncoderType::Quantization {
            return Ok(());
        }
        let quantization = AttributeQuantization::decode(att.num_components() as usize, in_buffer)?;
        let values = quantization.dequantize(&std::mem::take(&mut self.portable_values))?;
        att.set_data(values.iter().flat_map(|v| v.to_le_bytes()).collect());
        Ok(())
    }
}

/// Inverse of the encoder's portable cast.
fn store_integer_values(data_type: DataType, values: &[i32]) -> Vec<u8> {
    match data_type {
        DataType::Int8 | DataType::Uint8 | DataType::Bool => {
            values.iter().map(|&v| v as u8).collect()
        }
        DataType::Int16 | DataType::Uint16 => {
            values.iter().flat_map(|&v| (v as u16).to_le_bytes()).collect()
        }
        _ => values.iter().flat_map(|&v| v.to_le_bytes()).collect(),
    }
}
