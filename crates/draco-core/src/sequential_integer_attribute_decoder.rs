use crate::decoder_buffer::DecoderBuffer;
use crate::prediction_scheme::{PredictionSchemeMethod, PredictionSchemeTransformType};
use crate::prediction_scheme_delta::compute_original_values;
use crate::prediction_scheme_wrap::WrapTransform;
use crate::status::DracoError;
use crate::symbol_encoding::decode_symbols;

#[inline]
pub fn convert_symbol_to_signed_int(symbol: u32) -> i32 {
    ((symbol >> 1) as i32) ^ -((symbol & 1) as i32)
}

/// Decodes `num_values` integers written by the integer attribute encoder.
pub fn decode_integer_values(
    num_values: usize,
    num_components: usize,
    in_buffer: &mut DecoderBuffer,
) -> Result<Vec<i32>, DracoError> {
    let method = PredictionSchemeMethod::from_byte(in_buffer.decode_i8()?)?;
    if method == PredictionSchemeMethod::Difference {
        let transform = PredictionSchemeTransformType::from_byte(in_buffer.decode_i8()?)?;
        if transform != PredictionSchemeTransformType::Wrap {
            return Err(DracoError::UnsupportedFeature(format!(
                "Prediction transform {:?} for integer attributes",
                transform
            )));
        }
    }

    let compressed = in_buffer.decode_u8()?;
    let symbols = match compressed {
        1 => decode_symbols(num_values, num_components, in_buffer)?,
        0 => {
            let num_bytes = in_buffer.decode_u8()? as usize;
            if num_bytes == 0 || num_bytes > 4 {
                return Err(DracoError::DracoError(format!(
                    "Invalid raw value size: {}",
                    num_bytes
                )));
            }
            let raw = in_buffer.decode_slice(num_values * num_bytes)?;
            raw.chunks_exact(num_bytes)
                .map(|bytes| {
                    let mut value = [0u8; 4];
                    value[..num_bytes].copy_from_slice(bytes);
                    u32::from_le_bytes(value)
                })
                .collect()
        }
        _ => {
            return Err(DracoError::DracoError(format!(
                "Invalid compression flag: {}",
                compressed
            )))
        }
    };

    let values: Vec<i32> = symbols.into_iter().map(convert_symbol_to_signed_int).collect();
    if method == PredictionSchemeMethod::Difference {
        let wrap = WrapTransform::decode(in_buffer)?;
        Ok(compute_original_values(&values, num_components, &wrap))
    } else {
        Ok(values)
    }
}

#[cfg(all(test, feature = "encoder"))]
mod tests {
    use super::*;
    use crate::encoder_buffer::EncoderBuffer;
    use crate::encoder_options::EncoderOptions;
    use crate::sequential_integer_attribute_encoder::{
        convert_signed_int_to_symbol, encode_integer_values,
    };

    #[test]
    fn test_zigzag_inverse() {
        for v in [0, 1, -1, 1234, -98765, i32::MAX, i32::MIN] {
            assert_eq!(convert_symbol_to_signed_int(convert_signed_int_to_symbol(v)), v);
        }
    }

    #[test]
    fn test_integer_values_round_trip() {
        let values = vec![-40, 7, 300, -41, 9, 310, -39, 4, 290, 12, 12, 12];
        for speed in [0, 5, 10] {
            let mut options = EncoderOptions::new();
            options.set_speed_options(speed, speed);
            let mut buffer = EncoderBuffer::new();
            encode_integer_values(&values, 3, &options, &mut buffer).unwrap();
            let mut decoder = DecoderBuffer::new(buffer.data());
            assert_eq!(decode_integer_values(values.len(), 3, &mut decoder).unwrap(), values);
            assert_eq!(decoder.remaining_size(), 0);
        }
    }

    #[test]
    fn test_full_range_falls_back_to_no_prediction() {
        let values = vec![i32::MIN, 0, i32::MAX];
        let options = EncoderOptions::new();
        let mut buffer = EncoderBuffer::new();
        encode_integer_values(&values, 1, &options, &mut buffer).unwrap();
        assert_eq!(buffer.data()[0] as i8, -2);
        let mut decoder = DecoderBuffer::new(buffer.data());
        assert_eq!(decode_integer_values(3, 1, &mut decoder).unwrap(), values);
    }
}
