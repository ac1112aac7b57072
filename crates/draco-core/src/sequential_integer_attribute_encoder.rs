use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::prediction_scheme::{PredictionSchemeMethod, PredictionSchemeTransformType};
use crate::prediction_scheme_delta::compute_correction_values;
use crate::prediction_scheme_wrap::WrapTransform;
use crate::status::Status;
use crate::symbol_encoding::{encode_symbols, SymbolEncodingOptions};

/// Folds the sign into the least significant bit.
#[inline]
pub fn convert_signed_int_to_symbol(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Encodes integer values with difference prediction and the wrap
/// transform, followed by the wrap bounds.
///
/// Values whose span does not fit an i32 are stored without prediction.
pub fn encode_integer_values(
    values: &[i32],
    num_components: usize,
    options: &EncoderOptions,
    out_buffer: &mut EncoderBuffer,
) -> Status {
    let wrap = WrapTransform::for_values(values);
    let symbols: Vec<u32> = match &wrap {
        Some(wrap) => {
            out_buffer.encode_i8(PredictionSchemeMethod::Difference as i8);
            out_buffer.encode_i8(PredictionSchemeTransformType::Wrap as i8);
            compute_correction_values(values, num_components, wrap)
                .into_iter()
                .map(convert_signed_int_to_symbol)
                .collect()
        }
        None => {
            out_buffer.encode_i8(PredictionSchemeMethod::None as i8);
            values.iter().copied().map(convert_signed_int_to_symbol).collect()
        }
    };

    if options.use_built_in_compression() {
        out_buffer.encode_u8(1);
        let symbol_options =
            SymbolEncodingOptions::with_compression_level(options.compression_level());
        encode_symbols(&symbols, num_components, &symbol_options, out_buffer)?;
    } else {
        // Raw values, using only as many bytes as the largest one needs.
        let masked_value = symbols.iter().fold(0u32, |acc, &s| acc | s);
        let msb_pos = if masked_value == 0 {
            0
        } else {
            31 - masked_value.leading_zeros() as usize
        };
        let num_bytes = 1 + msb_pos / 8;
        out_buffer.encode_u8(0);
        out_buffer.encode_u8(num_bytes as u8);
        for s in &symbols {
            out_buffer.encode_data(&s.to_le_bytes()[..num_bytes]);
        }
    }

    if let Some(wrap) = wrap {
        wrap.encode(out_buffer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag() {
        assert_eq!(convert_signed_int_to_symbol(0), 0);
        assert_eq!(convert_signed_int_to_symbol(-1), 1);
        assert_eq!(convert_signed_int_to_symbol(1), 2);
        assert_eq!(convert_signed_int_to_symbol(-2), 3);
        assert_eq!(convert_signed_int_to_symbol(i32::MIN), u32::MAX);
    }

    #[test]
    fn test_uncompressed_layout() {
        let mut options = EncoderOptions::new();
        options.set_speed_options(10, 10);
        let mut buffer = EncoderBuffer::new();
        encode_integer_values(&[5, 6, 7], 1, &options, &mut buffer).unwrap();
        // Difference + wrap, raw flag, one byte per value, then bounds [5, 7].
        assert_eq!(
            buffer.data(),
            &[0, 1, 0, 1, 0, 2, 2, 5, 0, 0, 0, 7, 0, 0, 0]
        );
    }
}
