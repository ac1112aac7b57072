use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::status::DracoError;

/// Maps floats in `[0, range]` to integers in `[0, max_quantized_value]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quantizer {
    inverse_delta: f32,
}

impl Quantizer {
    pub fn new(range: f32, max_quantized_value: i32) -> Self {
        let inverse_delta = if range > 0.0 {
            max_quantized_value as f32 / range
        } else {
            0.0
        };
        Self { inverse_delta }
    }

    pub fn quantize_float(&self, val: f32) -> i32 {
        (val * self.inverse_delta + 0.5).floor() as i32
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Dequantizer {
    delta: f32,
}

impl Dequantizer {
    pub fn new(range: f32, max_quantized_value: i32) -> Result<Self, DracoError> {
        if max_quantized_value <= 0 {
            return Err(DracoError::InvalidParameter(format!(
                "Invalid max quantized value: {}",
                max_quantized_value
            )));
        }
        Ok(Self {
            delta: range / max_quantized_value as f32,
        })
    }

    pub fn dequantize_float(&self, val: i32) -> f32 {
        val as f32 * self.delta
    }
}

/// Per-attribute quantization parameters: one minimum per component and a
/// single range shared by all components.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeQuantization {
    pub quantization_bits: u8,
    pub min_values: Vec<f32>,
    pub range: f32,
}

impl AttributeQuantization {
    /// Computes the parameters covering `values` (interleaved components).
    pub fn compute(
        values: &[f32],
        num_components: usize,
        quantization_bits: u8,
    ) -> Result<Self, DracoError> {
        if !(1..=30).contains(&quantization_bits) {
            return Err(DracoError::InvalidParameter(format!(
                "Quantization bits must be in 1..=30, got {}",
                quantization_bits
            )));
        }
        if values.len() < num_components || num_components == 0 {
            return Err(DracoError::InvalidParameter(
                "Cannot quantize an empty attribute".into(),
            ));
        }
        let mut min_values = values[..num_components].to_vec();
        let mut max_values = min_values.clone();
        for entry in values.chunks_exact(num_components) {
            for (c, &v) in entry.iter().enumerate() {
                if v.is_nan() {
                    return Err(DracoError::InvalidParameter(
                        "Cannot quantize NaN values".into(),
                    ));
                }
                min_values[c] = min_values[c].min(v);
                max_values[c] = max_values[c].max(v);
            }
        }
        let mut range = 0.0f32;
        for (min, max) in min_values.iter().zip(&max_values) {
            if !min.is_finite() || !max.is_finite() {
                return Err(DracoError::InvalidParameter(
                    "Cannot quantize infinite values".into(),
                ));
            }
            range = range.max(max - min);
        }
        // All values equal: any unit range quantizes them to the same value.
        if range == 0.0 {
            range = 1.0;
        }
        Ok(Self {
            quantization_bits,
            min_values,
            range,
        })
    }

    pub fn max_quantized_value(&self) -> i32 {
        ((1u32 << self.quantization_bits) - 1) as i32
    }

    pub fn quantize(&self, values: &[f32]) -> Vec<i32> {
        let quantizer = Quantizer::new(self.range, self.max_quantized_value());
        let num_components = self.min_values.len();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| quantizer.quantize_float(v - self.min_values[i % num_components]))
            .collect()
    }

    pub fn dequantize(&self, values: &[i32]) -> Result<Vec<f32>, DracoError> {
        let dequantizer = Dequantizer::new(self.range, self.max_quantized_value())?;
        let num_components = self.min_values.len();
        Ok(values
            .iter()
            .enumerate()
            .map(|(i, &q)| dequantizer.dequantize_float(q) + self.min_values[i % num_components])
            .collect())
    }

    pub fn encode(&self, buffer: &mut EncoderBuffer) {
        for &min in &self.min_values {
            buffer.encode_f32(min);
        }
        buffer.encode_f32(self.range);
        buffer.encode_u8(self.quantization_bits);
    }

    pub fn decode(num_components: usize, buffer: &mut DecoderBuffer) -> Result<Self, DracoError> {
        let min_values = (0..num_components)
            .map(|_| buffer.decode_f32())
            .collect::<Result<Vec<_>, _>>()?;
        let range = buffer.decode_f32()?;
        let quantization_bits = buffer.decode_u8()?;
        if !(1..=30).contains(&quantization_bits) {
            return Err(DracoError::DracoError(format!(
                "Invalid quantization bits: {}",
                quantization_bits
            )));
        }
        Ok(Self {
            quantization_bits,
            min_values,
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantizer_round_trip() {
        let quantizer = Quantizer::new(10.0, 1023);
        let dequantizer = Dequantizer::new(10.0, 1023).unwrap();
        for &v in &[0.0f32, 1.2345, 5.0, 9.999, 10.0] {
            let q = quantizer.quantize_float(v);
            assert!((0..=1023).contains(&q));
            assert!((dequantizer.dequantize_float(q) - v).abs() <= 10.0 / 1023.0);
        }
    }

    #[test]
    fn test_parameters_use_largest_extent() {
        let values = [0.0, -1.0, 2.0, 4.0, 1.0, 3.0];
        let params = AttributeQuantization::compute(&values, 2, 8).unwrap();
        assert_eq!(params.min_values, vec![0.0, -1.0]);
        assert_eq!(params.range, 4.0);
        assert_eq!(params.max_quantized_value(), 255);
    }

    #[test]
    fn test_constant_values_get_unit_range() {
        let params = AttributeQuantization::compute(&[3.0, 3.0, 3.0], 1, 4).unwrap();
        assert_eq!(params.range, 1.0);
        assert_eq!(params.quantize(&[3.0, 3.0, 3.0]), vec![0, 0, 0]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(AttributeQuantization::compute(&[1.0], 1, 0).is_err());
        assert!(AttributeQuantization::compute(&[f32::NAN], 1, 8).is_err());
        assert!(AttributeQuantization::compute(&[f32::INFINITY, 0.0], 1, 8).is_err());
    }
}
