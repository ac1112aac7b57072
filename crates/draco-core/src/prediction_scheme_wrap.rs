use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::status::DracoError;

/// Wraps prediction corrections into the value range of the attribute so
/// they never need more bits than the values themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapTransform {
    min_value: i32,
    max_value: i32,
    max_dif: i32,
    min_correction: i32,
    max_correction: i32,
}

impl WrapTransform {
    /// Bounds covering `values`. `None` when their span does not fit in an i32.
    pub fn for_values(values: &[i32]) -> Option<Self> {
        let min = values.iter().copied().min()?;
        let max = values.iter().copied().max()?;
        Self::from_bounds(min, max).ok()
    }

    pub fn from_bounds(min_value: i32, max_value: i32) -> Result<Self, DracoError> {
        let dif = max_value as i64 - min_value as i64;
        if dif < 0 || dif >= i32::MAX as i64 {
            return Err(DracoError::DracoError(format!(
                "Invalid wrap bounds [{}, {}]",
                min_value, max_value
            )));
        }
        let max_dif = 1 + dif as i32;
        let mut max_correction = max_dif / 2;
        let min_correction = -max_correction;
        if max_dif & 1 == 0 {
            max_correction -= 1;
        }
        Ok(Self {
            min_value,
            max_value,
            max_dif,
            min_correction,
            max_correction,
        })
    }

    fn clamp_prediction(&self, predicted: i32) -> i32 {
        predicted.clamp(self.min_value, self.max_value)
    }

    pub fn compute_correction(&self, original: i32, predicted: i32) -> i32 {
        let predicted = self.clamp_prediction(predicted);
        let mut corr = original.wrapping_sub(predicted);
        if corr < self.min_correction {
            corr = corr.wrapping_add(self.max_dif);
        } else if corr > self.max_correction {
            corr = corr.wrapping_sub(self.max_dif);
        }
        corr
    }

    pub fn compute_original_value(&self, predicted: i32, corr: i32) -> i32 {
        let predicted = self.clamp_prediction(predicted);
        let mut value = predicted.wrapping_add(corr);
        if value > self.max_value {
            value = value.wrapping_sub(self.max_dif);
        } else if value < self.min_value {
            value = value.wrapping_add(self.max_dif);
        }
        value
    }

    pub fn encode(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_i32(self.min_value);
        buffer.encode_i32(self.max_value);
    }

    pub fn decode(buffer: &mut DecoderBuffer) -> Result<Self, DracoError> {
        let min_value = buffer.decode_i32()?;
        let max_value = buffer.decode_i32()?;
        Self::from_bounds(min_value, max_value)
    }
}
