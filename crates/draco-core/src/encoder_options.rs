use crate::geometry_attribute::GeometryAttributeType;
use std::collections::HashMap;

/// Options steering the sequential encoder.
///
/// Speeds run from 0 (best compression) to 10 (fastest). Quantization is
/// configured per attribute type; a type without a positive bit count is
/// stored losslessly.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    encoding_speed: i32,
    decoding_speed: i32,
    quantization_bits: HashMap<GeometryAttributeType, i32>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            encoding_speed: 5,
            decoding_speed: 5,
            quantization_bits: HashMap::new(),
        }
    }
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both speeds, clamped to 0..=10.
    pub fn set_speed_options(&mut self, encoding_speed: i32, decoding_speed: i32) {
        self.encoding_speed = encoding_speed.clamp(0, 10);
        self.decoding_speed = decoding_speed.clamp(0, 10);
    }

    pub fn encoding_speed(&self) -> i32 {
        self.encoding_speed
    }

    pub fn decoding_speed(&self) -> i32 {
        self.decoding_speed
    }

    /// The faster of the two speeds drives encoder decisions.
    pub fn speed(&self) -> i32 {
        self.encoding_speed.max(self.decoding_speed)
    }

    /// Symbol coding compression level, 0 (fast) to 10 (small).
    pub fn compression_level(&self) -> i32 {
        10 - self.speed()
    }

    /// Speed 10 stores connectivity and attribute symbols without entropy coding.
    pub fn use_built_in_compression(&self) -> bool {
        self.speed() < 10
    }

    pub fn set_attribute_quantization(&mut self, attribute_type: GeometryAttributeType, bits: i32) {
        self.quantization_bits.insert(attribute_type, bits);
    }

    /// Quantization bits for `attribute_type`, if quantization is enabled.
    pub fn quantization_bits(&self, attribute_type: GeometryAttributeType) -> Option<u8> {
        match self.quantization_bits.get(&attribute_type) {
            Some(&bits) if bits > 0 => Some(bits.min(30) as u8),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_selection() {
        let mut options = EncoderOptions::new();
        assert_eq!(options.speed(), 5);
        options.set_speed_options(2, 7);
        assert_eq!(options.speed(), 7);
        assert_eq!(options.compression_level(), 3);
        assert!(options.use_built_in_compression());
        options.set_speed_options(15, 0);
        assert_eq!(options.encoding_speed(), 10);
        assert!(!options.use_built_in_compression());
    }

    #[test]
    fn test_quantization_lookup() {
        let mut options = EncoderOptions::new();
        options.set_attribute_quantization(GeometryAttributeType::Position, 11);
        options.set_attribute_quantization(GeometryAttributeType::Normal, 0);
        assert_eq!(options.quantization_bits(GeometryAttributeType::Position), Some(11));
        assert_eq!(options.quantization_bits(GeometryAttributeType::Normal), None);
        assert_eq!(options.quantization_bits(GeometryAttributeType::Color), None);
    }
}
