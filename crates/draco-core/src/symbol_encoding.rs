//! Entropy coding of unsigned symbol streams.
//!
//! Two schemes share one entry point:
//! - tagged: the bit length of every entry is rANS coded, the raw bits follow;
//! - raw: symbols are rANS coded directly with an adaptive precision.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::rans_symbol_coding::compute_rans_precision_from_unique_symbols_bit_length;
use crate::rans_symbol_decoder::RAnsSymbolDecoder;
use crate::rans_symbol_encoder::RAnsSymbolEncoder;
use crate::status::DracoError;

const TAGGED_SCHEME: u8 = 0;
const RAW_SCHEME: u8 = 1;
const MAX_RAW_ENCODING_BIT_LENGTH: u32 = 18;
const MAX_TAG_SYMBOL_BIT_LENGTH: usize = 32;
/// Unique-symbol bit length used for the tag stream (precision 12).
const TAG_SYMBOLS_BIT_LENGTH: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct SymbolEncodingOptions {
    /// 0 (fastest) to 10 (smallest).
    pub compression_level: i32,
}

impl Default for SymbolEncodingOptions {
    fn default() -> Self {
        Self {
            compression_level: 7,
        }
    }
}

impl SymbolEncodingOptions {
    pub fn with_compression_level(compression_level: i32) -> Self {
        Self { compression_level }
    }
}

fn bit_length(value: u32) -> u32 {
    32 - value.leading_zeros()
}

pub fn encode_symbols(
    symbols: &[u32],
    num_components: usize,
    options: &SymbolEncodingOptions,
    target_buffer: &mut EncoderBuffer,
) -> Result<(), DracoError> {
    if symbols.is_empty() {
        return Ok(());
    }
    if num_components == 0 || symbols.len() % num_components != 0 {
        return Err(DracoError::InvalidParameter(format!(
            "{} symbols cannot be split into entries of {} components",
            symbols.len(),
            num_components
        )));
    }

    // Bit length of the largest component of every entry, at least 1.
    let bit_lengths: Vec<u32> = symbols
        .chunks(num_components)
        .map(|entry| bit_length(entry.iter().copied().max().unwrap_or(0)).max(1))
        .collect();
    let max_value = symbols.iter().copied().max().unwrap_or(0);

    let tagged_bits = compute_tagged_scheme_bits(num_components, &bit_lengths);
    let raw_bits = compute_raw_scheme_bits(symbols, max_value);
    let max_value_bit_length = bit_length(max_value.max(1));

    if tagged_bits < raw_bits || max_value_bit_length > MAX_RAW_ENCODING_BIT_LENGTH {
        target_buffer.encode_u8(TAGGED_SCHEME);
        encode_tagged_symbols(symbols, num_components, &bit_lengths, target_buffer)
    } else {
        target_buffer.encode_u8(RAW_SCHEME);
        encode_raw_symbols(symbols, max_value, options, target_buffer)
    }
}

fn shannon_bits(frequencies: &[u64]) -> u64 {
    let total: u64 = frequencies.iter().sum();
    if total == 0 {
        return 0;
    }
    let total_f = total as f64;
    let bits: f64 = frequencies
        .iter()
        .filter(|&&f| f > 0)
        .map(|&f| -(f as f64 / total_f).log2() * f as f64)
        .sum();
    bits.ceil() as u64
}

fn approximate_rans_frequency_table_bits(max_value: u32, num_unique_symbols: u32) -> u64 {
    let diff = max_value.saturating_sub(num_unique_symbols);
    let table_zero_frequency_bits = 8 * (num_unique_symbols as u64 + diff as u64 / 64);
    8 * num_unique_symbols as u64 + table_zero_frequency_bits
}

fn compute_raw_scheme_bits(symbols: &[u32], max_value: u32) -> u64 {
    if max_value > (1 << MAX_RAW_ENCODING_BIT_LENGTH) {
        return u64::MAX;
    }
    let mut frequencies = vec![0u64; max_value as usize + 1];
    for &s in symbols {
        frequencies[s as usize] += 1;
    }
    let num_unique = frequencies.iter().filter(|&&f| f > 0).count() as u32;
    shannon_bits(&frequencies) + approximate_rans_frequency_table_bits(max_value, num_unique)
}

fn compute_tagged_scheme_bits(num_components: usize, bit_lengths: &[u32]) -> u64 {
    let value_bits: u64 = bit_lengths
        .iter()
        .map(|&len| len as u64 * num_components as u64)
        .sum();
    let mut tag_frequencies = vec![0u64; MAX_TAG_SYMBOL_BIT_LENGTH + 1];
    for &len in bit_lengths {
        tag_frequencies[len as usize] += 1;
    }
    let num_unique = tag_frequencies.iter().filter(|&&f| f > 0).count() as u32;
    value_bits
        + shannon_bits(&tag_frequencies)
        + approximate_rans_frequency_table_bits(MAX_TAG_SYMBOL_BIT_LENGTH as u32, num_unique)
}

fn encode_raw_symbols(
    symbols: &[u32],
    max_value: u32,
    options: &SymbolEncodingOptions,
    target_buffer: &mut EncoderBuffer,
) -> Result<(), DracoError> {
    let mut frequencies = vec![0u64; max_value as usize + 1];
    for &s in symbols {
        frequencies[s as usize] += 1;
    }
    let num_unique_symbols = frequencies.iter().filter(|&&f| f > 0).count() as u32;

    let mut unique_symbols_bit_length = bit_length(num_unique_symbols) as i32;
    let level = options.compression_level;
    if level < 4 {
        unique_symbols_bit_length -= 2;
    } else if level < 6 {
        unique_symbols_bit_length -= 1;
    } else if level > 9 {
        unique_symbols_bit_length += 2;
    } else if level > 7 {
        unique_symbols_bit_length += 1;
    }
    let unique_symbols_bit_length =
        unique_symbols_bit_length.clamp(1, MAX_RAW_ENCODING_BIT_LENGTH as i32) as u32;
    target_buffer.encode_u8(unique_symbols_bit_length as u8);

    let precision_bits =
        compute_rans_precision_from_unique_symbols_bit_length(unique_symbols_bit_length);
    let mut encoder = RAnsSymbolEncoder::create(&frequencies, precision_bits, target_buffer)?;
    // rANS is LIFO: encode in reverse so decoding runs forward.
    for &sym in symbols.iter().rev() {
        encoder.encode_symbol(sym);
    }
    encoder.end_encoding(target_buffer)
}

fn encode_tagged_symbols(
    symbols: &[u32],
    num_components: usize,
    bit_lengths: &[u32],
    target_buffer: &mut EncoderBuffer,
) -> Result<(), DracoError> {
    let mut frequencies = vec![0u64; MAX_TAG_SYMBOL_BIT_LENGTH + 1];
    for &len in bit_lengths {
        frequencies[len as usize] += 1;
    }
    let precision_bits =
        compute_rans_precision_from_unique_symbols_bit_length(TAG_SYMBOLS_BIT_LENGTH);
    let mut tag_encoder = RAnsSymbolEncoder::create(&frequencies, precision_bits, target_buffer)?;

    let mut value_buffer = EncoderBuffer::new();
    value_buffer.start_bit_encoding(MAX_TAG_SYMBOL_BIT_LENGTH * symbols.len(), false)?;

    // Tags go in reverse (rANS), values in forward order.
    for &len in bit_lengths.iter().rev() {
        tag_encoder.encode_symbol(len);
    }
    for (entry, &len) in symbols.chunks(num_components).zip(bit_lengths) {
        for &value in entry {
            value_buffer.encode_least_significant_bits_32(len, value)?;
        }
    }

    tag_encoder.end_encoding(target_buffer)?;
    value_buffer.end_bit_encoding();
    target_buffer.encode_data(value_buffer.data());
    Ok(())
}

/// Decodes `num_values` symbols written by [`encode_symbols`].
pub fn decode_symbols(
    num_values: usize,
    num_components: usize,
    in_buffer: &mut DecoderBuffer,
) -> Result<Vec<u32>, DracoError> {
    if num_values == 0 {
        return Ok(Vec::new());
    }
    let scheme = in_buffer.decode_u8()?;
    match scheme {
        TAGGED_SCHEME => decode_tagged_symbols(num_values, num_components, in_buffer),
        RAW_SCHEME => decode_raw_symbols(num_values, in_buffer),
        _ => Err(DracoError::DracoError(format!(
            "Unknown symbol coding scheme: {}",
            scheme
        ))),
    }
}

fn decode_raw_symbols(
    num_values: usize,
    in_buffer: &mut DecoderBuffer,
) -> Result<Vec<u32>, DracoError> {
    let max_bit_length = in_buffer.decode_u8()? as u32;
    if max_bit_length == 0 || max_bit_length > MAX_RAW_ENCODING_BIT_LENGTH {
        return Err(DracoError::DracoError(format!(
            "Invalid raw symbol bit length: {}",
            max_bit_length
        )));
    }
    let precision_bits = compute_rans_precision_from_unique_symbols_bit_length(max_bit_length);
    let mut decoder = RAnsSymbolDecoder::create(precision_bits, in_buffer)?;
    if decoder.num_symbols() == 0 {
        return Err(DracoError::DracoError("Empty symbol table".into()));
    }
    let mut symbols = Vec::with_capacity(num_values.min(in_buffer.remaining_size()));
    for _ in 0..num_values {
        symbols.push(decoder.decode_symbol()?);
    }
    Ok(symbols)
}

fn decode_tagged_symbols(
    num_values: usize,
    num_components: usize,
    in_buffer: &mut DecoderBuffer,
) -> Result<Vec<u32>, DracoError> {
    if num_components == 0 {
        return Err(DracoError::InvalidParameter("Zero components".into()));
    }
    let precision_bits =
        compute_rans_precision_from_unique_symbols_bit_length(TAG_SYMBOLS_BIT_LENGTH);
    let mut tag_decoder = RAnsSymbolDecoder::create(precision_bits, in_buffer)?;
    if tag_decoder.num_symbols() == 0 {
        return Err(DracoError::DracoError("Empty tag table".into()));
    }

    in_buffer.start_bit_decoding(false)?;
    let mut symbols = Vec::with_capacity(num_values.min(in_buffer.remaining_size()));
    while symbols.len() < num_values {
        let len = tag_decoder.decode_symbol()?;
        if len > MAX_TAG_SYMBOL_BIT_LENGTH as u32 {
            return Err(DracoError::DracoError(format!("Invalid tag: {}", len)));
        }
        for _ in 0..num_components {
            symbols.push(in_buffer.decode_least_significant_bits32(len)?);
        }
    }
    in_buffer.end_bit_decoding();
    symbols.truncate(num_values);
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(symbols: &[u32], num_components: usize, level: i32) -> (u8, Vec<u32>) {
        let mut buffer = EncoderBuffer::new();
        let options = SymbolEncodingOptions::with_compression_level(level);
        encode_symbols(symbols, num_components, &options, &mut buffer).unwrap();
        let scheme = buffer.data()[0];
        let mut decoder = DecoderBuffer::new(buffer.data());
        let decoded = decode_symbols(symbols.len(), num_components, &mut decoder).unwrap();
        assert_eq!(decoder.remaining_size(), 0);
        (scheme, decoded)
    }

    #[test]
    fn test_small_values_use_raw_scheme() {
        let symbols: Vec<u32> = (0..200).map(|i| i % 7).collect();
        let (scheme, decoded) = roundtrip(&symbols, 1, 7);
        assert_eq!(scheme, RAW_SCHEME);
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn test_large_values_use_tagged_scheme() {
        let symbols: Vec<u32> = (0..60).map(|i| (i as u32) << 20 | 5).collect();
        let (scheme, decoded) = roundtrip(&symbols, 3, 7);
        assert_eq!(scheme, TAGGED_SCHEME);
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn test_single_repeated_symbol() {
        let symbols = vec![4u32; 33];
        for level in [0, 5, 7, 10] {
            let (_, decoded) = roundtrip(&symbols, 1, level);
            assert_eq!(decoded, symbols);
        }
    }

    #[test]
    fn test_count_beyond_stream_fails() {
        let small: Vec<u32> = (0..200).map(|i| i % 7).collect();
        let large = vec![1 << 20, 3, 1 << 25];
        for symbols in [small, large] {
            let mut buffer = EncoderBuffer::new();
            let options = SymbolEncodingOptions::default();
            encode_symbols(&symbols, 1, &options, &mut buffer).unwrap();
            let mut decoder = DecoderBuffer::new(buffer.data());
            assert!(decode_symbols(1 << 40, 1, &mut decoder).is_err());
        }
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let data = [9u8, 0, 0];
        let mut decoder = DecoderBuffer::new(&data);
        assert!(decode_symbols(3, 1, &mut decoder).is_err());
    }

    #[test]
    fn test_uneven_component_split_rejected() {
        let mut buffer = EncoderBuffer::new();
        let options = SymbolEncodingOptions::default();
        assert!(encode_symbols(&[1, 2, 3], 2, &options, &mut buffer).is_err());
    }
}
