use crate::status::DracoError;
use crate::version::DEFAULT_MESH_VERSION;
use std::mem;

/// Input buffer for reading compressed Draco data.
///
/// `DecoderBuffer` provides sequential byte and bit-level access to compressed data.
/// Byte-aligned reads are little-endian; bit-level reads serve the tagged
/// symbol coder.
///
/// # Example
///
/// ```ignore
/// use draco_core::decoder_buffer::DecoderBuffer;
///
/// let data = &[0x44, 0x52, 0x41, 0x43, 0x4F]; // "DRACO" header
/// let mut buffer = DecoderBuffer::new(data);
///
/// assert_eq!(buffer.decode_u8().unwrap(), 0x44);
/// assert_eq!(buffer.remaining_size(), 4);
/// ```
pub struct DecoderBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    bit_decoder_active: bool,
    bit_start_pos: usize,
    current_bit_offset: usize,
    bit_stream_end_pos: usize,
    bit_sequence_size_known: bool,
    version_major: u8,
    version_minor: u8,
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_decoder_active: false,
            bit_start_pos: 0,
            current_bit_offset: 0,
            bit_stream_end_pos: 0,
            bit_sequence_size_known: false,
            version_major: DEFAULT_MESH_VERSION.0,
            version_minor: DEFAULT_MESH_VERSION.1,
        }
    }

    /// Sets the bitstream version read from the header.
    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version_major = major;
        self.version_minor = minor;
    }

    pub fn version(&self) -> (u8, u8) {
        (self.version_major, self.version_minor)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining_size(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Starts bit-level decoding.
    ///
    /// When `decode_size` is true the sequence size in bytes is read first
    /// and returned.
    pub fn start_bit_decoding(&mut self, decode_size: bool) -> Result<u64, DracoError> {
        if self.bit_decoder_active {
            return Err(DracoError::BufferError("Bit decoding already active".into()));
        }
        let size_bytes = if decode_size { self.decode_varint()? } else { 0 };

        self.bit_start_pos = self.pos;
        self.bit_decoder_active = true;
        self.current_bit_offset = 0;
        self.bit_sequence_size_known = decode_size;
        self.bit_stream_end_pos = if decode_size {
            self.bit_start_pos.saturating_add(size_bytes as usize)
        } else {
            self.data.len()
        };
        Ok(size_bytes)
    }

    /// Ends bit-level decoding and moves past the consumed bytes.
    pub fn end_bit_decoding(&mut self) {
        self.bit_decoder_active = false;
        if self.bit_sequence_size_known {
            self.pos = self.bit_stream_end_pos.min(self.data.len());
        } else {
            self.pos = self.bit_start_pos + self.current_bit_offset.div_ceil(8);
        }
    }

    /// Decodes `nbits` least significant bits, LSB first.
    pub fn decode_least_significant_bits32(&mut self, nbits: u32) -> Result<u32, DracoError> {
        if !self.bit_decoder_active {
            return Err(DracoError::BufferError("Bit decoding not active".into()));
        }
        let mut value = 0;
        for i in 0..nbits {
            value |= self.get_bit()? << i;
        }
        Ok(value)
    }

    fn get_bit(&mut self) -> Result<u32, DracoError> {
        let byte_offset = self.bit_start_pos + self.current_bit_offset / 8;
        let bit_shift = self.current_bit_offset % 8;
        if byte_offset < self.bit_stream_end_pos && byte_offset < self.data.len() {
            self.current_bit_offset += 1;
            Ok(((self.data[byte_offset] >> bit_shift) & 1) as u32)
        } else {
            Err(DracoError::BufferError("Unexpected end of bit stream".into()))
        }
    }

    /// Decodes a plain-old-data value by copying its bytes.
    pub fn decode<T: bytemuck::Pod>(&mut self) -> Result<T, DracoError> {
        let bytes = self.decode_slice(mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned::<T>(bytes))
    }

    pub fn decode_u8(&mut self) -> Result<u8, DracoError> {
        self.decode::<u8>()
    }

    pub fn decode_i8(&mut self) -> Result<i8, DracoError> {
        self.decode::<i8>()
    }

    pub fn decode_u16(&mut self) -> Result<u16, DracoError> {
        Ok(u16::from_le_bytes(self.decode::<[u8; 2]>()?))
    }

    pub fn decode_u32(&mut self) -> Result<u32, DracoError> {
        Ok(u32::from_le_bytes(self.decode::<[u8; 4]>()?))
    }

    pub fn decode_i32(&mut self) -> Result<i32, DracoError> {
        Ok(i32::from_le_bytes(self.decode::<[u8; 4]>()?))
    }

    pub fn decode_f32(&mut self) -> Result<f32, DracoError> {
        Ok(f32::from_le_bytes(self.decode::<[u8; 4]>()?))
    }

    /// Decodes an unsigned LEB128 varint.
    pub fn decode_varint(&mut self) -> Result<u64, DracoError> {
        let mut val = 0u64;
        let mut shift = 0;
        loop {
            let b = self.decode_u8()?;
            val |= ((b & 0x7F) as u64) << shift;
            if (b & 0x80) == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(DracoError::BufferError("Varint exceeds 64 bits".into()));
            }
        }
        Ok(val)
    }

    /// Decodes a varint that must fit in 32 bits.
    pub fn decode_varint_u32(&mut self) -> Result<u32, DracoError> {
        let value = self.decode_varint()?;
        u32::try_from(value)
            .map_err(|_| DracoError::BufferError(format!("Varint {} exceeds 32 bits", value)))
    }

    /// Returns the remaining data without advancing.
    pub fn remaining_data(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Skips `n` bytes.
    pub fn advance(&mut self, n: usize) -> Result<(), DracoError> {
        self.decode_slice(n).map(|_| ())
    }

    /// Returns the next `size` bytes and advances past them.
    pub fn decode_slice(&mut self, size: usize) -> Result<&'a [u8], DracoError> {
        if self.bit_decoder_active {
            return Err(DracoError::BufferError(
                "Cannot decode bytes while bit decoding is active".into(),
            ));
        }
        if size > self.remaining_size() {
            return Err(DracoError::BufferError(format!(
                "Unexpected end of buffer: need {} bytes, have {}",
                size,
                self.remaining_size()
            )));
        }
        let slice = &self.data[self.pos..self.pos + size];
        self.pos += size;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF];
        let mut buffer = DecoderBuffer::new(&data);
        assert_eq!(buffer.decode_u8().unwrap(), 1);
        assert_eq!(buffer.decode_u16().unwrap(), 0x1234);
        assert_eq!(buffer.decode_u32().unwrap(), 0x12345678);
        assert_eq!(buffer.decode_i8().unwrap(), -1);
        assert!(buffer.decode_u8().is_err());
    }

    #[test]
    fn test_varint() {
        let data = [0xAC, 0x02, 0x7F];
        let mut buffer = DecoderBuffer::new(&data);
        assert_eq!(buffer.decode_varint().unwrap(), 300);
        assert_eq!(buffer.decode_varint_u32().unwrap(), 127);
        assert_eq!(buffer.remaining_size(), 0);
    }

    #[test]
    fn test_bit_decoding_advances_by_whole_bytes() {
        let data = [0b1100_1010, 0b0000_0001, 0x42];
        let mut buffer = DecoderBuffer::new(&data);
        buffer.start_bit_decoding(false).unwrap();
        assert_eq!(buffer.decode_least_significant_bits32(4).unwrap(), 0b1010);
        assert_eq!(buffer.decode_least_significant_bits32(5).unwrap(), 0b1_1100);
        assert!(buffer.decode_u8().is_err());
        buffer.end_bit_decoding();
        assert_eq!(buffer.decode_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_bit_decoding_with_size() {
        let data = [2, 0xBC, 0x0A, 0x99];
        let mut buffer = DecoderBuffer::new(&data);
        assert_eq!(buffer.start_bit_decoding(true).unwrap(), 2);
        assert_eq!(buffer.decode_least_significant_bits32(12).unwrap(), 0xABC);
        buffer.end_bit_decoding();
        assert_eq!(buffer.decode_u8().unwrap(), 0x99);
    }
}
