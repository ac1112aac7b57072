// Copyright 2022 The Draco Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::status::DracoError;

/// Output buffer for Draco serialization.
/// Supports both byte-aligned and bit-level encoding.
#[derive(Debug, Clone, Default)]
pub struct EncoderBuffer {
    /// Main buffer data
    buffer: Vec<u8>,

    /// Bit encoder state (active when encoding bits)
    bit_encoder: Option<BitEncoder>,

    /// Number of bytes reserved for bit encoding
    bit_encoder_reserved_bytes: usize,

    /// Whether to prefix the bit sequence with its size in bytes
    encode_bit_sequence_size: bool,
}

/// Bit writer state for variable-length bit sequences
#[derive(Debug, Clone)]
struct BitEncoder {
    /// Current bit position within the reserved area
    bit_offset: usize,

    /// Starting byte position of the reserved area
    start_byte_offset: usize,
}

impl EncoderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.buffer
    }

    pub fn bit_encoder_active(&self) -> bool {
        self.bit_encoder.is_some()
    }

    /// Starts encoding a bit sequence of at most `required_bits` bits.
    ///
    /// When `encode_size` is set, the number of bytes used is written as a
    /// varint in front of the sequence once it ends.
    pub fn start_bit_encoding(
        &mut self,
        required_bits: usize,
        encode_size: bool,
    ) -> Result<(), DracoError> {
        if self.bit_encoder_active() {
            return Err(DracoError::BufferError("Bit encoder already active".into()));
        }
        let required_bytes = required_bits.div_ceil(8);
        let start_pos = self.buffer.len();
        self.buffer.resize(start_pos + required_bytes, 0);

        self.bit_encoder = Some(BitEncoder {
            bit_offset: 0,
            start_byte_offset: start_pos,
        });
        self.bit_encoder_reserved_bytes = required_bytes;
        self.encode_bit_sequence_size = encode_size;
        Ok(())
    }

    /// Ends bit encoding and drops the unused part of the reserved area.
    pub fn end_bit_encoding(&mut self) {
        if let Some(encoder) = self.bit_encoder.take() {
            let used_bytes = encoder.bit_offset.div_ceil(8);
            self.buffer.truncate(encoder.start_byte_offset + used_bytes);

            if self.encode_bit_sequence_size {
                let mut size = EncoderBuffer::new();
                size.encode_varint(used_bytes as u64);
                let at = encoder.start_byte_offset;
                self.buffer.splice(at..at, size.buffer);
            }
        }
        self.bit_encoder_reserved_bytes = 0;
        self.encode_bit_sequence_size = false;
    }

    /// Writes the `nbits` least significant bits of `value`, LSB first.
    pub fn encode_least_significant_bits_32(
        &mut self,
        nbits: u32,
        value: u32,
    ) -> Result<(), DracoError> {
        if nbits > 32 {
            return Err(DracoError::BufferError(
                "Cannot encode more than 32 bits".into(),
            ));
        }
        let reserved_bits = self.bit_encoder_reserved_bytes * 8;
        let encoder = self
            .bit_encoder
            .as_mut()
            .ok_or_else(|| DracoError::BufferError("Bit encoder not active".into()))?;
        if encoder.bit_offset + nbits as usize > reserved_bits {
            return Err(DracoError::BufferError(
                "Bit sequence exceeds reserved space".into(),
            ));
        }
        for bit in 0..nbits {
            let offset = encoder.bit_offset;
            let byte = &mut self.buffer[encoder.start_byte_offset + offset / 8];
            let shift = offset % 8;
            *byte &= !(1 << shift);
            *byte |= (((value >> bit) & 1) as u8) << shift;
            encoder.bit_offset += 1;
        }
        Ok(())
    }

    /// Appends raw bytes. Fails while a bit sequence is open.
    pub fn encode(&mut self, data: &[u8]) -> Result<(), DracoError> {
        if self.bit_encoder_active() {
            return Err(DracoError::BufferError(
                "Cannot encode byte-aligned data during bit encoding".into(),
            ));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    // =========================================================================
    // Byte-aligned helpers. Callers never interleave them with bit encoding.
    // =========================================================================

    pub fn encode_data(&mut self, data: &[u8]) {
        debug_assert!(!self.bit_encoder_active());
        self.buffer.extend_from_slice(data);
    }

    pub fn encode_u8(&mut self, value: u8) {
        self.encode_data(&[value]);
    }

    pub fn encode_i8(&mut self, value: i8) {
        self.encode_data(&value.to_le_bytes());
    }

    pub fn encode_u16(&mut self, value: u16) {
        self.encode_data(&value.to_le_bytes());
    }

    pub fn encode_u32(&mut self, value: u32) {
        self.encode_data(&value.to_le_bytes());
    }

    pub fn encode_i32(&mut self, value: i32) {
        self.encode_data(&value.to_le_bytes());
    }

    pub fn encode_f32(&mut self, value: f32) {
        self.encode_data(&value.to_le_bytes());
    }

    /// Unsigned LEB128 varint.
    pub fn encode_varint(&mut self, mut value: u64) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.encode_u8(byte);
            if value == 0 {
                break;
            }
        }
    }
}
