//! Range asymmetric numeral system (rANS) state machine.
//!
//! The encoder emits bytes in reverse; the decoder reads the buffer from the
//! end towards the front.

use crate::rans_symbol_coding::RAnsSymbol;
use crate::status::DracoError;

pub const ANS_IO_BASE: u32 = 256;

pub struct AnsEncoder {
    buf: Vec<u8>,
    state: u32,
    l_base: u32,
    precision: u32,
}

impl AnsEncoder {
    pub fn new(precision: u32) -> Self {
        let l_base = precision * 4;
        Self {
            buf: Vec::new(),
            state: l_base,
            l_base,
            precision,
        }
    }

    pub fn rans_write(&mut self, sym: RAnsSymbol) {
        let p = sym.prob;
        while self.state >= self.l_base / self.precision * ANS_IO_BASE * p {
            self.buf.push((self.state % ANS_IO_BASE) as u8);
            self.state /= ANS_IO_BASE;
        }
        self.state = (self.state / p) * self.precision + self.state % p + sym.cum_prob;
    }

    /// Flushes the final state. The two top bits of the last byte give the
    /// number of state bytes.
    pub fn write_end(mut self) -> Result<Vec<u8>, DracoError> {
        let state = self.state - self.l_base;
        if state < (1 << 6) {
            self.buf.push(state as u8);
        } else if state < (1 << 14) {
            self.buf.extend_from_slice(&((0x01 << 14) + state as u16).to_le_bytes());
        } else if state < (1 << 22) {
            let v = (0x02 << 22) + state;
            self.buf.extend_from_slice(&v.to_le_bytes()[..3]);
        } else if state < (1 << 30) {
            let v = (0x03 << 30) + state;
            self.buf.extend_from_slice(&v.to_le_bytes());
        } else {
            return Err(DracoError::DracoError(format!(
                "State is too large to be serialized: {}",
                state
            )));
        }
        Ok(self.buf)
    }
}

pub struct AnsDecoder<'a> {
    buf: &'a [u8],
    offset: usize,
    state: u32,
    l_base: u32,
    precision: u32,
}

impl<'a> AnsDecoder<'a> {
    pub fn new(buf: &'a [u8], precision: u32) -> Result<Self, DracoError> {
        let l_base = precision * 4;
        let invalid = || DracoError::DracoError("Invalid rANS stream".into());
        let last = *buf.last().ok_or_else(invalid)?;
        let (len, mask) = match last >> 6 {
            0 => (1usize, 0x3Fu32),
            1 => (2, 0x3FFF),
            2 => (3, 0x3F_FFFF),
            _ => (4, 0x3FFF_FFFF),
        };
        if buf.len() < len {
            return Err(invalid());
        }
        let offset = buf.len() - len;
        let mut raw = [0u8; 4];
        raw[..len].copy_from_slice(&buf[offset..]);
        let state = (u32::from_le_bytes(raw) & mask) + l_base;
        if state >= l_base * ANS_IO_BASE {
            return Err(invalid());
        }
        Ok(Self {
            buf,
            offset,
            state,
            l_base,
            precision,
        })
    }

    /// Decodes one symbol using the probability table and its lookup table.
    /// Fails once the state can no longer be refilled from the buffer.
    pub fn rans_read(&mut self, table: &[RAnsSymbol], lut: &[u32]) -> Result<u32, DracoError> {
        while self.state < self.l_base && self.offset > 0 {
            self.offset -= 1;
            self.state = self.state * ANS_IO_BASE + self.buf[self.offset] as u32;
        }
        if self.state < self.l_base {
            return Err(DracoError::DracoError("rANS stream exhausted".into()));
        }
        let quo = self.state / self.precision;
        let rem = self.state % self.precision;
        let symbol = lut[rem as usize];
        let sym = table[symbol as usize];
        self.state = quo * sym.prob + rem - sym.cum_prob;
        Ok(symbol)
    }
}
