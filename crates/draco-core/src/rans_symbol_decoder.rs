use crate::ans::AnsDecoder;
use crate::decoder_buffer::DecoderBuffer;
use crate::rans_symbol_coding::RAnsSymbol;
use crate::status::DracoError;

/// Reads a probability table and then symbols from the rANS data that
/// follows it.
pub struct RAnsSymbolDecoder<'a> {
    ans: Option<AnsDecoder<'a>>,
    probability_table: Vec<RAnsSymbol>,
    lut: Vec<u32>,
}

impl<'a> RAnsSymbolDecoder<'a> {
    /// Decodes the probability table and positions the decoder on the rANS
    /// data. `buffer` ends up past the encoded symbols.
    pub fn create(
        precision_bits: u32,
        buffer: &mut DecoderBuffer<'a>,
    ) -> Result<Self, DracoError> {
        let rans_precision = 1u32 << precision_bits;
        let mut table = decode_table(buffer)?;

        let mut lut = vec![0u32; rans_precision as usize];
        let mut cum_prob: u32 = 0;
        for (i, entry) in table.iter_mut().enumerate() {
            entry.cum_prob = cum_prob;
            let end = cum_prob.saturating_add(entry.prob);
            if end > rans_precision {
                return Err(DracoError::DracoError(
                    "Probability table exceeds the precision".into(),
                ));
            }
            lut[cum_prob as usize..end as usize].fill(i as u32);
            cum_prob = end;
        }
        if !table.is_empty() && cum_prob != rans_precision {
            return Err(DracoError::DracoError(
                "Probability table does not sum to the precision".into(),
            ));
        }

        let bytes_encoded = buffer.decode_varint()? as usize;
        let data = buffer.decode_slice(bytes_encoded)?;
        let ans = if table.is_empty() {
            None
        } else {
            Some(AnsDecoder::new(data, rans_precision)?)
        };
        Ok(Self {
            ans,
            probability_table: table,
            lut,
        })
    }

    pub fn num_symbols(&self) -> usize {
        self.probability_table.len()
    }

    pub fn decode_symbol(&mut self) -> Result<u32, DracoError> {
        let ans = self
            .ans
            .as_mut()
            .ok_or_else(|| DracoError::DracoError("Decoding from an empty symbol table".into()))?;
        ans.rans_read(&self.probability_table, &self.lut)
    }
}

fn decode_table(buffer: &mut DecoderBuffer) -> Result<Vec<RAnsSymbol>, DracoError> {
    let num_symbols = buffer.decode_varint()? as usize;
    // Every entry costs at least one byte per 64 symbols.
    if num_symbols / 64 > buffer.remaining_size() {
        return Err(DracoError::DracoError(format!(
            "Too many symbols in table: {}",
            num_symbols
        )));
    }
    let mut table = vec![RAnsSymbol::default(); num_symbols];
    let mut i = 0;
    while i < num_symbols {
        let prob_data = buffer.decode_u8()?;
        let token = prob_data & 3;
        if token == 3 {
            let offset = (prob_data >> 2) as usize;
            if i + offset >= num_symbols {
                return Err(DracoError::DracoError("Zero run past end of table".into()));
            }
            i += offset;
        } else {
            let mut prob = (prob_data >> 2) as u32;
            for b in 0..token as u32 {
                let extra = buffer.decode_u8()? as u32;
                prob |= extra << (8 * (b + 1) - 2);
            }
            table[i].prob = prob;
        }
        i += 1;
    }
    Ok(table)
}
