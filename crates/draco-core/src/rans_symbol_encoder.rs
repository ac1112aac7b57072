use crate::ans::AnsEncoder;
use crate::encoder_buffer::EncoderBuffer;
use crate::rans_symbol_coding::RAnsSymbol;
use crate::status::DracoError;

/// Encodes symbols with a static probability table derived from their
/// frequencies. The table is written ahead of the rANS data.
pub struct RAnsSymbolEncoder {
    ans: AnsEncoder,
    probability_table: Vec<RAnsSymbol>,
    rans_precision: u32,
}

impl RAnsSymbolEncoder {
    /// Builds the probability table for `frequencies` and writes it to `buffer`.
    pub fn create(
        frequencies: &[u64],
        precision_bits: u32,
        buffer: &mut EncoderBuffer,
    ) -> Result<Self, DracoError> {
        let rans_precision = 1u32 << precision_bits;
        let probability_table = build_probability_table(frequencies, rans_precision)?;
        encode_table(&probability_table, buffer)?;
        Ok(Self {
            ans: AnsEncoder::new(rans_precision),
            probability_table,
            rans_precision,
        })
    }

    pub fn rans_precision(&self) -> u32 {
        self.rans_precision
    }

    pub fn encode_symbol(&mut self, symbol: u32) {
        let sym = self.probability_table[symbol as usize];
        self.ans.rans_write(sym);
    }

    /// Writes the size of the rANS data followed by the data itself.
    pub fn end_encoding(self, buffer: &mut EncoderBuffer) -> Result<(), DracoError> {
        let data = self.ans.write_end()?;
        buffer.encode_varint(data.len() as u64);
        buffer.encode_data(&data);
        Ok(())
    }
}

fn build_probability_table(
    frequencies: &[u64],
    rans_precision: u32,
) -> Result<Vec<RAnsSymbol>, DracoError> {
    let total_freq: u64 = frequencies.iter().sum();
    let num_symbols = frequencies
        .iter()
        .rposition(|&f| f > 0)
        .map(|i| i + 1)
        .ok_or_else(|| DracoError::DracoError("No symbols to encode".into()))?;

    let total_freq_d = total_freq as f64;
    let rans_precision_d = rans_precision as f64;
    let mut table = vec![RAnsSymbol::default(); num_symbols];

    let mut total_rans_prob: u32 = 0;
    for (entry, &freq) in table.iter_mut().zip(frequencies) {
        let prob = freq as f64 / total_freq_d;
        let mut rans_prob = (prob * rans_precision_d + 0.5) as u32;
        if rans_prob == 0 && freq > 0 {
            rans_prob = 1;
        }
        entry.prob = rans_prob;
        total_rans_prob += rans_prob;
    }

    // Rounding may leave the total off the precision; fix it up.
    if total_rans_prob != rans_precision {
        let mut sorted: Vec<usize> = (0..num_symbols).collect();
        sorted.sort_by_key(|&i| table[i].prob);

        if total_rans_prob < rans_precision {
            let most_frequent = sorted[num_symbols - 1];
            table[most_frequent].prob += rans_precision - total_rans_prob;
        } else {
            let mut error = (total_rans_prob - rans_precision) as i64;
            while error > 0 {
                let act_rel_error_d = rans_precision_d / total_rans_prob as f64;
                for j in (1..num_symbols).rev() {
                    let symbol_id = sorted[j];
                    let prob = table[symbol_id].prob as i64;
                    if prob <= 1 {
                        if j == num_symbols - 1 {
                            return Err(DracoError::DracoError(
                                "Most frequent symbol would be empty".into(),
                            ));
                        }
                        break;
                    }
                    let new_prob = (act_rel_error_d * prob as f64).floor() as i64;
                    let fix = (prob - new_prob).max(1).min(prob - 1).min(error);
                    table[symbol_id].prob -= fix as u32;
                    total_rans_prob -= fix as u32;
                    error -= fix;
                    if total_rans_prob == rans_precision {
                        break;
                    }
                }
            }
        }
    }

    let mut cum_prob = 0;
    for entry in table.iter_mut() {
        entry.cum_prob = cum_prob;
        cum_prob += entry.prob;
    }
    if cum_prob != rans_precision {
        return Err(DracoError::DracoError(
            "Probability table does not sum to the precision".into(),
        ));
    }
    Ok(table)
}

/// Each probability takes one to three bytes; the low two bits of the first
/// byte hold the extra byte count. Runs of zero probabilities use mode 3 with
/// the run length in the upper six bits.
fn encode_table(table: &[RAnsSymbol], buffer: &mut EncoderBuffer) -> Result<(), DracoError> {
    buffer.encode_varint(table.len() as u64);
    let mut i = 0;
    while i < table.len() {
        let prob = table[i].prob;
        if prob == 0 {
            let mut offset = 0;
            while offset < (1 << 6) - 1 && i + offset + 1 < table.len() {
                if table[i + offset + 1].prob > 0 {
                    break;
                }
                offset += 1;
            }
            buffer.encode_u8(((offset as u8) << 2) | 3);
            i += offset;
        } else {
            let num_extra_bytes: u32 = if prob >= (1 << 22) {
                return Err(DracoError::DracoError(format!(
                    "Probability {} is too large",
                    prob
                )));
            } else if prob >= (1 << 14) {
                2
            } else if prob >= (1 << 6) {
                1
            } else {
                0
            };
            buffer.encode_u8(((prob << 2) as u8) | num_extra_bytes as u8);
            for b in 0..num_extra_bytes {
                buffer.encode_u8((prob >> (8 * (b + 1) - 2)) as u8);
            }
        }
        i += 1;
    }
    Ok(())
}
