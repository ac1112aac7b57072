/// Probability and cumulative probability of one symbol, in units of the
/// rANS precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RAnsSymbol {
    pub prob: u32,
    pub cum_prob: u32,
}

pub fn compute_rans_unclamped_precision(symbols_bit_length: u32) -> u32 {
    (3 * symbols_bit_length) / 2
}

/// Precision bits used for a given unique-symbol bit length, clamped to 12..=20.
pub fn compute_rans_precision_from_unique_symbols_bit_length(symbols_bit_length: u32) -> u32 {
    compute_rans_unclamped_precision(symbols_bit_length).clamp(12, 20)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_clamp() {
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(1), 12);
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(5), 12);
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(10), 15);
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(18), 20);
    }
}
