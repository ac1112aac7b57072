use crate::prediction_scheme_wrap::WrapTransform;

/// Difference prediction: every entry is predicted by the previous one, the
/// first entry by zero. Corrections go through the wrap transform.
pub fn compute_correction_values(
    values: &[i32],
    num_components: usize,
    transform: &WrapTransform,
) -> Vec<i32> {
    let mut corrections = vec![0; values.len()];
    if values.is_empty() {
        return corrections;
    }
    let mut i = values.len() - num_components;
    while i > 0 {
        for c in 0..num_components {
            corrections[i + c] =
                transform.compute_correction(values[i + c], values[i - num_components + c]);
        }
        i -= num_components;
    }
    for c in 0..num_components {
        corrections[c] = transform.compute_correction(values[c], 0);
    }
    corrections
}

/// Inverse of [`compute_correction_values`].
pub fn compute_original_values(
    corrections: &[i32],
    num_components: usize,
    transform: &WrapTransform,
) -> Vec<i32> {
    let mut values = vec![0; corrections.len()];
    if corrections.is_empty() {
        return values;
    }
    for c in 0..num_components {
        values[c] = transform.compute_original_value(0, corrections[c]);
    }
    let mut i = num_components;
    while i < corrections.len() {
        for c in 0..num_components {
            values[i + c] = transform
                .compute_original_value(values[i - num_components + c], corrections[i + c]);
        }
        i += num_components;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_round_trip() {
        let values = vec![10, 200, 12, 190, 15, 205, 11, 199];
        let wrap = WrapTransform::for_values(&values).unwrap();
        let corrections = compute_correction_values(&values, 2, &wrap);
        assert_eq!(compute_original_values(&corrections, 2, &wrap), values);
    }

    #[test]
    fn test_smooth_data_gives_small_corrections() {
        let values: Vec<i32> = (1000..1100).collect();
        let wrap = WrapTransform::for_values(&values).unwrap();
        let corrections = compute_correction_values(&values, 1, &wrap);
        // First value is predicted from zero (clamped to the minimum).
        assert_eq!(corrections[0], 0);
        assert!(corrections[1..].iter().all(|&c| c == 1));
    }
}
