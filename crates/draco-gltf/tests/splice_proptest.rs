use std::collections::BTreeSet;

use draco_gltf::passes::{map_buffer_offset, remap_index, splice_ranges, subtract_ranges};
use proptest::prelude::*;

/// Disjoint `(offset, length)` ranges and a buffer length covering them.
fn disjoint_ranges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (prop::collection::vec((0usize..16, 1usize..16), 0..8), 0usize..16).prop_map(|(parts, tail)| {
        let mut cursor = 0;
        let mut ranges = Vec::with_capacity(parts.len());
        for (gap, length) in parts {
            let offset = cursor + gap;
            ranges.push((offset, length));
            cursor = offset + length;
        }
        (cursor + tail, ranges)
    })
}

fn covered(ranges: &[(usize, usize)], position: usize) -> bool {
    ranges.iter().any(|&(o, l)| o <= position && position < o + l)
}

proptest! {
    #[test]
    fn spliced_bytes_land_at_mapped_offsets(
        (length, ranges) in disjoint_ranges(),
        shuffle in any::<bool>(),
    ) {
        let original: Vec<u8> = (0..length).map(|i| (i % 251) as u8).collect();
        let mut ordered = ranges.clone();
        if shuffle {
            ordered.reverse();
        }
        let mut data = original.clone();
        splice_ranges(&mut data, &ordered);

        let removed: usize = ranges.iter().map(|(_, l)| l).sum();
        prop_assert_eq!(data.len(), length - removed);
        for position in (0..length).filter(|&p| !covered(&ranges, p)) {
            prop_assert_eq!(data[map_buffer_offset(position, &ranges)], original[position]);
        }
    }

    #[test]
    fn remap_skips_removed_indices(removed in prop::collection::btree_set(0usize..32, 0..16)) {
        let survivors: Vec<usize> = (0..32).filter(|i| !removed.contains(i)).collect();
        for (new, &old) in survivors.iter().enumerate() {
            prop_assert_eq!(remap_index(old, &removed), new);
        }
    }

    #[test]
    fn subtracted_ranges_avoid_kept_bytes(
        removed in prop::collection::vec((0usize..64, 0usize..16), 0..6),
        keep in prop::collection::vec((0usize..64, 0usize..16), 0..6),
    ) {
        let result = subtract_ranges(&removed, &keep);
        let mut expected = BTreeSet::new();
        for position in 0..80 {
            if covered(&removed, position) && !covered(&keep, position) {
                expected.insert(position);
            }
        }
        let mut actual = BTreeSet::new();
        for &(offset, length) in &result {
            prop_assert!(length > 0);
            actual.extend(offset..offset + length);
        }
        prop_assert_eq!(actual, expected);
        prop_assert!(result.windows(2).all(|w| w[0].0 + w[0].1 <= w[1].0));
    }
}
