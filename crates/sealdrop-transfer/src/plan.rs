//! Segment planning
//!
//! Files divide into fixed-size segments processed sequentially. The FIRST
//! segment absorbs the remainder, so planned sizes are
//! `{size − (n−1)·SEGMENT_SIZE, SEGMENT_SIZE, SEGMENT_SIZE, …}` and always
//! sum exactly to the file size.

/// Fixed plaintext segment size: 2.5 MiB.
pub const SEGMENT_SIZE: u64 = 2_621_440;

/// Number of segments for a file of `size` bytes. A zero-byte file still
/// transfers one (empty) segment.
pub fn segment_count(size: u64) -> u64 {
    if size == 0 {
        1
    } else {
        size.div_ceil(SEGMENT_SIZE)
    }
}

/// Planned segment sizes in transfer order.
pub fn plan_segments(size: u64) -> Vec<u64> {
    let count = segment_count(size);
    let mut sizes = Vec::with_capacity(count as usize);
    sizes.push(size - (count - 1) * SEGMENT_SIZE);
    for _ in 1..count {
        sizes.push(SEGMENT_SIZE);
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_file_is_one_empty_segment() {
        assert_eq!(plan_segments(0), vec![0]);
        assert_eq!(segment_count(0), 1);
    }

    #[test]
    fn exact_segment_is_one() {
        assert_eq!(plan_segments(SEGMENT_SIZE), vec![SEGMENT_SIZE]);
    }

    #[test]
    fn one_byte_over_splits_remainder_first() {
        assert_eq!(plan_segments(SEGMENT_SIZE + 1), vec![1, SEGMENT_SIZE]);
    }

    #[test]
    fn six_megabyte_file_has_three_segments() {
        let size = 6 * 1024 * 1024;
        let sizes = plan_segments(size);
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes[1], SEGMENT_SIZE);
        assert_eq!(sizes[2], SEGMENT_SIZE);
        assert_eq!(sizes.iter().sum::<u64>(), size);
    }

    proptest! {
        #[test]
        fn plan_always_sums_exactly(size in 0u64..50 * SEGMENT_SIZE) {
            let sizes = plan_segments(size);
            prop_assert_eq!(sizes.iter().sum::<u64>(), size);
            prop_assert_eq!(sizes.len() as u64, segment_count(size));
            // Every segment after the first is full-sized
            for s in &sizes[1..] {
                prop_assert_eq!(*s, SEGMENT_SIZE);
            }
            prop_assert!(sizes[0] <= SEGMENT_SIZE);
        }

        #[test]
        fn count_matches_ceiling_division(size in 1u64..50 * SEGMENT_SIZE) {
            prop_assert_eq!(segment_count(size), size.div_ceil(SEGMENT_SIZE));
        }
    }
}
