/// Indices of `target` frames spread evenly over `len` frames, in temporal order.
///
/// Frame `i` of the result is `floor(i * len / target)`. When there are no more frames than
/// `target` every index is returned.
pub fn resample_indices(len: usize, target: usize) -> Vec<usize> {
    if len <= target {
        return (0..len).collect();
    }
    (0..target).map(|i| i * len / target).collect()
}

/// Selects `target` frames evenly spaced across `frames`. No interpolation is done.
///
/// Inputs that are already at or below `target` come back unchanged, short ones included:
/// raw frames have no meaningful padding, so it is up to the caller to reject a short clip.
pub fn resample<T: Clone>(frames: &[T], target: usize) -> Vec<T> {
    resample_indices(frames.len(), target)
        .into_iter()
        .map(|ix| frames[ix].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_length_is_unchanged() {
        let frames: Vec<u32> = (0..30).collect();
        assert_eq!(resample(&frames, 30), frames);
    }

    #[test]
    fn short_input_is_unchanged() {
        let frames: Vec<u32> = (0..12).collect();
        assert_eq!(resample(&frames, 30), frames);
    }

    #[test]
    fn double_length_takes_every_other_frame() {
        let frames: Vec<u32> = (0..60).collect();
        let expected: Vec<u32> = (0..60).step_by(2).collect();
        assert_eq!(resample(&frames, 30), expected);
    }

    #[test]
    fn uneven_ratio_uses_floor_spacing() {
        assert_eq!(resample_indices(10, 4), vec![0, 2, 5, 7]);
        // One extra frame: the last one is the one dropped.
        assert_eq!(resample_indices(31, 30), (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn zero_target_selects_nothing() {
        assert!(resample(&[1, 2, 3], 0).is_empty());
    }
}
