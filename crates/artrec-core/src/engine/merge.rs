use crate::{Delta, MergeMode};

use super::frame_buffer::FrameBuffer;

/// Merge `deltas` onto a copy of `base`.
///
/// LTP writes every delta; HTP only raises channels. Deltas addressing a
/// channel outside the buffer are skipped.
///
/// # Examples
/// ```
/// use artrec_core::{Delta, FrameBuffer, MergeMode, merge};
///
/// let base = FrameBuffer::from_values(vec![5]);
/// let htp = merge(&base, &[Delta::new(1, 3)], MergeMode::Htp);
/// assert_eq!(htp.get(1), Some(5));
/// let ltp = merge(&base, &[Delta::new(1, 3)], MergeMode::Ltp);
/// assert_eq!(ltp.get(1), Some(3));
/// ```
pub fn merge(base: &FrameBuffer, deltas: &[Delta], mode: MergeMode) -> FrameBuffer {
    let mut merged = base.clone();
    merged.apply(deltas, mode);
    merged
}

#[cfg(test)]
mod tests {
    use super::merge;
    use crate::engine::frame_buffer::FrameBuffer;
    use crate::{Delta, MergeMode};

    #[test]
    fn htp_keeps_higher_live_value() {
        let base = FrameBuffer::from_values(vec![5]);
        let merged = merge(&base, &[Delta::new(1, 3)], MergeMode::Htp);
        assert_eq!(merged.get(1), Some(5));
    }

    #[test]
    fn htp_raises_to_higher_delta() {
        let base = FrameBuffer::from_values(vec![5]);
        let merged = merge(&base, &[Delta::new(1, 7)], MergeMode::Htp);
        assert_eq!(merged.get(1), Some(7));
    }

    #[test]
    fn ltp_always_takes_delta() {
        let base = FrameBuffer::from_values(vec![5]);
        let merged = merge(&base, &[Delta::new(1, 3)], MergeMode::Ltp);
        assert_eq!(merged.get(1), Some(3));
    }

    #[test]
    fn base_is_not_modified() {
        let base = FrameBuffer::from_values(vec![5, 5]);
        let _ = merge(&base, &[Delta::new(2, 0)], MergeMode::Ltp);
        assert_eq!(base.as_slice(), &[5, 5]);
    }

    #[test]
    fn later_delta_for_same_channel_wins_under_ltp() {
        let base = FrameBuffer::new(1);
        let merged = merge(
            &base,
            &[Delta::new(1, 200), Delta::new(1, 10)],
            MergeMode::Ltp,
        );
        assert_eq!(merged.get(1), Some(10));
    }

    #[test]
    fn out_of_range_channels_are_skipped() {
        let mut buffer = FrameBuffer::new(2);
        let changed = buffer.apply(
            &[Delta::new(0, 9), Delta::new(3, 9), Delta::new(2, 9)],
            MergeMode::Ltp,
        );
        assert_eq!(changed, 1);
        assert_eq!(buffer.as_slice(), &[0, 9]);
    }
}
