//! Linear-interpolation resampling of one synthesis frame.

use crate::{
    float::{cast, Float},
    ratio::QuantizedRatio,
};

/// Maps output sample `i` of an `output_len` frame onto a `source_len` frame.
///
/// Source positions are `i * source_len / output_len`; the integer and
/// fractional parts are taken with integer arithmetic, and the right-hand
/// neighbour wraps modulo `source_len`, so no read leaves the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    source_len: usize,
    output_len: usize,
}

impl Resampler {
    pub fn new(source_len: usize, output_len: usize) -> Self {
        Self {
            source_len: source_len.max(1),
            output_len: output_len.max(1),
        }
    }

    /// Resampler producing `floor(frame_size / ratio)` samples.
    pub fn for_ratio(frame_size: usize, ratio: QuantizedRatio) -> Self {
        Self::new(frame_size, ratio.resampled_length(frame_size))
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Left source index, right source index and interpolation fraction.
    #[inline]
    pub fn position<T: Float>(&self, i: usize) -> (usize, usize, T) {
        let scaled = i * self.source_len;
        let left = (scaled / self.output_len) % self.source_len;
        let frac = cast::<T>((scaled % self.output_len) as f64) / cast::<T>(self.output_len as f64);
        (left, (left + 1) % self.source_len, frac)
    }

    /// Interpolated sample `i`, reading the source through `source`.
    #[inline]
    pub fn sample<T: Float>(&self, i: usize, source: impl Fn(usize) -> T) -> T {
        let (left, right, frac) = self.position::<T>(i);
        let a = source(left);
        let b = source(right);
        a + frac * (b - a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn compresses_a_ramp() {
        let source: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let resampler = Resampler::new(8, 4);
        let out: Vec<f32> = (0..resampler.output_len())
            .map(|i| resampler.sample(i, |j| source[j]))
            .collect();
        assert_eq!(out, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn stretches_with_interpolation() {
        let source = [0.0f32, 1.0, 0.0, -1.0];
        let resampler = Resampler::new(4, 8);
        let out: Vec<f32> = (0..8).map(|i| resampler.sample(i, |j| source[j])).collect();
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[3], 0.5);
        // the last sample interpolates toward the wrapped first sample
        assert_relative_eq!(out[7], -0.5);
    }

    #[test]
    fn unit_ratio_is_a_copy() {
        let ratio = QuantizedRatio::new(1.0, 16);
        let resampler = Resampler::for_ratio(64, ratio);
        assert_eq!(resampler.output_len(), 64);
        for i in 0..64 {
            let (left, _, frac) = resampler.position::<f32>(i);
            assert_eq!(left, i);
            assert_eq!(frac, 0.0);
        }
    }

    proptest! {
        #[test]
        fn reads_stay_inside_the_source(
            log_size in 5u32..14,
            divisor in prop::sample::select(vec![2usize, 4, 8]),
            ratio in 0.5f32..2.0,
        ) {
            let frame_size = 1usize << log_size;
            let ratio = QuantizedRatio::new(ratio, frame_size / divisor);
            let resampler = Resampler::for_ratio(frame_size, ratio);
            prop_assert!(resampler.output_len() >= 1);
            // floor(frame_size / (steps / hop)) bracketed in integers
            let hop = ratio.hop_size();
            prop_assert!(resampler.output_len() * ratio.steps() <= frame_size * hop);
            prop_assert!((resampler.output_len() + 1) * ratio.steps() > frame_size * hop);
            for i in 0..resampler.output_len() {
                let (left, right, frac) = resampler.position::<f64>(i);
                prop_assert!(left < frame_size && right < frame_size);
                prop_assert!((0.0..1.0).contains(&frac));
            }
        }
    }
}
