//! Per-bin phase tracking for frequency reassignment across hops.

use rustfft::num_complex::Complex;

use crate::{
    float::{cast, Float},
    ratio::QuantizedRatio,
};

/// Wraps a phase into `(-PI, PI]`.
pub fn wrap_phase<T: Float>(phase: T) -> T {
    let wrapped = if phase >= T::zero() {
        (phase + T::PI()) % T::TAU() - T::PI()
    } else {
        (phase - T::PI()) % T::TAU() + T::PI()
    };
    if wrapped <= -T::PI() {
        wrapped + T::TAU()
    } else {
        wrapped
    }
}

/// `2 * PI * cycles / frame_size`, where `cycles` is already reduced modulo
/// `frame_size`.
#[inline]
fn bin_phase<T: Float>(cycles: usize, frame_size: usize) -> T {
    T::TAU() * cast::<T>(cycles as f64) / cast::<T>(frame_size as f64)
}

/// Input phase history and output phase accumulator of one channel.
#[derive(Debug, Clone)]
pub struct PhaseTracker<T> {
    last_input: Vec<T>,
    last_output: Vec<T>,
}

impl<T: Float> PhaseTracker<T> {
    pub fn new(bin_count: usize) -> Self {
        Self {
            last_input: vec![T::zero(); bin_count],
            last_output: vec![T::zero(); bin_count],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.last_input.len()
    }

    pub fn reset(&mut self) {
        self.last_input.fill(T::zero());
        self.last_output.fill(T::zero());
    }

    pub fn last_input_phase(&self, k: usize) -> T {
        self.last_input[k]
    }

    pub fn last_output_phase(&self, k: usize) -> T {
        self.last_output[k]
    }

    /// Replaces the phase of each tracked bin with one advanced by the bin's
    /// measured frequency times `ratio`, keeping the magnitude.
    ///
    /// The expected advance `omega[k] * hop` and its scaled counterpart
    /// `omega[k] * hop * ratio` are reduced modulo `2 * PI` with integer
    /// arithmetic before entering floating point; `hop * ratio` is a whole
    /// number of samples, so this changes each wrapped result only by rounding.
    pub fn advance(
        &mut self,
        bins: &mut [Complex<T>],
        frame_size: usize,
        hop_size: usize,
        ratio: QuantizedRatio,
    ) {
        let ratio_value = ratio.value::<T>();
        let tracked = self.bin_count().min(bins.len());

        for k in 0..tracked {
            let (magnitude, phase) = bins[k].to_polar();
            let expected = bin_phase::<T>(k * hop_size % frame_size, frame_size);
            let scaled = bin_phase::<T>(k * ratio.steps() % frame_size, frame_size);

            let deviation = wrap_phase(phase - self.last_input[k] - expected);
            let new_phase = wrap_phase(self.last_output[k] + scaled + deviation * ratio_value);

            self.last_input[k] = phase;
            self.last_output[k] = new_phase;
            bins[k] = Complex::from_polar(magnitude, new_phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn wrap_phase_covers_both_signs() {
        assert_relative_eq!(wrap_phase(0.5f64), 0.5);
        assert_relative_eq!(wrap_phase(-0.5f64), -0.5, epsilon = 1e-12);
        assert_relative_eq!(wrap_phase(-PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_phase(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_phase(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_phase(PI), PI);
        assert_relative_eq!(wrap_phase(-PI), PI);
    }

    proptest! {
        #[test]
        fn wrap_phase_lands_in_principal_range(x in -1.0e5f64..1.0e5) {
            let wrapped = wrap_phase(x);
            prop_assert!(wrapped > -PI && wrapped <= PI);
        }

        #[test]
        fn wrap_phase_ignores_whole_turns(x in -100.0f64..100.0, n in -64i32..64) {
            let a = wrap_phase(x);
            let b = wrap_phase(x + TAU * n as f64);
            // compare on the circle so values straddling +-PI still match
            prop_assert!(wrap_phase(a - b).abs() < 1e-9);
        }
    }

    fn tone_bins(frame_size: usize, bin: f64, offset: f64) -> Vec<Complex<f64>> {
        let mut fft = crate::fft::Fft::<f64>::new(frame_size);
        let mut buf: Vec<_> = (0..frame_size)
            .map(|i| {
                let t = TAU * bin * (i as f64 + offset) / frame_size as f64;
                Complex::new(t.cos(), t.sin())
            })
            .collect();
        fft.forward(&mut buf);
        buf
    }

    #[test]
    fn unit_ratio_reproduces_input_phases() {
        let frame_size = 64;
        let hop = 16;
        let mut tracker = PhaseTracker::<f64>::new(frame_size / 2 + 1);
        for hop_index in 0..4 {
            let mut bins = tone_bins(frame_size, 5.0, (hop_index * hop) as f64);
            let original = bins.clone();
            tracker.advance(&mut bins, frame_size, hop, QuantizedRatio::new(1.0, hop));
            for k in 0..=frame_size / 2 {
                assert_relative_eq!(bins[k].re, original[k].re, epsilon = 1e-9);
                assert_relative_eq!(bins[k].im, original[k].im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn output_phase_advances_by_scaled_true_frequency() {
        let frame_size = 64;
        let hop = 16;
        let bin = 5.25;
        let ratio = QuantizedRatio::new(1.5, hop);
        let mut tracker = PhaseTracker::<f64>::new(frame_size / 2 + 1);

        let mut first = tone_bins(frame_size, bin, 0.0);
        tracker.advance(&mut first, frame_size, hop, ratio);
        let before = tracker.last_output_phase(5);

        let mut second = tone_bins(frame_size, bin, hop as f64);
        tracker.advance(&mut second, frame_size, hop, ratio);
        let after = tracker.last_output_phase(5);

        let true_increment = TAU * bin * hop as f64 / frame_size as f64;
        assert_relative_eq!(
            wrap_phase(after - before - true_increment * 1.5),
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn reset_zeroes_history() {
        let mut tracker = PhaseTracker::<f32>::new(9);
        let mut bins: Vec<_> = (0..16).map(|i| Complex::new(1.0, i as f32)).collect();
        tracker.advance(&mut bins, 16, 4, QuantizedRatio::new(2.0, 4));
        assert!(tracker.last_input_phase(3) != 0.0);
        tracker.reset();
        for k in 0..tracker.bin_count() {
            assert_eq!(tracker.last_input_phase(k), 0.0);
            assert_eq!(tracker.last_output_phase(k), 0.0);
        }
    }
}
