use rustfft::{num_complex::Complex, num_traits::Zero};

use crate::{
    config::ConfigError,
    error::Result,
    fft::{fill_right_part_of_spectrum, fix_scale, Fft},
    float::Float,
    ring_buffer::RingBuffer,
};

/// One analysis frame of complex coefficients plus the transform that owns it.
#[derive(Debug)]
pub struct SpectralFrame<T: Float> {
    fft: Fft<T>,
    bins: Vec<Complex<T>>,
}

impl<T: Float> SpectralFrame<T> {
    pub fn new(frame_size: usize) -> Result<Self> {
        if !frame_size.is_power_of_two() {
            return Err(ConfigError::FrameSize(frame_size).into());
        }
        Ok(Self {
            fft: Fft::new(frame_size),
            bins: vec![Complex::zero(); frame_size],
        })
    }

    pub fn frame_size(&self) -> usize {
        self.bins.len()
    }

    /// Number of bins carrying independent information (`frame_size / 2 + 1`).
    pub fn bin_count(&self) -> usize {
        self.bins.len() / 2 + 1
    }

    /// Loads `frame_size` samples from `input` starting at `start`, each
    /// multiplied by the matching `window` coefficient.
    pub fn load(&mut self, input: &RingBuffer<T>, start: usize, window: &[T]) {
        for (i, (bin, &w)) in self.bins.iter_mut().zip(window).enumerate() {
            *bin = Complex::new(w * input.read(start + i), T::zero());
        }
    }

    pub fn forward(&mut self) {
        self.fft.forward(&mut self.bins);
    }

    /// Restores conjugate symmetry from the lower half, then runs the
    /// normalized inverse transform.
    pub fn inverse(&mut self) {
        fill_right_part_of_spectrum(&mut self.bins);
        self.fft.inverse(&mut self.bins);
        fix_scale(&mut self.bins);
    }

    pub fn bins(&self) -> &[Complex<T>] {
        &self.bins
    }

    pub fn bins_mut(&mut self) -> &mut [Complex<T>] {
        &mut self.bins
    }

    pub fn magnitude(&self, k: usize) -> T {
        self.bins[k].norm()
    }

    pub fn phase(&self, k: usize) -> T {
        self.bins[k].arg()
    }

    /// Real part of time-domain sample `i`, valid after [`SpectralFrame::inverse`].
    #[inline]
    pub fn sample(&self, i: usize) -> T {
        self.bins[i].re
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PitchShiftError;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_power_of_two() {
        let err = SpectralFrame::<f32>::new(100).unwrap_err();
        assert_eq!(
            err,
            PitchShiftError::InvalidConfiguration(ConfigError::FrameSize(100))
        );
    }

    #[test]
    fn round_trip_through_ring_buffer() {
        let mut ring = RingBuffer::<f32>::new(32);
        for i in 0..32 {
            ring.write(i, (i as f32 * 0.2).cos());
        }
        let mut frame = SpectralFrame::new(32).unwrap();
        frame.load(&ring, 5, &[1.0; 32]);
        frame.forward();
        frame.inverse();
        for i in 0..32 {
            assert_relative_eq!(frame.sample(i), ring.read(5 + i), epsilon = 1e-5);
        }
    }

    #[test]
    fn reports_magnitude_and_phase() {
        let mut frame = SpectralFrame::<f64>::new(16).unwrap();
        let ring = {
            let mut ring = RingBuffer::new(16);
            for i in 0..16 {
                let t = std::f64::consts::TAU * 2.0 * i as f64 / 16.0;
                ring.write(i, t.sin());
            }
            ring
        };
        frame.load(&ring, 0, &[1.0; 16]);
        frame.forward();
        assert_relative_eq!(frame.magnitude(2), 8.0, epsilon = 1e-9);
        assert_relative_eq!(frame.phase(2), -std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
        assert_eq!(frame.bin_count(), 9);
        assert_eq!(frame.bins().len(), 16);
    }
}
