use std::sync::Arc;

use rustfft::{num_complex::Complex, num_traits::Zero};

use crate::float::{cast, Float};

/// Forward/inverse plan pair sharing one preallocated scratch buffer.
///
/// Both directions run in place through `process_with_scratch`, so a planned
/// `Fft` never touches the allocator again.
pub struct Fft<T: Float> {
    forward: Arc<dyn rustfft::Fft<T>>,
    inverse: Arc<dyn rustfft::Fft<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T: Float> Fft<T> {
    pub fn new(size: usize) -> Self {
        let mut planner = rustfft::FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            forward,
            inverse,
            scratch: vec![Complex::zero(); scratch_len],
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn forward(&mut self, buffer: &mut [Complex<T>]) {
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Unnormalized inverse; follow with [`fix_scale`] for a true inverse.
    pub fn inverse(&mut self, buffer: &mut [Complex<T>]) {
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
    }
}

impl<T: Float> std::fmt::Debug for Fft<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("len", &self.len()).finish()
    }
}

pub fn fix_scale<T: Float>(buf: &mut [Complex<T>]) {
    let scale = T::one() / cast::<T>(buf.len() as f64);
    for x in buf.iter_mut() {
        *x = *x * scale;
    }
}

/// Mirrors bins `1..len/2` onto the upper half as complex conjugates so the
/// inverse transform of the spectrum is real.
pub fn fill_right_part_of_spectrum<T: Float>(spectrum: &mut [Complex<T>]) {
    let len = spectrum.len();
    for i in 1..len / 2 {
        spectrum[len - i] = spectrum[i].conj();
    }
}
