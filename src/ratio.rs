//! Pitch-ratio control: semitone conversion, per-sample smoothing and the
//! hop-rate quantization the resynthesis step needs.

use crate::float::{cast, Float};

/// `2^(semitones / 12)`.
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0f32.powf(semitones / 12.0)
}

pub fn ratio_to_semitones(ratio: f32) -> f32 {
    12.0 * ratio.log2()
}

/// Linear ramp toward a target ratio, advanced once per sample.
///
/// Reaching the end of a ramp snaps exactly onto the target so that
/// `current() == target()` holds once [`RatioSmoother::is_smoothing`] is false.
#[derive(Debug, Clone)]
pub struct RatioSmoother {
    current: f32,
    target: f32,
    step: f32,
    samples_remaining: u32,
}

impl RatioSmoother {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            samples_remaining: 0,
        }
    }

    /// Starts a ramp of `samples` steps; zero jumps straight to `target`.
    pub fn set_target(&mut self, target: f32, samples: u32) {
        if samples == 0 || target == self.current {
            self.set_immediate(target);
            return;
        }
        if target == self.target {
            return;
        }
        self.target = target;
        self.samples_remaining = samples;
        self.step = (self.target - self.current) / samples as f32;
    }

    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.samples_remaining = 0;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.step;
            self.samples_remaining -= 1;

            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }

        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.samples_remaining > 0
    }
}

/// A pitch ratio rounded to a whole number of samples per hop.
///
/// `value = steps / hop_size`, so `hop_size * value` is an integer and the
/// resampled frame length `frame_size / value` can be computed exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedRatio {
    steps: usize,
    hop_size: usize,
}

impl QuantizedRatio {
    pub fn new(pitch_ratio: f32, hop_size: usize) -> Self {
        let hop_size = hop_size.max(1);
        let steps = (pitch_ratio * hop_size as f32).round();
        Self {
            steps: if steps.is_finite() && steps > 0.0 {
                steps as usize
            } else {
                0
            },
            hop_size,
        }
    }

    pub fn steps(self) -> usize {
        self.steps
    }

    pub fn hop_size(self) -> usize {
        self.hop_size
    }

    pub fn value<T: Float>(self) -> T {
        cast::<T>(self.steps as f64) / cast::<T>(self.hop_size as f64)
    }

    /// A ratio that rounded to zero produces no output frame.
    pub fn is_silent(self) -> bool {
        self.steps == 0
    }

    /// `floor(frame_size / value)`, never less than one sample.
    pub fn resampled_length(self, frame_size: usize) -> usize {
        (frame_size * self.hop_size / self.steps.max(1)).max(1)
    }
}
