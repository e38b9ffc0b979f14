//! Real-time phase vocoder pitch shifter.
//!
//! Audio is pushed through a per-channel input ring one sample at a time;
//! every hop the most recent frame is analysed, its bin phases are advanced by
//! the measured frequencies times the pitch ratio, and the resynthesized frame
//! is resampled by the same ratio and overlap-added into an output ring read
//! one frame later.
//!
//! [`PitchShiftEngine`] is the thread-safe entry point; [`Processor`] is the
//! lock-free core for single-threaded use.

pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod float;
pub mod phase;
pub mod processor;
pub mod ratio;
pub mod resample;
pub mod ring_buffer;
pub mod spectral;
pub mod windows;

pub use config::{BufferSizes, Config, ConfigError};
pub use engine::PitchShiftEngine;
pub use error::{PitchShiftError, Result};
pub use phase::{wrap_phase, PhaseTracker};
pub use processor::{EngineState, Processor, RunState};
pub use ratio::{ratio_to_semitones, semitones_to_ratio, QuantizedRatio, RatioSmoother};
pub use resample::Resampler;
pub use ring_buffer::RingBuffer;
pub use spectral::SpectralFrame;
pub use windows::{WindowShape, WindowTable};

/// Root mean square of `buf`.
pub fn power<T: float::Float + std::iter::Sum>(buf: &[T]) -> T {
    if buf.is_empty() {
        return T::zero();
    }
    (buf.iter().map(|&x| x.powi(2)).sum::<T>() / float::cast::<T>(buf.len() as f64)).sqrt()
}
