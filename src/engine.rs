//! Thread-safe front end shared by a control thread and the audio callback.

use std::sync::atomic::{AtomicU32, Ordering};

use atomic_float::AtomicF32;
use parking_lot::Mutex;

use crate::{
    config::{BufferSizes, Config},
    error::{PitchShiftError, Result},
    processor::{EngineState, Processor},
    ratio::semitones_to_ratio,
};

/// Real-time pitch shifter with hot reconfiguration.
///
/// The streaming pass and every reconfiguration hold the same mutex. The audio
/// side only ever calls `try_lock`: a block that collides with a
/// reconfiguration is emitted as silence instead of waiting, which matches
/// what the freshly cleared buffers would have produced. Ratio changes bypass
/// the lock entirely through atomics and are picked up at the start of the
/// next block.
///
/// ```
/// use pitch_vocoder::{Config, PitchShiftEngine, WindowShape};
///
/// let engine = PitchShiftEngine::with_config(
///     Config::new(1024, 4, WindowShape::Hann).with_max_channels(1),
/// )
/// .unwrap();
/// engine.set_semitones(7.0, 20.0).unwrap();
///
/// let mut block = vec![0.0f32; 256];
/// engine.process(&mut [block.as_mut_slice()], 256);
/// ```
#[derive(Debug)]
pub struct PitchShiftEngine {
    processor: Mutex<Option<Processor>>,
    target_ratio: AtomicF32,
    smoothing_ms: AtomicF32,
    ratio_generation: AtomicU32,
    applied_generation: AtomicU32,
}

impl Default for PitchShiftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchShiftEngine {
    /// An unconfigured engine; [`PitchShiftEngine::process`] emits silence
    /// until [`PitchShiftEngine::configure`] succeeds.
    pub fn new() -> Self {
        Self {
            processor: Mutex::new(None),
            target_ratio: AtomicF32::new(1.0),
            smoothing_ms: AtomicF32::new(0.0),
            ratio_generation: AtomicU32::new(0),
            applied_generation: AtomicU32::new(0),
        }
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let engine = Self::new();
        engine.configure(config)?;
        Ok(engine)
    }

    /// Replaces every buffer with ones sized for `config`.
    ///
    /// The new buffers are allocated before the lock is taken; under the lock
    /// the processor is swapped and the current ratio carried over. On error
    /// the previous configuration keeps running untouched.
    pub fn configure(&self, config: Config) -> Result<()> {
        let summary = (
            config.frame_size,
            config.hop_size(),
            config.window_shape,
            config.max_channels,
            config.sample_rate,
        );
        let mut fresh = match Processor::new(config) {
            Ok(processor) => processor,
            Err(err) => {
                log::warn!("rejected configuration: {err}");
                return Err(err);
            }
        };

        let retired = {
            let mut guard = self.processor.lock();
            match guard.as_ref() {
                Some(previous) => fresh.inherit_ratio(previous),
                None => {
                    // the first configuration applies any ratio set while idle
                    self.applied_generation.store(u32::MAX, Ordering::Relaxed);
                }
            }
            guard.replace(fresh)
        };
        drop(retired);

        let (frame_size, hop_size, window_shape, channels, sample_rate) = summary;
        log::info!(
            "configured frame={frame_size} hop={hop_size} window={window_shape:?} \
             channels={channels} sample_rate={sample_rate}"
        );
        Ok(())
    }

    /// Drops every buffer and returns to [`EngineState::Idle`].
    pub fn release(&self) {
        let retired = self.processor.lock().take();
        if retired.is_some() {
            log::debug!("released processing buffers");
        }
    }

    /// Clears audio and phase history, keeping the configuration.
    pub fn reset(&self) {
        if let Some(processor) = self.processor.lock().as_mut() {
            processor.reset();
            log::debug!("reset processing state");
        }
    }

    /// Sets the pitch ratio target, reached over `smoothed_over_ms`.
    ///
    /// Never blocks; the value is clamped to the configured range when the
    /// audio thread picks it up.
    pub fn set_pitch_ratio(&self, ratio: f32, smoothed_over_ms: f32) -> Result<()> {
        if !ratio.is_finite() {
            log::warn!("ignoring non-finite pitch ratio {ratio}");
            return Err(PitchShiftError::InvalidRatio(ratio));
        }
        self.smoothing_ms
            .store(smoothed_over_ms.max(0.0), Ordering::Relaxed);
        self.target_ratio.store(ratio, Ordering::Relaxed);
        self.ratio_generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    pub fn set_semitones(&self, semitones: f32, smoothed_over_ms: f32) -> Result<()> {
        self.set_pitch_ratio(semitones_to_ratio(semitones), smoothed_over_ms)
    }

    /// Shifts one block in place. Returns `false` when the block was silenced
    /// because the engine is idle or being reconfigured.
    pub fn process(&self, channels: &mut [&mut [f32]], num_samples: usize) -> bool {
        let Some(mut guard) = self.processor.try_lock() else {
            silence(channels, num_samples);
            return false;
        };
        let Some(processor) = guard.as_mut() else {
            silence(channels, num_samples);
            return false;
        };

        let generation = self.ratio_generation.load(Ordering::Acquire);
        if generation != self.applied_generation.load(Ordering::Relaxed) {
            let ratio = self.target_ratio.load(Ordering::Relaxed);
            let ms = self.smoothing_ms.load(Ordering::Relaxed);
            // finite by construction in set_pitch_ratio
            let _ = processor.set_pitch_ratio(ratio, ms);
            self.applied_generation.store(generation, Ordering::Relaxed);
        }

        processor.process(channels, num_samples);
        true
    }

    pub fn state(&self) -> EngineState {
        self.processor
            .lock()
            .as_ref()
            .map_or(EngineState::Idle, Processor::state)
    }

    pub fn config(&self) -> Option<Config> {
        self.processor.lock().as_ref().map(|p| p.config().clone())
    }

    /// Per-channel buffer sizes of the active configuration.
    pub fn buffer_sizes(&self) -> Option<BufferSizes> {
        self.processor.lock().as_ref().map(Processor::buffer_sizes)
    }

    pub fn latency_samples(&self) -> usize {
        self.processor
            .lock()
            .as_ref()
            .map_or(0, Processor::latency_samples)
    }

    /// Smoothed ratio as of the last processed sample, if configured.
    pub fn pitch_ratio(&self) -> Option<f32> {
        self.processor.lock().as_ref().map(Processor::pitch_ratio)
    }
}

fn silence(channels: &mut [&mut [f32]], num_samples: usize) {
    for buf in channels.iter_mut() {
        let n = num_samples.min(buf.len());
        buf[..n].fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ConfigError, windows::WindowShape};

    #[test]
    fn idle_engine_emits_silence() {
        let engine = PitchShiftEngine::new();
        assert_eq!(engine.state(), EngineState::Idle);
        let mut block = vec![1.0f32; 64];
        assert!(!engine.process(&mut [block.as_mut_slice()], 64));
        assert!(block.iter().all(|&x| x == 0.0));
        assert_eq!(engine.latency_samples(), 0);
    }

    #[test]
    fn lifecycle_moves_through_states() {
        let engine = PitchShiftEngine::with_config(Config::default()).unwrap();
        assert_eq!(engine.state(), EngineState::Configured);
        let mut l = vec![0.1f32; 128];
        let mut r = vec![0.1f32; 128];
        assert!(engine.process(&mut [l.as_mut_slice(), r.as_mut_slice()], 128));
        assert_eq!(engine.state(), EngineState::Streaming);

        engine.configure(Config::new(256, 2, WindowShape::Bartlett)).unwrap();
        assert_eq!(engine.state(), EngineState::Configured);
        assert_eq!(engine.latency_samples(), 256);

        engine.release();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.config(), None);
    }

    #[test]
    fn rejected_configuration_keeps_the_previous_one() {
        let engine = PitchShiftEngine::with_config(Config::default()).unwrap();
        let err = engine
            .configure(Config::new(300, 4, WindowShape::Hann))
            .unwrap_err();
        assert_eq!(
            err,
            PitchShiftError::InvalidConfiguration(ConfigError::FrameSize(300))
        );
        assert_eq!(engine.config(), Some(Config::default()));

        let err = engine
            .configure(Config::default().with_sample_rate(-1.0))
            .unwrap_err();
        assert!(matches!(err, PitchShiftError::InvalidConfiguration(_)));
        assert_eq!(engine.buffer_sizes(), Some(Config::default().buffer_sizes()));
    }

    #[test]
    fn ratio_set_while_idle_applies_after_configure() {
        let engine = PitchShiftEngine::new();
        engine.set_pitch_ratio(1.5, 0.0).unwrap();
        engine.configure(Config::default()).unwrap();
        let mut block = vec![0.0f32; 16];
        engine.process(&mut [block.as_mut_slice()], 16);
        assert_eq!(engine.pitch_ratio(), Some(1.5));
    }

    #[test]
    fn ratio_survives_reconfiguration() {
        let engine = PitchShiftEngine::with_config(Config::default()).unwrap();
        engine.set_semitones(-12.0, 0.0).unwrap();
        let mut block = vec![0.0f32; 16];
        engine.process(&mut [block.as_mut_slice()], 16);
        engine.configure(Config::new(1024, 4, WindowShape::Hamming)).unwrap();
        assert_eq!(engine.pitch_ratio(), Some(0.5));
    }

    #[test]
    fn non_finite_ratio_is_rejected() {
        let engine = PitchShiftEngine::new();
        assert_eq!(
            engine.set_pitch_ratio(f32::NAN, 0.0).map_err(|e| e.to_string()),
            Err("invalid pitch ratio: NaN is not finite".to_string())
        );
    }
}
