//! Single-threaded streaming pitch shifter.
//!
//! [`Processor`] owns every buffer for one configuration and runs the
//! per-sample exchange and the per-hop analysis/resynthesis cycle. It performs
//! no locking; [`crate::PitchShiftEngine`] wraps it for use across a control
//! thread and a real-time thread.

use crate::{
    config::{BufferSizes, Config},
    error::{PitchShiftError, Result},
    phase::PhaseTracker,
    ratio::{semitones_to_ratio, QuantizedRatio, RatioSmoother},
    resample::Resampler,
    ring_buffer::RingBuffer,
    spectral::SpectralFrame,
    windows::WindowTable,
};

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No buffers allocated; processing emits silence.
    Idle,
    /// Buffers sized and cleared, waiting for the first block.
    Configured,
    /// At least one block processed since the last (re)configuration.
    Streaming,
}

/// Cursor state of one channel.
///
/// Cursors are kept reduced modulo their buffer lengths. A fresh state places
/// the output write cursor one hop ahead of the read cursor, which makes the
/// input-to-output delay exactly one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunState {
    pub in_write: usize,
    pub out_write: usize,
    pub out_read: usize,
    pub samples_since_hop: usize,
}

impl RunState {
    pub fn new(sizes: &BufferSizes) -> Self {
        Self {
            out_write: sizes.hop_size % sizes.output_len,
            ..Self::default()
        }
    }

    /// State after one input sample was pushed and one output sample popped.
    #[inline]
    pub fn advanced(self, sizes: &BufferSizes) -> Self {
        Self {
            in_write: (self.in_write + 1) % sizes.input_len,
            out_read: (self.out_read + 1) % sizes.output_len,
            samples_since_hop: self.samples_since_hop + 1,
            ..self
        }
    }

    #[inline]
    pub fn hop_due(&self, sizes: &BufferSizes) -> bool {
        self.samples_since_hop >= sizes.hop_size
    }

    /// State after a hop cycle wrote its frame at `out_write`.
    #[inline]
    pub fn after_hop(self, sizes: &BufferSizes) -> Self {
        Self {
            out_write: (self.out_write + sizes.hop_size) % sizes.output_len,
            samples_since_hop: 0,
            ..self
        }
    }
}

#[derive(Debug, Clone)]
struct ChannelState {
    run: RunState,
    input: RingBuffer<f32>,
    output: RingBuffer<f32>,
    phases: PhaseTracker<f32>,
}

impl ChannelState {
    fn new(sizes: &BufferSizes) -> Self {
        Self {
            run: RunState::new(sizes),
            input: RingBuffer::new(sizes.input_len),
            output: RingBuffer::new(sizes.output_len),
            phases: PhaseTracker::new(sizes.bin_count),
        }
    }

    fn reset(&mut self, sizes: &BufferSizes) {
        self.run = RunState::new(sizes);
        self.input.clear();
        self.output.clear();
        self.phases.reset();
    }

    /// Pops the next output sample and pushes `input` in its place.
    #[inline]
    fn exchange(&mut self, input: f32, sizes: &BufferSizes) -> f32 {
        let run = self.run;
        let out = self.output.take(run.out_read);
        self.input.write(run.in_write, input);
        self.run = run.advanced(sizes);
        out
    }
}

/// Buffers and transform shared by every channel during a hop cycle.
#[derive(Debug)]
struct HopContext {
    sizes: BufferSizes,
    window: WindowTable<f32>,
    frame: SpectralFrame<f32>,
}

impl HopContext {
    /// Analysis, phase reassignment, resynthesis, resampling and overlap-add of
    /// the most recent `frame_size` input samples of `channel`.
    fn run(&mut self, channel: &mut ChannelState, ratio: QuantizedRatio) {
        let sizes = self.sizes;
        let run = channel.run;

        // in_write now points at the oldest sample of the input frame
        self.frame
            .load(&channel.input, run.in_write, self.window.analysis());
        self.frame.forward();
        channel.phases.advance(
            self.frame.bins_mut(),
            sizes.frame_size,
            sizes.hop_size,
            ratio,
        );
        self.frame.inverse();

        let scale = self.window.scale_factor();
        if !ratio.is_silent() && scale != 0.0 {
            // output_len covers the lowest quantized ratio the clamp allows
            let resampler = Resampler::for_ratio(sizes.frame_size, ratio);
            let len = resampler.output_len();
            debug_assert!(len <= sizes.output_len);
            let frame = &self.frame;
            for i in 0..len {
                let value = resampler.sample(i, |j| frame.sample(j));
                let gain = self.window.synthesis(i, len) * scale;
                channel.output.add(run.out_write + i, value * gain);
            }
        }

        channel.run = run.after_hop(&sizes);
    }
}

/// Streaming pitch shifter for one configuration.
#[derive(Debug)]
pub struct Processor {
    config: Config,
    hop: HopContext,
    channels: Vec<ChannelState>,
    smoother: RatioSmoother,
    reset_phases: bool,
    streaming: bool,
}

impl Processor {
    /// Validates `config` and allocates every buffer it needs.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let sizes = config.buffer_sizes();
        let hop = HopContext {
            sizes,
            window: WindowTable::new(config.window_shape, config.frame_size, config.hop_divisor),
            frame: SpectralFrame::new(config.frame_size)?,
        };
        let channels = (0..config.max_channels)
            .map(|_| ChannelState::new(&sizes))
            .collect();
        let smoother = RatioSmoother::new(config.clamp_ratio(1.0));

        Ok(Self {
            config,
            hop,
            channels,
            smoother,
            reset_phases: true,
            streaming: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn buffer_sizes(&self) -> BufferSizes {
        self.hop.sizes
    }

    pub fn latency_samples(&self) -> usize {
        self.config.latency_samples()
    }

    pub fn state(&self) -> EngineState {
        if self.streaming {
            EngineState::Streaming
        } else {
            EngineState::Configured
        }
    }

    pub fn window_scale_factor(&self) -> f32 {
        self.hop.window.scale_factor()
    }

    /// Smoothed ratio as of the last processed sample.
    pub fn pitch_ratio(&self) -> f32 {
        self.smoother.current()
    }

    pub fn target_pitch_ratio(&self) -> f32 {
        self.smoother.target()
    }

    /// True while a phase restart is pending (a ratio change has not settled).
    pub fn phase_reset_pending(&self) -> bool {
        self.reset_phases
    }

    /// Ramps toward `ratio` (clamped to the configured range) over
    /// `smoothed_over_ms` milliseconds.
    pub fn set_pitch_ratio(&mut self, ratio: f32, smoothed_over_ms: f32) -> Result<()> {
        if !ratio.is_finite() {
            return Err(PitchShiftError::InvalidRatio(ratio));
        }
        let samples = if smoothed_over_ms.is_finite() && smoothed_over_ms > 0.0 {
            (smoothed_over_ms * 0.001 * self.config.sample_rate).round() as u32
        } else {
            0
        };
        self.smoother
            .set_target(self.config.clamp_ratio(ratio), samples);
        Ok(())
    }

    pub fn set_semitones(&mut self, semitones: f32, smoothed_over_ms: f32) -> Result<()> {
        self.set_pitch_ratio(semitones_to_ratio(semitones), smoothed_over_ms)
    }

    /// Carries the ratio of `previous` across a reconfiguration, so the new
    /// buffers start at the pitch the old ones were producing.
    pub fn inherit_ratio(&mut self, previous: &Processor) {
        let current = self.config.clamp_ratio(previous.smoother.current());
        let target = self.config.clamp_ratio(previous.smoother.target());
        self.smoother.set_immediate(current);
        if target != current {
            // whatever ramp time was left is lost; finish within one hop
            self.smoother
                .set_target(target, self.hop.sizes.hop_size as u32);
        }
    }

    /// Clears buffers, cursors and phase history while keeping the
    /// configuration.
    pub fn reset(&mut self) {
        let sizes = self.hop.sizes;
        for channel in self.channels.iter_mut() {
            channel.reset(&sizes);
        }
        self.reset_phases = true;
        self.streaming = false;
    }

    /// Shifts `num_samples` samples of every channel in place.
    ///
    /// Channels beyond `max_channels` are zeroed and otherwise ignored. Buffers
    /// shorter than `num_samples` limit the block to their length.
    pub fn process(&mut self, channels: &mut [&mut [f32]], num_samples: usize) {
        let num_samples = channels
            .iter()
            .map(|c| c.len())
            .fold(num_samples, usize::min);
        let active = channels.len().min(self.channels.len());
        let (channels, extra) = channels.split_at_mut(active);
        for buf in extra.iter_mut() {
            buf[..num_samples].fill(0.0);
        }

        let sizes = self.hop.sizes;
        for n in 0..num_samples {
            let pitch = self.smoother.next_sample();

            let mut hop_due = false;
            for (state, buf) in self.channels.iter_mut().zip(channels.iter_mut()) {
                buf[n] = state.exchange(buf[n], &sizes);
                hop_due |= state.run.hop_due(&sizes);
            }

            if hop_due {
                let ratio = self.begin_hop(pitch);
                for state in self.channels[..active].iter_mut() {
                    if state.run.hop_due(&sizes) {
                        self.hop.run(state, ratio);
                    }
                }
            }
        }

        self.streaming = true;
    }

    /// Applies the phase-reset policy and quantizes the ratio for one hop.
    fn begin_hop(&mut self, pitch: f32) -> QuantizedRatio {
        if self.smoother.is_smoothing() {
            self.reset_phases = true;
        } else if self.reset_phases {
            for channel in self.channels.iter_mut() {
                channel.phases.reset();
            }
            self.reset_phases = false;
        }
        // ramp accumulation may overshoot the clamped endpoints by rounding
        QuantizedRatio::new(self.config.clamp_ratio(pitch), self.hop.sizes.hop_size)
    }
}
