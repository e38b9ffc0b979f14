//! Frame, hop and window configuration plus the buffer sizes it implies.

use thiserror::Error;

use crate::{ratio::QuantizedRatio, windows::WindowShape};

pub const MIN_FRAME_SIZE: usize = 32;
pub const MAX_FRAME_SIZE: usize = 8192;
/// Largest overlap-add accumulator a configuration may ask for, per channel.
pub const MAX_OUTPUT_LENGTH: usize = MAX_FRAME_SIZE * 16;
pub const SUPPORTED_HOP_DIVISORS: [usize; 3] = [2, 4, 8];

/// Why a [`Config`] was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frame size {0} is not a power of two in [32, 8192]")]
    FrameSize(usize),

    #[error("hop divisor {0} is not one of 2, 4 or 8")]
    HopDivisor(usize),

    #[error("sample rate {0} must be positive and finite")]
    SampleRate(f32),

    #[error("channel count must be at least one")]
    MaxChannels,

    #[error(
        "pitch ratio range [{min}, {max}] must be finite and ordered, and its lowest ratio \
         must round to at least one sample per hop and fit a 131072-sample output buffer"
    )]
    RatioRange { min: f32, max: f32 },

    #[error("frame size selection {0} is out of range")]
    FrameSizeIndex(usize),

    #[error("hop size selection {0} is out of range")]
    HopDivisorIndex(usize),

    #[error("window selection {0} is out of range")]
    WindowIndex(usize),
}

/// Engine configuration.
///
/// `frame_size` and `hop_divisor` fix the hop size and every buffer length;
/// `min_ratio` fixes the capacity of the overlap-add accumulator, which must
/// hold one frame resampled to the lowest allowed pitch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub frame_size: usize,
    pub hop_divisor: usize,
    pub window_shape: WindowShape,
    pub sample_rate: f32,
    pub max_channels: usize,
    pub min_ratio: f32,
    pub max_ratio: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_size: 512,
            hop_divisor: 8,
            window_shape: WindowShape::Hann,
            sample_rate: 44100.0,
            max_channels: 2,
            min_ratio: 0.5,
            max_ratio: 2.0,
        }
    }
}

impl Config {
    pub fn new(frame_size: usize, hop_divisor: usize, window_shape: WindowShape) -> Self {
        Self {
            frame_size,
            hop_divisor,
            window_shape,
            ..Self::default()
        }
    }

    /// Builds a configuration from selection indices: frame size `2^(i + 5)`,
    /// hop divisor `2^(i + 1)`, window 0/1/2 = Bartlett/Hann/Hamming.
    pub fn from_indices(
        frame_index: usize,
        hop_index: usize,
        window_index: usize,
    ) -> Result<Self, ConfigError> {
        if frame_index > 8 {
            return Err(ConfigError::FrameSizeIndex(frame_index));
        }
        if hop_index > 2 {
            return Err(ConfigError::HopDivisorIndex(hop_index));
        }
        let window_shape =
            WindowShape::from_index(window_index).ok_or(ConfigError::WindowIndex(window_index))?;
        Ok(Self::new(1 << (frame_index + 5), 1 << (hop_index + 1), window_shape))
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }

    pub fn with_window_shape(mut self, window_shape: WindowShape) -> Self {
        self.window_shape = window_shape;
        self
    }

    pub fn with_ratio_range(mut self, min_ratio: f32, max_ratio: f32) -> Self {
        self.min_ratio = min_ratio;
        self.max_ratio = max_ratio;
        self
    }

    /// Ratio range covering `-semitones..=semitones`.
    pub fn with_semitone_range(self, semitones: f32) -> Self {
        let semitones = semitones.abs();
        self.with_ratio_range(
            crate::ratio::semitones_to_ratio(-semitones),
            crate::ratio::semitones_to_ratio(semitones),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_size.is_power_of_two()
            || !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&self.frame_size)
        {
            return Err(ConfigError::FrameSize(self.frame_size));
        }
        if !SUPPORTED_HOP_DIVISORS.contains(&self.hop_divisor) {
            return Err(ConfigError::HopDivisor(self.hop_divisor));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        if self.max_channels == 0 {
            return Err(ConfigError::MaxChannels);
        }
        let range_ok = self.min_ratio.is_finite()
            && self.max_ratio.is_finite()
            && self.min_ratio > 0.0
            && self.min_ratio <= self.max_ratio;
        let lowest = self.lowest_quantized_ratio();
        if !range_ok || lowest.is_silent() || self.out_length() > MAX_OUTPUT_LENGTH {
            return Err(ConfigError::RatioRange {
                min: self.min_ratio,
                max: self.max_ratio,
            });
        }
        Ok(())
    }

    pub fn hop_size(&self) -> usize {
        self.frame_size / self.hop_divisor
    }

    /// Bins with tracked phase: DC through Nyquist.
    pub fn bin_count(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// `min_ratio` as the hop cycle will see it after quantization.
    ///
    /// Quantization is monotonic, so every clamped ratio quantizes to at least
    /// this many steps.
    pub fn lowest_quantized_ratio(&self) -> QuantizedRatio {
        QuantizedRatio::new(self.min_ratio, self.hop_size())
    }

    /// Capacity of the overlap-add accumulator: the resampled length of one
    /// frame at the lowest quantized ratio, and never less than a frame.
    pub fn out_length(&self) -> usize {
        self.lowest_quantized_ratio()
            .resampled_length(self.frame_size)
            .max(self.frame_size)
    }

    /// Delay between an input sample and its resynthesized counterpart.
    pub fn latency_samples(&self) -> usize {
        self.frame_size
    }

    pub fn clamp_ratio(&self, ratio: f32) -> f32 {
        ratio.clamp(self.min_ratio, self.max_ratio)
    }

    pub fn buffer_sizes(&self) -> BufferSizes {
        BufferSizes {
            frame_size: self.frame_size,
            hop_size: self.hop_size(),
            input_len: self.frame_size,
            output_len: self.out_length(),
            bin_count: self.bin_count(),
        }
    }
}

/// Per-channel buffer dimensions for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    pub frame_size: usize,
    pub hop_size: usize,
    /// Input accumulator length.
    pub input_len: usize,
    /// Overlap-add accumulator length.
    pub output_len: usize,
    /// Bins with tracked phase.
    pub bin_count: usize,
}
