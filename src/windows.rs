//! Analysis/synthesis windows and the overlap-add normalization factor.

use rustfft::num_traits;

use crate::float::{cast, Float};

/// Window function applied before analysis and after resynthesis.
///
/// All shapes are generated in their periodic form (denominator `len`), which
/// sums to a constant under overlap-add for every supported hop divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowShape {
    Bartlett,
    #[default]
    Hann,
    Hamming,
}

impl WindowShape {
    pub const ALL: [WindowShape; 3] = [
        WindowShape::Bartlett,
        WindowShape::Hann,
        WindowShape::Hamming,
    ];

    /// Maps a selection index (0 = Bartlett, 1 = Hann, 2 = Hamming).
    pub fn from_index(index: usize) -> Option<WindowShape> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            WindowShape::Bartlett => 0,
            WindowShape::Hann => 1,
            WindowShape::Hamming => 2,
        }
    }

    /// Sample `i` of a window of length `len`.
    #[inline]
    pub fn value<T: Float>(self, i: usize, len: usize) -> T {
        let x = cast::<T>(i as f64) / cast::<T>(len.max(1) as f64);
        match self {
            WindowShape::Bartlett => {
                T::one() - num_traits::Float::abs(cast::<T>(2.0) * x - T::one())
            }
            WindowShape::Hann => cast::<T>(0.5) * (T::one() - (x * T::TAU()).cos()),
            WindowShape::Hamming => cast::<T>(0.54) - cast::<T>(0.46) * (x * T::TAU()).cos(),
        }
    }

    pub fn generate<T: Float>(self, size: usize) -> Vec<T> {
        (0..size).map(|i| self.value(i, size)).collect()
    }
}

pub fn bartlett_window<T: Float>(size: usize) -> Vec<T> {
    WindowShape::Bartlett.generate(size)
}

pub fn hann_window<T: Float>(size: usize) -> Vec<T> {
    WindowShape::Hann.generate(size)
}

pub fn hamming_window<T: Float>(size: usize) -> Vec<T> {
    WindowShape::Hamming.generate(size)
}

/// `frame_size / (overlap * sum(window))`, or zero when either term vanishes.
pub fn scale_factor<T: Float>(window: &[T], overlap: usize) -> T {
    let window_sum = window.iter().fold(T::zero(), |acc, &w| acc + w);
    if overlap == 0 || window_sum == T::zero() {
        return T::zero();
    }
    cast::<T>(window.len() as f64) / (cast::<T>(overlap as f64) * window_sum)
}

/// Precomputed window for one frame configuration.
#[derive(Debug, Clone)]
pub struct WindowTable<T> {
    shape: WindowShape,
    window: Vec<T>,
    analysis: Vec<T>,
    scale_factor: T,
}

impl<T: Float> WindowTable<T> {
    pub fn new(shape: WindowShape, frame_size: usize, overlap: usize) -> Self {
        let window = shape.generate::<T>(frame_size);
        let analysis = window.iter().map(|w| w.sqrt()).collect();
        let scale_factor = scale_factor(&window, overlap);
        Self {
            shape,
            window,
            analysis,
            scale_factor,
        }
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn window(&self) -> &[T] {
        &self.window
    }

    /// Square root of the window, applied to each analysis frame.
    pub fn analysis(&self) -> &[T] {
        &self.analysis
    }

    pub fn scale_factor(&self) -> T {
        self.scale_factor
    }

    /// Square-root synthesis gain for sample `i` of a `len`-sample output frame.
    #[inline]
    pub fn synthesis(&self, i: usize, len: usize) -> T {
        self.shape.value::<T>(i, len).sqrt()
    }
}
