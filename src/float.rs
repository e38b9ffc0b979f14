use rustfft::{num_traits, FftNum};

pub trait Float: FftNum + num_traits::Float + num_traits::FloatConst {}

impl<T: FftNum + num_traits::Float + num_traits::FloatConst> Float for T {}

/// Converts a count or literal into `T`.
///
/// Every `Float` is an `FftNum`, which is `FromPrimitive`, and every `usize`
/// or `f64` this crate converts is representable, so the conversion is total.
#[inline]
pub(crate) fn cast<T: Float>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::zero)
}
