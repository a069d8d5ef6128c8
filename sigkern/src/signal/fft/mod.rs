//! Strided FFT/IFFT kernels.
//!
//! [`radix2`] is the in-place power-of-two engine built on the tables in
//! [`twiddle`]. With the `std` feature, [`planner`] wraps the `rustfft`
//! planner behind the same [`LaneTransform`] seam so [`FftKernel`] and
//! [`IfftKernel`] can take any length.

mod kernels;
#[cfg(feature = "std")]
pub mod planner;
pub mod radix2;
pub mod twiddle;

pub use kernels::*;

use num_complex::Complex;
use num_traits::{Float, FloatConst};

/// Sign of the transform exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `exp(-i*theta)`.
    Forward,
    /// `exp(+i*theta)`.
    Inverse,
}

/// One unscaled complex transform applied lane by lane.
pub trait LaneTransform<T> {
    /// Transform length.
    fn len(&self) -> usize;

    /// True if the transform is zero-length.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scratch elements [`LaneTransform::process`] needs.
    fn scratch_len(&self) -> usize;

    /// Transform `buf` in place using `scratch`.
    fn process(&self, buf: &mut [Complex<T>], scratch: &mut [Complex<T>]);
}

/// Element types a transform can read or produce.
///
/// Real elements select the half-spectrum variants: a real forward transform
/// writes `nfft/2 + 1` bins, a real-output inverse reads them.
pub trait FftSample: Copy + Send + Sync + 'static {
    /// Underlying float.
    type Real: Float + FloatConst + Send + Sync + 'static;

    /// True for `f32`/`f64`.
    const IS_REAL: bool;

    /// Widen to a complex value.
    fn to_complex(self) -> Complex<Self::Real>;

    /// Narrow from a complex value, dropping the imaginary part if real.
    fn from_complex(value: Complex<Self::Real>) -> Self;
}

macro_rules! impl_fft_sample {
    ($($t:ty),*) => {$(
        impl FftSample for $t {
            type Real = $t;
            const IS_REAL: bool = true;

            fn to_complex(self) -> Complex<$t> {
                Complex::new(self, 0.0)
            }

            fn from_complex(value: Complex<$t>) -> Self {
                value.re
            }
        }

        impl FftSample for Complex<$t> {
            type Real = $t;
            const IS_REAL: bool = false;

            fn to_complex(self) -> Complex<$t> {
                self
            }

            fn from_complex(value: Complex<$t>) -> Self {
                value
            }
        }
    )*};
}

impl_fft_sample!(f32, f64);
