//! Trait interfaces for signal-processing capabilities.
//!
//! Every kernel reads one flat tensor and writes one (or two) flat tensors of
//! the shapes it reports. `run_into` checks the caller's buffers against
//! those shapes; `run_alloc` allocates them.

use crate::kernel::{ExecInvariantViolation, ReadBuf, WriteBuf};
use crate::signal::fft::FftSample;
use crate::signal::lpc::LevinsonScalar;
use alloc::vec::Vec;
use num_complex::Complex;

/// Forward FFT capability.
pub trait Fft1D<X: FftSample> {
    /// Transform into a caller-provided spectrum buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<X> + ?Sized,
        O: WriteBuf<Complex<X::Real>> + ?Sized;

    /// Transform and allocate the spectrum.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<Complex<X::Real>>, ExecInvariantViolation>
    where
        I: ReadBuf<X> + ?Sized;
}

/// Inverse FFT capability.
pub trait Ifft1D<Y: FftSample> {
    /// Transform into a caller-provided signal buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<Complex<Y::Real>> + ?Sized,
        O: WriteBuf<Y> + ?Sized;

    /// Transform and allocate the signal.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<Y>, ExecInvariantViolation>
    where
        I: ReadBuf<Complex<Y::Real>> + ?Sized;
}

/// Linear prediction capability: coefficient lanes plus one prediction-error
/// variance per lane.
pub trait LinearPredict<S: LevinsonScalar> {
    /// Predict into caller-provided coefficient and variance buffers.
    fn run_into<I, O, V>(
        &self,
        input: &I,
        out: &mut O,
        var: &mut V,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
        V: WriteBuf<S::Real> + ?Sized;

    /// Predict and allocate `(coefficients, variances)`.
    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<S>, Vec<S::Real>), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized;
}

/// Autocovariance capability.
pub trait Autocov1D<S: LevinsonScalar> {
    /// Estimate lags into a caller-provided buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized;

    /// Estimate lags and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<S>, ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized;
}

/// Conversion between reflection and AR coefficient sets of the same order.
pub trait Reflection1D<S: LevinsonScalar> {
    /// Convert into a caller-provided buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized;

    /// Convert and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<S>, ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized;
}

/// 1D convolution capability.
pub trait Convolve1D<T> {
    /// Convolve into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<T> + ?Sized,
        O: WriteBuf<T> + ?Sized;

    /// Convolve and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: ReadBuf<T> + ?Sized;
}
