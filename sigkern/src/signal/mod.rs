//! Signal kernels over strided 4-D tensors.

pub mod convolve;
pub mod fft;
pub mod lpc;
pub mod traits;
