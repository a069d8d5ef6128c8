//! Signal kernels over strided 4-D tensors.
//!
//! Every kernel works on one axis of an `(R, C, S, H)` tensor stored flat in
//! row-major or column-major order, treating each 1-D slice along that axis
//! as an independent lane. [`layout::AxisWalk`] resolves the lane addressing
//! once per kernel; the kernels then read each lane in place when lanes are
//! contiguous, or gather it into scratch when they are not.
//!
//! Kernels are built from a plain config through
//! [`kernel::KernelLifecycle::try_new`] and run through a capability trait in
//! [`signal::traits`]:
//!
//! ```
//! use sigkern::kernel::KernelLifecycle;
//! use sigkern::layout::{Layout, Shape4};
//! use sigkern::signal::fft::{FftConfig, Rad2FftKernel};
//! use sigkern::signal::traits::Fft1D;
//!
//! // Two channels of eight samples, transformed along the last axis.
//! let x: Vec<f64> = (0..16).map(|i| (i % 8) as f64).collect();
//! let kernel = Rad2FftKernel::<f64>::try_new(FftConfig {
//!     shape: Shape4::new(1, 2, 1, 8),
//!     layout: Layout::RowMajor,
//!     axis: 3,
//!     nfft: None,
//!     scale: false,
//! })
//! .unwrap();
//! let spectrum = kernel.run_alloc(&x).unwrap();
//! assert_eq!(spectrum.len(), 2 * 5);
//! assert_eq!(spectrum[0].re, 28.0);
//! ```
//!
//! # Features
//!
//! * `alloc`: every kernel in [`signal`].
//! * `std` (default): `std::error::Error` impls and the `rustfft`-backed
//!   general-length [`signal::fft::FftKernel`] / [`signal::fft::IfftKernel`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub mod kernel;
pub mod layout;
#[cfg(feature = "alloc")]
pub mod signal;

pub use error::{Error, ErrorKind, Result};
