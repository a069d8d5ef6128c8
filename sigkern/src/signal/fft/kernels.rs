//! Batched FFT/IFFT kernels over 4-D tensors.

use super::radix2::Radix2Plan;
use super::{Direction, FftSample, LaneTransform};
use crate::kernel::{
    lane_buffer, try_filled, ConfigError, ExecInvariantViolation, KernelLifecycle, ReadBuf,
    WriteBuf,
};
use crate::layout::{for_each_lane, AxisWalk, Layout, Shape4};
use crate::signal::traits::{Fft1D, Ifft1D};
use alloc::vec::Vec;
use core::marker::PhantomData;
use num_complex::Complex;
use num_traits::{Float, Zero};

/// Transforms at or above this length go to the general-length backend.
pub const RADIX2_MAX_LEN: usize = 1 << 16;

/// Constructor config shared by every FFT/IFFT kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FftConfig {
    /// Input tensor shape.
    pub shape: Shape4,
    /// Memory order of input and output.
    pub layout: Layout,
    /// Axis to transform, in `0..=3`.
    pub axis: usize,
    /// Transform length. `None` picks the input axis length for forward and
    /// complex inverse transforms, `2*(L-1)` for real-output inverses.
    pub nfft: Option<usize>,
    /// Use the symmetric `sqrt` scaling instead of `1` / `1/nfft`.
    pub scale: bool,
}

impl FftConfig {
    /// Config for a single vector of `len` samples.
    pub fn vector(len: usize) -> Self {
        Self {
            shape: Shape4::new(1, 1, 1, len),
            layout: Layout::RowMajor,
            axis: 3,
            nfft: None,
            scale: false,
        }
    }
}

/// Resolved lane geometry of one configured transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    input: AxisWalk,
    output: AxisWalk,
    in_shape: Shape4,
    out_shape: Shape4,
    nfft: usize,
    direction: Direction,
    real: bool,
    scale: bool,
}

impl Geometry {
    fn resolve(
        config: FftConfig,
        direction: Direction,
        real: bool,
        radix2: bool,
    ) -> Result<Self, ConfigError> {
        let input = AxisWalk::new(config.shape, config.layout, config.axis)?;
        let lx = input.len();
        let empty = config.shape.is_empty();
        let nfft = match (config.nfft, direction, real) {
            (Some(n), _, _) => n,
            (None, Direction::Inverse, true) => (2 * lx.saturating_sub(1)).max(1),
            (None, _, _) => lx.max(1),
        };
        if nfft == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "nfft",
                reason: "transform length must be positive",
            });
        }
        if radix2 && !nfft.is_power_of_two() {
            log::warn!("rejecting radix-2 nfft {nfft}");
            return Err(ConfigError::InvalidArgument {
                arg: "nfft",
                reason: "radix-2 transform length must be a power of two",
            });
        }
        let half = nfft / 2 + 1;
        let ly = match direction {
            Direction::Forward => {
                if !empty && lx > nfft {
                    return Err(ConfigError::InvalidArgument {
                        arg: "nfft",
                        reason: "nfft must not be shorter than the input axis",
                    });
                }
                if real {
                    half
                } else {
                    nfft
                }
            }
            Direction::Inverse => {
                let expected = if real { half } else { nfft };
                if !empty && lx != expected {
                    return Err(ConfigError::LengthMismatch {
                        arg: "x",
                        expected,
                        got: lx,
                    });
                }
                nfft
            }
        };
        Ok(Self {
            input,
            output: input.with_len(ly),
            in_shape: config.shape,
            out_shape: config.shape.with_axis_len(config.axis, ly),
            nfft,
            direction,
            real,
            scale: config.scale,
        })
    }

    fn factor<T: Float>(&self) -> T {
        let one = T::one();
        let two = one + one;
        let n = T::from(self.nfft).unwrap_or_else(T::one);
        match (self.direction, self.scale) {
            (Direction::Forward, false) => one,
            (Direction::Forward, true) => (one / (two * n)).sqrt(),
            (Direction::Inverse, false) => one / n,
            (Direction::Inverse, true) => (two / n).sqrt(),
        }
    }

    fn check_lengths(&self, x: usize, y: usize) -> Result<(), ExecInvariantViolation> {
        if x != self.in_shape.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "x",
                expected: self.in_shape.len(),
                got: x,
            });
        }
        if y != self.out_shape.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: self.out_shape.len(),
                got: y,
            });
        }
        Ok(())
    }

    /// Run `plan` over every lane, widening input samples with `load` and
    /// narrowing results with `store`. All scratch is reserved before `y` is
    /// touched.
    fn execute<R, X, Y, P>(
        &self,
        plan: &P,
        x: &[X],
        y: &mut [Y],
        load: impl Fn(X) -> Complex<R>,
        store: impl Fn(Complex<R>) -> Y,
    ) -> Result<(), ExecInvariantViolation>
    where
        R: Float,
        X: Copy,
        Y: Copy,
        P: LaneTransform<R>,
    {
        self.check_lengths(x.len(), y.len())?;
        let zero = Complex::<R>::zero();
        if self.input.is_empty() || x.is_empty() {
            y.fill(store(zero));
            return Ok(());
        }

        let n = self.nfft;
        let mut buf = try_filled("buf", n, zero)?;
        let mut scratch = try_filled("fft_scratch", plan.scratch_len(), zero)?;
        let mut x_lane = lane_buffer("x_lane", &self.input, x[0])?;
        let mut y_lane = lane_buffer("y_lane", &self.output, store(zero))?;

        let factor: R = self.factor();
        let mirror = self.direction == Direction::Inverse && self.real;
        for_each_lane(
            &self.input,
            &self.output,
            x,
            y,
            &mut x_lane,
            &mut y_lane,
            |_, xi, yi| {
                for (b, &s) in buf.iter_mut().zip(xi.iter()) {
                    *b = load(s);
                }
                if mirror {
                    // Hermitian completion of a half spectrum.
                    for l in xi.len()..n {
                        buf[l] = buf[n - l].conj();
                    }
                } else {
                    buf[xi.len()..].fill(zero);
                }
                plan.process(&mut buf, &mut scratch);
                for (o, b) in yi.iter_mut().zip(buf.iter()) {
                    *o = store(*b * factor);
                }
            },
        );
        Ok(())
    }
}

/// Radix-2 forward FFT along one axis.
///
/// `X = f32 | f64` gives the real-input transform with `nfft/2 + 1` output
/// bins; `X = Complex<f32> | Complex<f64>` gives all `nfft` bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rad2FftKernel<X> {
    geom: Geometry,
    _elem: PhantomData<X>,
}

/// Radix-2 inverse FFT along one axis.
///
/// `Y = f32 | f64` reads `nfft/2 + 1` bins of a Hermitian spectrum and writes
/// the real signal; `Y = Complex<f32> | Complex<f64>` is the full inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rad2IfftKernel<Y> {
    geom: Geometry,
    _elem: PhantomData<Y>,
}

macro_rules! shape_accessors {
    ($kernel:ident) => {
        impl<E> $kernel<E> {
            /// Shape of the tensor this kernel writes.
            pub fn output_shape(&self) -> Shape4 {
                self.geom.out_shape
            }

            /// Shape of the tensor this kernel reads.
            pub fn input_shape(&self) -> Shape4 {
                self.geom.in_shape
            }

            /// Resolved transform length.
            pub fn nfft(&self) -> usize {
                self.geom.nfft
            }
        }
    };
}

shape_accessors!(Rad2FftKernel);
shape_accessors!(Rad2IfftKernel);

impl<X: FftSample> KernelLifecycle for Rad2FftKernel<X> {
    type Config = FftConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let geom = Geometry::resolve(config, Direction::Forward, X::IS_REAL, true)?;
        Ok(Self {
            geom,
            _elem: PhantomData,
        })
    }
}

impl<Y: FftSample> KernelLifecycle for Rad2IfftKernel<Y> {
    type Config = FftConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let geom = Geometry::resolve(config, Direction::Inverse, Y::IS_REAL, true)?;
        Ok(Self {
            geom,
            _elem: PhantomData,
        })
    }
}

impl<X: FftSample> Fft1D<X> for Rad2FftKernel<X> {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<X> + ?Sized,
        O: WriteBuf<Complex<X::Real>> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        let plan = Radix2Plan::try_new(self.geom.nfft, Direction::Forward)?;
        self.geom.execute(&plan, x, y, X::to_complex, |c| c)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<Complex<X::Real>>, ExecInvariantViolation>
    where
        I: ReadBuf<X> + ?Sized,
    {
        let mut out = try_filled("out", self.geom.out_shape.len(), Complex::zero())?;
        self.run_into(input, &mut out)?;
        Ok(out)
    }
}

impl<Y: FftSample> Ifft1D<Y> for Rad2IfftKernel<Y> {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<Complex<Y::Real>> + ?Sized,
        O: WriteBuf<Y> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        let plan = Radix2Plan::try_new(self.geom.nfft, Direction::Inverse)?;
        self.geom.execute(&plan, x, y, |c| c, Y::from_complex)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<Y>, ExecInvariantViolation>
    where
        I: ReadBuf<Complex<Y::Real>> + ?Sized,
    {
        let zero = Y::from_complex(Complex::zero());
        let mut out = try_filled("out", self.geom.out_shape.len(), zero)?;
        self.run_into(input, &mut out)?;
        Ok(out)
    }
}

/// Radix-2 FFT of one vector. See [`Rad2FftKernel`].
pub fn fft_rad2<X: FftSample>(
    x: &[X],
    nfft: Option<usize>,
    scale: bool,
) -> Result<Vec<Complex<X::Real>>, ExecInvariantViolation> {
    let kernel = Rad2FftKernel::<X>::try_new(FftConfig {
        nfft,
        scale,
        ..FftConfig::vector(x.len())
    })?;
    kernel.run_alloc(x)
}

/// Radix-2 inverse FFT of one vector. See [`Rad2IfftKernel`].
pub fn ifft_rad2<Y: FftSample>(
    x: &[Complex<Y::Real>],
    nfft: Option<usize>,
    scale: bool,
) -> Result<Vec<Y>, ExecInvariantViolation> {
    let kernel = Rad2IfftKernel::<Y>::try_new(FftConfig {
        nfft,
        scale,
        ..FftConfig::vector(x.len())
    })?;
    kernel.run_alloc(x)
}

#[cfg(feature = "std")]
pub use dispatch::*;

#[cfg(feature = "std")]
mod dispatch {
    use super::*;
    use crate::signal::fft::planner::PlannedLane;
    use num_traits::FloatConst;
    use rustfft::FftNum;

    /// Engine chosen for a configured transform length.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Backend {
        /// Power of two below [`RADIX2_MAX_LEN`].
        Radix2,
        /// Everything else, through the `rustfft` planner.
        Planner,
    }

    impl Backend {
        fn for_len(nfft: usize) -> Self {
            if nfft.is_power_of_two() && nfft < RADIX2_MAX_LEN {
                Backend::Radix2
            } else {
                Backend::Planner
            }
        }
    }

    fn run_backend<R, X, Y>(
        geom: &Geometry,
        backend: Backend,
        x: &[X],
        y: &mut [Y],
        load: impl Fn(X) -> Complex<R>,
        store: impl Fn(Complex<R>) -> Y,
    ) -> Result<(), ExecInvariantViolation>
    where
        R: Float + FloatConst + FftNum,
        X: Copy,
        Y: Copy,
    {
        log::debug!("{:?} nfft {} on {backend:?}", geom.direction, geom.nfft);
        match backend {
            Backend::Radix2 => {
                let plan = Radix2Plan::<R>::try_new(geom.nfft, geom.direction)?;
                geom.execute(&plan, x, y, load, store)
            }
            Backend::Planner => {
                let plan = PlannedLane::<R>::new(geom.nfft, geom.direction);
                geom.execute(&plan, x, y, load, store)
            }
        }
    }

    /// Forward FFT of any length along one axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FftKernel<X> {
        geom: Geometry,
        pub(super) backend: Backend,
        _elem: PhantomData<X>,
    }

    /// Inverse FFT of any length along one axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IfftKernel<Y> {
        geom: Geometry,
        backend: Backend,
        _elem: PhantomData<Y>,
    }

    shape_accessors!(FftKernel);
    shape_accessors!(IfftKernel);

    impl<X> FftKernel<X> {
        /// Engine selected for this length.
        pub fn backend(&self) -> Backend {
            self.backend
        }
    }

    impl<Y> IfftKernel<Y> {
        /// Engine selected for this length.
        pub fn backend(&self) -> Backend {
            self.backend
        }
    }

    impl<X: FftSample> KernelLifecycle for FftKernel<X> {
        type Config = FftConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            let geom = Geometry::resolve(config, Direction::Forward, X::IS_REAL, false)?;
            Ok(Self {
                backend: Backend::for_len(geom.nfft),
                geom,
                _elem: PhantomData,
            })
        }
    }

    impl<Y: FftSample> KernelLifecycle for IfftKernel<Y> {
        type Config = FftConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            let geom = Geometry::resolve(config, Direction::Inverse, Y::IS_REAL, false)?;
            Ok(Self {
                backend: Backend::for_len(geom.nfft),
                geom,
                _elem: PhantomData,
            })
        }
    }

    impl<X> Fft1D<X> for FftKernel<X>
    where
        X: FftSample,
        X::Real: FftNum,
    {
        fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
        where
            I: ReadBuf<X> + ?Sized,
            O: WriteBuf<Complex<X::Real>> + ?Sized,
        {
            let x = input.read_slice()?;
            let y = out.write_slice_mut()?;
            run_backend(&self.geom, self.backend, x, y, X::to_complex, |c| c)
        }

        fn run_alloc<I>(&self, input: &I) -> Result<Vec<Complex<X::Real>>, ExecInvariantViolation>
        where
            I: ReadBuf<X> + ?Sized,
        {
            let mut out = try_filled("out", self.geom.out_shape.len(), Complex::zero())?;
            self.run_into(input, &mut out)?;
            Ok(out)
        }
    }

    impl<Y> Ifft1D<Y> for IfftKernel<Y>
    where
        Y: FftSample,
        Y::Real: FftNum,
    {
        fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
        where
            I: ReadBuf<Complex<Y::Real>> + ?Sized,
            O: WriteBuf<Y> + ?Sized,
        {
            let x = input.read_slice()?;
            let y = out.write_slice_mut()?;
            run_backend(&self.geom, self.backend, x, y, |c| c, Y::from_complex)
        }

        fn run_alloc<I>(&self, input: &I) -> Result<Vec<Y>, ExecInvariantViolation>
        where
            I: ReadBuf<Complex<Y::Real>> + ?Sized,
        {
            let zero = Y::from_complex(Complex::zero());
            let mut out = try_filled("out", self.geom.out_shape.len(), zero)?;
            self.run_into(input, &mut out)?;
            Ok(out)
        }
    }
}
