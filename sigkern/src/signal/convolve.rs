//! FFT-based 1-D convolution of every lane with one kernel vector.

use crate::kernel::{
    lane_buffer, try_filled, ConfigError, ExecInvariantViolation, KernelLifecycle, ReadBuf,
    WriteBuf,
};
use crate::layout::{for_each_lane, AxisWalk, Layout, Shape4};
use crate::signal::fft::radix2::Radix2Plan;
use crate::signal::fft::Direction;
use crate::signal::traits::Convolve1D;
use alloc::vec::Vec;
use num_complex::Complex;
use num_traits::{Float, FloatConst};

/// Constructor config for [`Conv1dFftKernel`].
///
/// Lane `x` of length `L1` is zero-padded by `padding` on both ends to
/// `N1 = L1 + 2*padding`. The kernel is dilated to `N2 = dilation*(L2-1) + 1`
/// taps. Output lanes hold the `W = 1 + (N1 - N2)/stride` fully overlapping
/// convolution points, taken every `stride` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Conv1dFftConfig<T> {
    /// Input tensor shape.
    pub shape: Shape4,
    /// Memory order of input and output.
    pub layout: Layout,
    /// Axis to convolve along, in `0..=3`.
    pub axis: usize,
    /// Kernel taps, before dilation.
    pub kernel: Vec<T>,
    /// Output decimation; at least 1.
    pub stride: usize,
    /// Kernel tap spacing; at least 1.
    pub dilation: usize,
    /// Zeros added before and after every lane.
    pub padding: usize,
}

impl<T> Conv1dFftConfig<T> {
    /// Config for a single vector of `len` samples with unit stride and
    /// dilation and no padding.
    pub fn vector(len: usize, kernel: Vec<T>) -> Self {
        Self {
            shape: Shape4::new(1, 1, 1, len),
            layout: Layout::RowMajor,
            axis: 3,
            kernel,
            stride: 1,
            dilation: 1,
            padding: 0,
        }
    }
}

/// Convolution of every lane along one axis, executed on the radix-2 engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Conv1dFftKernel<T> {
    input: AxisWalk,
    output: AxisWalk,
    in_shape: Shape4,
    out_shape: Shape4,
    kernel: Vec<T>,
    stride: usize,
    dilation: usize,
    padding: usize,
    padded_len: usize,
    dilated_len: usize,
    nfft: usize,
}

impl<T> Conv1dFftKernel<T> {
    /// Shape of the output tensor.
    pub fn output_shape(&self) -> Shape4 {
        self.out_shape
    }

    /// Transform length used for every lane.
    pub fn nfft(&self) -> usize {
        self.nfft
    }
}

impl<T> KernelLifecycle for Conv1dFftKernel<T>
where
    T: Float + FloatConst,
{
    type Config = Conv1dFftConfig<T>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let input = AxisWalk::new(config.shape, config.layout, config.axis)?;
        if config.kernel.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "kernel" });
        }
        if config.stride == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "stride",
                reason: "stride must be at least 1",
            });
        }
        if config.dilation == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "dilation",
                reason: "dilation must be at least 1",
            });
        }
        let padded_len = input.len() + 2 * config.padding;
        let dilated_len = config.dilation * (config.kernel.len() - 1) + 1;
        let out_len = if padded_len >= dilated_len {
            1 + (padded_len - dilated_len) / config.stride
        } else if config.shape.is_empty() {
            0
        } else {
            log::warn!("conv1d: padded lane of {padded_len} is shorter than kernel span {dilated_len}");
            return Err(ConfigError::InvalidArgument {
                arg: "kernel",
                reason: "dilated kernel is longer than the padded signal",
            });
        };
        Ok(Self {
            input,
            output: input.with_len(out_len),
            in_shape: config.shape,
            out_shape: config.shape.with_axis_len(config.axis, out_len),
            kernel: config.kernel,
            stride: config.stride,
            dilation: config.dilation,
            padding: config.padding,
            padded_len,
            dilated_len,
            nfft: (padded_len + dilated_len - 1).next_power_of_two(),
        })
    }
}

impl<T> Convolve1D<T> for Conv1dFftKernel<T>
where
    T: Float + FloatConst,
{
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<T> + ?Sized,
        O: WriteBuf<T> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        if x.len() != self.in_shape.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "x",
                expected: self.in_shape.len(),
                got: x.len(),
            });
        }
        if y.len() != self.out_shape.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: self.out_shape.len(),
                got: y.len(),
            });
        }
        if self.in_shape.is_empty() {
            return Ok(());
        }

        let n = self.nfft;
        let forward = Radix2Plan::<T>::try_new(n, Direction::Forward)?;
        let inverse = Radix2Plan::<T>::try_new(n, Direction::Inverse)?;
        let zero = Complex::new(T::zero(), T::zero());
        let mut spectrum = try_filled("kernel_spectrum", n, zero)?;
        let mut buf = try_filled("lane", n, zero)?;
        let mut x_lane = lane_buffer("x_lane", &self.input, T::zero())?;
        let mut y_lane = lane_buffer("y_lane", &self.output, T::zero())?;

        for (j, &tap) in self.kernel.iter().enumerate() {
            spectrum[j * self.dilation] = Complex::new(tap, T::zero());
        }
        forward.transform(&mut spectrum);
        let inv_n = T::one() / T::from(n).unwrap_or_else(T::one);
        let (pad, stride, tail) = (self.padding, self.stride, self.dilated_len - 1);
        log::debug!(
            "conv1d: N1 {}, N2 {}, nfft {n}, stride {stride}",
            self.padded_len,
            self.dilated_len
        );

        for_each_lane(
            &self.input,
            &self.output,
            x,
            y,
            &mut x_lane,
            &mut y_lane,
            |_, xi, yi| {
                buf.fill(zero);
                for (b, &v) in buf[pad..pad + xi.len()].iter_mut().zip(xi) {
                    *b = Complex::new(v, T::zero());
                }
                forward.transform(&mut buf);
                for (b, &k) in buf.iter_mut().zip(spectrum.iter()) {
                    *b = *b * k;
                }
                inverse.transform(&mut buf);
                for (w, out) in yi.iter_mut().enumerate() {
                    *out = buf[w * stride + tail].re * inv_n;
                }
            },
        );
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: ReadBuf<T> + ?Sized,
    {
        let mut out = try_filled("out", self.out_shape.len(), T::zero())?;
        self.run_into(input, &mut out)?;
        Ok(out)
    }
}

/// Convolve one vector. See [`Conv1dFftKernel`].
pub fn conv1d_fft<T>(
    x: &[T],
    kernel: &[T],
    stride: usize,
    dilation: usize,
    padding: usize,
) -> Result<Vec<T>, ExecInvariantViolation>
where
    T: Float + FloatConst,
{
    let kernel = Conv1dFftKernel::try_new(Conv1dFftConfig {
        stride,
        dilation,
        padding,
        ..Conv1dFftConfig::vector(x.len(), kernel.to_vec())
    })?;
    kernel.run_alloc(x)
}
