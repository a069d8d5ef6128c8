//! Autocovariance / autocorrelation of signal lanes.

use super::levinson::{real_from_count, LevinsonScalar};
use super::LpcGeometry;
use crate::kernel::{
    lane_buffer, try_filled, ConfigError, ExecInvariantViolation, KernelLifecycle, ReadBuf,
    WriteBuf,
};
use crate::layout::{for_each_lane, Layout, Shape4};
use crate::signal::traits::Autocov1D;
use alloc::vec::Vec;
use core::marker::PhantomData;

/// Estimator options shared by every kernel that starts from a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutocovOptions {
    /// Subtract each lane's mean first.
    pub zero_mean: bool,
    /// Divide lag `l` by `N - l` instead of `N`.
    pub unbiased: bool,
    /// Normalise every lag by lag 0.
    pub corr: bool,
}

/// Estimate lags `0..r.len()` of `x`.
///
/// `r[l] = sum_n (x[n+l] - m) * conj(x[n] - m) / D` with `m` the lane mean
/// when `zero_mean` is set (else 0) and `D` either `N` or `N - l`.
pub fn autocov_lane<S: LevinsonScalar>(x: &[S], r: &mut [S], opts: AutocovOptions) {
    let n = x.len();
    let mean = if opts.zero_mean && n > 0 {
        x.iter()
            .fold(S::zero(), |acc, &v| acc + v)
            .div_real(real_from_count(n))
    } else {
        S::zero()
    };
    for (l, slot) in r.iter_mut().enumerate() {
        let acc = x[l..]
            .iter()
            .zip(x.iter())
            .fold(S::zero(), |acc, (&lead, &lag)| {
                acc + (lead - mean) * (lag - mean).conj()
            });
        let denom = if opts.unbiased { n - l } else { n };
        *slot = acc.div_real(real_from_count(denom));
    }
    if opts.corr {
        if let Some(r0) = r.first().map(|v| v.re()) {
            for v in r.iter_mut() {
                *v = v.div_real(r0);
            }
        }
    }
}

/// Constructor config for [`AutocovKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutocovConfig {
    /// Input tensor shape.
    pub shape: Shape4,
    /// Memory order of input and output.
    pub layout: Layout,
    /// Axis holding the signal, in `0..=3`.
    pub axis: usize,
    /// Number of lags to estimate (`0..lags`); output axis length.
    pub lags: usize,
    /// Estimator options.
    pub options: AutocovOptions,
}

/// Autocovariance of every lane along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutocovKernel<S> {
    geom: LpcGeometry,
    options: AutocovOptions,
    _elem: PhantomData<S>,
}

impl<S> AutocovKernel<S> {
    /// Shape of the lag tensor this kernel writes.
    pub fn output_shape(&self) -> Shape4 {
        self.geom.out_shape
    }
}

/// Validate a signal-side lag count against the signal axis.
pub(super) fn check_lags(geom_len: usize, lags: usize, empty: bool) -> Result<(), ConfigError> {
    if lags == 0 {
        return Err(ConfigError::InvalidArgument {
            arg: "lags",
            reason: "at least one lag is required",
        });
    }
    if empty {
        return Ok(());
    }
    if geom_len < 2 {
        return Err(ConfigError::InvalidArgument {
            arg: "axis",
            reason: "cannot work along a singleton axis",
        });
    }
    if lags > geom_len {
        return Err(ConfigError::InvalidArgument {
            arg: "lags",
            reason: "more lags requested than samples per lane",
        });
    }
    Ok(())
}

impl<S: LevinsonScalar> KernelLifecycle for AutocovKernel<S> {
    type Config = AutocovConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let geom = LpcGeometry::new(config.shape, config.layout, config.axis, config.lags)?;
        check_lags(geom.input.len(), config.lags, config.shape.is_empty())?;
        Ok(Self {
            geom,
            options: config.options,
            _elem: PhantomData,
        })
    }
}

impl<S: LevinsonScalar> Autocov1D<S> for AutocovKernel<S> {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        self.geom.check_input(x.len())?;
        self.geom.check_output("out", y.len())?;

        let mut x_lane = lane_buffer("x_lane", &self.geom.input, S::zero())?;
        let mut y_lane = lane_buffer("y_lane", &self.geom.output, S::zero())?;
        let options = self.options;
        for_each_lane(
            &self.geom.input,
            &self.geom.output,
            x,
            y,
            &mut x_lane,
            &mut y_lane,
            |_, xi, yi| autocov_lane(xi, yi, options),
        );
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<S>, ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
    {
        let mut out = try_filled("out", self.geom.out_shape.len(), S::zero())?;
        self.run_into(input, &mut out)?;
        Ok(out)
    }
}

/// Autocovariance of one vector. See [`AutocovKernel`].
pub fn sig2ac<S: LevinsonScalar>(
    x: &[S],
    lags: usize,
    options: AutocovOptions,
) -> Result<Vec<S>, ExecInvariantViolation> {
    let kernel = AutocovKernel::<S>::try_new(AutocovConfig {
        shape: Shape4::new(1, 1, 1, x.len()),
        layout: Layout::RowMajor,
        axis: 3,
        lags,
        options,
    })?;
    kernel.run_alloc(x)
}
