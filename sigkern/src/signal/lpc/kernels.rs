//! Batched linear-prediction kernels.

use super::autocov::{autocov_lane, check_lags, AutocovOptions};
use super::levinson::{levinson_durbin, LevinsonScalar};
use super::{LpcConfig, LpcGeometry};
use crate::kernel::{
    lane_buffer, try_filled, ConfigError, ExecInvariantViolation, KernelLifecycle, ReadBuf,
    WriteBuf,
};
use crate::layout::{for_each_lane, Layout, Shape4};
use crate::signal::traits::LinearPredict;
use alloc::vec::Vec;
use core::marker::PhantomData;
use num_traits::Zero;

/// Walk every lane, storing each lane's returned error power in `var[v]`.
fn predict_lanes<S, F>(
    geom: &LpcGeometry,
    x: &[S],
    y: &mut [S],
    var: &mut [S::Real],
    mut lane: F,
) -> Result<(), ExecInvariantViolation>
where
    S: LevinsonScalar,
    F: FnMut(&[S], &mut [S]) -> S::Real,
{
    geom.check_input(x.len())?;
    geom.check_output("out", y.len())?;
    geom.check_var(var.len())?;
    if geom.input.is_empty() {
        y.fill(S::zero());
        var.fill(S::Real::zero());
        return Ok(());
    }
    let mut x_lane = lane_buffer("x_lane", &geom.input, S::zero())?;
    let mut y_lane = lane_buffer("y_lane", &geom.output, S::zero())?;
    for_each_lane(
        &geom.input,
        &geom.output,
        x,
        y,
        &mut x_lane,
        &mut y_lane,
        |v, xi, yi| var[v] = lane(xi, yi),
    );
    Ok(())
}

/// `[1, -a1, ..., -aP]` in `poly` from an AC lane, returning the error power.
fn poly_lane<S: LevinsonScalar>(ac: &[S], poly: &mut [S], snapshot: &mut [S]) -> S::Real {
    poly[0] = S::one();
    let e = levinson_durbin(ac, &mut poly[1..], None, snapshot);
    for c in poly[1..].iter_mut() {
        *c = -*c;
    }
    e
}

fn alloc_outputs<S: LevinsonScalar>(
    geom: &LpcGeometry,
) -> Result<(Vec<S>, Vec<S::Real>), ExecInvariantViolation> {
    let out = try_filled("out", geom.out_shape.len(), S::zero())?;
    let var = try_filled("var", geom.var_shape.len(), S::Real::zero())?;
    Ok((out, var))
}

macro_rules! lpc_accessors {
    ($kernel:ident) => {
        impl<S> $kernel<S> {
            /// Shape of the coefficient tensor this kernel writes.
            pub fn output_shape(&self) -> Shape4 {
                self.geom.out_shape
            }

            /// Shape of the variance tensor: the vector axis collapsed to 1.
            pub fn variance_shape(&self) -> Shape4 {
                self.geom.var_shape
            }
        }
    };
}

macro_rules! impl_run_alloc {
    () => {
        fn run_alloc<I>(&self, input: &I) -> Result<(Vec<S>, Vec<S::Real>), ExecInvariantViolation>
        where
            I: ReadBuf<S> + ?Sized,
        {
            let (mut out, mut var) = alloc_outputs::<S>(&self.geom)?;
            self.run_into(input, &mut out, &mut var)?;
            Ok((out, var))
        }
    };
}

/// Autocovariance lanes (length `P + 1`) to `P` AR coefficients each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcToArKernel<S> {
    geom: LpcGeometry,
    _elem: PhantomData<S>,
}

lpc_accessors!(AcToArKernel);

impl<S: LevinsonScalar> KernelLifecycle for AcToArKernel<S> {
    type Config = LpcConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let lx = config
            .shape
            .axis_len(config.axis)
            .ok_or(ConfigError::InvalidAxis { axis: config.axis })?;
        let geom = LpcGeometry::new(
            config.shape,
            config.layout,
            config.axis,
            lx.saturating_sub(1),
        )?;
        Ok(Self {
            geom,
            _elem: PhantomData,
        })
    }
}

impl<S: LevinsonScalar> LinearPredict<S> for AcToArKernel<S> {
    fn run_into<I, O, V>(
        &self,
        input: &I,
        out: &mut O,
        var: &mut V,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
        V: WriteBuf<S::Real> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        let var = var.write_slice_mut()?;
        let order = self.geom.output.len();
        let mut snapshot = try_filled("snapshot", order.saturating_sub(1), S::zero())?;
        predict_lanes(&self.geom, x, y, var, |xi, yi| {
            levinson_durbin(xi, yi, None, &mut snapshot)
        })
    }

    impl_run_alloc!();
}

/// Autocovariance lanes to prediction polynomials of the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcToPolyKernel<S> {
    geom: LpcGeometry,
    _elem: PhantomData<S>,
}

lpc_accessors!(AcToPolyKernel);

impl<S: LevinsonScalar> KernelLifecycle for AcToPolyKernel<S> {
    type Config = LpcConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let lx = config
            .shape
            .axis_len(config.axis)
            .ok_or(ConfigError::InvalidAxis { axis: config.axis })?;
        let geom = LpcGeometry::new(config.shape, config.layout, config.axis, lx)?;
        Ok(Self {
            geom,
            _elem: PhantomData,
        })
    }
}

impl<S: LevinsonScalar> LinearPredict<S> for AcToPolyKernel<S> {
    fn run_into<I, O, V>(
        &self,
        input: &I,
        out: &mut O,
        var: &mut V,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
        V: WriteBuf<S::Real> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        let var = var.write_slice_mut()?;
        let mut snapshot = try_filled(
            "snapshot",
            self.geom.output.len().saturating_sub(2),
            S::zero(),
        )?;
        predict_lanes(&self.geom, x, y, var, |xi, yi| {
            poly_lane(xi, yi, &mut snapshot)
        })
    }

    impl_run_alloc!();
}

/// Constructor config for [`SigToArKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigToArConfig {
    /// Signal tensor shape.
    pub shape: Shape4,
    /// Memory order of every tensor involved.
    pub layout: Layout,
    /// Axis holding each signal, in `0..=3`.
    pub axis: usize,
    /// Prediction order `P`, in `1..L`.
    pub order: usize,
    /// Autocovariance estimator options.
    pub options: AutocovOptions,
}

/// Signal lanes to `P` AR coefficients each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigToArKernel<S> {
    geom: LpcGeometry,
    options: AutocovOptions,
    _elem: PhantomData<S>,
}

lpc_accessors!(SigToArKernel);

impl<S: LevinsonScalar> KernelLifecycle for SigToArKernel<S> {
    type Config = SigToArConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let geom = LpcGeometry::new(config.shape, config.layout, config.axis, config.order)?;
        if config.order == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "prediction order must be positive",
            });
        }
        if !config.shape.is_empty() && config.order >= geom.input.len() {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "prediction order must be less than the signal length",
            });
        }
        Ok(Self {
            geom,
            options: config.options,
            _elem: PhantomData,
        })
    }
}

impl<S: LevinsonScalar> LinearPredict<S> for SigToArKernel<S> {
    fn run_into<I, O, V>(
        &self,
        input: &I,
        out: &mut O,
        var: &mut V,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
        V: WriteBuf<S::Real> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        let var = var.write_slice_mut()?;
        let order = self.geom.output.len();
        let mut ac = try_filled("ac", order + 1, S::zero())?;
        let mut snapshot = try_filled("snapshot", order - 1, S::zero())?;
        let options = self.options;
        predict_lanes(&self.geom, x, y, var, |xi, yi| {
            autocov_lane(xi, &mut ac, options);
            levinson_durbin(&ac, yi, None, &mut snapshot)
        })
    }

    impl_run_alloc!();
}

/// Constructor config for [`SigToPolyKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigToPolyConfig {
    /// Signal tensor shape.
    pub shape: Shape4,
    /// Memory order of every tensor involved.
    pub layout: Layout,
    /// Axis holding each signal, in `0..=3`.
    pub axis: usize,
    /// Autocovariance lags `L`; the polynomial has `L` terms (order `L - 1`).
    pub lags: usize,
    /// Autocovariance estimator options.
    pub options: AutocovOptions,
}

/// Signal lanes to length-`L` prediction polynomials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigToPolyKernel<S> {
    geom: LpcGeometry,
    options: AutocovOptions,
    _elem: PhantomData<S>,
}

lpc_accessors!(SigToPolyKernel);

impl<S: LevinsonScalar> KernelLifecycle for SigToPolyKernel<S> {
    type Config = SigToPolyConfig;

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

impl<S: LevinsonScalar> LinearPredict<S> for SigToPolyKernel<S> {
    fn run_into<I, O, V>(
        &self,
        input: &I,
        out: &mut O,
        var: &mut V,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
        V: WriteBuf<S::Real> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        let var = var.write_slice_mut()?;
        let lags = self.geom.output.len();
        let mut ac = try_filled("ac", lags, S::zero())?;
        let mut snapshot = try_filled("snapshot", lags.saturating_sub(2), S::zero())?;
        let options = self.options;
        predict_lanes(&self.geom, x, y, var, |xi, yi| {
            autocov_lane(xi, &mut ac, options);
            poly_lane(&ac, yi, &mut snapshot)
        })
    }

    impl_run_alloc!();
}

/// AR coefficients and error power of one autocovariance vector.
pub fn ac2ar<S: LevinsonScalar>(x: &[S]) -> Result<(Vec<S>, S::Real), ExecInvariantViolation> {
    let kernel = AcToArKernel::<S>::try_new(LpcConfig::vector(x.len()))?;
    let (ar, var) = kernel.run_alloc(x)?;
    Ok((ar, var.first().copied().unwrap_or_else(S::Real::zero)))
}

/// Prediction polynomial and error power of one autocovariance vector.
pub fn ac2poly<S: LevinsonScalar>(x: &[S]) -> Result<(Vec<S>, S::Real), ExecInvariantViolation> {
    let kernel = AcToPolyKernel::<S>::try_new(LpcConfig::vector(x.len()))?;
    let (poly, var) = kernel.run_alloc(x)?;
    Ok((poly, var.first().copied().unwrap_or_else(S::Real::zero)))
}

/// Order-`order` AR coefficients and error power of one signal vector.
pub fn sig2ar<S: LevinsonScalar>(
    x: &[S],
    order: usize,
    options: AutocovOptions,
) -> Result<(Vec<S>, S::Real), ExecInvariantViolation> {
    let kernel = SigToArKernel::<S>::try_new(SigToArConfig {
        shape: Shape4::new(1, 1, 1, x.len()),
        layout: Layout::RowMajor,
        axis: 3,
        order,
        options,
    })?;
    let (ar, var) = kernel.run_alloc(x)?;
    Ok((ar, var.first().copied().unwrap_or_else(S::Real::zero)))
}

/// Length-`lags` prediction polynomial and error power of one signal vector.
pub fn sig2poly<S: LevinsonScalar>(
    x: &[S],
    lags: usize,
    options: AutocovOptions,
) -> Result<(Vec<S>, S::Real), ExecInvariantViolation> {
    let kernel = SigToPolyKernel::<S>::try_new(SigToPolyConfig {
        shape: Shape4::new(1, 1, 1, x.len()),
        layout: Layout::RowMajor,
        axis: 3,
        lags,
        options,
    })?;
    let (poly, var) = kernel.run_alloc(x)?;
    Ok((poly, var.first().copied().unwrap_or_else(S::Real::zero)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::AxisWalk;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex;

    fn ac_tensor(shape: Shape4, layout: Layout, axis: usize) -> Vec<f64> {
        // Every lane is a valid autocovariance: r[l] = rho^l with a
        // lane-dependent rho in (-0.8, 0.8).
        let walk = AxisWalk::new(shape, layout, axis).expect("walk");
        let mut x = vec![0.0; shape.len()];
        for v in 0..walk.lanes() {
            let rho = 0.8 * ((v as f64 * 0.37).sin());
            for (l, o) in walk.lane_offsets(v).enumerate() {
                x[o] = rho.powi(l as i32) * (1.0 + 0.05 * l as f64).recip();
            }
        }
        x
    }

    #[test]
    fn order_one_vector() {
        let (ar, e) = ac2ar(&[1.0f64, 0.5]).expect("ac2ar");
        assert_eq!(ar, vec![0.5]);
        assert_abs_diff_eq!(e, 0.75);
    }

    #[test]
    fn lanes_match_single_vector_runs() {
        let shape = Shape4::new(5, 3, 4, 2);
        for layout in [Layout::RowMajor, Layout::ColMajor] {
            for axis in [0usize, 2] {
                let x = ac_tensor(shape, layout, axis);
                let kernel = AcToArKernel::<f64>::try_new(LpcConfig {
                    shape,
                    layout,
                    axis,
                })
                .expect("kernel");
                let (ar, var) = kernel.run_alloc(&x).expect("run");
                assert_eq!(kernel.variance_shape().len(), var.len());

                let walk = AxisWalk::new(shape, layout, axis).expect("walk");
                let out_walk = walk.with_len(walk.len() - 1);
                for v in 0..walk.lanes() {
                    let lane: Vec<f64> = walk.lane_offsets(v).map(|o| x[o]).collect();
                    let (single, e) = ac2ar(&lane).expect("single");
                    let got: Vec<f64> = out_walk.lane_offsets(v).map(|o| ar[o]).collect();
                    assert_eq!(got, single, "{layout:?} axis {axis} lane {v}");
                    assert_eq!(var[v], e);
                }
            }
        }
    }

    #[test]
    fn strided_path_matches_contiguous_path() {
        let shape = Shape4::new(2, 2, 3, 6);
        let x = ac_tensor(shape, Layout::RowMajor, 3);
        let fast = AcToArKernel::<f64>::try_new(LpcConfig {
            shape,
            layout: Layout::RowMajor,
            axis: 3,
        })
        .expect("kernel");
        let mut slow = fast;
        slow.geom.input = slow.geom.input.force_strided();
        slow.geom.output = slow.geom.output.force_strided();
        assert_eq!(
            fast.run_alloc(&x).expect("fast"),
            slow.run_alloc(&x).expect("slow")
        );
    }

    #[test]
    fn output_shape_contract_on_every_axis() {
        let shape = Shape4::new(3, 4, 5, 6);
        for axis in 0..4 {
            let config = LpcConfig {
                shape,
                layout: Layout::RowMajor,
                axis,
            };
            let ar = AcToArKernel::<f32>::try_new(config).expect("ar");
            let poly = AcToPolyKernel::<f32>::try_new(config).expect("poly");
            for a in 0..4 {
                let n = shape.0[a];
                assert_eq!(ar.output_shape().0[a], if a == axis { n - 1 } else { n });
                assert_eq!(poly.output_shape().0[a], n);
                assert_eq!(ar.variance_shape().0[a], if a == axis { 1 } else { n });
            }
        }
    }

    #[test]
    fn poly_is_one_then_negated_ar() {
        let r = [2.0f64, 1.2, 0.5, 0.1];
        let (ar, e_ar) = ac2ar(&r).expect("ar");
        let (poly, e_poly) = ac2poly(&r).expect("poly");
        assert_eq!(poly[0], 1.0);
        for (p, a) in poly[1..].iter().zip(ar.iter()) {
            assert_eq!(*p, -*a);
        }
        assert_eq!(e_ar, e_poly);
    }

    #[test]
    fn short_lanes_are_identity_cases() {
        let (ar, e) = ac2ar(&[3.0f64]).expect("singleton");
        assert!(ar.is_empty());
        assert_eq!(e, 3.0);
        let (poly, e) = ac2poly(&[3.0f64]).expect("singleton poly");
        assert_eq!((poly, e), (vec![1.0], 3.0));
    }

    #[test]
    fn signal_to_ar_recovers_a_first_order_process() {
        // x[n] = 0.9 x[n-1] + small deterministic excitation.
        let mut x = vec![0.0f64; 4096];
        let mut state = 12345u64;
        for n in 1..x.len() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let w = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            x[n] = 0.9 * x[n - 1] + w;
        }
        let (ar, var) = sig2ar(
            &x,
            2,
            AutocovOptions {
                zero_mean: true,
                ..Default::default()
            },
        )
        .expect("sig2ar");
        assert_abs_diff_eq!(ar[0], 0.9, epsilon = 0.05);
        assert_abs_diff_eq!(ar[1], 0.0, epsilon = 0.05);
        // Uniform(-0.5, 0.5) excitation has variance 1/12.
        assert_abs_diff_eq!(var, 1.0 / 12.0, epsilon = 0.01);

        let (poly, var_poly) = sig2poly(
            &x,
            3,
            AutocovOptions {
                zero_mean: true,
                ..Default::default()
            },
        )
        .expect("sig2poly");
        assert_eq!(poly.len(), 3);
        assert_eq!(poly[0], 1.0);
        assert_eq!(poly[1], -ar[0]);
        assert_eq!(var_poly, var);
    }

    #[test]
    fn complex_kernel_runs_batched() {
        let shape = Shape4::new(1, 2, 1, 3);
        let x: Vec<Complex<f32>> = [1.0f32, 0.4, 0.1, 2.0, -0.5, 0.2]
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        let kernel = AcToArKernel::<Complex<f32>>::try_new(LpcConfig {
            shape,
            layout: Layout::RowMajor,
            axis: 3,
        })
        .expect("kernel");
        let (ar, var) = kernel.run_alloc(&x).expect("run");
        assert_eq!(ar.len(), 4);
        assert_eq!(var.len(), 2);
        let (real, e) = ac2ar(&[2.0f32, -0.5, 0.2]).expect("real");
        assert_abs_diff_eq!(ar[2].re, real[0], epsilon = 1e-6);
        assert_abs_diff_eq!(ar[3].re, real[1], epsilon = 1e-6);
        assert_abs_diff_eq!(var[1], e, epsilon = 1e-6);
    }

    #[test]
    fn config_and_length_errors() {
        assert_eq!(
            AcToArKernel::<f64>::try_new(LpcConfig {
                axis: 7,
                ..LpcConfig::vector(3)
            }),
            Err(ConfigError::InvalidAxis { axis: 7 })
        );
        assert!(sig2ar(&[1.0f64, 2.0, 3.0], 3, AutocovOptions::default()).is_err());
        assert!(sig2ar(&[1.0f64, 2.0, 3.0], 0, AutocovOptions::default()).is_err());

        let kernel = AcToArKernel::<f64>::try_new(LpcConfig::vector(3)).expect("kernel");
        let mut ar = vec![0.0; 2];
        let mut var = vec![0.0; 2];
        let err = kernel
            .run_into(&[1.0, 0.5, 0.2], &mut ar, &mut var)
            .expect_err("var too long");
        assert_eq!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "var",
                expected: 1,
                got: 2,
            }
        );
    }

    #[test]
    fn status_contract_through_crate_error() {
        use crate::error::{status_of, Error, ErrorKind};

        let result: Result<AcToArKernel<f64>, Error> = AcToArKernel::try_new(LpcConfig {
            axis: 4,
            ..LpcConfig::vector(2)
        })
        .map_err(Error::from);
        assert_eq!(status_of(&result), 1);
        assert_eq!(
            result.expect_err("invalid axis").kind(),
            ErrorKind::InvalidAxis
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn failed_scratch_leaves_coefficients_and_variances_untouched() {
        use crate::kernel::with_scratch_budget;

        let shape = Shape4::new(12, 2, 3, 1);
        let x: Vec<f64> = (0..shape.len())
            .map(|i| (i as f64 * 0.43).sin() + 0.2 * (i as f64 * 1.3).cos())
            .collect();
        let kernel = SigToArKernel::<f64>::try_new(SigToArConfig {
            shape,
            layout: Layout::RowMajor,
            axis: 0,
            order: 4,
            options: AutocovOptions::default(),
        })
        .expect("kernel");
        let mut failures = 0;
        for allowed in 0..16 {
            let mut ar = vec![9.5; kernel.output_shape().len()];
            let mut var = vec![-9.5; kernel.variance_shape().len()];
            match with_scratch_budget(allowed, || kernel.run_into(&x, &mut ar, &mut var)) {
                Err(ExecInvariantViolation::AllocationFailure { .. }) => {
                    failures += 1;
                    assert!(ar.iter().all(|&a| a == 9.5), "budget {allowed}");
                    assert!(var.iter().all(|&v| v == -9.5), "budget {allowed}");
                }
                Err(other) => panic!("unexpected error {other:?}"),
                Ok(()) => {
                    let (want_ar, want_var) = kernel.run_alloc(&x).expect("run");
                    assert_eq!(ar, want_ar);
                    assert_eq!(var, want_var);
                    break;
                }
            }
        }
        assert!(failures >= 4, "only {failures} scratch requests");
    }
}
