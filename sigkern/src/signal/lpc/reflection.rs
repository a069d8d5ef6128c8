//! Step-up and step-down between reflection and AR coefficients.
//!
//! The step-up runs on the polynomial side: starting from `rc`, order `l`
//! subtracts `rc[l]` times the reversed lower-order coefficients, and the
//! finished vector is negated. Nothing is conjugated, for complex lanes too.
//!
//! This takes reflection coefficients with the opposite sign to those
//! [`levinson_durbin`] reports. For real lanes, `rc2ar` of the negated
//! Levinson-Durbin coefficients gives the tail of the prediction polynomial,
//! `-a`.
//!
//! [`levinson_durbin`]: super::levinson_durbin

use super::levinson::LevinsonScalar;
use super::{LpcConfig, LpcGeometry};
use crate::kernel::{
    lane_buffer, try_filled, ConfigError, ExecInvariantViolation, KernelLifecycle, ReadBuf,
    WriteBuf,
};
use crate::layout::{for_each_lane, Shape4};
use crate::signal::traits::Reflection1D;
use alloc::vec::Vec;
use core::marker::PhantomData;

/// AR coefficients from reflection coefficients, one order at a time.
///
/// `snapshot` needs `rc.len() - 1` elements.
pub fn rc2ar_lane<S: LevinsonScalar>(rc: &[S], ar: &mut [S], snapshot: &mut [S]) {
    let order = rc.len();
    ar[..order].copy_from_slice(rc);
    for l in 1..order {
        let k = ar[l];
        snapshot[..l].copy_from_slice(&ar[..l]);
        for (q, a) in ar[..l].iter_mut().enumerate() {
            *a = *a - k * snapshot[l - 1 - q];
        }
    }
    for a in ar[..order].iter_mut() {
        *a = -*a;
    }
}

/// Reflection coefficients from AR coefficients; inverse of [`rc2ar_lane`].
///
/// `work` and `snapshot` need `ar.len()` elements. A coefficient with
/// `k * k == 1` makes the step-down divide by zero; the result is then
/// non-finite, as with a degenerate Levinson-Durbin input.
pub fn ar2rc_lane<S: LevinsonScalar>(ar: &[S], rc: &mut [S], work: &mut [S], snapshot: &mut [S]) {
    let order = ar.len();
    for (w, &a) in work[..order].iter_mut().zip(ar.iter()) {
        *w = -a;
    }
    for p in (0..order).rev() {
        let k = work[p];
        rc[p] = k;
        snapshot[..p].copy_from_slice(&work[..p]);
        let denom = S::one() - k * k;
        for (q, w) in work[..p].iter_mut().enumerate() {
            *w = (*w + k * snapshot[p - 1 - q]) / denom;
        }
    }
}

fn same_length_geometry(config: LpcConfig) -> Result<LpcGeometry, ConfigError> {
    let len = config
        .shape
        .axis_len(config.axis)
        .ok_or(ConfigError::InvalidAxis { axis: config.axis })?;
    LpcGeometry::new(config.shape, config.layout, config.axis, len)
}

/// Reflection-coefficient lanes to AR lanes of the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rc2ArKernel<S> {
    geom: LpcGeometry,
    _elem: PhantomData<S>,
}

/// AR lanes to reflection-coefficient lanes of the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ar2RcKernel<S> {
    geom: LpcGeometry,
    _elem: PhantomData<S>,
}

macro_rules! reflection_kernel {
    ($kernel:ident) => {
        impl<S> $kernel<S> {
            /// Shape of the output tensor; equal to the input shape.
            pub fn output_shape(&self) -> Shape4 {
                self.geom.out_shape
            }
        }

        impl<S: LevinsonScalar> KernelLifecycle for $kernel<S> {
            type Config = LpcConfig;

            fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
                Ok(Self {
                    geom: same_length_geometry(config)?,
                    _elem: PhantomData,
                })
            }
        }
    };
}

reflection_kernel!(Rc2ArKernel);
reflection_kernel!(Ar2RcKernel);

impl<S: LevinsonScalar> Reflection1D<S> for Rc2ArKernel<S> {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        self.geom.check_input(x.len())?;
        self.geom.check_output("out", y.len())?;
        let order = self.geom.input.len();
        let mut snapshot = try_filled("snapshot", order.saturating_sub(1), S::zero())?;
        let mut x_lane = lane_buffer("x_lane", &self.geom.input, S::zero())?;
        let mut y_lane = lane_buffer("y_lane", &self.geom.output, S::zero())?;
        for_each_lane(
            &self.geom.input,
            &self.geom.output,
            x,
            y,
            &mut x_lane,
            &mut y_lane,
            |_, rc, ar| rc2ar_lane(rc, ar, &mut snapshot),
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

impl<S: LevinsonScalar> Reflection1D<S> for Ar2RcKernel<S> {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: ReadBuf<S> + ?Sized,
        O: WriteBuf<S> + ?Sized,
    {
        let x = input.read_slice()?;
        let y = out.write_slice_mut()?;
        self.geom.check_input(x.len())?;
        self.geom.check_output("out", y.len())?;
        let order = self.geom.input.len();
        let mut work = try_filled("work", order, S::zero())?;
        let mut snapshot = try_filled("snapshot", order, S::zero())?;
        let mut x_lane = lane_buffer("x_lane", &self.geom.input, S::zero())?;
        let mut y_lane = lane_buffer("y_lane", &self.geom.output, S::zero())?;
        for_each_lane(
            &self.geom.input,
            &self.geom.output,
            x,
            y,
            &mut x_lane,
            &mut y_lane,
            |_, ar, rc| ar2rc_lane(ar, rc, &mut work, &mut snapshot),
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

/// AR coefficients of one reflection-coefficient vector.
pub fn rc2ar<S: LevinsonScalar>(rc: &[S]) -> Result<Vec<S>, ExecInvariantViolation> {
    Rc2ArKernel::<S>::try_new(LpcConfig::vector(rc.len()))?.run_alloc(rc)
}

/// Reflection coefficients of one AR vector.
pub fn ar2rc<S: LevinsonScalar>(ar: &[S]) -> Result<Vec<S>, ExecInvariantViolation> {
    Ar2RcKernel::<S>::try_new(LpcConfig::vector(ar.len()))?.run_alloc(ar)
}
