//! Linear prediction: Levinson-Durbin and the kernels built around it.
//!
//! * [`levinson`]: the single-lane recursion.
//! * [`AcToArKernel`] / [`AcToPolyKernel`]: autocovariance lanes to AR
//!   coefficients or the prediction polynomial `[1, -a1, ..., -aP]`, plus the
//!   per-lane prediction-error variance.
//! * [`SigToArKernel`] / [`SigToPolyKernel`]: the same starting from signal
//!   lanes, through [`autocov`].
//! * [`reflection`]: step-up and step-down between reflection and AR
//!   coefficients.

pub mod autocov;
mod kernels;
pub mod levinson;
pub mod reflection;

pub use autocov::{sig2ac, AutocovConfig, AutocovKernel, AutocovOptions};
pub use kernels::*;
pub use levinson::{check_energy, levinson_durbin, LevinsonScalar};
pub use reflection::{ar2rc, rc2ar, Ar2RcKernel, Rc2ArKernel};

use crate::kernel::{ConfigError, ExecInvariantViolation};
use crate::layout::{AxisWalk, Layout, Shape4};

/// Constructor config for kernels whose only parameter is the tensor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LpcConfig {
    /// Input tensor shape.
    pub shape: Shape4,
    /// Memory order of every tensor involved.
    pub layout: Layout,
    /// Axis holding each vector, in `0..=3`.
    pub axis: usize,
}

impl LpcConfig {
    /// Config for a single vector of `len` elements.
    pub fn vector(len: usize) -> Self {
        Self {
            shape: Shape4::new(1, 1, 1, len),
            layout: Layout::RowMajor,
            axis: 3,
        }
    }
}

/// Input, output and variance addressing shared by the LPC kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LpcGeometry {
    pub(crate) input: AxisWalk,
    pub(crate) output: AxisWalk,
    pub(crate) in_shape: Shape4,
    pub(crate) out_shape: Shape4,
    pub(crate) var_shape: Shape4,
}

impl LpcGeometry {
    pub(crate) fn new(
        shape: Shape4,
        layout: Layout,
        axis: usize,
        out_len: usize,
    ) -> Result<Self, ConfigError> {
        let input = AxisWalk::new(shape, layout, axis)?;
        Ok(Self {
            input,
            output: input.with_len(out_len),
            in_shape: shape,
            out_shape: shape.with_axis_len(axis, out_len),
            var_shape: shape.with_axis_len(axis, 1),
        })
    }

    pub(crate) fn check_input(&self, got: usize) -> Result<(), ExecInvariantViolation> {
        check_len("x", self.in_shape.len(), got)
    }

    pub(crate) fn check_output(
        &self,
        arg: &'static str,
        got: usize,
    ) -> Result<(), ExecInvariantViolation> {
        check_len(arg, self.out_shape.len(), got)
    }

    pub(crate) fn check_var(&self, got: usize) -> Result<(), ExecInvariantViolation> {
        check_len("var", self.var_shape.len(), got)
    }
}

fn check_len(arg: &'static str, expected: usize, got: usize) -> Result<(), ExecInvariantViolation> {
    if expected != got {
        return Err(ExecInvariantViolation::LengthMismatch { arg, expected, got });
    }
    Ok(())
}
