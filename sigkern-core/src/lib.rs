//! Error and result types shared by the `sigkern` kernels.
//!
//! Every kernel failure maps onto one [`Error`] kind. Callers that need the
//! integer status contract of a C-style entry point can use
//! [`Error::status`], which is `1` for every failure (success is `0`).

#![no_std]

use core::{error, fmt};

/// Alias for results produced by sigkern.
pub type Result<T> = core::result::Result<T, Error>;

/// Status code returned by a successful call.
pub const STATUS_OK: i32 = 0;

/// Status code returned by any failed call.
pub const STATUS_FAILURE: i32 = 1;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested axis is not one of the four tensor axes.
    InvalidAxis,
    /// A scratch buffer could not be allocated.
    AllocationFailure,
    /// Buffer or axis lengths disagree with the configured shape.
    ShapeMismatch,
    /// The input cannot be processed without producing NaN/Inf.
    NumericDegeneracy,
    /// Any other rejected argument.
    InvalidArg,
}

/// Errors raised whilst running sigkern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Axis index outside `0..=3`.
    InvalidAxis {
        /// The rejected axis.
        axis: usize,
    },
    /// A scratch allocation failed before any output was written.
    AllocationFailure {
        /// Name of the buffer that could not be allocated.
        arg: &'static str,
        /// Number of elements requested.
        len: usize,
    },
    /// A buffer or axis length did not match the configured shape.
    ShapeMismatch {
        /// Name of the offending argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// The input makes the recursion divide by zero or lose positivity.
    NumericDegeneracy {
        /// Human readable reason.
        reason: &'static str,
    },
    /// Argument passed into a kernel was invalid.
    InvalidArg {
        /// The invalid arg.
        arg: &'static str,
        /// Explaining why arg is invalid.
        reason: &'static str,
    },
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAxis { .. } => ErrorKind::InvalidAxis,
            Error::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            Error::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Error::NumericDegeneracy { .. } => ErrorKind::NumericDegeneracy,
            Error::InvalidArg { .. } => ErrorKind::InvalidArg,
        }
    }

    /// Integer status for C-style callers. Always [`STATUS_FAILURE`].
    pub fn status(&self) -> i32 {
        STATUS_FAILURE
    }
}

/// Collapse a result into the `0`/`1` status convention.
pub fn status_of<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(err) => err.status(),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAxis { axis } => write!(f, "axis must be in [0 3], got {axis}"),
            Error::AllocationFailure { arg, len } => {
                write!(f, "could not allocate {len} elements for `{arg}`")
            }
            Error::ShapeMismatch { arg, expected, got } => {
                write!(
                    f,
                    "Shape mismatch on `{arg}`. Expected {expected}, got {got}."
                )
            }
            Error::NumericDegeneracy { reason } => write!(f, "Numeric degeneracy: {reason}"),
            Error::InvalidArg { arg, reason } => write!(f, "Invalid argument `{arg}`: {reason}"),
        }
    }
}

impl error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_reports_status_one() {
        let errs = [
            Error::InvalidAxis { axis: 4 },
            Error::AllocationFailure {
                arg: "scratch",
                len: 8,
            },
            Error::ShapeMismatch {
                arg: "out",
                expected: 4,
                got: 3,
            },
            Error::NumericDegeneracy {
                reason: "zero energy",
            },
            Error::InvalidArg {
                arg: "nfft",
                reason: "must be a power of two",
            },
        ];
        for err in &errs {
            assert_eq!(err.status(), STATUS_FAILURE);
        }
        assert_eq!(errs[0].kind(), ErrorKind::InvalidAxis);
        assert_eq!(errs[3].kind(), ErrorKind::NumericDegeneracy);
    }

    #[test]
    fn status_of_collapses_results() {
        let ok: Result<()> = Ok(());
        let err: Result<()> = Err(Error::InvalidAxis { axis: 7 });
        assert_eq!(status_of(&ok), STATUS_OK);
        assert_eq!(status_of(&err), STATUS_FAILURE);
    }
}
