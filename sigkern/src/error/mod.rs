//! Crate-level error taxonomy.
//!
//! Kernels report through the two-layer [`ConfigError`] /
//! [`ExecInvariantViolation`] pair; callers that only care about the kind of
//! failure (or the `0`/`1` status) convert into [`Error`].

use crate::kernel::{ConfigError, ExecInvariantViolation};

pub use sigkern_core::{status_of, Error, ErrorKind, Result, STATUS_FAILURE, STATUS_OK};

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        match value {
            ConfigError::InvalidAxis { axis } => Error::InvalidAxis { axis },
            ConfigError::LengthMismatch { arg, expected, got } => {
                Error::ShapeMismatch { arg, expected, got }
            }
            ConfigError::EmptyInput { arg } => Error::InvalidArg {
                arg,
                reason: "input was empty",
            },
            ConfigError::InvalidArgument { arg, reason } => Error::InvalidArg { arg, reason },
            ConfigError::NonContiguous { arg } => Error::InvalidArg {
                arg,
                reason: "buffer is not contiguous in memory",
            },
        }
    }
}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        match value {
            ExecInvariantViolation::InvalidState { reason } => Error::InvalidArg {
                arg: "state",
                reason,
            },
            ExecInvariantViolation::LengthMismatch { arg, expected, got } => {
                Error::ShapeMismatch { arg, expected, got }
            }
            ExecInvariantViolation::AllocationFailure { arg, len } => {
                Error::AllocationFailure { arg, len }
            }
            ExecInvariantViolation::Config(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_kind() {
        let err: Error = ConfigError::InvalidAxis { axis: 5 }.into();
        assert_eq!(err.kind(), ErrorKind::InvalidAxis);
        assert_eq!(err.status(), STATUS_FAILURE);

        let err: Error = ConfigError::LengthMismatch {
            arg: "x",
            expected: 8,
            got: 7,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn nested_config_errors_unwrap_through_exec() {
        let exec = ExecInvariantViolation::from(ConfigError::InvalidAxis { axis: 9 });
        let err: Error = exec.into();
        assert_eq!(err, Error::InvalidAxis { axis: 9 });

        let err: Error = ExecInvariantViolation::AllocationFailure {
            arg: "scratch",
            len: 1 << 20,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    }
}
