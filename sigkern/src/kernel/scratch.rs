use super::ExecInvariantViolation;
use crate::layout::AxisWalk;
use alloc::vec::Vec;

/// Allocate `len` copies of `fill`, reporting failure instead of aborting.
///
/// Kernels reserve all scratch through this before the first output write,
/// so a failed call leaves the output untouched.
pub fn try_filled<T: Clone>(
    arg: &'static str,
    len: usize,
    fill: T,
) -> Result<Vec<T>, ExecInvariantViolation> {
    let mut buf = Vec::new();
    if budget_exhausted() || buf.try_reserve_exact(len).is_err() {
        log::error!("allocation of {len} elements for `{arg}` failed");
        return Err(ExecInvariantViolation::AllocationFailure { arg, len });
    }
    buf.resize(len, fill);
    Ok(buf)
}

#[cfg(all(test, feature = "std"))]
std::thread_local! {
    static BUDGET: core::cell::Cell<Option<usize>> = const { core::cell::Cell::new(None) };
}

/// Run `f` with only `allowed` scratch allocations succeeding on this thread.
#[cfg(all(test, feature = "std"))]
pub(crate) fn with_scratch_budget<R>(allowed: usize, f: impl FnOnce() -> R) -> R {
    BUDGET.with(|b| b.set(Some(allowed)));
    let out = f();
    BUDGET.with(|b| b.set(None));
    out
}

#[cfg(all(test, feature = "std"))]
fn budget_exhausted() -> bool {
    BUDGET.with(|b| match b.get() {
        Some(0) => true,
        Some(n) => {
            b.set(Some(n - 1));
            false
        }
        None => false,
    })
}

#[cfg(not(all(test, feature = "std")))]
fn budget_exhausted() -> bool {
    false
}

/// Gather/scatter lane buffer for `walk`; empty when lanes are contiguous.
pub fn lane_buffer<T: Clone>(
    arg: &'static str,
    walk: &AxisWalk,
    fill: T,
) -> Result<Vec<T>, ExecInvariantViolation> {
    let len = if walk.is_contiguous() { 0 } else { walk.len() };
    try_filled(arg, len, fill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Layout, Shape4};

    #[test]
    fn oversized_request_reports_allocation_failure() {
        let err = try_filled::<u64>("scratch", usize::MAX / 4, 0).expect_err("too large");
        assert_eq!(
            err,
            ExecInvariantViolation::AllocationFailure {
                arg: "scratch",
                len: usize::MAX / 4,
            }
        );
    }

    #[test]
    fn exhausted_budget_fails_the_next_request() {
        let err = with_scratch_budget(1, || {
            try_filled("first", 4, 0u8).expect("within budget");
            try_filled("second", 4, 0u8).expect_err("over budget")
        });
        assert_eq!(
            err,
            ExecInvariantViolation::AllocationFailure {
                arg: "second",
                len: 4,
            }
        );
        assert!(try_filled("after", 4, 0u8).is_ok());
    }

    #[test]
    fn lane_buffer_only_for_strided_walks() {
        let shape = Shape4::new(4, 2, 1, 3);
        let fast = AxisWalk::new(shape, Layout::RowMajor, 3).expect("axis 3");
        let slow = AxisWalk::new(shape, Layout::RowMajor, 0).expect("axis 0");
        assert!(lane_buffer("x", &fast, 0.0f32).expect("fast").is_empty());
        assert_eq!(lane_buffer("x", &slow, 0.0f32).expect("slow").len(), 4);
    }
}
