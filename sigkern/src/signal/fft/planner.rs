//! General-length lane transforms backed by the `rustfft` planner.

use super::{Direction, LaneTransform};
use alloc::sync::Arc;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftNum, FftPlanner};

/// A planned `rustfft` transform of one length and direction.
pub struct PlannedLane<T: FftNum> {
    fft: Arc<dyn Fft<T>>,
}

impl<T: FftNum> PlannedLane<T> {
    /// Plan a transform of `nfft` samples.
    pub fn new(nfft: usize, direction: Direction) -> Self {
        let mut planner = FftPlanner::<T>::new();
        let fft = match direction {
            Direction::Forward => planner.plan_fft_forward(nfft),
            Direction::Inverse => planner.plan_fft_inverse(nfft),
        };
        log::trace!("rustfft plan: nfft {nfft}, {direction:?}");
        Self { fft }
    }
}

impl<T: FftNum> LaneTransform<T> for PlannedLane<T> {
    fn len(&self) -> usize {
        self.fft.len()
    }

    fn scratch_len(&self) -> usize {
        self.fft.get_inplace_scratch_len()
    }

    fn process(&self, buf: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
        self.fft.process_with_scratch(buf, scratch);
    }
}

impl<T: FftNum> core::fmt::Debug for PlannedLane<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlannedLane")
            .field("len", &self.fft.len())
            .finish()
    }
}
