//! Lane addressing for 4-D `(R, C, S, H)` tensors.
//!
//! A kernel never sees the tensor as a whole. It is handed one 1-D "lane" at a
//! time: every run of samples along the active axis with the other three
//! indices fixed. [`AxisWalk`] resolves a shape, a memory [`Layout`] and an
//! axis into the four numbers needed to find every lane in a flat buffer:
//!
//! * `len` (L): samples per lane, the active axis length.
//! * `stride` (K): distance between consecutive samples of one lane.
//! * `block` (B): lanes that interleave sample-by-sample.
//! * `groups` (G): number of such interleaved blocks. `G * B` is the lane count.
//!
//! When `K == 1` and either `G == 1` or `B == 1`, lane `v` is simply
//! `v*L .. (v+1)*L`. Otherwise sample `l` of the lane `(g, b)` lives at
//! `g*B*L + b + l*K`, lanes enumerated with `g` outer and `b` inner.

use crate::kernel::ConfigError;

#[cfg(feature = "alloc")]
use ndarray::{ArrayBase, Data, Ix4};

/// Memory order of a flat 4-D tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// Last axis (H) varies fastest.
    #[default]
    RowMajor,
    /// First axis (R) varies fastest.
    ColMajor,
}

/// Axis lengths `[R, C, S, H]` of a 4-D tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape4(pub [usize; 4]);

impl Shape4 {
    /// Build a shape from its four axis lengths.
    pub const fn new(r: usize, c: usize, s: usize, h: usize) -> Self {
        Self([r, c, s, h])
    }

    /// Total element count `R*C*S*H`.
    pub fn len(&self) -> usize {
        self.0.iter().product()
    }

    /// True if any axis has zero length.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of `axis`, or `None` if `axis > 3`.
    pub fn axis_len(&self, axis: usize) -> Option<usize> {
        self.0.get(axis).copied()
    }

    /// The same shape with the active axis resized. Out-of-range axes are
    /// returned unchanged; kernels validate the axis before calling this.
    pub fn with_axis_len(mut self, axis: usize, len: usize) -> Self {
        if let Some(slot) = self.0.get_mut(axis) {
            *slot = len;
        }
        self
    }
}

impl From<[usize; 4]> for Shape4 {
    fn from(value: [usize; 4]) -> Self {
        Self(value)
    }
}

impl From<(usize, usize, usize, usize)> for Shape4 {
    fn from((r, c, s, h): (usize, usize, usize, usize)) -> Self {
        Self([r, c, s, h])
    }
}

/// Reject axes outside `0..=3`.
pub fn check_axis(axis: usize) -> Result<(), ConfigError> {
    if axis > 3 {
        log::warn!("rejecting axis {axis}: must be in [0 3]");
        return Err(ConfigError::InvalidAxis { axis });
    }
    Ok(())
}

/// Resolved `(L, K, B, G)` addressing for one axis of one tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisWalk {
    len: usize,
    stride: usize,
    block: usize,
    groups: usize,
    contiguous: bool,
}

impl AxisWalk {
    /// Resolve the lane addressing of `axis` in `shape` stored as `layout`.
    pub fn new(shape: Shape4, layout: Layout, axis: usize) -> Result<Self, ConfigError> {
        check_axis(axis)?;
        let [r, c, s, h] = shape.0;
        let stride = match (layout, axis) {
            (Layout::RowMajor, 0) => c * s * h,
            (Layout::RowMajor, 1) => s * h,
            (Layout::RowMajor, 2) => h,
            (Layout::RowMajor, _) => 1,
            (Layout::ColMajor, 0) => 1,
            (Layout::ColMajor, 1) => r,
            (Layout::ColMajor, 2) => r * c,
            (Layout::ColMajor, _) => r * c * s,
        };
        let block = match (layout, axis) {
            (Layout::ColMajor, 0) => c * s * h,
            _ => stride,
        };
        // Lane count from the other three axes so a zero-length active axis
        // still reports its lanes.
        let lanes: usize = shape
            .0
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != axis)
            .map(|(_, &n)| n)
            .product();
        let groups = if block == 0 { 0 } else { lanes / block };
        let contiguous = stride == 1 && (groups == 1 || block == 1);
        Ok(Self {
            len: shape.0[axis],
            stride,
            block,
            groups,
            contiguous,
        })
    }

    /// Same lanes, different lane length.
    ///
    /// Output tensors whose active axis is resized (`nfft`, `P`, `1`, ...)
    /// share `K`, `B` and `G` with the input so lane `v` maps onto lane `v`.
    pub fn with_len(self, len: usize) -> Self {
        Self { len, ..self }
    }

    /// Samples per lane (L).
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if lanes are empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sample stride within a lane (K).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Interleaved lanes per group (B).
    pub fn block(&self) -> usize {
        self.block
    }

    /// Number of groups (G).
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Lane count `V = G * B`.
    pub fn lanes(&self) -> usize {
        self.groups * self.block
    }

    /// Flat tensor length this walk addresses.
    pub fn tensor_len(&self) -> usize {
        self.lanes() * self.len
    }

    /// True if each lane is one contiguous run of `L` samples.
    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    /// Flat offset of sample 0 of lane `lane`.
    pub fn lane_start(&self, lane: usize) -> usize {
        if self.contiguous {
            lane * self.len
        } else {
            let g = lane / self.block;
            let b = lane % self.block;
            g * self.block * self.len + b
        }
    }

    /// Distance between consecutive samples of a lane.
    pub fn lane_step(&self) -> usize {
        if self.contiguous {
            1
        } else {
            self.stride
        }
    }

    /// Flat offsets of every sample of lane `lane`, in order.
    pub fn lane_offsets(&self, lane: usize) -> impl Iterator<Item = usize> {
        let start = self.lane_start(lane);
        let step = self.lane_step();
        (0..self.len).map(move |l| start + l * step)
    }

    /// Copy lane `lane` of `src` into `dst[..L]`.
    pub fn gather<T: Copy>(&self, src: &[T], lane: usize, dst: &mut [T]) {
        for (d, o) in dst[..self.len].iter_mut().zip(self.lane_offsets(lane)) {
            *d = src[o];
        }
    }

    /// Copy `src[..L]` into lane `lane` of `dst`.
    pub fn scatter<T: Copy>(&self, src: &[T], lane: usize, dst: &mut [T]) {
        for (s, o) in src[..self.len].iter().zip(self.lane_offsets(lane)) {
            dst[o] = *s;
        }
    }

    /// Take the general path even when the fast path applies.
    #[cfg(test)]
    pub(crate) fn force_strided(self) -> Self {
        Self {
            contiguous: false,
            ..self
        }
    }
}

/// Visit every lane of `x` together with the matching lane of `y`.
///
/// `input` and `output` must share `K`, `B` and `G` (see
/// [`AxisWalk::with_len`]). On the strided path lanes are gathered into
/// `in_buf` and `out_buf` is scattered back after `f` returns, so both must
/// hold at least one lane. On the contiguous path `f` sees `x` and `y`
/// directly and the buffers are unused.
pub fn for_each_lane<X, Y, F>(
    input: &AxisWalk,
    output: &AxisWalk,
    x: &[X],
    y: &mut [Y],
    in_buf: &mut [X],
    out_buf: &mut [Y],
    mut f: F,
) where
    X: Copy,
    Y: Copy,
    F: FnMut(usize, &[X], &mut [Y]),
{
    let (lx, ly) = (input.len(), output.len());
    let lanes = input.lanes();
    if input.is_contiguous() {
        log::debug!("lane walk: {lanes} contiguous lanes, L {lx} -> {ly}");
        for v in 0..lanes {
            let (xs, ys) = (v * lx, v * ly);
            f(v, &x[xs..xs + lx], &mut y[ys..ys + ly]);
        }
    } else {
        log::debug!(
            "lane walk: {lanes} strided lanes (K {}, B {}, G {}), L {lx} -> {ly}",
            input.stride(),
            input.block(),
            input.groups()
        );
        for v in 0..lanes {
            input.gather(x, v, in_buf);
            f(v, &in_buf[..lx], &mut out_buf[..ly]);
            output.scatter(out_buf, v, y);
        }
    }
}

/// Describe a 4-D `ndarray` tensor as `(Shape4, Layout)`.
///
/// Standard (C) order maps to [`Layout::RowMajor`], Fortran order to
/// [`Layout::ColMajor`]. Anything else is not a flat tensor.
#[cfg(feature = "alloc")]
pub fn describe<S>(array: &ArrayBase<S, Ix4>) -> Result<(Shape4, Layout), ConfigError>
where
    S: Data,
{
    let (r, c, s, h) = array.dim();
    let shape = Shape4::new(r, c, s, h);
    if array.is_standard_layout() {
        Ok((shape, Layout::RowMajor))
    } else if array.t().is_standard_layout() {
        Ok((shape, Layout::ColMajor))
    } else {
        Err(ConfigError::NonContiguous { arg: "array" })
    }
}
