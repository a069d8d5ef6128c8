//! Levinson-Durbin recursion on one autocovariance lane.
//!
//! Coefficients use the predictor sign: `x[n] ~ sum_q a[q] * x[n-1-q]`. The
//! reflection coefficient of step `p` is `k[p] = -a[p]` right after that step.
//!
//! Complex lanes multiply and divide without conjugating the inner product;
//! only the reversed copy of the previous coefficients is conjugated. With
//! zero imaginary parts this reduces exactly to the real recursion.

use crate::error::Error;
use core::ops::Neg;
use num_complex::Complex;
use num_traits::{Float, Num, NumCast, One, Zero};

/// Scalars the recursion runs on: `f32`, `f64` and their complex forms.
pub trait LevinsonScalar: Copy + Num + Neg<Output = Self> + Send + Sync + 'static {
    /// Underlying float.
    type Real: Float + Send + Sync + 'static;

    /// Embed a real value.
    fn from_real(value: Self::Real) -> Self;

    /// Real part.
    fn re(self) -> Self::Real;

    /// Complex conjugate (identity for reals).
    fn conj(self) -> Self;

    /// Squared magnitude.
    fn norm_sqr(self) -> Self::Real;

    /// Divide by a real value.
    fn div_real(self, value: Self::Real) -> Self;
}

macro_rules! impl_levinson_scalar {
    ($($t:ty),*) => {$(
        impl LevinsonScalar for $t {
            type Real = $t;

            fn from_real(value: $t) -> Self {
                value
            }

            fn re(self) -> $t {
                self
            }

            fn conj(self) -> Self {
                self
            }

            fn norm_sqr(self) -> $t {
                self * self
            }

            fn div_real(self, value: $t) -> Self {
                self / value
            }
        }

        impl LevinsonScalar for Complex<$t> {
            type Real = $t;

            fn from_real(value: $t) -> Self {
                Complex::new(value, 0.0)
            }

            fn re(self) -> $t {
                self.re
            }

            fn conj(self) -> Self {
                Complex::conj(&self)
            }

            fn norm_sqr(self) -> $t {
                Complex::norm_sqr(&self)
            }

            fn div_real(self, value: $t) -> Self {
                self / value
            }
        }
    )*};
}

impl_levinson_scalar!(f32, f64);

/// Cast a count into the scalar's float type.
pub(crate) fn real_from_count<R: Float>(n: usize) -> R {
    <R as NumCast>::from(n).unwrap_or_else(R::nan)
}

/// Raise the order of `ar[..p]` to `p + 1` with reflection coefficient `k`.
///
/// `snapshot` must hold at least `p` elements.
pub fn step_up<S: LevinsonScalar>(ar: &mut [S], p: usize, k: S, snapshot: &mut [S]) {
    // Snapshot before overwrite: a[j] needs the old a[p-1-j].
    for (j, s) in snapshot[..p].iter_mut().enumerate() {
        *s = ar[p - 1 - j].conj();
    }
    for (a, &s) in ar[..p].iter_mut().zip(snapshot[..p].iter()) {
        *a = *a + k * s;
    }
    ar[p] = -k;
}

/// Run the recursion on `x` (length `P + 1`), writing `P` AR coefficients to
/// `ar` and, if given, `P` reflection coefficients to `rc`.
///
/// Returns the final prediction-error power. `snapshot` needs `P - 1`
/// elements. Degenerate input (`x[0] == 0`, vanishing error) is not guarded
/// and propagates NaN/Inf; see [`check_energy`].
pub fn levinson_durbin<S: LevinsonScalar>(
    x: &[S],
    ar: &mut [S],
    mut rc: Option<&mut [S]>,
    snapshot: &mut [S],
) -> S::Real {
    let order = ar.len();
    debug_assert_eq!(x.len(), order + 1);
    if order == 0 {
        return x.first().map_or_else(S::Real::zero, |v| v.re());
    }
    let one = S::Real::one();

    let k = -(x[1] / x[0]);
    step_up(ar, 0, k, snapshot);
    if let Some(rc) = rc.as_deref_mut() {
        rc[0] = k;
    }
    let mut e = x[0].re() * (one - k.norm_sqr());

    for p in 1..order {
        let mut acc = x[p + 1];
        for q in 0..p {
            acc = acc - ar[q] * x[p - q];
        }
        let k = -acc.div_real(e);
        step_up(ar, p, k, snapshot);
        if let Some(rc) = rc.as_deref_mut() {
            rc[p] = k;
        }
        e = e * (one - k.norm_sqr());
    }
    e
}

/// Reject lanes whose lag-0 term would make the recursion divide by zero.
pub fn check_energy<S: LevinsonScalar>(x: &[S]) -> Result<(), Error> {
    match x.first().map(|v| v.re()) {
        Some(r0) if r0 > S::Real::zero() && r0.is_finite() => Ok(()),
        _ => Err(Error::NumericDegeneracy {
            reason: "lag-0 autocovariance must be positive and finite",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_abs_diff_eq;

    /// Autocovariance of an AR(2) process `x[n] = 0.6 x[n-1] - 0.2 x[n-2] + w`.
    fn ar2_autocov(len: usize) -> Vec<f64> {
        let (a1, a2) = (0.6, -0.2);
        let r1_over_r0 = a1 / (1.0 - a2);
        let mut r = vec![1.0, r1_over_r0];
        while r.len() < len {
            let n = r.len();
            r.push(a1 * r[n - 1] + a2 * r[n - 2]);
        }
        r
    }

    #[test]
    fn order_one_example() {
        let mut ar = [0.0f64];
        let mut rc = [0.0f64];
        let e = levinson_durbin(&[1.0, 0.5], &mut ar, Some(&mut rc[..]), &mut []);
        assert_eq!(ar, [0.5]);
        assert_eq!(rc, [-0.5]);
        assert_abs_diff_eq!(e, 0.75);
    }

    #[test]
    fn recovers_ar2_coefficients() {
        let r = ar2_autocov(6);
        let mut ar = [0.0f64; 5];
        let mut snap = [0.0f64; 4];
        levinson_durbin(&r, &mut ar, None, &mut snap);
        assert_abs_diff_eq!(ar[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(ar[1], -0.2, epsilon = 1e-12);
        for &a in &ar[2..] {
            assert_abs_diff_eq!(a, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn positive_definite_input_is_stable() {
        // Biased autocovariance of a short deterministic sequence.
        let x: Vec<f64> = (0..64)
            .map(|i| {
                let jitter = ((i * 7919) % 101) as f64 / 101.0 - 0.5;
                (i as f64 * 0.9).sin() + 0.3 * (i as f64 * 0.17).cos() + jitter
            })
            .collect();
        let order = 8;
        let r: Vec<f64> = (0..=order)
            .map(|l| x.iter().zip(x.iter().skip(l)).map(|(a, b)| a * b).sum::<f64>() / 64.0)
            .collect();

        let mut prev = r[0];
        for p in 1..=order {
            let mut ar = vec![0.0; p];
            let mut rc = vec![0.0; p];
            let mut snap = vec![0.0; p.saturating_sub(1)];
            let e = levinson_durbin(&r[..=p], &mut ar, Some(rc.as_mut_slice()), &mut snap);
            assert!(rc.iter().all(|k| k.abs() < 1.0));
            assert!(e > 0.0 && e < prev, "order {p}: {e} vs {prev}");
            prev = e;
        }
    }

    #[test]
    fn complex_with_zero_imaginary_matches_real() {
        let r = ar2_autocov(5);
        let rc_in: Vec<Complex<f64>> = r.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let mut ar_real = [0.0f64; 4];
        let mut ar_cplx = [Complex::new(0.0f64, 0.0); 4];
        let mut snap_r = [0.0f64; 3];
        let mut snap_c = [Complex::new(0.0f64, 0.0); 3];
        let e_r = levinson_durbin(&r, &mut ar_real, None, &mut snap_r);
        let e_c = levinson_durbin(&rc_in, &mut ar_cplx, None, &mut snap_c);
        for (a, b) in ar_real.iter().zip(ar_cplx.iter()) {
            assert_abs_diff_eq!(*a, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(b.im, 0.0);
        }
        assert_abs_diff_eq!(e_r, e_c, epsilon = 1e-12);
    }

    #[test]
    fn complex_order_one_is_plain_ratio() {
        let x = [Complex::new(2.0f32, 0.0), Complex::new(0.5, 0.5)];
        let mut ar = [Complex::new(0.0f32, 0.0)];
        let e = levinson_durbin(&x, &mut ar, None, &mut []);
        assert_abs_diff_eq!(ar[0].re, 0.25);
        assert_abs_diff_eq!(ar[0].im, 0.25);
        assert_abs_diff_eq!(e, 2.0 * (1.0 - 0.125), epsilon = 1e-6);
    }

    #[test]
    fn zero_energy_propagates_non_finite() {
        let mut ar = [0.0f64; 2];
        let mut snap = [0.0f64; 1];
        levinson_durbin(&[0.0, 1.0, 0.5], &mut ar, None, &mut snap);
        assert!(ar.iter().any(|a| !a.is_finite()));
        let err = check_energy(&[0.0f64, 1.0, 0.5]).expect_err("zero lag 0");
        assert_eq!(err.kind(), ErrorKind::NumericDegeneracy);
        assert!(check_energy(&[1.0f64, 0.5]).is_ok());
    }
}
