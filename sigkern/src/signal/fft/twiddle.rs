//! Bit-reversal and trigonometric tables for the radix-2 engine.

use num_traits::{Float, FloatConst};

/// Fill `tbl` with the bit-reversal permutation of `0..tbl.len()`.
///
/// `tbl.len()` must be a power of two. The permutation is its own inverse.
pub fn fill_bit_reversal(tbl: &mut [usize]) {
    let n = tbl.len();
    if n == 0 {
        return;
    }
    tbl[0] = 0;
    let mut j = 0usize;
    for slot in tbl.iter_mut().skip(1) {
        // Reversed increment: clear high bits while they are set, then set
        // the first clear one.
        let mut k = n / 2;
        while k <= j {
            j -= k;
            k /= 2;
        }
        j += k;
        *slot = j;
    }
}

/// Fill `tbl` (length `nfft + nfft/4`) with `sin(2*pi*h/nfft)`.
///
/// The cosine of the same angle is `tbl[h + nfft/4]`. Sines of the first
/// octant come from a second-order recurrence seeded with the half-angle
/// sine, cosines are mirrored into the second octant, and the rest follows
/// by symmetry. Only meaningful for `nfft >= 8`.
pub fn fill_trig_table<T>(nfft: usize, tbl: &mut [T])
where
    T: Float + FloatConst,
{
    debug_assert_eq!(tbl.len(), nfft + nfft / 4);
    let (n2, n4, n8) = (nfft / 2, nfft / 4, nfft / 8);
    let two = T::one() + T::one();

    let half = (T::PI() / T::from(nfft).unwrap_or_else(T::one)).sin();
    let mut dc = two * half * half;
    let t = two * dc;
    let mut ds = (t - dc * dc).sqrt();

    let mut s = T::zero();
    for slot in tbl.iter_mut().take(n8) {
        *slot = s;
        s = s + ds;
        ds = ds - t * s;
    }
    if n8 > 0 {
        tbl[n8] = T::FRAC_1_SQRT_2();
    }

    let mut c = T::one();
    for i in 0..n8 {
        tbl[n4 - i] = c;
        c = c - dc;
        dc = dc + t * c;
    }
    for i in 0..n4 {
        tbl[n2 - i] = tbl[i];
    }
    for i in 0..n2 + n4 {
        tbl[i + n2] = -tbl[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bit_reversal_of_eight() {
        let mut tbl = [0usize; 8];
        fill_bit_reversal(&mut tbl);
        assert_eq!(tbl, [0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn bit_reversal_is_an_involution() {
        let mut tbl = vec![0usize; 1024];
        fill_bit_reversal(&mut tbl);
        for (i, &j) in tbl.iter().enumerate() {
            assert_eq!(tbl[j], i);
        }
    }

    #[test]
    fn trig_table_matches_libm() {
        for nfft in [8usize, 16, 64, 1024] {
            let mut tbl = vec![0.0f64; nfft + nfft / 4];
            fill_trig_table(nfft, &mut tbl);
            for (h, &v) in tbl.iter().enumerate() {
                let expected = (2.0 * core::f64::consts::PI * h as f64 / nfft as f64).sin();
                assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn trig_table_single_precision() {
        let nfft = 256usize;
        let mut tbl = vec![0.0f32; nfft + nfft / 4];
        fill_trig_table(nfft, &mut tbl);
        assert_abs_diff_eq!(tbl[nfft / 4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(tbl[nfft / 8], core::f32::consts::FRAC_1_SQRT_2);
        assert_abs_diff_eq!(tbl[nfft / 2], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(tbl[3 * nfft / 4], -1.0, epsilon = 1e-6);
    }
}
