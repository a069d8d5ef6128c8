//! In-place radix-2 decimation-in-time FFT.

use super::twiddle::{fill_bit_reversal, fill_trig_table};
use super::{Direction, LaneTransform};
use crate::kernel::{try_filled, ConfigError, ExecInvariantViolation};
use alloc::vec::Vec;
use num_complex::Complex;
use num_traits::{Float, FloatConst};

/// Tables for one power-of-two transform length.
///
/// Lengths 1, 2 and 4 use closed forms and carry no tables.
#[derive(Debug, Clone)]
pub struct Radix2Plan<T> {
    nfft: usize,
    direction: Direction,
    bitrev: Vec<usize>,
    trig: Vec<T>,
}

impl<T> Radix2Plan<T>
where
    T: Float + FloatConst,
{
    /// Build the tables for `nfft`. Fails if `nfft` is not a power of two or
    /// the tables cannot be allocated.
    pub fn try_new(nfft: usize, direction: Direction) -> Result<Self, ExecInvariantViolation> {
        if !nfft.is_power_of_two() {
            return Err(ConfigError::InvalidArgument {
                arg: "nfft",
                reason: "radix-2 transform length must be a power of two",
            }
            .into());
        }
        let (bitrev, trig) = if nfft > 4 {
            let mut bitrev = try_filled("bitrev", nfft, 0usize)?;
            let mut trig = try_filled("trig", nfft + nfft / 4, T::zero())?;
            fill_bit_reversal(&mut bitrev);
            fill_trig_table(nfft, &mut trig);
            (bitrev, trig)
        } else {
            (Vec::new(), Vec::new())
        };
        log::trace!("radix-2 plan: nfft {nfft}, {direction:?}");
        Ok(Self {
            nfft,
            direction,
            bitrev,
            trig,
        })
    }

    /// Transform `buf` in place. `buf.len()` must equal the plan length.
    ///
    /// No scaling is applied in either direction.
    pub fn transform(&self, buf: &mut [Complex<T>]) {
        debug_assert_eq!(buf.len(), self.nfft);
        match self.nfft {
            1 => {}
            2 => {
                let (a, b) = (buf[0], buf[1]);
                buf[0] = a + b;
                buf[1] = a - b;
            }
            4 => self.transform4(buf),
            _ => self.transform_general(buf),
        }
    }

    fn transform4(&self, buf: &mut [Complex<T>]) {
        let (x0, x1, x2, x3) = (buf[0], buf[1], buf[2], buf[3]);
        let even = x0 - x2;
        let odd = x1 - x3;
        // -i * odd
        let rot = Complex::new(odd.im, -odd.re);
        buf[0] = x0 + x1 + x2 + x3;
        buf[2] = x0 - x1 + x2 - x3;
        match self.direction {
            Direction::Forward => {
                buf[1] = even + rot;
                buf[3] = even - rot;
            }
            Direction::Inverse => {
                buf[1] = even - rot;
                buf[3] = even + rot;
            }
        }
    }

    fn transform_general(&self, buf: &mut [Complex<T>]) {
        let n = self.nfft;
        let n4 = n / 4;
        for (i, &j) in self.bitrev.iter().enumerate().skip(1) {
            if i < j {
                buf.swap(i, j);
            }
        }

        let mut k = 1usize;
        while k < n {
            let kk = 2 * k;
            let d = n / kk;
            for j in 0..k {
                let h = j * d;
                let (sin, cos) = (self.trig[h], self.trig[h + n4]);
                let w = match self.direction {
                    Direction::Forward => Complex::new(cos, -sin),
                    Direction::Inverse => Complex::new(cos, sin),
                };
                let mut i = j;
                while i < n {
                    let t = buf[i + k] * w;
                    buf[i + k] = buf[i] - t;
                    buf[i] = buf[i] + t;
                    i += kk;
                }
            }
            k = kk;
        }
    }
}

impl<T> LaneTransform<T> for Radix2Plan<T>
where
    T: Float + FloatConst,
{
    fn len(&self) -> usize {
        self.nfft
    }

    fn scratch_len(&self) -> usize {
        0
    }

    fn process(&self, buf: &mut [Complex<T>], _scratch: &mut [Complex<T>]) {
        self.transform(buf);
    }
}
