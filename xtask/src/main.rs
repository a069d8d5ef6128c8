use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array4, ShapeBuilder};
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use sigkern::kernel::KernelLifecycle;
use sigkern::layout::describe;
use sigkern::signal::convolve::conv1d_fft;
use sigkern::signal::fft::{fft_rad2, FftConfig, IfftKernel, Rad2FftKernel};
use sigkern::signal::lpc::{ac2ar, rc2ar, sig2ac, AutocovOptions};
use sigkern::signal::traits::{Fft1D, Ifft1D};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    reference: String,
    len: usize,
    pearson_r: f64,
    mae: f64,
    rmse: f64,
    max_abs: f64,
    candidate_ns: f64,
    reference_ns: f64,
    speedup_vs_reference: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    sigkern_version: String,
    rows: Vec<ContractRow>,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            Ok(())
        }
    }
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let mut rng = StdRng::seed_from_u64(0x5167_6b65_726e);
    let mut rows = Vec::new();

    // Radix-2 forward transform against the rustfft planner.
    for nfft in [8usize, 64, 1024, 4096] {
        let case_id = format!("fft_rad2_complex_{nfft}");
        let x: Vec<Complex<f64>> = (0..nfft)
            .map(|_| Complex::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
            .collect();
        let candidate = fft_rad2(&x, None, false).map_err(|e| anyhow!("{case_id}: {e}"))?;
        let fft = FftPlanner::<f64>::new().plan_fft_forward(nfft);
        let mut reference = x.clone();
        fft.process(&mut reference);

        let kernel = Rad2FftKernel::<Complex<f64>>::try_new(FftConfig::vector(nfft))?;
        let candidate_ns = benchmark_avg_ns(200, || {
            kernel
                .run_alloc(&x)
                .map(|_| ())
                .map_err(|e| anyhow!("{case_id} benchmark failed: {e}"))
        })?;
        let reference_ns = benchmark_avg_ns(200, || {
            let mut buf = x.clone();
            fft.process(&mut buf);
            Ok(())
        })?;
        rows.push(build_row(RowBuildInput {
            case_id: &case_id,
            reference: "rustfft",
            candidate: &interleave(&candidate),
            expected: &interleave(&reference),
            candidate_ns,
            reference_ns,
        })?);
    }

    // Batched real transform of a Fortran-ordered tensor along axis 0.
    {
        let case_id = "fft_rad2_real_colmajor_axis0";
        let mut tensor = Array4::<f64>::zeros((256, 3, 2, 2).f());
        tensor.mapv_inplace(|_| rng.random_range(-1.0..1.0));
        let (shape, layout) = describe(&tensor)?;
        let kernel = Rad2FftKernel::<f64>::try_new(FftConfig {
            shape,
            layout,
            axis: 0,
            nfft: None,
            scale: false,
        })?;
        let flat = tensor
            .as_slice_memory_order()
            .ok_or_else(|| anyhow!("{case_id}: tensor is not contiguous"))?;
        let candidate = kernel
            .run_alloc(&tensor)
            .map_err(|e| anyhow!("{case_id}: {e}"))?;

        let fft = FftPlanner::<f64>::new().plan_fft_forward(256);
        let reference_lanes = |out: &mut Vec<Complex<f64>>| {
            let bins = 256 / 2 + 1;
            out.clear();
            out.resize(bins * 12, Complex::new(0.0, 0.0));
            for v in 0..12 {
                let mut lane: Vec<Complex<f64>> = flat[v * 256..(v + 1) * 256]
                    .iter()
                    .map(|&r| Complex::new(r, 0.0))
                    .collect();
                fft.process(&mut lane);
                out[v * bins..(v + 1) * bins].copy_from_slice(&lane[..bins]);
            }
        };
        let mut reference = Vec::new();
        reference_lanes(&mut reference);

        let candidate_ns = benchmark_avg_ns(100, || {
            kernel
                .run_alloc(flat)
                .map(|_| ())
                .map_err(|e| anyhow!("{case_id} benchmark failed: {e}"))
        })?;
        let mut scratch = Vec::new();
        let reference_ns = benchmark_avg_ns(100, || {
            reference_lanes(&mut scratch);
            Ok(())
        })?;
        rows.push(build_row(RowBuildInput {
            case_id,
            reference: "rustfft per lane",
            candidate: &interleave(&candidate),
            expected: &interleave(&reference),
            candidate_ns,
            reference_ns,
        })?);
    }

    // General-length inverse round trip.
    {
        let case_id = "ifft_planner_roundtrip_1000";
        let x: Vec<f64> = (0..1000).map(|_| rng.random_range(-1.0..1.0)).collect();
        let spectrum: Vec<Complex<f64>> = {
            let mut buf: Vec<Complex<f64>> = x.iter().map(|&r| Complex::new(r, 0.0)).collect();
            FftPlanner::<f64>::new()
                .plan_fft_forward(1000)
                .process(&mut buf);
            buf.truncate(501);
            buf
        };
        let kernel = IfftKernel::<f64>::try_new(FftConfig::vector(501))?;
        let candidate = kernel
            .run_alloc(&spectrum)
            .map_err(|e| anyhow!("{case_id}: {e}"))?;
        let candidate_ns = benchmark_avg_ns(100, || {
            kernel
                .run_alloc(&spectrum)
                .map(|_| ())
                .map_err(|e| anyhow!("{case_id} benchmark failed: {e}"))
        })?;
        rows.push(build_row(RowBuildInput {
            case_id,
            reference: "input signal",
            candidate: &candidate,
            expected: &x,
            candidate_ns,
            reference_ns: f64::NAN,
        })?);
    }

    // Levinson-Durbin against a direct Toeplitz solve.
    for order in [4usize, 16, 32] {
        let case_id = format!("ac2ar_order_{order}");
        let signal = ar_process(&mut rng, 4096);
        let ac = sig2ac(
            &signal,
            order + 1,
            AutocovOptions {
                zero_mean: true,
                ..Default::default()
            },
        )
        .map_err(|e| anyhow!("{case_id}: {e}"))?;
        let (candidate, _) = ac2ar(&ac).map_err(|e| anyhow!("{case_id}: {e}"))?;
        let reference = toeplitz_solve(&ac)?;
        let candidate_ns = benchmark_avg_ns(500, || {
            ac2ar(&ac)
                .map(|_| ())
                .map_err(|e| anyhow!("{case_id} benchmark failed: {e}"))
        })?;
        let reference_ns = benchmark_avg_ns(500, || toeplitz_solve(&ac).map(|_| ()))?;
        rows.push(build_row(RowBuildInput {
            case_id: &case_id,
            reference: "gaussian elimination",
            candidate: &candidate,
            expected: &reference,
            candidate_ns,
            reference_ns,
        })?);

        // Step-up from the negated reflection coefficients lands on -a.
        let case_id = format!("rc2ar_order_{order}");
        let rc: Vec<f64> = reflection_of(&ac)?.iter().map(|k| -k).collect();
        let stepped = rc2ar(&rc).map_err(|e| anyhow!("{case_id}: {e}"))?;
        let negated: Vec<f64> = candidate.iter().map(|a| -a).collect();
        rows.push(build_row(RowBuildInput {
            case_id: &case_id,
            reference: "ac2ar",
            candidate: &stepped,
            expected: &negated,
            candidate_ns: f64::NAN,
            reference_ns: f64::NAN,
        })?);
    }

    // FFT convolution against direct convolution.
    {
        let case_id = "conv1d_fft_stride2_dil3";
        let x: Vec<f64> = (0..2048).map(|_| rng.random_range(-1.0..1.0)).collect();
        let taps: Vec<f64> = (0..31)
            .map(|i| {
                let t = (i as f64 - 15.0) / 5.0;
                (-(t * t) / 2.0).exp()
            })
            .collect();
        let (stride, dilation, padding) = (2, 3, 8);
        let candidate = conv1d_fft(&x, &taps, stride, dilation, padding)
            .map_err(|e| anyhow!("{case_id}: {e}"))?;
        let reference = direct_conv(&x, &taps, stride, dilation, padding);
        let candidate_ns = benchmark_avg_ns(50, || {
            conv1d_fft(&x, &taps, stride, dilation, padding)
                .map(|_| ())
                .map_err(|e| anyhow!("{case_id} benchmark failed: {e}"))
        })?;
        let reference_ns = benchmark_avg_ns(50, || {
            let _ = direct_conv(&x, &taps, stride, dilation, padding);
            Ok(())
        })?;
        rows.push(build_row(RowBuildInput {
            case_id,
            reference: "direct convolution",
            candidate: &candidate,
            expected: &reference,
            candidate_ns,
            reference_ns,
        })?);
    }

    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        sigkern_version: env!("CARGO_PKG_VERSION").to_string(),
        rows,
    };
    let json_path = out_dir.join("contracts.json");
    fs::write(&json_path, serde_json::to_string_pretty(&bundle)?)
        .with_context(|| format!("writing {}", json_path.display()))?;
    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;

    for row in &bundle.rows {
        println!(
            "{:<34} max_abs={:.3e} r={:.9} speedup={:.2}",
            row.case_id, row.max_abs, row.pearson_r, row.speedup_vs_reference
        );
    }
    println!("wrote {}", out_dir.display());
    Ok(())
}

/// AR(3) process with uniform excitation.
fn ar_process(rng: &mut StdRng, len: usize) -> Vec<f64> {
    let mut x = vec![0.0; len];
    for n in 3..len {
        let w: f64 = rng.random_range(-0.5..0.5);
        x[n] = 1.2 * x[n - 1] - 0.6 * x[n - 2] + 0.1 * x[n - 3] + w;
    }
    x
}

/// Solve `R a = r[1..]` with partial pivoting, `R[i][j] = r[|i-j|]`.
fn toeplitz_solve(r: &[f64]) -> Result<Vec<f64>> {
    let p = r.len() - 1;
    let mut m: Vec<Vec<f64>> = (0..p)
        .map(|i| {
            let mut row: Vec<f64> = (0..p).map(|j| r[i.abs_diff(j)]).collect();
            row.push(r[i + 1]);
            row
        })
        .collect();
    for col in 0..p {
        let pivot = (col..p)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .ok_or_else(|| anyhow!("empty system"))?;
        if m[pivot][col] == 0.0 {
            bail!("singular Toeplitz system at column {col}");
        }
        m.swap(col, pivot);
        for row in col + 1..p {
            let f = m[row][col] / m[col][col];
            for k in col..=p {
                m[row][k] -= f * m[col][k];
            }
        }
    }
    let mut a = vec![0.0; p];
    for i in (0..p).rev() {
        let tail: f64 = (i + 1..p).map(|k| m[i][k] * a[k]).sum();
        a[i] = (m[i][p] - tail) / m[i][i];
    }
    Ok(a)
}

fn reflection_of(ac: &[f64]) -> Result<Vec<f64>> {
    let order = ac.len() - 1;
    let mut ar = vec![0.0; order];
    let mut rc = vec![0.0; order];
    let mut snapshot = vec![0.0; order.saturating_sub(1)];
    sigkern::signal::lpc::levinson_durbin(ac, &mut ar, Some(rc.as_mut_slice()), &mut snapshot);
    if rc.iter().any(|k| !k.is_finite()) {
        bail!("non-finite reflection coefficients");
    }
    Ok(rc)
}

fn direct_conv(x: &[f64], taps: &[f64], stride: usize, dilation: usize, padding: usize) -> Vec<f64> {
    let mut xp = vec![0.0; padding];
    xp.extend_from_slice(x);
    xp.resize(xp.len() + padding, 0.0);
    let span = dilation * (taps.len() - 1) + 1;
    (0..)
        .map(|w| w * stride + span - 1)
        .take_while(|&base| base < xp.len())
        .map(|base| {
            taps.iter()
                .enumerate()
                .map(|(j, &k)| k * xp[base - j * dilation])
                .sum()
        })
        .collect()
}

fn interleave(values: &[Complex<f64>]) -> Vec<f64> {
    values.iter().flat_map(|c| [c.re, c.im]).collect()
}

fn ensure_same_length(case_id: &str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        bail!(
            "case {case_id} has mismatched output lengths: left={}, right={}",
            a.len(),
            b.len()
        );
    }
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

struct RowBuildInput<'a> {
    case_id: &'a str,
    reference: &'a str,
    candidate: &'a [f64],
    expected: &'a [f64],
    candidate_ns: f64,
    reference_ns: f64,
}

fn build_row(args: RowBuildInput<'_>) -> Result<ContractRow> {
    ensure_same_length(args.case_id, args.candidate, args.expected)?;
    Ok(ContractRow {
        case_id: args.case_id.to_string(),
        reference: args.reference.to_string(),
        len: args.candidate.len(),
        pearson_r: pearson(args.candidate, args.expected),
        mae: mean_abs_error(args.candidate, args.expected),
        rmse: root_mean_squared_error(args.candidate, args.expected),
        max_abs: max_abs_error(args.candidate, args.expected),
        candidate_ns: args.candidate_ns,
        reference_ns: args.reference_ns,
        speedup_vs_reference: args.reference_ns / args.candidate_ns,
    })
}

fn mean_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        / a.len() as f64
}

fn root_mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    (a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64)
        .sqrt()
}

fn max_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = *x - mean_a;
        let db = *y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        if a == b {
            1.0
        } else {
            0.0
        }
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,reference,len,pearson_r,mae,rmse,max_abs,candidate_ns,reference_ns,speedup_vs_reference\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{:.12},{:.12},{:.12},{:.12},{:.3},{:.3},{:.6}\n",
            row.case_id,
            row.reference,
            row.len,
            row.pearson_r,
            row.mae,
            row.rmse,
            row.max_abs,
            row.candidate_ns,
            row.reference_ns,
            row.speedup_vs_reference
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}
