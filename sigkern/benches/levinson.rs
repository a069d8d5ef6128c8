use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::ThreadRng;
use rand::Rng;
use sigkern::kernel::KernelLifecycle;
use sigkern::layout::{Layout, Shape4};
use sigkern::signal::lpc::{
    AcToArKernel, AutocovOptions, LpcConfig, SigToArConfig, SigToArKernel,
};
use sigkern::signal::traits::LinearPredict;

/// `lanes` noisy AR(2) signals of `len` samples each, laid out lane after lane.
fn ar2_signals(mut rng: ThreadRng, lanes: usize, len: usize) -> Vec<f64> {
    let mut x = vec![0.0; lanes * len];
    for lane in x.chunks_mut(len) {
        for n in 2..len {
            let w: f64 = rng.random_range(-0.5..0.5);
            lane[n] = 0.75 * lane[n - 1] - 0.5 * lane[n - 2] + w;
        }
    }
    x
}

/// AR fit straight from the signal, along the last axis and along axis 1.
fn sig2ar_lanes(c: &mut Criterion) {
    let len = 1024;
    let x = ar2_signals(rand::rng(), 32, len);
    let mut group = c.benchmark_group("sig2ar");
    for order in [8usize, 32] {
        for (label, shape, axis) in [
            ("contiguous", Shape4::new(1, 4, 8, len), 3),
            ("strided", Shape4::new(4, len, 8, 1), 1),
        ] {
            let kernel = SigToArKernel::<f64>::try_new(SigToArConfig {
                shape,
                layout: Layout::RowMajor,
                axis,
                order,
                options: AutocovOptions {
                    zero_mean: true,
                    ..Default::default()
                },
            })
            .expect("sig2ar kernel config should be valid");
            let mut ar = vec![0.0; kernel.output_shape().len()];
            let mut var = vec![0.0; kernel.variance_shape().len()];
            group.bench_with_input(BenchmarkId::new(label, order), &x, |bench, x| {
                bench.iter(|| kernel.run_into(black_box(x), &mut ar, &mut var))
            });
        }
    }
    group.finish();
}

/// The recursion alone on a precomputed autocovariance tensor.
fn ac2ar_lanes(c: &mut Criterion) {
    let order = 64;
    let lanes = 256;
    let mut ac = vec![0.0; lanes * (order + 1)];
    for (v, lane) in ac.chunks_mut(order + 1).enumerate() {
        let rho = 0.2 + 0.7 * (v as f64 / lanes as f64);
        for (l, r) in lane.iter_mut().enumerate() {
            *r = rho.powi(l as i32);
        }
    }
    let kernel = AcToArKernel::<f64>::try_new(LpcConfig {
        shape: Shape4::new(lanes, 1, 1, order + 1),
        layout: Layout::RowMajor,
        axis: 3,
    })
    .expect("ac2ar kernel config should be valid");
    let mut ar = vec![0.0; kernel.output_shape().len()];
    let mut var = vec![0.0; lanes];
    c.bench_with_input(BenchmarkId::new("ac2ar", order), &ac, |bench, ac| {
        bench.iter(|| kernel.run_into(black_box(ac), &mut ar, &mut var))
    });
}

criterion_group!(benches, sig2ar_lanes, ac2ar_lanes);
criterion_main!(benches);
