//! Benchmarks for Vector operations comparing Scalar vs SSE2 vs AVX2 backends
//!
//! # Benchmark Methodology
//!
//! - Vector sizes: 100, 1000, 10000 elements
//! - Backends selected explicitly through `Vector::with_backend`
//! - Dense operands exercise the lane kernels, strided operands the
//!   element-by-element path
//! - Throughput reported in elements/second

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dlinalg::{Backend, Storage, Vector};

const SIZES: [usize; 3] = [100, 1000, 10000];

/// Generate test data for benchmarks
fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size).map(|i| (i as f64) * 0.5).collect()
}

/// Backends available on this machine
fn backends() -> Vec<(&'static str, Backend)> {
    [
        ("Scalar", Backend::Scalar),
        ("SSE2", Backend::SSE2),
        ("AVX2", Backend::AVX2),
    ]
    .into_iter()
    .filter(|(_, backend)| backend.is_available())
    .collect()
}

fn vector(data: &[f64], backend: Backend) -> Vector {
    Vector::from_slice(data)
        .with_backend(backend)
        .expect("backend filtered by availability")
}

/// Benchmark in-place element-wise addition
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let data = generate_test_data(size);

        for (name, backend) in backends() {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, _| {
                let mut a = vector(&data, backend);
                let b = vector(&data, backend);
                bencher.iter(|| {
                    black_box(a.add(black_box(&b)).unwrap());
                });
            });
        }
    }

    group.finish();
}

/// Benchmark `self += alpha * y`
fn bench_fma(c: &mut Criterion) {
    let mut group = c.benchmark_group("fma");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let data = generate_test_data(size);

        for (name, backend) in backends() {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, _| {
                let mut a = vector(&data, backend);
                let b = vector(&data, backend);
                bencher.iter(|| {
                    black_box(a.fma(1e-9, black_box(&b)).unwrap());
                });
            });
        }
    }

    group.finish();
}

/// Benchmark dot product
fn bench_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let data = generate_test_data(size);

        for (name, backend) in backends() {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, _| {
                let a = vector(&data, backend);
                let b = vector(&data, backend);
                bencher.iter(|| black_box(a.dot(black_box(&b)).unwrap()));
            });
        }
    }

    group.finish();
}

/// Benchmark sum reduction
fn bench_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let data = generate_test_data(size);

        for (name, backend) in backends() {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, _| {
                let a = vector(&data, backend);
                bencher.iter(|| black_box(a.sum()));
            });
        }
    }

    group.finish();
}

/// Benchmark a transcendental unary op
fn bench_exp(c: &mut Criterion) {
    let mut group = c.benchmark_group("exp");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let data: Vec<f64> = (0..size).map(|i| (i % 10) as f64 * 0.1).collect();

        for (name, backend) in backends() {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, _| {
                let a = vector(&data, backend);
                let mut out = Vector::zeros(size);
                bencher.iter(|| {
                    a.exp_to(black_box(&mut out)).unwrap();
                });
            });
        }
    }

    group.finish();
}

/// Dense fast path vs strided generic path for the same logical values
fn bench_layout_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_paths");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        let dense = Vector::from_vec(generate_test_data(size));
        let strided = Vector::wrap_strided(
            Storage::from_vec(generate_test_data(2 * size)),
            0,
            2,
            size,
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("dense_sum", size), &dense, |bencher, v| {
            bencher.iter(|| black_box(v.sum()));
        });
        group.bench_with_input(BenchmarkId::new("strided_sum", size), &strided, |bencher, v| {
            bencher.iter(|| black_box(v.sum()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add,
    bench_fma,
    bench_dot,
    bench_sum,
    bench_exp,
    bench_layout_paths
);
criterion_main!(benches);
