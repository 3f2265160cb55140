use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use evalgate_stats::describe;

fn scores(n: usize) -> Vec<f64> {
    (0..n).map(|i| ((i * 37) % 101) as f64).collect()
}

fn bench_describe(c: &mut Criterion) {
    let mut group = c.benchmark_group("describe");
    for n in [100usize, 1_000, 10_000, 50_000] {
        let values = scores(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, v| {
            b.iter(|| describe(black_box(v)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_describe);
criterion_main!(benches);
