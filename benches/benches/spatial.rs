// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use trickle_index::{Coords, KdTree, PagedSequence};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_points(count: usize, extent: f64, seed: u64) -> Vec<Coords> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| [rng.next_f64() * extent, rng.next_f64() * extent])
        .collect()
}

fn gen_clustered(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Coords> {
    let mut rng = Rng::new(0xC1A5_7E2D);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let (cx, cy) = (rng.next_f64() * 10_000.0, rng.next_f64() * 10_000.0);
        for _ in 0..per_cluster {
            out.push([
                cx + (rng.next_f64() - 0.5) * spread,
                cy + (rng.next_f64() - 0.5) * spread,
            ]);
        }
    }
    out
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_build");
    for &n in &[1_000_usize, 10_000, 100_000] {
        let points = gen_points(n, 1000.0, 42);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("uniform_n{}", n), |b| {
            b.iter_batched(
                || points.clone(),
                |pts| black_box(KdTree::from_items(pts, |p| *p)),
                BatchSize::LargeInput,
            );
        });
    }
    let clustered = gen_clustered(100, 1_000, 50.0);
    group.throughput(Throughput::Elements(clustered.len() as u64));
    group.bench_function("clustered_n100000", |b| {
        b.iter_batched(
            || clustered.clone(),
            |pts| black_box(KdTree::from_items(pts, |p| *p)),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_linearize(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_linearize");
    for &n in &[10_000_usize, 100_000] {
        let tree = KdTree::from_items(gen_points(n, 1000.0, 7), |p| *p);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("clone_n{}", n), |b| {
            b.iter(|| black_box(tree.linearize()));
        });
        let points = gen_points(n, 1000.0, 7);
        group.bench_function(format!("into_n{}", n), |b| {
            b.iter_batched(
                || KdTree::from_items(points.clone(), |p| *p),
                |tree| black_box(tree.into_linearized()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_nearest");
    let tree = KdTree::from_items(gen_points(100_000, 1000.0, 99), |p| *p);
    let queries = gen_points(256, 1000.0, 3);
    for &k in &[1_usize, 5, 50] {
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_function(format!("k{}_unbounded", k), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(tree.nearest(*q, k, f64::INFINITY));
                }
            });
        });
    }
    group.bench_function("k50_radius25", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(tree.nearest(*q, 50, 25.0 * 25.0));
            }
        });
    });
    group.finish();
}

fn bench_paged(c: &mut Criterion) {
    let mut group = c.benchmark_group("paged_sequence");
    let n = 200_000_usize;
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("push_n200000", |b| {
        b.iter(|| {
            let mut seq = PagedSequence::new();
            for i in 0..n {
                seq.push(i);
            }
            black_box(seq)
        });
    });
    let seq: PagedSequence<usize> = (0..n).collect();
    group.bench_function("iter_from_mid", |b| {
        b.iter(|| black_box(seq.iter_from(n / 2).sum::<usize>()));
    });
    group.bench_function("shift_drain", |b| {
        b.iter_batched(
            || seq.clone(),
            |mut s| {
                while let Some(v) = s.shift() {
                    black_box(v);
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_linearize,
    bench_nearest,
    bench_paged
);
criterion_main!(benches);
