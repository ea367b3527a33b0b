// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use trickle_index::PagedSequence;
use trickle_schedule::testing::ManualHost;
use trickle_schedule::{FrameAnimationScheduler, IdleConfig, IdleWorkScheduler, Spirit, Speed};

fn bench_idle_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_session");
    let n = 100_000_usize;
    group.throughput(Throughput::Elements(n as u64));
    for speed in [Speed::Fast, Speed::Smooth] {
        group.bench_function(format!("{:?}_4ms_slices", speed), |b| {
            b.iter_batched(
                || {
                    let host = Rc::new(ManualHost::new());
                    let sum = Rc::new(Cell::new(0_usize));
                    let s = Rc::clone(&sum);
                    let sched = IdleWorkScheduler::new(
                        host.clone(),
                        PagedSequence::from_vec((0..n).collect()),
                        move |v: &usize| s.set(s.get().wrapping_add(*v)),
                        IdleConfig::default().with_throughput(speed),
                    )
                    .unwrap();
                    (host, sched, sum)
                },
                |(host, sched, sum)| {
                    sched.start();
                    host.run_idle_until_idle(4.0, usize::MAX);
                    black_box(sum.get())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.bench_function("blocking_layer_limit_16", |b| {
        b.iter_batched(
            || PagedSequence::from_vec((0..n).collect::<Vec<usize>>()),
            |seq| {
                let host = Rc::new(ManualHost::new());
                let config = IdleConfig::blocking().with_layer_limit(Some(16));
                let sched = IdleWorkScheduler::new(host, seq, |v: &usize| {
                    black_box(v);
                }, config)
                .unwrap();
                sched.start();
                black_box(sched.processed())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_animation");
    for &spirits in &[100_usize, 1_000] {
        group.throughput(Throughput::Elements(spirits as u64));
        group.bench_function(format!("spirits{}_to_settle", spirits), |b| {
            b.iter_batched(
                || {
                    let host = Rc::new(ManualHost::new());
                    let frames = FrameAnimationScheduler::new(host.clone());
                    for i in 0..spirits {
                        let spirit = Spirit::animated(0.0, i as f64, |v, _| {
                            black_box(v);
                        })
                        .with_split_count(30);
                        frames.add_spirit(spirit).unwrap();
                    }
                    (host, frames)
                },
                |(host, frames)| {
                    host.run_frames(usize::MAX);
                    black_box(frames.frames())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_idle_session, bench_frames);
criterion_main!(benches);
