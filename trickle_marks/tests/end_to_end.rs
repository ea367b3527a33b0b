// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level-of-detail rendering and nearest lookup over a large random point set.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::Point;
use trickle_marks::{MassMarks, MassMarksOptions};
use trickle_schedule::testing::ManualHost;
use trickle_schedule::{SchedulerState, Speed};

struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn random_points(n: usize) -> Vec<Point> {
    let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
    (0..n)
        .map(|_| {
            let x = rng.next_f64() * 2000.0 - 1000.0;
            Point::new(x, rng.next_f64() * 2000.0 - 1000.0)
        })
        .collect()
}

#[test]
fn layer_ten_draws_1023_then_nearest_matches_brute_force() {
    let host = Rc::new(ManualHost::new());
    let points = random_points(10_000);
    let drawn = Rc::new(Cell::new(0_usize));
    let d = Rc::clone(&drawn);
    let options = MassMarksOptions::default()
        .with_kd(true)
        .with_layer(Some(10))
        .with_speed(Speed::Smooth);
    let draw = move |_: &Point| d.set(d.get() + 1);
    let marks = MassMarks::new(host.clone(), points.clone(), draw, options).unwrap();

    // 128 items per millisecond: 2 ms slices need several rounds.
    let slices = host.run_idle_until_idle(2.0, 1000);
    assert!(slices > 1);
    assert_eq!(drawn.get(), 1023);
    assert_eq!(marks.scheduler().state(), SchedulerState::Finished);
    assert_eq!(host.pending_idle(), 0);

    let found = marks.nearest(Point::ORIGIN, 5, f64::INFINITY);
    let mut brute: Vec<(f64, Point)> = points
        .iter()
        .map(|p| (p.to_vec2().hypot2(), *p))
        .collect();
    brute.sort_by(|a, b| a.0.total_cmp(&b.0));
    let expected: Vec<(Point, f64)> = brute[..5].iter().map(|&(d, p)| (p, d)).collect();
    let got: Vec<(Point, f64)> = found.iter().map(|&(p, d)| (*p, d)).collect();
    assert_eq!(got, expected);
}

#[test]
fn preview_then_restore_round_trip() {
    let host = Rc::new(ManualHost::new());
    let seen: Rc<RefCell<Vec<Point>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let options = MassMarksOptions::default().with_kd(true).with_layer(Some(4));
    let draw = move |p: &Point| sink.borrow_mut().push(*p);
    let marks = MassMarks::new(host.clone(), random_points(500), draw, options).unwrap();
    host.run_idle_until_idle(16.0, 10);
    assert_eq!(seen.borrow().len(), 15);

    seen.borrow_mut().clear();
    let hits = marks.preview_nearest(Point::new(200.0, -300.0), 40, f64::INFINITY);
    assert_eq!(hits, 40);
    host.run_idle_until_idle(16.0, 10);
    assert_eq!(seen.borrow().len(), 40);

    seen.borrow_mut().clear();
    marks.restore();
    host.run_idle_until_idle(16.0, 10);
    assert_eq!(seen.borrow().len(), 15);
}
