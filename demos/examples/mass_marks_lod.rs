// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trickle Marks level of detail: draw a coarse layer of a large point set in
//! idle slices, zoom in on a neighborhood, then go back.
//!
//! Run:
//! - `cargo run -p trickle_demos --example mass_marks_lod`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::Point;
use trickle_marks::{MassMarks, MassMarksOptions};
use trickle_schedule::testing::ManualHost;
use trickle_schedule::{SchedulerState, Speed};

fn main() {
    let points: Vec<Point> = (0..200)
        .flat_map(|y| (0..200).map(move |x| Point::new(f64::from(x), f64::from(y))))
        .collect();

    let host = Rc::new(ManualHost::new());
    let drawn = Rc::new(Cell::new(0_usize));
    let sink = drawn.clone();
    let clock = host.clone();
    let options = MassMarksOptions::default()
        .with_kd(true)
        .with_layer(Some(8))
        .with_speed(Speed::Smooth);
    let marks = MassMarks::new(
        host.clone(),
        points,
        move |_: &Point| {
            // Each point costs a hundredth of a millisecond.
            clock.advance(0.01);
            sink.set(sink.get() + 1);
        },
        options,
    )
    .unwrap();

    let slices = host.run_idle_until_idle(1.0, usize::MAX);
    println!(
        "layer 8: drew {} of {} points in {} slices",
        drawn.get(),
        marks.len(),
        slices
    );
    assert_eq!(drawn.get(), 255);
    assert_eq!(marks.scheduler().state(), SchedulerState::Finished);

    // Pointer hovers near (50, 50): show its neighborhood at full detail.
    drawn.set(0);
    let found = marks.preview_nearest(Point::new(50.0, 50.0), 64, 10.0 * 10.0);
    host.run_idle_until_idle(1.0, usize::MAX);
    println!("preview: {} neighbors drawn", drawn.get());
    assert_eq!(drawn.get(), found);

    drawn.set(0);
    marks.restore();
    host.run_idle_until_idle(1.0, usize::MAX);
    println!("restored: drew {} points", drawn.get());
    assert_eq!(drawn.get(), 255);
}
