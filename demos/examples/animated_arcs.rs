// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trickle Marks animated arcs: grow flow lines between endpoint pairs, one
//! frame at a time, and report when they all land.
//!
//! Run:
//! - `cargo run -p trickle_demos --example animated_arcs`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Affine, Point};
use trickle_marks::recording::{DrawCommand, RecordingSurface};
use trickle_marks::{AnimatedArcs, AnimatedArcsOptions, ArcsUpdate, CoordinateTransform};
use trickle_schedule::Curve;
use trickle_schedule::testing::ManualHost;

fn main() {
    let host = Rc::new(ManualHost::new());
    let surface = Rc::new(RefCell::new(RecordingSurface::new(400, 300)));
    let routes = vec![
        [Point::new(20.0, 200.0), Point::new(180.0, 200.0)],
        [Point::new(60.0, 250.0), Point::new(300.0, 120.0)],
        [Point::new(350.0, 80.0), Point::new(100.0, 60.0)],
    ];
    let options = AnimatedArcsOptions {
        rate: 1.0,
        split_count: 20,
        curve: Curve::EaseInOut,
        ..AnimatedArcsOptions::default()
    };
    let mut arcs = AnimatedArcs::new(
        host.clone(),
        surface.clone(),
        routes,
        CoordinateTransform::identity(),
        options,
    )
    .unwrap();

    let landed = Rc::new(Cell::new(0));
    let l = landed.clone();
    arcs.set_on_animation_end(move || l.set(l.get() + 1));

    arcs.render();
    let frames = host.run_frames(100);
    let strokes = surface
        .borrow()
        .count(|c| matches!(c, DrawCommand::StrokeArc(..)));
    println!("{frames} frames, {strokes} arc strokes, landed {} time(s)", landed.get());
    assert_eq!(landed.get(), 1);

    // Zoom the view 2x around the origin: the arcs grow again in the new space.
    surface.borrow_mut().take_commands();
    let changed = arcs
        .set_options(ArcsUpdate::new().transform(Affine::scale(0.5)))
        .unwrap();
    println!("changed: {:?}", changed);
    host.run_frames(100);
    assert_eq!(landed.get(), 2);
}
