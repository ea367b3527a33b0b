// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trickle_marks --heading-base-level=0

//! Trickle Marks: progressive renderers built on the Trickle schedulers.
//!
//! Each renderer turns a dataset into draw calls on a [`Surface`] without ever
//! blocking its host for longer than one idle slice or one display frame.
//!
//! - [`MassMarks`]: hundreds of thousands of points, drawn in a shuffled or
//!   k-d tree order so partial renders look like a coarse version of the
//!   final one. With the tree, a layer limit gives a level-of-detail view and
//!   nearest-neighbor lookups can temporarily replace the view with the hits.
//! - [`Paths`]: one polyline per item with per-item styling.
//! - [`Grid`]: filled cells, caching the pixels of each distinct cell look and
//!   pasting them for repeats.
//! - [`AnimatedArcs`]: arcs that grow from one endpoint to the other, one frame
//!   per step.
//!
//! ## Surfaces
//!
//! [`Surface`] is the drawing contract, expressed with Kurbo geometry. No
//! rasterizer ships here; [`recording::RecordingSurface`] logs commands and
//! keeps a small raster for tests and demos.
//!
//! ## Updates
//!
//! Renderers take partial updates and report what they touched as
//! [`Changed`]. A non-empty set restarts rendering so old and new
//! configuration never mix on screen.
//!
//! ## Example
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//! use kurbo::Point;
//! use trickle_marks::{MassMarks, MassMarksOptions};
//! use trickle_schedule::testing::ManualHost;
//!
//! let host = Rc::new(ManualHost::new());
//! let points: Vec<Point> = (0..1000).map(|i| Point::new(f64::from(i % 37), f64::from(i / 37))).collect();
//! let drawn = Rc::new(Cell::new(0));
//! let d = drawn.clone();
//! let options = MassMarksOptions::default().with_kd(true).with_layer(Some(5));
//! let marks = MassMarks::new(host.clone(), points, move |_: &Point| d.set(d.get() + 1), options).unwrap();
//!
//! host.run_idle_until_idle(16.0, 100);
//! assert_eq!(drawn.get(), 31);
//! assert_eq!(marks.nearest(Point::ORIGIN, 1, f64::INFINITY)[0].1, 0.0);
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to Kurbo's `std` feature.
//! - `libm`: forwards to Kurbo's `libm` feature for `no_std` builds.

#![no_std]

extern crate alloc;

pub mod animated_arcs;
pub mod arc;
pub mod error;
pub mod grid;
pub mod mass_marks;
pub mod paths;
pub mod recording;
pub mod surface;
pub mod types;

pub use animated_arcs::{AnimatedArcs, AnimatedArcsOptions, ArcsUpdate, Endpoints};
pub use arc::CanvasArc;
pub use error::MarksError;
pub use grid::{Grid, GridCell, Placement};
pub use mass_marks::{DEFAULT_SEED, MassMarks, MassMarksOptions, Positioned};
pub use paths::{DEFAULT_PATH_STYLE, PathFn, Paths, PathsOptions, PathsUpdate, StyleFn};
pub use surface::{LineStyle, PixelBlock, Rgba, Surface};
pub use types::{Changed, CoordinateTransform};
