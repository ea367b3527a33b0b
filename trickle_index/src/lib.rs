// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trickle_index --heading-base-level=0

//! Trickle Index: paged storage and a progressive-detail k-d tree.
//!
//! Trickle Index holds the data side of progressive rendering.
//!
//! - [`PagedSequence`] stores large datasets in fixed-capacity pages and is read
//!   sequentially by a scheduler cursor.
//! - [`KdTree`] builds a balanced 2D k-d tree for a pluggable [`Metric`] and a
//!   dimension selector, answers nearest-neighbor queries, and linearizes itself
//!   breadth-first so that every prefix of length `2^L - 1` is an evenly spread
//!   sample at level `L`.
//!
//! # Example
//!
//! ```rust
//! use trickle_index::KdTree;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Mark { x: f64, y: f64 }
//!
//! let marks: Vec<Mark> = (0..100)
//!     .map(|i| Mark { x: (i % 10) as f64, y: (i / 10) as f64 })
//!     .collect();
//! let tree = KdTree::from_items(marks, |m| [m.x, m.y]);
//!
//! // The first three items are the root and its two children.
//! let coarse = tree.linearize();
//! assert_eq!(coarse.len(), 100);
//! assert_eq!(coarse.iter().take(3).count(), 3);
//!
//! // Two closest marks to the origin, nearest first.
//! let hits = tree.nearest([0.0, 0.0], 2, f64::INFINITY);
//! assert_eq!(hits[0].0, &Mark { x: 0.0, y: 0.0 });
//! assert_eq!(hits[0].1, 0.0);
//! assert_eq!(hits[1].1, 1.0);
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for coordinates or distances. NaN compares equal
//! to everything when sorting, which keeps builds deterministic but makes the
//! resulting order meaningless.

#![no_std]

extern crate alloc;

pub mod kdtree;
pub mod metric;
pub mod paged;
pub mod types;

pub use kdtree::{BreadthFirst, KdTree};
pub use metric::{Manhattan, Metric, SquaredEuclidean};
pub use paged::{DEFAULT_PAGE_CAPACITY, PagedSequence};
pub use types::{Aabb2D, Axis, Coords};
