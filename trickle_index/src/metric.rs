// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Distance metrics used by the k-d tree.
//!
//! A metric must be non-negative and monotone in each per-axis difference:
//! moving a point closer to the query along one axis never increases the
//! distance. Nearest-neighbor pruning relies on this to bound whole subtrees by
//! the closest point of their bounding box.

use crate::types::Coords;

/// Distance between two points.
pub trait Metric {
    /// Distance from `a` to `b`.
    fn distance(&self, a: Coords, b: Coords) -> f64;
}

/// Squared Euclidean distance. Avoids square roots and preserves ordering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SquaredEuclidean;

impl Metric for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: Coords, b: Coords) -> f64 {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        dx * dx + dy * dy
    }
}

/// Manhattan (taxicab) distance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Manhattan;

impl Metric for Manhattan {
    #[inline]
    fn distance(&self, a: Coords, b: Coords) -> f64 {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        let ax = if dx < 0.0 { -dx } else { dx };
        let ay = if dy < 0.0 { -dy } else { dy };
        ax + ay
    }
}

impl<F> Metric for F
where
    F: Fn(Coords, Coords) -> f64,
{
    #[inline]
    fn distance(&self, a: Coords, b: Coords) -> f64 {
        self(a, b)
    }
}
