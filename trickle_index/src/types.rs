// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;

/// Coordinates of a point in 2D, `[x, y]`.
pub type Coords = [f64; 2];

/// Splitting axis of a k-d tree level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal (`coords[0]`).
    X,
    /// Vertical (`coords[1]`).
    Y,
}

impl Axis {
    /// Axis used at the given tree depth; alternates starting with `X`.
    pub const fn at_depth(depth: usize) -> Self {
        if depth % 2 == 0 { Self::X } else { Self::Y }
    }

    /// Index of this axis into a [`Coords`] pair.
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

/// Axis-aligned bounding box in 2D.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Degenerate box covering a single point.
    pub const fn from_point(x: T, y: T) -> Self {
        Self::new(x, y, x, y)
    }

    /// Whether this AABB contains the point.
    pub fn contains_point(&self, x: T, y: T) -> bool {
        le(self.min_x, x) && le(self.min_y, y) && le(x, self.max_x) && le(y, self.max_y)
    }

    /// Smallest AABB covering both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: min_t(self.min_x, other.min_x),
            min_y: min_t(self.min_y, other.min_y),
            max_x: max_t(self.max_x, other.max_x),
            max_y: max_t(self.max_y, other.max_y),
        }
    }

    /// The point of this box closest to `(x, y)`.
    ///
    /// Returns the point itself when it lies inside the box.
    pub fn clamp_point(&self, x: T, y: T) -> (T, T) {
        (
            min_t(max_t(x, self.min_x), self.max_x),
            min_t(max_t(y, self.min_y), self.max_y),
        )
    }
}

impl Aabb2D<f64> {
    /// Bounding box of a set of coordinates, or `None` when empty.
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coords>) -> Option<Self> {
        let mut it = coords.into_iter();
        let first = it.next()?;
        let start = Self::from_point(first[0], first[1]);
        Some(it.fold(start, |acc, c| acc.union(&Self::from_point(c[0], c[1]))))
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

/// Total order over floats used for sorting coordinates and distances.
///
/// NaN sorts as equal, which keeps sorting deterministic for finite inputs.
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
