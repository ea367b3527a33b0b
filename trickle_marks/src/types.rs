// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types shared by the consumers: change flags and coordinate transforms.

use alloc::rc::Rc;
use core::fmt;

use kurbo::{Affine, Point};

bitflags::bitflags! {
    /// Which parts of a consumer's configuration an update touched.
    ///
    /// A consumer re-renders when the set is non-empty.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Changed: u8 {
        /// The item list was replaced.
        const DATA      = 0b0000_0001;
        /// The coordinate transform was replaced by a different one.
        const TRANSFORM = 0b0000_0010;
        /// The geometry accessor was replaced.
        const GEOMETRY  = 0b0000_0100;
        /// Stroke or fill styling changed.
        const STYLE     = 0b0000_1000;
        /// The arc chord-to-radius rate changed.
        const RATE      = 0b0001_0000;
        /// The scheduler throughput changed.
        const THROUGHPUT = 0b0010_0000;
    }
}

/// Maps data coordinates to surface coordinates.
///
/// Cheap to clone. Two transforms compare as the same only when they are
/// clones of one another, which is what change detection needs.
#[derive(Clone, Default)]
pub struct CoordinateTransform(Option<Rc<dyn Fn(Point) -> Point>>);

impl CoordinateTransform {
    /// The transform that leaves points unchanged.
    pub const fn identity() -> Self {
        Self(None)
    }

    /// Wrap a point mapping.
    pub fn new(f: impl Fn(Point) -> Point + 'static) -> Self {
        Self(Some(Rc::new(f)))
    }

    /// Map one point.
    pub fn apply(&self, p: Point) -> Point {
        match &self.0 {
            Some(f) => f(p),
            None => p,
        }
    }

    /// Whether this is the identity.
    pub fn is_identity(&self) -> bool {
        self.0.is_none()
    }

    /// Whether both are the same transform instance.
    pub fn same_as(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Affine> for CoordinateTransform {
    fn from(affine: Affine) -> Self {
        Self::new(move |p| affine * p)
    }
}

impl fmt::Debug for CoordinateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CoordinateTransform")
            .field(&if self.is_identity() { "identity" } else { "custom" })
            .finish()
    }
}
