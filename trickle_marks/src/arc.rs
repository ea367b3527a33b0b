// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circle-through-two-points geometry for arc overlays.
//!
//! A chord between two endpoints and a rate `chord / radius` in `(0, 2]` fix a
//! radius; two circles of that radius pass through both endpoints, one on each
//! side of the chord. [`AnimatedArcs`](crate::AnimatedArcs) solves this once for
//! the unit chord `(0, 0)-(1, 0)` and maps the result onto every real chord with
//! [`transformed_circle`].
//!
//! Angles follow the surface convention: measured from the positive `x` axis
//! with `y` pointing down, so they grow clockwise on screen and angles in
//! `[π, 2π)` lie above the center.

use core::f64::consts::{PI, TAU};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Arc, Circle, Point, Vec2};

use crate::error::MarksError;

/// An arc in canvas terms: start and end angle plus a direction flag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CanvasArc {
    /// Circle center.
    pub center: Point,
    /// Circle radius.
    pub radius: f64,
    /// Angle the stroke starts at, in radians.
    pub start_angle: f64,
    /// Angle the stroke ends at, in radians.
    pub end_angle: f64,
    /// Walk from start to end against increasing angles.
    pub anticlockwise: bool,
}

impl CanvasArc {
    /// Signed angle actually swept, in `[-2π, 2π]`.
    ///
    /// Uses the 2D canvas rule: the stroke walks from `start_angle` in the
    /// chosen direction until it reaches `end_angle`, and a span of a full
    /// turn or more draws the whole circle.
    pub fn sweep(&self) -> f64 {
        let delta = self.end_angle - self.start_angle;
        if self.anticlockwise {
            if -delta >= TAU {
                -TAU
            } else {
                -normalize_angle(-delta)
            }
        } else if delta >= TAU {
            TAU
        } else {
            normalize_angle(delta)
        }
    }

    /// The same arc as a Kurbo [`Arc`].
    pub fn to_kurbo(&self) -> Arc {
        Arc {
            center: self.center,
            radii: Vec2::new(self.radius, self.radius),
            start_angle: self.start_angle,
            sweep_angle: self.sweep(),
            x_rotation: 0.0,
        }
    }

    /// Point on the circle at `angle`.
    pub fn point_at(&self, angle: f64) -> Point {
        self.center + Vec2::from_angle(angle) * self.radius
    }
}

/// The two circles of radius `|p2 - p1| / rate` through `p1` and `p2`.
///
/// With `rate == 2` the chord is a diameter and both circles coincide.
pub fn circles_through(p1: Point, p2: Point, rate: f64) -> Result<[Circle; 2], MarksError> {
    check_rate(rate)?;
    let chord = p2 - p1;
    let length = chord.hypot();
    if length == 0.0 {
        return Err(MarksError::CoincidentPoints);
    }
    let radius = length / rate;
    let half = length / 2.0;
    let offset = (radius * radius - half * half).max(0.0).sqrt();
    let normal = Vec2::new(chord.y, -chord.x) / length;
    let mid = p1.midpoint(p2);
    Ok([
        Circle::new(mid + normal * offset, radius),
        Circle::new(mid - normal * offset, radius),
    ])
}

/// The circles through the unit chord `(0, 0)-(1, 0)`.
pub fn unit_circles(rate: f64) -> Result<[Circle; 2], MarksError> {
    circles_through(Point::ORIGIN, Point::new(1.0, 0.0), rate)
}

/// Map a circle solved for the unit chord onto the chord `p1-p2`.
///
/// The unit chord is scaled to the chord length, rotated to its direction and
/// moved to `p1`, so the radius scales by the chord length too.
pub fn transformed_circle(p1: Point, p2: Point, unit: Circle) -> Circle {
    let chord = p2 - p1;
    let length = chord.hypot();
    let to_chord =
        Affine::translate(p1.to_vec2()) * Affine::rotate(chord.atan2()) * Affine::scale(length);
    Circle::new(to_chord * unit.center, unit.radius * length)
}

/// Wrap `angle` into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle % TAU;
    let wrapped = if wrapped < 0.0 { wrapped + TAU } else { wrapped };
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Direction of `v` in `[0, 2π)`.
pub fn angle_of(v: Vec2) -> f64 {
    normalize_angle(v.atan2())
}

/// Re-express `end` so that walking from `start` to it takes the short way
/// round.
///
/// The result is `start + d` with `d` in `(-π, π]`.
pub fn delivered_end_angle(start: f64, end: f64) -> f64 {
    let mut delta = normalize_angle(end - start);
    if delta > PI {
        delta -= TAU;
    }
    start + delta
}

/// Whether reaching `end` from `start` clockwise takes more than half a turn,
/// in which case the arc should be drawn anticlockwise instead.
pub fn is_anticlockwise(start: f64, end: f64) -> bool {
    let end = if end < start { end + TAU } else { end };
    end - start > PI
}

fn check_rate(rate: f64) -> Result<(), MarksError> {
    if rate.is_nan() || rate <= 0.0 || rate > 2.0 {
        return Err(MarksError::RateOutOfRange(rate));
    }
    Ok(())
}

/// The short arc of `circle` from `p1` to `p2`, if it lies above the center.
///
/// The arc's mid angle decides: it must fall in `[π, 2π)`.
pub fn upper_arc(circle: Circle, p1: Point, p2: Point) -> Option<CanvasArc> {
    let start_angle = angle_of(p1 - circle.center);
    let end_angle = delivered_end_angle(start_angle, angle_of(p2 - circle.center));
    if normalize_angle((start_angle + end_angle) / 2.0) < PI {
        return None;
    }
    Some(CanvasArc {
        center: circle.center,
        radius: circle.radius,
        start_angle,
        end_angle,
        anticlockwise: is_anticlockwise(start_angle, end_angle),
    })
}
