// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpolation curves for spirits.

use alloc::rc::Rc;
use core::fmt;

/// Maps `(from, to, rate)` to an in-between value, with `rate` in `[0, 1]`.
///
/// Curves are pure: the same inputs always give the same value.
#[derive(Clone, Default)]
pub enum Curve {
    /// `from * (1 - rate) + to * rate`.
    #[default]
    Linear,
    /// Hold `from` until `rate >= at`, then jump to `to`.
    Step {
        /// Switch-over point in `[0, 1]`.
        at: f64,
    },
    /// Smoothstep easing, slow at both ends.
    EaseInOut,
    /// Caller-supplied curve.
    Custom(Rc<dyn Fn(f64, f64, f64) -> f64>),
}

impl Curve {
    /// Step at the halfway point, for overlays that appear late.
    pub const fn delayed() -> Self {
        Self::Step { at: 0.5 }
    }

    /// Wrap a closure as a curve.
    pub fn custom(curve: impl Fn(f64, f64, f64) -> f64 + 'static) -> Self {
        Self::Custom(Rc::new(curve))
    }

    /// Evaluate the curve. `rate` is clamped to `[0, 1]`.
    pub fn eval(&self, from: f64, to: f64, rate: f64) -> f64 {
        let rate = rate.clamp(0.0, 1.0);
        match self {
            Self::Linear => lerp(from, to, rate),
            Self::Step { at } => {
                if rate >= *at {
                    to
                } else {
                    from
                }
            }
            Self::EaseInOut => lerp(from, to, rate * rate * (3.0 - 2.0 * rate)),
            Self::Custom(curve) => curve(from, to, rate),
        }
    }
}

fn lerp(from: f64, to: f64, rate: f64) -> f64 {
    from * (1.0 - rate) + to * rate
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("Linear"),
            Self::Step { at } => f.debug_struct("Step").field("at", at).finish(),
            Self::EaseInOut => f.write_str("EaseInOut"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_endpoints_and_midpoint() {
        let c = Curve::Linear;
        assert_eq!(c.eval(2.0, 6.0, 0.0), 2.0);
        assert_eq!(c.eval(2.0, 6.0, 1.0), 6.0);
        assert_eq!(c.eval(2.0, 6.0, 0.5), 4.0);
        assert_eq!(c.eval(2.0, 6.0, 3.0), 6.0);
    }

    #[test]
    fn delayed_holds_then_jumps() {
        let c = Curve::delayed();
        assert_eq!(c.eval(0.0, 1.0, 0.49), 0.0);
        assert_eq!(c.eval(0.0, 1.0, 0.5), 1.0);
    }

    #[test]
    fn ease_is_symmetric() {
        let c = Curve::EaseInOut;
        assert_eq!(c.eval(0.0, 1.0, 0.5), 0.5);
        let a = c.eval(0.0, 1.0, 0.25);
        let b = c.eval(0.0, 1.0, 0.75);
        assert!(a < 0.25);
        assert!((a + b - 1.0) * (a + b - 1.0) < 1e-24);
    }

    #[test]
    fn custom_curve_is_called() {
        let c = Curve::custom(|from, _, rate| from + rate);
        assert_eq!(c.eval(1.0, 100.0, 0.25), 1.25);
    }
}
