// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spirits: per-frame interpolation tasks.

use alloc::boxed::Box;
use core::fmt;

use crate::curve::Curve;
use crate::error::ConfigError;

/// Interpolation steps used when none is given.
pub const DEFAULT_SPLIT_COUNT: usize = 100;

/// Render callback. Receives the current value and the step index, or `None`
/// for the exact final value and for settled renders.
pub type RenderFn = Box<dyn FnMut(f64, Option<usize>)>;

/// Identifies a spirit within its scheduler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpiritId(pub(crate) u64);

/// One animation task.
///
/// An animated spirit renders `split_count + 1` interpolated values, one per
/// frame, then the exact `to` value, and then settles. A settled spirit keeps
/// rendering `to` every frame until it is removed or the scheduler is cleared.
pub struct Spirit {
    pub(crate) id: SpiritId,
    from: Option<f64>,
    to: f64,
    curve: Curve,
    split_count: usize,
    step: usize,
    settled: bool,
    on_render: RenderFn,
    on_settle: Option<Box<dyn FnOnce()>>,
}

impl Spirit {
    /// A spirit that animates from `from` to `to`.
    pub fn animated(from: f64, to: f64, on_render: impl FnMut(f64, Option<usize>) + 'static) -> Self {
        Self::with_range(Some(from), to, on_render)
    }

    /// A spirit that starts settled at `value`, for static per-frame overlays.
    pub fn settled(value: f64, on_render: impl FnMut(f64, Option<usize>) + 'static) -> Self {
        Self::with_range(None, value, on_render)
    }

    /// Animated when `from` is known, settled at `to` otherwise.
    pub fn with_range(
        from: Option<f64>,
        to: f64,
        on_render: impl FnMut(f64, Option<usize>) + 'static,
    ) -> Self {
        Self {
            id: SpiritId::default(),
            from,
            to,
            curve: Curve::Linear,
            split_count: DEFAULT_SPLIT_COUNT,
            step: 0,
            settled: from.is_none(),
            on_render: Box::new(on_render),
            on_settle: None,
        }
    }

    /// Use `curve` instead of linear interpolation.
    #[must_use]
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// Number of interpolation intervals. Must be at least 1.
    #[must_use]
    pub fn with_split_count(mut self, split_count: usize) -> Self {
        self.split_count = split_count;
        self
    }

    /// Run `hook` once when the spirit settles.
    #[must_use]
    pub fn on_settle(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_settle = Some(Box::new(hook));
        self
    }

    /// Identifier assigned by the scheduler. Default until added.
    pub fn id(&self) -> SpiritId {
        self.id
    }

    /// Start value, if animated.
    pub fn from(&self) -> Option<f64> {
        self.from
    }

    /// Final value.
    pub fn to(&self) -> f64 {
        self.to
    }

    /// Next step to render.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Interpolation intervals.
    pub fn split_count(&self) -> usize {
        self.split_count
    }

    /// Whether no interpolation steps remain.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.split_count == 0 {
            return Err(ConfigError::ZeroSplitCount);
        }
        Ok(())
    }

    /// Render the next step. Returns `true` once the final value has been
    /// rendered and the spirit has settled.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Step counts are far below 2^52."
    )]
    pub(crate) fn advance(&mut self) -> bool {
        let Some(from) = self.from.filter(|_| self.step <= self.split_count) else {
            (self.on_render)(self.to, None);
            self.settled = true;
            return true;
        };
        let rate = self.step as f64 / self.split_count as f64;
        let value = self.curve.eval(from, self.to, rate);
        (self.on_render)(value, Some(self.step));
        self.step += 1;
        false
    }

    pub(crate) fn render_settled(&mut self) {
        (self.on_render)(self.to, None);
    }

    pub(crate) fn fire_settle(&mut self) {
        if let Some(hook) = self.on_settle.take() {
            hook();
        }
    }
}

impl fmt::Debug for Spirit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spirit")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("curve", &self.curve)
            .field("step", &self.step)
            .field("split_count", &self.split_count)
            .field("settled", &self.settled)
            .finish_non_exhaustive()
    }
}
