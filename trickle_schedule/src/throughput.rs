// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Items-per-millisecond throughput and its adaptive estimate.
//!
//! A slice's work quota is `floor(time_remaining * rate)`. With
//! [`Throughput::Fixed`] the rate never changes. With [`Throughput::Auto`] the
//! scheduler measures each slice and folds `processed / elapsed` into an
//! exponential moving average, so later slices aim at what the device
//! actually manages. The auto loop also checks the deadline after every item,
//! which keeps a slice inside its budget while the estimate is still too
//! optimistic.

use crate::error::ConfigError;

/// Lower bound for an adaptive rate, in items per millisecond.
pub const MIN_RATE: f64 = 0.01;

/// Upper bound for an adaptive rate, in items per millisecond.
pub const MAX_RATE: f64 = 1_000_000.0;

/// Named throughput presets, in items per millisecond.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Speed {
    /// 512 items/ms. Fewer slices, more jank on slow devices.
    Fast,
    /// 256 items/ms.
    #[default]
    Default,
    /// 128 items/ms. Smaller bursts.
    Smooth,
}

impl Speed {
    /// Items per millisecond for this preset.
    pub const fn rate(self) -> f64 {
        match self {
            Self::Fast => 512.0,
            Self::Default => 256.0,
            Self::Smooth => 128.0,
        }
    }
}

/// How many items a slice may process per millisecond of budget.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Throughput {
    /// Constant rate in items per millisecond.
    Fixed(f64),
    /// Rate learned from measured slices.
    Auto {
        /// Rate used before the first measurement.
        initial: f64,
        /// Weight of each new sample, in `(0, 1]`. `1.0` trusts only the last
        /// slice.
        smoothing: f64,
    },
}

impl Default for Throughput {
    fn default() -> Self {
        Self::Fixed(Speed::Default.rate())
    }
}

impl From<Speed> for Throughput {
    fn from(speed: Speed) -> Self {
        Self::Fixed(speed.rate())
    }
}

impl Throughput {
    /// Adaptive throughput starting from a preset, with moderate smoothing.
    pub const fn auto(start: Speed) -> Self {
        Self::Auto {
            initial: start.rate(),
            smoothing: 0.3,
        }
    }

    /// Check that the rate and smoothing are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.initial_rate();
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        if let Self::Auto { smoothing, .. } = *self {
            if smoothing.is_nan() || smoothing <= 0.0 || smoothing > 1.0 {
                return Err(ConfigError::InvalidSmoothing(smoothing));
            }
        }
        Ok(())
    }

    /// Rate used for the first slice.
    pub const fn initial_rate(&self) -> f64 {
        match *self {
            Self::Fixed(rate) => rate,
            Self::Auto { initial, .. } => initial,
        }
    }

    /// Whether the rate adapts to measurements.
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto { .. })
    }
}

/// Number of items a slice may process.
///
/// At least one item whenever any time remains, so a slow device still makes
/// progress. Zero once the budget is spent.
#[allow(
    clippy::cast_possible_truncation,
    reason = "float-to-int `as` saturates, and the value is non-negative here."
)]
pub(crate) fn quota(time_remaining: f64, rate: f64) -> usize {
    if time_remaining.is_nan() || time_remaining <= 0.0 {
        return 0;
    }
    let items = time_remaining * rate;
    // Truncation is floor for non-negative values.
    (items as usize).max(1)
}

/// Exponential moving average.
#[derive(Copy, Clone, Debug)]
struct Ema {
    value: f64,
    alpha: f64,
    initialized: bool,
}

impl Ema {
    const fn new(alpha: f64) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    fn update(&mut self, sample: f64) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    const fn get(&self) -> f64 {
        self.value
    }
}

/// Current rate plus, in auto mode, the average it is drawn from.
#[derive(Copy, Clone, Debug)]
pub(crate) struct RateEstimator {
    rate: f64,
    ema: Option<Ema>,
}

impl RateEstimator {
    pub(crate) const fn new(throughput: Throughput) -> Self {
        match throughput {
            Throughput::Fixed(rate) => Self { rate, ema: None },
            Throughput::Auto { initial, smoothing } => Self {
                rate: initial,
                ema: Some(Ema::new(smoothing)),
            },
        }
    }

    pub(crate) const fn rate(&self) -> f64 {
        self.rate
    }

    /// Fold one slice's measurement in. Slices that processed nothing or took
    /// no measurable time carry no information and are ignored.
    pub(crate) fn record(&mut self, processed: usize, elapsed_ms: f64) {
        let Some(ema) = self.ema.as_mut() else {
            return;
        };
        if processed == 0 || elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
            return;
        }
        ema.update(processed as f64 / elapsed_ms);
        self.rate = ema.get().clamp(MIN_RATE, MAX_RATE);
    }
}
