// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration errors.

use thiserror::Error;

/// A scheduler or spirit was configured with values it cannot run with.
///
/// Returned synchronously from the call that supplied the bad value; the
/// scheduler keeps its previous configuration.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A fixed throughput rate was zero, negative, or not finite.
    #[error("throughput rate must be finite and positive, got {0}")]
    InvalidRate(f64),
    /// An adaptive smoothing factor outside `(0, 1]`.
    #[error("smoothing factor must be in (0, 1], got {0}")]
    InvalidSmoothing(f64),
    /// A layer limit of zero, or one too deep to address.
    #[error("layer limit must be between 1 and {max}, got {got}")]
    LayerOutOfRange {
        /// Requested layer count.
        got: u32,
        /// Largest supported layer count on this target.
        max: u32,
    },
    /// A paged dataset with zero items per page.
    #[error("page capacity must be at least 1")]
    ZeroPageCapacity,
    /// An animation with zero interpolation steps.
    #[error("split count must be at least 1")]
    ZeroSplitCount,
}
