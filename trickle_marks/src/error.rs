// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the consumers.

use thiserror::Error;
use trickle_schedule::ConfigError;

/// Rejected consumer configuration.
///
/// Like [`ConfigError`], these are raised synchronously by constructors and
/// option setters, never from inside a slice or frame.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum MarksError {
    /// The underlying scheduler rejected its configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Chord to radius rate outside `(0, 2]`; no circle passes through both
    /// endpoints with that radius.
    #[error("arc rate {0} is outside (0, 2]")]
    RateOutOfRange(f64),
    /// The two arc endpoints are the same point.
    #[error("arc endpoints coincide")]
    CoincidentPoints,
}
