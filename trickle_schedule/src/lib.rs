// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trickle_schedule --heading-base-level=0

//! Trickle Schedule: cooperative, `no_std` schedulers for progressive rendering.
//!
//! ## Overview
//!
//! Two single-threaded schedulers share one model: they never block, they ask
//! the host for time and get called back.
//!
//! - [`IdleWorkScheduler`] feeds a [`PagedSequence`](trickle_index::PagedSequence)
//!   to a per-item handler in slices bounded by the host's idle deadline. It
//!   resumes at its cursor across slices, honors a layer limit for
//!   level-of-detail views, and can learn its throughput from measured slices.
//! - [`FrameAnimationScheduler`] advances [`Spirit`]s once per display frame,
//!   interpolating each from `from` to `to` along a [`Curve`], and fires an
//!   animation-end hook once when the last one settles.
//!
//! ## Hosts
//!
//! The schedulers talk to their event loop through [`IdleHost`] and
//! [`FrameHost`]. A browser binding maps these to `requestIdleCallback` and
//! `requestAnimationFrame`. [`testing::ManualHost`] implements both with a
//! hand-driven clock.
//!
//! ## Errors
//!
//! Bad configuration is rejected synchronously with a [`ConfigError`]. Slices
//! and frames never fail; an empty dataset simply finishes.
//!
//! ## Example
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use trickle_schedule::testing::ManualHost;
//! use trickle_schedule::{FrameAnimationScheduler, Spirit};
//!
//! let host = Rc::new(ManualHost::new());
//! let frames = FrameAnimationScheduler::new(host.clone());
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! frames
//!     .add_spirit(Spirit::animated(0.0, 1.0, move |v, _| sink.borrow_mut().push(v)).with_split_count(2))
//!     .unwrap();
//! host.run_frames(10);
//! assert_eq!(*seen.borrow(), [0.0, 0.5, 1.0, 1.0]);
//! ```

#![no_std]

extern crate alloc;

pub mod curve;
pub mod error;
pub mod frame;
pub mod host;
pub mod idle;
pub mod spirit;
pub mod testing;
pub mod throughput;

pub use curve::Curve;
pub use error::ConfigError;
pub use frame::{FrameAnimationScheduler, WeakFrameScheduler};
pub use host::{Deadline, FrameCallback, FrameHost, IdleCallback, IdleHost, TaskHandle, Unbounded};
pub use idle::{
    IdleConfig, IdleWorkScheduler, MAX_LAYER, Reconfigure, RunMode, SchedulerState, SessionEnd,
    WeakIdleScheduler, layer_capacity,
};
pub use spirit::{DEFAULT_SPLIT_COUNT, Spirit, SpiritId};
pub use throughput::{Speed, Throughput};
