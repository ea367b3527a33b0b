// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host event-loop seams.
//!
//! The schedulers never own a thread or a timer. They ask the host for an idle
//! slice or an animation frame and get called back later. A browser binds
//! these to `requestIdleCallback` and `requestAnimationFrame`; tests use
//! [`ManualHost`](crate::testing::ManualHost), which runs callbacks only when
//! told to.

use alloc::boxed::Box;

/// Identifies a pending host request so it can be cancelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub u64);

/// Time budget of an idle slice.
pub trait Deadline {
    /// Milliseconds left before the slice should yield. Zero or negative when
    /// the budget is spent.
    fn time_remaining(&self) -> f64;
}

/// A deadline that never runs out, used by blocking runs.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> f64 {
        f64::INFINITY
    }
}

/// Callback run during an idle slice.
pub type IdleCallback = Box<dyn FnOnce(&dyn Deadline)>;

/// Callback run on an animation frame, given the frame timestamp in
/// milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Source of idle slices.
pub trait IdleHost {
    /// Run `callback` once during a future idle period.
    fn request_idle(&self, callback: IdleCallback) -> TaskHandle;

    /// Drop a pending idle request. Unknown or already-run handles are ignored.
    fn cancel_idle(&self, handle: TaskHandle);

    /// Monotonic time in milliseconds, used to measure how long slices take.
    fn now(&self) -> f64;
}

/// Source of animation frames.
pub trait FrameHost {
    /// Run `callback` once before the next repaint.
    fn request_frame(&self, callback: FrameCallback) -> TaskHandle;

    /// Drop a pending frame request. Unknown or already-run handles are ignored.
    fn cancel_frame(&self, handle: TaskHandle);
}
