// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic host for tests, benches and demos.
//!
//! [`ManualHost`] implements [`IdleHost`] and [`FrameHost`] with a clock that
//! only moves when told to. Callbacks queue up until the caller runs them, so
//! a test decides exactly how many slices or frames happen and how much budget
//! each slice gets.
//!
//! ```rust
//! use std::rc::Rc;
//! use trickle_index::PagedSequence;
//! use trickle_schedule::testing::ManualHost;
//! use trickle_schedule::{IdleConfig, IdleWorkScheduler, Throughput};
//!
//! let host = Rc::new(ManualHost::new());
//! let config = IdleConfig::default().with_throughput(Throughput::Fixed(2.0));
//! let sched = IdleWorkScheduler::new(
//!     host.clone(),
//!     PagedSequence::from_vec((0..10).collect()),
//!     |_: &u32| {},
//!     config,
//! )
//! .unwrap();
//! sched.start();
//!
//! // A 2 ms slice at 2 items per millisecond.
//! host.run_idle(2.0);
//! assert_eq!(sched.cursor(), 4);
//! ```

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::host::{Deadline, FrameCallback, FrameHost, IdleCallback, IdleHost, TaskHandle};

/// Frame period used by [`ManualHost::new`], in milliseconds.
pub const DEFAULT_FRAME_INTERVAL: f64 = 1000.0 / 60.0;

/// Host whose clock and callbacks are driven by hand.
pub struct ManualHost {
    clock: Cell<f64>,
    next_handle: Cell<u64>,
    frame_interval: f64,
    idle: RefCell<VecDeque<(TaskHandle, IdleCallback)>>,
    frames: RefCell<VecDeque<(TaskHandle, FrameCallback)>>,
}

struct SliceDeadline<'a> {
    host: &'a ManualHost,
    end: f64,
}

impl Deadline for SliceDeadline<'_> {
    fn time_remaining(&self) -> f64 {
        self.end - self.host.now()
    }
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    /// A host at time zero with a 60 Hz frame interval.
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    /// A host at time zero whose frames are `interval` milliseconds apart.
    pub fn with_frame_interval(interval: f64) -> Self {
        Self {
            clock: Cell::new(0.0),
            next_handle: Cell::new(1),
            frame_interval: interval,
            idle: RefCell::default(),
            frames: RefCell::default(),
        }
    }

    /// Move the clock forward. Callbacks use this to simulate work cost.
    pub fn advance(&self, ms: f64) {
        self.clock.set(self.clock.get() + ms);
    }

    /// Queued idle callbacks.
    pub fn pending_idle(&self) -> usize {
        self.idle.borrow().len()
    }

    /// Queued frame callbacks.
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Run the oldest idle callback with a budget of `budget_ms` from now.
    ///
    /// Returns `false` when nothing was queued.
    pub fn run_idle(&self, budget_ms: f64) -> bool {
        let next = self.idle.borrow_mut().pop_front();
        let Some((_, callback)) = next else {
            return false;
        };
        let deadline = SliceDeadline {
            host: self,
            end: self.now() + budget_ms,
        };
        callback(&deadline);
        true
    }

    /// Run idle slices of `budget_ms` until none are queued or `max_slices`
    /// have run. Returns the number run.
    pub fn run_idle_until_idle(&self, budget_ms: f64, max_slices: usize) -> usize {
        let mut ran = 0;
        while ran < max_slices && self.run_idle(budget_ms) {
            ran += 1;
        }
        ran
    }

    /// Advance one frame interval and run every frame callback queued before
    /// this call. Callbacks requested while running wait for the next frame.
    ///
    /// Returns `false` when nothing was queued.
    pub fn run_frame(&self) -> bool {
        let due: Vec<_> = self.frames.borrow_mut().drain(..).collect();
        if due.is_empty() {
            return false;
        }
        self.advance(self.frame_interval);
        let timestamp = self.now();
        for (_, callback) in due {
            callback(timestamp);
        }
        true
    }

    /// Run up to `count` frames, stopping early once nothing is queued.
    /// Returns the number run.
    pub fn run_frames(&self, count: usize) -> usize {
        let mut ran = 0;
        while ran < count && self.run_frame() {
            ran += 1;
        }
        ran
    }

    fn handle(&self) -> TaskHandle {
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        TaskHandle(id)
    }
}

impl IdleHost for ManualHost {
    fn request_idle(&self, callback: IdleCallback) -> TaskHandle {
        let handle = self.handle();
        self.idle.borrow_mut().push_back((handle, callback));
        handle
    }

    fn cancel_idle(&self, handle: TaskHandle) {
        let removed = {
            let mut idle = self.idle.borrow_mut();
            idle.iter()
                .position(|(h, _)| *h == handle)
                .and_then(|i| idle.remove(i))
        };
        drop(removed);
    }

    fn now(&self) -> f64 {
        self.clock.get()
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&self, callback: FrameCallback) -> TaskHandle {
        let handle = self.handle();
        self.frames.borrow_mut().push_back((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: TaskHandle) {
        let removed = {
            let mut frames = self.frames.borrow_mut();
            frames
                .iter()
                .position(|(h, _)| *h == handle)
                .and_then(|i| frames.remove(i))
        };
        drop(removed);
    }
}

impl fmt::Debug for ManualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualHost")
            .field("now", &self.clock.get())
            .field("pending_idle", &self.pending_idle())
            .field("pending_frames", &self.pending_frames())
            .finish_non_exhaustive()
    }
}
