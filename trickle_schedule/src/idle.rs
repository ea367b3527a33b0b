// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deadline-driven incremental work over a paged dataset.
//!
//! [`IdleWorkScheduler`] walks a [`PagedSequence`] with a cursor and hands each
//! item to a handler, a slice at a time. Each slice gets a [`Deadline`] from
//! the host and processes at most `floor(time_remaining * rate)` items before
//! yielding. A session ends when the data runs out, when the layer limit is
//! reached, or when the stop predicate fires. Running out of budget only
//! yields; the next slice resumes at the cursor.
//!
//! ## Re-entrancy
//!
//! Handlers and predicates may call back into the scheduler through a handle
//! obtained from [`IdleWorkScheduler::downgrade`]. `pause` takes effect after
//! the current item. `start`, `restart` and `reconfigure` are staged and
//! applied when the slice returns, followed by a restart from cursor zero.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use trickle_index::PagedSequence;

use crate::error::ConfigError;
use crate::host::{Deadline, IdleHost, TaskHandle, Unbounded};
use crate::throughput::{RateEstimator, Throughput, quota};

/// Per-item draw callback.
pub type ItemHandler<T> = Box<dyn FnMut(&T)>;

/// Pure per-item transform applied right before the handler.
pub type ItemTransform<T> = Box<dyn Fn(&T) -> T>;

/// Per-item predicate, given the item's cursor index.
pub type ItemPredicate<T> = Box<dyn FnMut(usize, &T) -> bool>;

type SessionHook = Box<dyn FnMut(SessionEnd)>;

/// Deepest supported layer limit on this target.
pub const MAX_LAYER: u32 = usize::BITS - 1;

/// Number of items in the first `layer` levels of a breadth-first
/// linearization, `2^layer - 1`.
///
/// Saturates at `usize::MAX` past [`MAX_LAYER`].
pub const fn layer_capacity(layer: u32) -> usize {
    if layer > MAX_LAYER {
        usize::MAX
    } else {
        (1_usize << layer) - 1
    }
}

fn validate_layer(layer: Option<u32>) -> Result<(), ConfigError> {
    match layer {
        Some(got) if got == 0 || got > MAX_LAYER => Err(ConfigError::LayerOutOfRange {
            got,
            max: MAX_LAYER,
        }),
        _ => Ok(()),
    }
}

/// How slices are driven.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Yield to the host between slices.
    #[default]
    Idle,
    /// Run the whole session synchronously with an unbounded deadline.
    Blocking,
}

/// Scheduler configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct IdleConfig {
    /// Items per millisecond of slice budget.
    pub throughput: Throughput,
    /// Whether to yield between slices.
    pub mode: RunMode,
    /// Process at most `2^L - 1` items per session when set.
    pub layer_limit: Option<u32>,
}

impl IdleConfig {
    /// Blocking run with the default throughput and no layer limit.
    pub fn blocking() -> Self {
        Self {
            mode: RunMode::Blocking,
            ..Self::default()
        }
    }

    /// Replace the throughput.
    #[must_use]
    pub fn with_throughput(mut self, throughput: impl Into<Throughput>) -> Self {
        self.throughput = throughput.into();
        self
    }

    /// Replace the run mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the layer limit.
    #[must_use]
    pub fn with_layer_limit(mut self, layer_limit: Option<u32>) -> Self {
        self.layer_limit = layer_limit;
        self
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.throughput.validate()?;
        validate_layer(self.layer_limit)
    }
}

/// Lifecycle of a scheduler session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Created but never started.
    Idle,
    /// Slices are being scheduled.
    Running,
    /// Paused by the caller; `resume` continues at the cursor.
    Paused,
    /// The session ended; see [`SessionEnd`].
    Finished,
}

/// Why a session ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SessionEnd {
    /// Every item was processed.
    Exhausted,
    /// The layer limit was reached before the data ran out.
    LayerLimit,
    /// The stop predicate returned `true`.
    Stopped,
}

/// An atomic change to a scheduler's configuration.
///
/// Unset fields keep their current value. Applying a change restarts the
/// session from cursor zero.
pub struct Reconfigure<T> {
    dataset: Option<PagedSequence<T>>,
    handler: Option<ItemHandler<T>>,
    transform: Option<Option<ItemTransform<T>>>,
    stop_predicate: Option<Option<ItemPredicate<T>>>,
    render_predicate: Option<Option<ItemPredicate<T>>>,
    layer_limit: Option<Option<u32>>,
    throughput: Option<Throughput>,
    preview: Option<Option<PagedSequence<T>>>,
}

impl<T> Default for Reconfigure<T> {
    fn default() -> Self {
        Self {
            dataset: None,
            handler: None,
            transform: None,
            stop_predicate: None,
            render_predicate: None,
            layer_limit: None,
            throughput: None,
            preview: None,
        }
    }
}

impl<T> Reconfigure<T> {
    /// An empty change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the main dataset.
    #[must_use]
    pub fn dataset(mut self, dataset: PagedSequence<T>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Replace the per-item handler.
    #[must_use]
    pub fn handler(mut self, handler: impl FnMut(&T) + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Transform every item before it reaches the handler.
    #[must_use]
    pub fn transform(mut self, transform: impl Fn(&T) -> T + 'static) -> Self {
        self.transform = Some(Some(Box::new(transform)));
        self
    }

    /// Hand items to the handler unchanged.
    #[must_use]
    pub fn no_transform(mut self) -> Self {
        self.transform = Some(None);
        self
    }

    /// End the session after the first item for which `stop` returns `true`.
    /// That item is still drawn.
    #[must_use]
    pub fn stop_when(mut self, stop: impl FnMut(usize, &T) -> bool + 'static) -> Self {
        self.stop_predicate = Some(Some(Box::new(stop)));
        self
    }

    /// Only draw items for which `render` returns `true`. Skipped items still
    /// advance the cursor.
    #[must_use]
    pub fn render_if(mut self, render: impl FnMut(usize, &T) -> bool + 'static) -> Self {
        self.render_predicate = Some(Some(Box::new(render)));
        self
    }

    /// Remove the stop and render predicates.
    #[must_use]
    pub fn no_predicates(mut self) -> Self {
        self.stop_predicate = Some(None);
        self.render_predicate = Some(None);
        self
    }

    /// Replace the layer limit.
    #[must_use]
    pub fn layer_limit(mut self, layer_limit: Option<u32>) -> Self {
        self.layer_limit = Some(layer_limit);
        self
    }

    /// Replace the throughput. Resets any learned rate.
    #[must_use]
    pub fn throughput(mut self, throughput: impl Into<Throughput>) -> Self {
        self.throughput = Some(throughput.into());
        self
    }

    fn preview(mut self, preview: Option<PagedSequence<T>>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Drop any preview dataset so the session runs on the main one.
    #[must_use]
    pub fn restore_main(self) -> Self {
        self.preview(None)
    }

    /// Check the numeric fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(throughput) = &self.throughput {
            throughput.validate()?;
        }
        if let Some(layer) = self.layer_limit {
            validate_layer(layer)?;
        }
        Ok(())
    }

    /// Combine with a later change; fields set in `newer` win.
    fn merge(self, newer: Self) -> Self {
        Self {
            dataset: newer.dataset.or(self.dataset),
            handler: newer.handler.or(self.handler),
            transform: newer.transform.or(self.transform),
            stop_predicate: newer.stop_predicate.or(self.stop_predicate),
            render_predicate: newer.render_predicate.or(self.render_predicate),
            layer_limit: newer.layer_limit.or(self.layer_limit),
            throughput: newer.throughput.or(self.throughput),
            preview: newer.preview.or(self.preview),
        }
    }
}

impl<T> fmt::Debug for Reconfigure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconfigure")
            .field("dataset", &self.dataset.as_ref().map(PagedSequence::len))
            .field("handler", &self.handler.is_some())
            .field("transform", &self.transform.as_ref().map(Option::is_some))
            .field("layer_limit", &self.layer_limit)
            .field("throughput", &self.throughput)
            .finish_non_exhaustive()
    }
}

/// Cooperative scheduler that feeds a paged dataset to a handler in
/// deadline-bounded slices.
///
/// Cloning yields another handle to the same scheduler. Dropping the last
/// handle cancels any pending slice.
pub struct IdleWorkScheduler<T: 'static> {
    inner: Rc<Inner<T>>,
}

/// Non-owning handle for use inside the scheduler's own callbacks.
pub struct WeakIdleScheduler<T: 'static> {
    inner: Weak<Inner<T>>,
}

struct Inner<T: 'static> {
    host: Rc<dyn IdleHost>,
    core: RefCell<Core<T>>,
    staged: RefCell<Option<Reconfigure<T>>>,
    on_session_end: RefCell<Option<SessionHook>>,
    state: Cell<SchedulerState>,
    mode: Cell<RunMode>,
    layer_limit: Cell<Option<u32>>,
    throughput: Cell<Throughput>,
    rate: Cell<RateEstimator>,
    cursor: Cell<usize>,
    processed: Cell<usize>,
    previewing: Cell<bool>,
    in_slice: Cell<bool>,
    restart_requested: Cell<bool>,
    pending: Cell<Option<TaskHandle>>,
}

/// State only touched while no slice is running, or by the slice itself.
struct Core<T> {
    dataset: PagedSequence<T>,
    preview: Option<PagedSequence<T>>,
    handler: ItemHandler<T>,
    transform: Option<ItemTransform<T>>,
    stop_predicate: Option<ItemPredicate<T>>,
    render_predicate: Option<ItemPredicate<T>>,
}

enum SliceEnd {
    /// Budget spent with work remaining.
    Yielded,
    /// A callback paused or restarted the scheduler.
    Interrupted,
    Ended(SessionEnd),
}

impl<T: 'static> IdleWorkScheduler<T> {
    /// Create a scheduler over `dataset`. It does nothing until
    /// [`start`](Self::start).
    pub fn new<H: IdleHost + 'static>(
        host: Rc<H>,
        dataset: PagedSequence<T>,
        handler: impl FnMut(&T) + 'static,
        config: IdleConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let host: Rc<dyn IdleHost> = host;
        Ok(Self {
            inner: Rc::new(Inner {
                host,
                core: RefCell::new(Core {
                    dataset,
                    preview: None,
                    handler: Box::new(handler),
                    transform: None,
                    stop_predicate: None,
                    render_predicate: None,
                }),
                staged: RefCell::new(None),
                on_session_end: RefCell::new(None),
                state: Cell::new(SchedulerState::Idle),
                mode: Cell::new(config.mode),
                layer_limit: Cell::new(config.layer_limit),
                throughput: Cell::new(config.throughput),
                rate: Cell::new(RateEstimator::new(config.throughput)),
                cursor: Cell::new(0),
                processed: Cell::new(0),
                previewing: Cell::new(false),
                in_slice: Cell::new(false),
                restart_requested: Cell::new(false),
                pending: Cell::new(None),
            }),
        })
    }

    /// Begin a session at cursor zero.
    ///
    /// In [`RunMode::Blocking`] the whole session runs before this returns.
    pub fn start(&self) {
        self.inner.begin("started");
    }

    /// Reset the cursor to zero and continue, whatever the current state.
    pub fn restart(&self) {
        self.inner.begin("restarted");
    }

    /// Cancel the pending slice. Idempotent.
    pub fn pause(&self) {
        let inner = &self.inner;
        if inner.state.get() != SchedulerState::Running {
            return;
        }
        inner.state.set(SchedulerState::Paused);
        inner.cancel_pending();
        log::debug!("idle session paused at cursor {}", inner.cursor.get());
    }

    /// Continue from the current cursor after [`pause`](Self::pause).
    ///
    /// Starts a never-started scheduler. Does nothing once the session has
    /// finished; use [`restart`](Self::restart) for that.
    pub fn resume(&self) {
        let inner = &self.inner;
        if !matches!(
            inner.state.get(),
            SchedulerState::Paused | SchedulerState::Idle
        ) {
            return;
        }
        inner.state.set(SchedulerState::Running);
        log::debug!("idle session resumed at cursor {}", inner.cursor.get());
        inner.schedule();
    }

    /// Apply `change` atomically and restart.
    ///
    /// Invalid values are rejected before anything changes. Called from one of
    /// this scheduler's callbacks, the change is staged and applied when the
    /// slice returns.
    pub fn reconfigure(&self, change: Reconfigure<T>) -> Result<(), ConfigError> {
        change.validate()?;
        self.reconfigure_unchecked(change);
        Ok(())
    }

    /// Stage or apply an already validated change.
    fn reconfigure_unchecked(&self, change: Reconfigure<T>) {
        let inner = &self.inner;
        if inner.in_slice.get() {
            log::warn!("reconfiguration requested from inside a slice; applying at slice end");
            let mut staged = inner.staged.borrow_mut();
            let merged = match staged.take() {
                Some(earlier) => earlier.merge(change),
                None => change,
            };
            *staged = Some(merged);
            inner.state.set(SchedulerState::Running);
            inner.restart_requested.set(true);
            return;
        }
        inner.apply(change);
        inner.begin("reconfigured");
    }

    /// Replace the dataset and restart.
    pub fn set_dataset(&self, dataset: PagedSequence<T>) {
        self.reconfigure_unchecked(Reconfigure::new().dataset(dataset));
    }

    /// Replace the handler and restart.
    pub fn set_handler(&self, handler: impl FnMut(&T) + 'static) {
        self.reconfigure_unchecked(Reconfigure::new().handler(handler));
    }

    /// Replace the layer limit and restart.
    pub fn set_layer_limit(&self, layer_limit: Option<u32>) -> Result<(), ConfigError> {
        self.reconfigure(Reconfigure::new().layer_limit(layer_limit))
    }

    /// Replace the throughput and restart.
    pub fn set_throughput(&self, throughput: impl Into<Throughput>) -> Result<(), ConfigError> {
        self.reconfigure(Reconfigure::new().throughput(throughput))
    }

    /// Switch to a substitute dataset, such as the result of a nearest query,
    /// and restart. The layer limit does not apply while previewing.
    pub fn preview(&self, dataset: PagedSequence<T>) {
        self.reconfigure_unchecked(Reconfigure::new().preview(Some(dataset)));
    }

    /// Drop the preview dataset and restart on the main one.
    pub fn restore(&self) {
        self.reconfigure_unchecked(Reconfigure::new().restore_main());
    }

    /// Register a hook run once at the end of each session.
    pub fn set_on_session_end(&self, hook: impl FnMut(SessionEnd) + 'static) {
        *self.inner.on_session_end.borrow_mut() = Some(Box::new(hook));
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.inner.state.get()
    }

    /// Whether slices are being scheduled.
    pub fn is_running(&self) -> bool {
        self.inner.state.get() == SchedulerState::Running
    }

    /// Index of the next item to process.
    pub fn cursor(&self) -> usize {
        self.inner.cursor.get()
    }

    /// Items handed to the handler this session.
    pub fn processed(&self) -> usize {
        self.inner.processed.get()
    }

    /// Configured throughput.
    pub fn throughput(&self) -> Throughput {
        self.inner.throughput.get()
    }

    /// Rate the next slice will use, in items per millisecond.
    pub fn rate(&self) -> f64 {
        self.inner.rate.get().rate()
    }

    /// Current layer limit.
    pub fn layer_limit(&self) -> Option<u32> {
        self.inner.layer_limit.get()
    }

    /// Whether a preview dataset is active.
    pub fn is_previewing(&self) -> bool {
        self.inner.previewing.get()
    }

    /// Whether a slice is currently executing.
    pub fn in_slice(&self) -> bool {
        self.inner.in_slice.get()
    }

    /// A handle that does not keep the scheduler alive.
    pub fn downgrade(&self) -> WeakIdleScheduler<T> {
        WeakIdleScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T: 'static> Clone for IdleWorkScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for IdleWorkScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("IdleWorkScheduler")
            .field("state", &inner.state.get())
            .field("cursor", &inner.cursor.get())
            .field("processed", &inner.processed.get())
            .field("rate", &inner.rate.get().rate())
            .field("layer_limit", &inner.layer_limit.get())
            .field("previewing", &inner.previewing.get())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> WeakIdleScheduler<T> {
    /// The scheduler, if it is still alive.
    pub fn upgrade(&self) -> Option<IdleWorkScheduler<T>> {
        self.inner.upgrade().map(|inner| IdleWorkScheduler { inner })
    }
}

impl<T: 'static> Clone for WeakIdleScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for WeakIdleScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakIdleScheduler")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T: 'static> Inner<T> {
    fn begin(self: &Rc<Self>, what: &str) {
        self.state.set(SchedulerState::Running);
        if self.in_slice.get() {
            log::warn!("idle session {what} from inside a slice; restarting at slice end");
            self.restart_requested.set(true);
            return;
        }
        self.cursor.set(0);
        self.processed.set(0);
        log::debug!("idle session {what}");
        self.schedule();
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.pending.take() {
            self.host.cancel_idle(handle);
        }
    }

    fn schedule(self: &Rc<Self>) {
        if self.in_slice.get() || self.state.get() != SchedulerState::Running {
            return;
        }
        match self.mode.get() {
            RunMode::Idle => {
                if self.pending.get().is_some() {
                    return;
                }
                let weak = Rc::downgrade(self);
                let handle = self
                    .host
                    .request_idle(Box::new(move |deadline: &dyn Deadline| {
                        if let Some(inner) = weak.upgrade() {
                            inner.pending.set(None);
                            if inner.run_slice(deadline) {
                                inner.schedule();
                            }
                        }
                    }));
                self.pending.set(Some(handle));
            }
            RunMode::Blocking => {
                self.cancel_pending();
                while self.run_slice(&Unbounded) {}
            }
        }
    }

    /// Run one slice. Returns whether another slice should be scheduled.
    fn run_slice(self: &Rc<Self>, deadline: &dyn Deadline) -> bool {
        if self.state.get() != SchedulerState::Running {
            return false;
        }
        let started = self.host.now();
        self.in_slice.set(true);
        let (end, visited) = self.core.borrow_mut().run(self, deadline);
        self.in_slice.set(false);

        let elapsed = self.host.now() - started;
        let mut rate = self.rate.get();
        rate.record(visited, elapsed);
        self.rate.set(rate);
        log::trace!(
            "idle slice: {visited} items in {elapsed:.3} ms, next rate {:.2}/ms",
            rate.rate()
        );

        let staged = self.staged.borrow_mut().take();
        if let Some(change) = staged {
            self.apply(change);
            self.restart_requested.set(true);
        }
        if self.restart_requested.replace(false) {
            self.cursor.set(0);
            self.processed.set(0);
            log::debug!("idle session restarted after slice");
            return self.state.get() == SchedulerState::Running;
        }

        match end {
            SliceEnd::Yielded | SliceEnd::Interrupted => {
                self.state.get() == SchedulerState::Running
            }
            SliceEnd::Ended(reason) => {
                if self.state.get() == SchedulerState::Running {
                    self.finish(reason);
                }
                false
            }
        }
    }

    fn finish(&self, reason: SessionEnd) {
        self.state.set(SchedulerState::Finished);
        log::debug!(
            "idle session ended ({reason:?}) after {} items",
            self.processed.get()
        );
        let hook = self.on_session_end.borrow_mut().take();
        if let Some(mut hook) = hook {
            hook(reason);
            let mut slot = self.on_session_end.borrow_mut();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }

    fn apply(&self, change: Reconfigure<T>) {
        let Reconfigure {
            dataset,
            handler,
            transform,
            stop_predicate,
            render_predicate,
            layer_limit,
            throughput,
            preview,
        } = change;
        let mut core = self.core.borrow_mut();
        if let Some(dataset) = dataset {
            core.dataset = dataset;
        }
        if let Some(handler) = handler {
            core.handler = handler;
        }
        if let Some(transform) = transform {
            core.transform = transform;
        }
        if let Some(stop) = stop_predicate {
            core.stop_predicate = stop;
        }
        if let Some(render) = render_predicate {
            core.render_predicate = render;
        }
        if let Some(preview) = preview {
            self.previewing.set(preview.is_some());
            core.preview = preview;
        }
        if let Some(layer_limit) = layer_limit {
            self.layer_limit.set(layer_limit);
        }
        if let Some(throughput) = throughput {
            self.throughput.set(throughput);
            self.rate.set(RateEstimator::new(throughput));
        }
    }
}

impl<T: 'static> Drop for Inner<T> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl<T: 'static> Core<T> {
    /// Process items from the cursor until the quota, the limit, or a
    /// callback ends the slice. Returns how it ended and how many items were
    /// visited.
    fn run(&mut self, inner: &Inner<T>, deadline: &dyn Deadline) -> (SliceEnd, usize) {
        let Self {
            dataset,
            preview,
            handler,
            transform,
            stop_predicate,
            render_predicate,
        } = self;
        let previewing = preview.is_some();
        let data: &PagedSequence<T> = preview.as_ref().unwrap_or(&*dataset);
        let total = data.len();
        let limit = match inner.layer_limit.get() {
            Some(layer) if !previewing => layer_capacity(layer).min(total),
            _ => total,
        };
        let reason = if limit < total {
            SessionEnd::LayerLimit
        } else {
            SessionEnd::Exhausted
        };

        let mut cursor = inner.cursor.get();
        if cursor >= limit {
            return (SliceEnd::Ended(reason), 0);
        }
        let budget = quota(deadline.time_remaining(), inner.rate.get().rate()).min(limit - cursor);
        let check_deadline = inner.throughput.get().is_auto();
        let mut processed = inner.processed.get();
        let mut visited = 0;
        let mut end = SliceEnd::Yielded;

        for item in data.iter_from(cursor).take(budget) {
            if check_deadline && visited > 0 && deadline.time_remaining() <= 0.0 {
                break;
            }
            let index = cursor;
            let draw = render_predicate
                .as_mut()
                .is_none_or(|render| render(index, item));
            let halt = stop_predicate
                .as_mut()
                .is_some_and(|stop| stop(index, item));
            if draw {
                match transform {
                    Some(transform) => handler(&transform(item)),
                    None => handler(item),
                }
                processed += 1;
            }
            cursor += 1;
            visited += 1;
            if halt {
                end = SliceEnd::Ended(SessionEnd::Stopped);
                break;
            }
            if inner.state.get() != SchedulerState::Running || inner.restart_requested.get() {
                end = SliceEnd::Interrupted;
                break;
            }
        }

        inner.cursor.set(cursor);
        inner.processed.set(processed);
        if matches!(end, SliceEnd::Yielded) && cursor >= limit {
            end = SliceEnd::Ended(reason);
        }
        (end, visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualHost;
    use crate::throughput::Speed;
    use alloc::vec;
    use alloc::vec::Vec;

    type Log = Rc<RefCell<Vec<u32>>>;

    fn recorder() -> (Log, impl FnMut(&u32) + 'static) {
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        (log, move |item: &u32| sink.borrow_mut().push(*item))
    }

    fn data(n: u32) -> PagedSequence<u32> {
        PagedSequence::from_vec_with_capacity((0..n).collect(), 16)
    }

    fn ends(sched: &IdleWorkScheduler<u32>) -> Rc<RefCell<Vec<SessionEnd>>> {
        let ends: Rc<RefCell<Vec<SessionEnd>>> = Rc::default();
        let sink = Rc::clone(&ends);
        sched.set_on_session_end(move |end| sink.borrow_mut().push(end));
        ends
    }

    #[test]
    fn unbounded_budget_processes_everything_once_in_order() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let sched = IdleWorkScheduler::new(host.clone(), data(100), handler, IdleConfig::default())
            .unwrap();
        let ends = ends(&sched);
        sched.start();
        assert_eq!(host.pending_idle(), 1);
        assert!(host.run_idle(f64::INFINITY));
        assert_eq!(*log.borrow(), (0..100).collect::<Vec<_>>());
        assert_eq!(sched.state(), SchedulerState::Finished);
        assert_eq!(*ends.borrow(), vec![SessionEnd::Exhausted]);
        assert_eq!(host.pending_idle(), 0);
    }

    #[test]
    fn quota_splits_work_across_slices() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let config = IdleConfig::default().with_throughput(Throughput::Fixed(10.0));
        let sched = IdleWorkScheduler::new(host.clone(), data(45), handler, config).unwrap();
        let ends = ends(&sched);
        sched.start();
        // 1 ms at 10 items/ms.
        assert!(host.run_idle(1.0));
        assert_eq!(log.borrow().len(), 10);
        assert_eq!(sched.cursor(), 10);
        assert!(ends.borrow().is_empty());
        let slices = host.run_idle_until_idle(1.0, 100);
        assert_eq!(slices, 4);
        assert_eq!(*log.borrow(), (0..45).collect::<Vec<_>>());
        assert_eq!(*ends.borrow(), vec![SessionEnd::Exhausted]);
    }

    #[test]
    fn spent_budget_yields_without_ending() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let sched =
            IdleWorkScheduler::new(host.clone(), data(5), handler, IdleConfig::default()).unwrap();
        sched.start();
        assert!(host.run_idle(0.0));
        assert!(log.borrow().is_empty());
        assert_eq!(sched.state(), SchedulerState::Running);
        assert_eq!(host.pending_idle(), 1);
    }

    #[test]
    fn layer_limit_caps_items() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let config = IdleConfig::default().with_layer_limit(Some(3));
        let sched = IdleWorkScheduler::new(host.clone(), data(100), handler, config).unwrap();
        let ends = ends(&sched);
        sched.start();
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), (0..7).collect::<Vec<_>>());
        assert_eq!(*ends.borrow(), vec![SessionEnd::LayerLimit]);

        // A limit past the data length is plain exhaustion.
        sched.set_layer_limit(Some(10)).unwrap();
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(log.borrow().len(), 107);
        assert_eq!(ends.borrow()[1], SessionEnd::Exhausted);
    }

    #[test]
    fn invalid_config_is_rejected_synchronously() {
        let host = Rc::new(ManualHost::new());
        let bad_layer = IdleConfig::default().with_layer_limit(Some(0));
        assert!(matches!(
            IdleWorkScheduler::new(host.clone(), data(1), |_: &u32| {}, bad_layer),
            Err(ConfigError::LayerOutOfRange { got: 0, .. })
        ));
        let bad_rate = IdleConfig::default().with_throughput(Throughput::Fixed(-1.0));
        assert!(IdleWorkScheduler::new(host.clone(), data(1), |_: &u32| {}, bad_rate).is_err());

        let sched =
            IdleWorkScheduler::new(host.clone(), data(3), |_: &u32| {}, IdleConfig::default())
                .unwrap();
        assert!(sched.set_layer_limit(Some(MAX_LAYER + 1)).is_err());
        assert_eq!(sched.layer_limit(), None);
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[test]
    fn stop_predicate_draws_item_then_ends() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let sched =
            IdleWorkScheduler::new(host.clone(), data(50), handler, IdleConfig::default()).unwrap();
        let ends = ends(&sched);
        sched
            .reconfigure(Reconfigure::new().stop_when(|_, item| *item == 4))
            .unwrap();
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*ends.borrow(), vec![SessionEnd::Stopped]);
        assert_eq!(sched.state(), SchedulerState::Finished);
    }

    #[test]
    fn render_predicate_and_transform() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let sched =
            IdleWorkScheduler::new(host.clone(), data(10), handler, IdleConfig::default()).unwrap();
        sched
            .reconfigure(
                Reconfigure::new()
                    .render_if(|_, item| item % 2 == 0)
                    .transform(|item| item * 10),
            )
            .unwrap();
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![0, 20, 40, 60, 80]);
        assert_eq!(sched.processed(), 5);
        assert_eq!(sched.cursor(), 10);
    }

    #[test]
    fn pause_is_idempotent_and_resume_continues() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let config = IdleConfig::default().with_throughput(Throughput::Fixed(4.0));
        let sched = IdleWorkScheduler::new(host.clone(), data(10), handler, config).unwrap();
        let ends = ends(&sched);
        sched.start();
        host.run_idle(1.0);
        sched.pause();
        sched.pause();
        assert_eq!(sched.state(), SchedulerState::Paused);
        assert_eq!(host.pending_idle(), 0);
        assert!(ends.borrow().is_empty());
        sched.resume();
        host.run_idle_until_idle(1.0, 10);
        assert_eq!(*log.borrow(), (0..10).collect::<Vec<_>>());
        assert_eq!(*ends.borrow(), vec![SessionEnd::Exhausted]);
    }

    #[test]
    fn restart_resets_cursor() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let config = IdleConfig::default().with_throughput(Throughput::Fixed(3.0));
        let sched = IdleWorkScheduler::new(host.clone(), data(6), handler, config).unwrap();
        sched.start();
        host.run_idle(1.0);
        sched.restart();
        assert_eq!(sched.cursor(), 0);
        assert_eq!(host.pending_idle(), 1);
        host.run_idle_until_idle(1.0, 10);
        assert_eq!(*log.borrow(), vec![0, 1, 2, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn pause_from_handler_stops_after_current_item() {
        let host = Rc::new(ManualHost::new());
        let log: Log = Rc::default();
        let slot: Rc<RefCell<Option<WeakIdleScheduler<u32>>>> = Rc::default();
        let handler = {
            let log = Rc::clone(&log);
            let slot = Rc::clone(&slot);
            move |item: &u32| {
                log.borrow_mut().push(*item);
                if *item == 2 {
                    if let Some(sched) = slot.borrow().as_ref().and_then(WeakIdleScheduler::upgrade) {
                        sched.pause();
                    }
                }
            }
        };
        let sched =
            IdleWorkScheduler::new(host.clone(), data(10), handler, IdleConfig::default()).unwrap();
        *slot.borrow_mut() = Some(sched.downgrade());
        sched.start();
        host.run_idle(f64::INFINITY);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(sched.state(), SchedulerState::Paused);
        assert_eq!(host.pending_idle(), 0);
    }

    #[test]
    fn reconfigure_from_handler_is_deferred() {
        let host = Rc::new(ManualHost::new());
        let log: Log = Rc::default();
        let slot: Rc<RefCell<Option<WeakIdleScheduler<u32>>>> = Rc::default();
        let handler = {
            let log = Rc::clone(&log);
            let slot = Rc::clone(&slot);
            move |item: &u32| {
                log.borrow_mut().push(*item);
                if *item == 1 {
                    if let Some(sched) = slot.borrow().as_ref().and_then(WeakIdleScheduler::upgrade) {
                        assert!(sched.in_slice());
                        sched
                            .reconfigure(
                                Reconfigure::new()
                                    .dataset(PagedSequence::from_vec(vec![100, 101])),
                            )
                            .unwrap();
                    }
                }
            }
        };
        let sched =
            IdleWorkScheduler::new(host.clone(), data(10), handler, IdleConfig::default()).unwrap();
        *slot.borrow_mut() = Some(sched.downgrade());
        sched.start();
        host.run_idle(f64::INFINITY);
        // The slice ended right after the request; the new data starts fresh.
        assert_eq!(*log.borrow(), vec![0, 1]);
        assert_eq!(sched.cursor(), 0);
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![0, 1, 100, 101]);
    }

    #[test]
    fn preview_ignores_layer_limit_and_restore_restarts() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let config = IdleConfig::default().with_layer_limit(Some(1));
        let sched = IdleWorkScheduler::new(host.clone(), data(10), handler, config).unwrap();
        sched.start();
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![0]);

        sched.preview(PagedSequence::from_vec(vec![7, 8, 9]));
        assert!(sched.is_previewing());
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![0, 7, 8, 9]);

        sched.restore();
        assert!(!sched.is_previewing());
        assert_eq!(sched.cursor(), 0);
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![0, 7, 8, 9, 0]);
    }

    #[test]
    fn new_dataset_with_restore_main_leaves_preview() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let sched =
            IdleWorkScheduler::new(host.clone(), data(3), handler, IdleConfig::default()).unwrap();
        sched.preview(PagedSequence::from_vec(vec![7, 8]));
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![7, 8]);

        // A bare dataset swap keeps the preview.
        sched.set_dataset(PagedSequence::from_vec(vec![40]));
        assert!(sched.is_previewing());
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![7, 8, 7, 8]);

        log.borrow_mut().clear();
        sched
            .reconfigure(
                Reconfigure::new()
                    .dataset(PagedSequence::from_vec(vec![50, 51]))
                    .restore_main(),
            )
            .unwrap();
        assert!(!sched.is_previewing());
        host.run_idle_until_idle(f64::INFINITY, 10);
        assert_eq!(*log.borrow(), vec![50, 51]);
    }

    #[test]
    fn blocking_mode_runs_synchronously() {
        let host = Rc::new(ManualHost::new());
        let (log, handler) = recorder();
        let sched = IdleWorkScheduler::new(host.clone(), data(40), handler, IdleConfig::blocking())
            .unwrap();
        sched.start();
        assert_eq!(log.borrow().len(), 40);
        assert_eq!(host.pending_idle(), 0);
        assert_eq!(sched.state(), SchedulerState::Finished);
    }

    #[test]
    fn auto_throughput_adapts_to_item_cost() {
        let host = Rc::new(ManualHost::new());
        let count = Rc::new(Cell::new(0_usize));
        let handler = {
            let host = Rc::clone(&host);
            let count = Rc::clone(&count);
            // Every item costs half a millisecond.
            move |_: &u32| {
                host.advance(0.5);
                count.set(count.get() + 1);
            }
        };
        let config = IdleConfig::default().with_throughput(Throughput::auto(Speed::Default));
        let sched = IdleWorkScheduler::new(host.clone(), data(200), handler, config).unwrap();
        sched.start();
        // The deadline check keeps the first, over-optimistic slice in budget.
        host.run_idle(4.0);
        assert_eq!(count.get(), 8);
        assert!(sched.rate() > 1.99 && sched.rate() < 2.01);
        host.run_idle(4.0);
        assert_eq!(count.get(), 16);
    }

    #[test]
    fn empty_dataset_finishes_immediately() {
        let host = Rc::new(ManualHost::new());
        let sched = IdleWorkScheduler::new(
            host.clone(),
            PagedSequence::new(),
            |_: &u32| {},
            IdleConfig::default(),
        )
        .unwrap();
        let ends = ends(&sched);
        sched.start();
        host.run_idle(1.0);
        assert_eq!(*ends.borrow(), vec![SessionEnd::Exhausted]);
    }

    #[test]
    fn dropping_scheduler_cancels_pending_slice() {
        let host = Rc::new(ManualHost::new());
        let sched =
            IdleWorkScheduler::new(host.clone(), data(3), |_: &u32| {}, IdleConfig::default())
                .unwrap();
        sched.start();
        assert_eq!(host.pending_idle(), 1);
        drop(sched);
        assert_eq!(host.pending_idle(), 0);
    }
}
