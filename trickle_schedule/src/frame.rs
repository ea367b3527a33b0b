// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Refresh-synchronized animation of spirits.
//!
//! Each frame runs, in order: the frame-start hook, every settled spirit, every
//! animating spirit, then the frame-end hook. When no spirit is left animating
//! the scheduler fires its animation-end hook once and stops requesting frames
//! until it is started again or handed a new spirit.
//!
//! Hooks and render callbacks may call back into the scheduler. Spirits added
//! during a frame join at the end of it; `clear` during a frame drops
//! everything that was present when it was called.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::{fmt, mem};

use crate::error::ConfigError;
use crate::host::{FrameHost, TaskHandle};
use crate::spirit::{Spirit, SpiritId};

type Hook = Box<dyn FnMut()>;

#[derive(Default)]
struct SpiritSets {
    animating: Vec<Spirit>,
    settled: Vec<Spirit>,
}

impl SpiritSets {
    fn insert(&mut self, spirit: Spirit) {
        if spirit.is_settled() {
            self.settled.push(spirit);
        } else {
            self.animating.push(spirit);
        }
    }

    fn remove(&mut self, ids: &[SpiritId]) {
        self.animating.retain(|s| !ids.contains(&s.id));
        self.settled.retain(|s| !ids.contains(&s.id));
    }
}

/// Drives spirits once per host frame.
///
/// Cloning yields another handle to the same scheduler.
pub struct FrameAnimationScheduler {
    inner: Rc<Inner>,
}

/// Non-owning handle for use inside the scheduler's own callbacks.
#[derive(Clone)]
pub struct WeakFrameScheduler {
    inner: Weak<Inner>,
}

struct Inner {
    host: Rc<dyn FrameHost>,
    sets: RefCell<SpiritSets>,
    /// Spirits added while a frame is running.
    incoming: RefCell<Vec<Spirit>>,
    /// Removals requested while a frame is running.
    removed: RefCell<Vec<SpiritId>>,
    on_frame_start: RefCell<Option<Hook>>,
    on_frame_end: RefCell<Option<Hook>>,
    on_animation_end: RefCell<Option<Hook>>,
    pending: Cell<Option<TaskHandle>>,
    in_frame: Cell<bool>,
    cleared_in_frame: Cell<bool>,
    rearm_requested: Cell<bool>,
    /// Animation end has not fired yet for this session.
    armed: Cell<bool>,
    next_id: Cell<u64>,
    frames: Cell<u64>,
    counts: Cell<(usize, usize)>,
}

fn fire(slot: &RefCell<Option<Hook>>) {
    let hook = slot.borrow_mut().take();
    if let Some(mut hook) = hook {
        hook();
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(hook);
        }
    }
}

impl FrameAnimationScheduler {
    /// Create an idle scheduler.
    pub fn new<H: FrameHost + 'static>(host: Rc<H>) -> Self {
        let host: Rc<dyn FrameHost> = host;
        Self {
            inner: Rc::new(Inner {
                host,
                sets: RefCell::default(),
                incoming: RefCell::default(),
                removed: RefCell::default(),
                on_frame_start: RefCell::new(None),
                on_frame_end: RefCell::new(None),
                on_animation_end: RefCell::new(None),
                pending: Cell::new(None),
                in_frame: Cell::new(false),
                cleared_in_frame: Cell::new(false),
                rearm_requested: Cell::new(false),
                armed: Cell::new(false),
                next_id: Cell::new(1),
                frames: Cell::new(0),
                counts: Cell::new((0, 0)),
            }),
        }
    }

    /// Hook run at the start of every frame, typically to clear the surface.
    pub fn set_on_frame_start(&self, hook: impl FnMut() + 'static) {
        *self.inner.on_frame_start.borrow_mut() = Some(Box::new(hook));
    }

    /// Hook run after every frame's spirits have rendered.
    pub fn set_on_frame_end(&self, hook: impl FnMut() + 'static) {
        *self.inner.on_frame_end.borrow_mut() = Some(Box::new(hook));
    }

    /// Hook run once per session, after the last animating spirit settles.
    pub fn set_on_animation_end(&self, hook: impl FnMut() + 'static) {
        *self.inner.on_animation_end.borrow_mut() = Some(Box::new(hook));
    }

    /// Begin requesting frames and re-arm the animation-end hook.
    pub fn start(&self) {
        let inner = &self.inner;
        if inner.in_frame.get() {
            inner.rearm_requested.set(true);
            return;
        }
        inner.armed.set(true);
        log::debug!("frame animation started");
        inner.request();
    }

    /// Add a spirit and re-arm. Fails if the spirit has no interpolation steps.
    pub fn add_spirit(&self, mut spirit: Spirit) -> Result<SpiritId, ConfigError> {
        spirit.validate()?;
        let inner = &self.inner;
        let id = SpiritId(inner.next_id.get());
        inner.next_id.set(id.0 + 1);
        spirit.id = id;
        inner.armed.set(true);
        if inner.in_frame.get() {
            inner.incoming.borrow_mut().push(spirit);
        } else {
            inner.sets.borrow_mut().insert(spirit);
            inner.sync_counts();
            inner.request();
        }
        Ok(id)
    }

    /// Drop a spirit without settling it. Unknown ids are ignored.
    pub fn remove_spirit(&self, id: SpiritId) {
        let inner = &self.inner;
        inner.incoming.borrow_mut().retain(|s| s.id != id);
        if inner.in_frame.get() {
            inner.removed.borrow_mut().push(id);
        } else {
            let removed = {
                let mut sets = inner.sets.borrow_mut();
                let sets = &mut *sets;
                let mut gone: Vec<Spirit> = sets.animating.extract_if(.., |s| s.id == id).collect();
                gone.extend(sets.settled.extract_if(.., |s| s.id == id));
                gone
            };
            drop(removed);
            inner.sync_counts();
        }
    }

    /// Drop every spirit and cancel the pending frame. Idempotent, fires no
    /// hook.
    pub fn clear(&self) {
        let inner = &self.inner;
        if let Some(handle) = inner.pending.take() {
            inner.host.cancel_frame(handle);
        }
        inner.armed.set(false);
        inner.rearm_requested.set(false);
        let incoming = mem::take(&mut *inner.incoming.borrow_mut());
        inner.removed.borrow_mut().clear();
        if inner.in_frame.get() {
            inner.cleared_in_frame.set(true);
        } else {
            let sets = mem::take(&mut *inner.sets.borrow_mut());
            drop(sets);
            inner.counts.set((0, 0));
        }
        drop(incoming);
    }

    /// Number of `(animating, settled)` spirits as of the last frame boundary.
    pub fn spirit_counts(&self) -> (usize, usize) {
        self.inner.counts.get()
    }

    /// Whether a frame is requested or running.
    pub fn is_running(&self) -> bool {
        self.inner.pending.get().is_some() || self.inner.in_frame.get()
    }

    /// Frames run since creation.
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }

    /// A handle that does not keep the scheduler alive.
    pub fn downgrade(&self) -> WeakFrameScheduler {
        WeakFrameScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Clone for FrameAnimationScheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for FrameAnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (animating, settled) = self.inner.counts.get();
        f.debug_struct("FrameAnimationScheduler")
            .field("animating", &animating)
            .field("settled", &settled)
            .field("frames", &self.inner.frames.get())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl WeakFrameScheduler {
    /// The scheduler, if it is still alive.
    pub fn upgrade(&self) -> Option<FrameAnimationScheduler> {
        self.inner
            .upgrade()
            .map(|inner| FrameAnimationScheduler { inner })
    }
}

impl fmt::Debug for WeakFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakFrameScheduler")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Inner {
    fn request(self: &Rc<Self>) {
        if self.pending.get().is_some() || self.in_frame.get() {
            return;
        }
        let weak = Rc::downgrade(self);
        let handle = self.host.request_frame(Box::new(move |timestamp: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.tick(timestamp);
            }
        }));
        self.pending.set(Some(handle));
    }

    fn sync_counts(&self) {
        let sets = self.sets.borrow();
        self.counts.set((sets.animating.len(), sets.settled.len()));
    }

    fn tick(self: &Rc<Self>, timestamp: f64) {
        self.pending.set(None);
        self.in_frame.set(true);
        self.cleared_in_frame.set(false);

        fire(&self.on_frame_start);
        let mut sets = mem::take(&mut *self.sets.borrow_mut());
        let mut newly_settled = 0_usize;

        if !self.cleared_in_frame.get() {
            for spirit in &mut sets.settled {
                spirit.render_settled();
                if self.cleared_in_frame.get() {
                    break;
                }
            }
        }
        if !self.cleared_in_frame.get() {
            let mut still = Vec::with_capacity(sets.animating.len());
            for mut spirit in sets.animating.drain(..) {
                if self.cleared_in_frame.get() {
                    break;
                }
                if spirit.advance() {
                    newly_settled += 1;
                    spirit.fire_settle();
                    sets.settled.push(spirit);
                } else {
                    still.push(spirit);
                }
            }
            sets.animating = still;
        }

        self.in_frame.set(false);
        if self.cleared_in_frame.replace(false) {
            drop(sets);
        } else {
            let removed = mem::take(&mut *self.removed.borrow_mut());
            if !removed.is_empty() {
                sets.remove(&removed);
            }
            *self.sets.borrow_mut() = sets;
        }
        let incoming = mem::take(&mut *self.incoming.borrow_mut());
        let had_incoming = !incoming.is_empty();
        {
            let mut sets = self.sets.borrow_mut();
            for spirit in incoming {
                sets.insert(spirit);
            }
        }
        self.sync_counts();
        self.frames.set(self.frames.get() + 1);
        if newly_settled > 0 {
            log::debug!(
                "frame at {timestamp:.1} ms settled {newly_settled} spirits, {} still animating",
                self.counts.get().0
            );
        }
        fire(&self.on_frame_end);

        if self.rearm_requested.replace(false) {
            self.armed.set(true);
            self.request();
            return;
        }
        if self.counts.get().0 > 0 || had_incoming {
            self.request();
            return;
        }
        if self.armed.replace(false) {
            log::debug!("frame animation ended after {} frames", self.frames.get());
            fire(&self.on_animation_end);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.host.cancel_frame(handle);
        }
    }
}
