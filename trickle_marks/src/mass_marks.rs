// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progressive rendering of large point sets.
//!
//! [`MassMarks`] hands every point to a draw callback in idle-time slices. The
//! draw order is either a seeded shuffle, so a partial render is an even
//! sample, or the breadth-first order of a k-d tree, so each completed tree
//! level refines the one before. With the tree, a layer limit turns the render
//! into a level-of-detail view of `2^L - 1` points, and nearest-neighbor
//! lookups are available.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use trickle_index::{Coords, DEFAULT_PAGE_CAPACITY, KdTree, PagedSequence};
use trickle_schedule::{
    ConfigError, IdleConfig, IdleHost, IdleWorkScheduler, Reconfigure, RunMode, Speed, Throughput,
};

use crate::error::MarksError;

/// Seed used by [`MassMarksOptions::default`] for the shuffled order.
pub const DEFAULT_SEED: u64 = 0x7_1c4e;

/// Anything with a position on the surface.
pub trait Positioned {
    /// Where the item is drawn.
    fn position(&self) -> Point;
}

impl Positioned for Point {
    fn position(&self) -> Point {
        *self
    }
}

/// Options for [`MassMarks`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassMarksOptions {
    /// Points drawn per millisecond of idle time.
    pub speed: Throughput,
    /// Order points by a k-d tree instead of shuffling them.
    pub use_kd: bool,
    /// Draw at most `2^L - 1` points when set.
    pub layer: Option<u32>,
    /// Page size of the draw-order sequence.
    pub page_capacity: usize,
    /// Seed of the shuffle when `use_kd` is off.
    pub seed: u64,
    /// Whether to yield to the host between slices.
    pub mode: RunMode,
}

impl Default for MassMarksOptions {
    fn default() -> Self {
        Self {
            speed: Speed::Default.into(),
            use_kd: false,
            layer: None,
            page_capacity: DEFAULT_PAGE_CAPACITY,
            seed: DEFAULT_SEED,
            mode: RunMode::Idle,
        }
    }
}

impl MassMarksOptions {
    /// Replace the speed.
    #[must_use]
    pub fn with_speed(mut self, speed: impl Into<Throughput>) -> Self {
        self.speed = speed.into();
        self
    }

    /// Turn the k-d ordering on or off.
    #[must_use]
    pub fn with_kd(mut self, use_kd: bool) -> Self {
        self.use_kd = use_kd;
        self
    }

    /// Replace the layer limit.
    #[must_use]
    pub fn with_layer(mut self, layer: Option<u32>) -> Self {
        self.layer = layer;
        self
    }

    /// Replace the page capacity.
    #[must_use]
    pub fn with_page_capacity(mut self, page_capacity: usize) -> Self {
        self.page_capacity = page_capacity;
        self
    }

    /// Replace the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the run mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    fn idle_config(&self) -> IdleConfig {
        IdleConfig {
            throughput: self.speed,
            mode: self.mode,
            layer_limit: self.layer,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_capacity == 0 {
            return Err(ConfigError::ZeroPageCapacity);
        }
        self.idle_config().validate()
    }
}

/// A progressively drawn set of points.
pub struct MassMarks<T: 'static> {
    scheduler: IdleWorkScheduler<T>,
    tree: Option<KdTree<T>>,
    len: usize,
    options: MassMarksOptions,
}

impl<T: Positioned + Clone + 'static> MassMarks<T> {
    /// Arrange `items` and start drawing them with `drawer`.
    ///
    /// In [`RunMode::Blocking`] every point is drawn before this returns.
    pub fn new<H: IdleHost + 'static>(
        host: Rc<H>,
        items: Vec<T>,
        drawer: impl FnMut(&T) + 'static,
        options: MassMarksOptions,
    ) -> Result<Self, MarksError> {
        options.validate()?;
        let len = items.len();
        let (tree, order) = arrange(items, &options);
        let scheduler = IdleWorkScheduler::new(host, order, drawer, options.idle_config())?;
        scheduler.start();
        Ok(Self {
            scheduler,
            tree,
            len,
            options,
        })
    }

    /// Replace the points and draw them from the start.
    ///
    /// Any nearest-point preview is dropped along with the old points.
    pub fn set_data(&mut self, items: Vec<T>) -> Result<(), MarksError> {
        let len = items.len();
        let (tree, order) = arrange(items, &self.options);
        self.scheduler
            .reconfigure(Reconfigure::new().dataset(order).restore_main())?;
        self.len = len;
        self.tree = tree;
        Ok(())
    }

    /// Up to `max_count` points within squared distance `max_distance` of
    /// `center`, nearest first.
    ///
    /// Empty unless the points are ordered by a k-d tree.
    pub fn nearest(&self, center: Point, max_count: usize, max_distance: f64) -> Vec<(&T, f64)> {
        match &self.tree {
            Some(tree) => tree.nearest(coords(center), max_count, max_distance),
            None => Vec::new(),
        }
    }

    /// Redraw only the points [`nearest`](Self::nearest) finds, ignoring the
    /// layer limit, until [`restore`](Self::restore).
    ///
    /// Returns the number of points found. Without a k-d tree nothing changes
    /// and zero is returned.
    pub fn preview_nearest(&self, center: Point, max_count: usize, max_distance: f64) -> usize {
        if self.tree.is_none() {
            log::debug!("nearest preview requested without a k-d tree");
            return 0;
        }
        let found: Vec<T> = self
            .nearest(center, max_count, max_distance)
            .into_iter()
            .map(|(item, _)| item.clone())
            .collect();
        let count = found.len();
        self.scheduler
            .preview(PagedSequence::from_vec_with_capacity(found, self.options.page_capacity));
        count
    }
}

impl<T: 'static> MassMarks<T> {
    /// Leave lookup mode and redraw the full set.
    pub fn restore(&self) {
        self.scheduler.restore();
    }

    /// Continue drawing after [`stop`](Self::stop).
    pub fn start(&self) {
        self.scheduler.resume();
    }

    /// Swap the draw callback and draw from the start.
    pub fn start_with(&self, drawer: impl FnMut(&T) + 'static) {
        self.scheduler.set_handler(drawer);
    }

    /// Stop drawing. The cursor is kept.
    pub fn stop(&self) {
        self.scheduler.pause();
    }

    /// Draw again from the first point.
    pub fn restart(&self) {
        self.scheduler.restart();
    }

    /// Change the level-of-detail limit and redraw.
    pub fn set_layer(&mut self, layer: Option<u32>) -> Result<(), MarksError> {
        self.scheduler.set_layer_limit(layer)?;
        self.options.layer = layer;
        Ok(())
    }

    /// Change the drawing speed and redraw.
    pub fn set_speed(&mut self, speed: impl Into<Throughput>) -> Result<(), MarksError> {
        let speed = speed.into();
        self.scheduler.set_throughput(speed)?;
        self.options.speed = speed;
        Ok(())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether nearest queries are available.
    pub fn is_indexed(&self) -> bool {
        self.tree.is_some()
    }

    /// Current options.
    pub fn options(&self) -> &MassMarksOptions {
        &self.options
    }

    /// The scheduler driving the draw callback.
    pub fn scheduler(&self) -> &IdleWorkScheduler<T> {
        &self.scheduler
    }
}

impl<T: 'static> fmt::Debug for MassMarks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MassMarks")
            .field("len", &self.len)
            .field("indexed", &self.tree.is_some())
            .field("options", &self.options)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

fn coords(p: Point) -> Coords {
    [p.x, p.y]
}

fn arrange<T: Positioned + Clone>(
    mut items: Vec<T>,
    options: &MassMarksOptions,
) -> (Option<KdTree<T>>, PagedSequence<T>) {
    if options.use_kd {
        let tree = KdTree::from_items(items, |item| coords(item.position()));
        let order = tree.linearize_with_capacity(options.page_capacity);
        (Some(tree), order)
    } else {
        items.shuffle(&mut SmallRng::seed_from_u64(options.seed));
        (
            None,
            PagedSequence::from_vec_with_capacity(items, options.page_capacity),
        )
    }
}
