// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filled grid cells with an image cache.
//!
//! Heatmap-style grids repeat a handful of cell looks many times. [`Grid`]
//! draws each distinct `(width, height, color, border)` once, reads the pixels
//! back, and pastes the cached block for every later cell with the same look.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};
use trickle_index::PagedSequence;
use trickle_schedule::{IdleConfig, IdleHost, IdleWorkScheduler};

use crate::error::MarksError;
use crate::surface::{LineStyle, PixelBlock, Rgba, Surface};

/// One cell, given by its bottom-left and top-right corners in surface
/// coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridCell {
    /// Bottom-left corner; on screen its `y` is the larger one.
    pub bottom_left: Point,
    /// Top-right corner.
    pub top_right: Point,
    /// Fill color.
    pub color: Rgba,
    /// Outline color, if the cell has a border.
    pub border: Option<Rgba>,
}

/// Where and how large a cell lands on the surface, in whole pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Top-left corner, rounded to whole pixels.
    pub origin: (i64, i64),
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Placement {
    /// The covered rectangle.
    pub fn rect(&self) -> Rect {
        let size = (f64::from(self.width), f64::from(self.height));
        Rect::from_origin_size(self.origin_point(), size)
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "Pixel coordinates are far below 2^52."
    )]
    fn origin_point(&self) -> Point {
        Point::new(self.origin.0 as f64, self.origin.1 as f64)
    }
}

impl GridCell {
    /// A black cell with a black border.
    pub fn new(bottom_left: Point, top_right: Point) -> Self {
        Self {
            bottom_left,
            top_right,
            color: Rgba::BLACK,
            border: Some(Rgba::BLACK),
        }
    }

    /// Replace the fill color.
    #[must_use]
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Replace the border color; `None` draws no outline.
    #[must_use]
    pub fn with_border(mut self, border: Option<Rgba>) -> Self {
        self.border = border;
        self
    }

    /// Pixel placement, or `None` when the rounded width or height is not
    /// positive.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Sizes are checked positive and surfaces are far smaller than u32::MAX."
    )]
    pub fn placement(&self) -> Option<Placement> {
        let (x0, y1) = (self.bottom_left.x, self.bottom_left.y);
        let (x1, y0) = (self.top_right.x, self.top_right.y);
        let width = (x1 - x0).round();
        let height = (y1 - y0).round();
        let positive = |v: f64| v >= 1.0;
        if !positive(width) || !positive(height) {
            return None;
        }
        Some(Placement {
            origin: (x0.round() as i64, y0.round() as i64),
            width: width as u32,
            height: height as u32,
        })
    }
}

type CacheKey = (u32, u32, Rgba, Option<Rgba>);

struct GridInner<S> {
    surface: Rc<RefCell<S>>,
    cache: RefCell<BTreeMap<CacheKey, PixelBlock>>,
    use_cache: Cell<bool>,
}

impl<S: Surface> GridInner<S> {
    fn render(&self, cell: &GridCell) -> bool {
        let Some(place) = cell.placement() else {
            return false;
        };
        let key = (place.width, place.height, cell.color, cell.border);
        let origin = place.origin_point();
        let mut surface = self.surface.borrow_mut();
        if self.use_cache.get() {
            if let Some(block) = self.cache.borrow().get(&key) {
                surface.write_pixels(block, origin);
                return true;
            }
        }
        let rect = place.rect();
        if let Some(border) = cell.border {
            surface.clear_rect(rect);
            surface.fill_rect(rect, cell.color);
            surface.stroke_rect(rect, LineStyle::new(1.0, border));
        } else {
            surface.fill_rect(rect, cell.color);
        }
        if self.use_cache.get() {
            let block = surface.read_pixels(origin, place.width, place.height);
            self.cache.borrow_mut().insert(key, block);
        }
        true
    }
}

/// Renders [`GridCell`]s into a shared surface.
pub struct Grid<S: 'static> {
    inner: Rc<GridInner<S>>,
}

impl<S: Surface + 'static> Grid<S> {
    /// A grid drawing into `surface` with caching on.
    pub fn new(surface: Rc<RefCell<S>>) -> Self {
        Self {
            inner: Rc::new(GridInner {
                surface,
                cache: RefCell::default(),
                use_cache: Cell::new(true),
            }),
        }
    }

    /// Turn the image cache on or off. Cached images are kept either way.
    pub fn set_use_cache(&self, use_cache: bool) {
        self.inner.use_cache.set(use_cache);
    }

    /// Whether the image cache is used.
    pub fn use_cache(&self) -> bool {
        self.inner.use_cache.get()
    }

    /// Distinct cell looks cached so far.
    pub fn cached_images(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    /// Forget every cached image, for instance after the surface was resized.
    pub fn clear_cache(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    /// Draw one cell. Returns `false` if it was skipped for having no area.
    pub fn render_cell(&self, cell: &GridCell) -> bool {
        self.inner.render(cell)
    }

    /// Draw every cell now and return how many were drawn.
    pub fn group_render(&self, cells: &[GridCell]) -> usize {
        cells.iter().filter(|cell| self.inner.render(cell)).count()
    }

    /// Draw `cells` in idle-time slices. The returned scheduler is already
    /// started; dropping it stops the render.
    pub fn progressive<H: IdleHost + 'static>(
        &self,
        host: Rc<H>,
        cells: Vec<GridCell>,
        config: IdleConfig,
    ) -> Result<IdleWorkScheduler<GridCell>, MarksError> {
        let inner = Rc::clone(&self.inner);
        let scheduler = IdleWorkScheduler::new(
            host,
            PagedSequence::from_vec(cells),
            move |cell: &GridCell| {
                inner.render(cell);
            },
            config,
        )?;
        scheduler.start();
        Ok(scheduler)
    }

    /// The drawing surface.
    pub fn surface(&self) -> &Rc<RefCell<S>> {
        &self.inner.surface
    }
}

impl<S: 'static> Clone for Grid<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static> fmt::Debug for Grid<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("use_cache", &self.inner.use_cache.get())
            .field("cached_images", &self.inner.cache.borrow().len())
            .finish_non_exhaustive()
    }
}
