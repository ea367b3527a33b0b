// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progressive polyline rendering.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use kurbo::Point;
use trickle_index::PagedSequence;
use trickle_schedule::{IdleConfig, IdleHost, IdleWorkScheduler, Reconfigure, Throughput};

use crate::error::MarksError;
use crate::surface::{LineStyle, Rgba, Surface};
use crate::types::{Changed, CoordinateTransform};

/// Extracts an item's polyline in data coordinates.
pub type PathFn<T> = Rc<dyn Fn(&T) -> Vec<Point>>;

/// Chooses an item's stroke.
pub type StyleFn<T> = Rc<dyn Fn(&T) -> LineStyle>;

/// Stroke used when no style accessor is given: 1 unit wide, amber.
pub const DEFAULT_PATH_STYLE: LineStyle = LineStyle::new(1.0, Rgba::opaque(255, 217, 0));

/// Options for [`Paths`].
pub struct PathsOptions<T> {
    /// Polyline of an item.
    pub get_path: PathFn<T>,
    /// Stroke of an item.
    pub get_style: StyleFn<T>,
    /// Applied to every point before drawing.
    pub transform: CoordinateTransform,
    /// Scheduler configuration.
    pub config: IdleConfig,
}

impl<T> PathsOptions<T> {
    /// Options with the given path accessor and defaults for the rest.
    pub fn new(get_path: impl Fn(&T) -> Vec<Point> + 'static) -> Self {
        Self {
            get_path: Rc::new(get_path),
            get_style: Rc::new(|_: &T| DEFAULT_PATH_STYLE),
            transform: CoordinateTransform::identity(),
            config: IdleConfig::default(),
        }
    }

    /// Replace the style accessor.
    #[must_use]
    pub fn with_style(mut self, get_style: impl Fn(&T) -> LineStyle + 'static) -> Self {
        self.get_style = Rc::new(get_style);
        self
    }

    /// Replace the coordinate transform.
    #[must_use]
    pub fn with_transform(mut self, transform: impl Into<CoordinateTransform>) -> Self {
        self.transform = transform.into();
        self
    }

    /// Replace the scheduler configuration.
    #[must_use]
    pub fn with_config(mut self, config: IdleConfig) -> Self {
        self.config = config;
        self
    }
}

impl<T> Clone for PathsOptions<T> {
    fn clone(&self) -> Self {
        Self {
            get_path: Rc::clone(&self.get_path),
            get_style: Rc::clone(&self.get_style),
            transform: self.transform.clone(),
            config: self.config,
        }
    }
}

impl<T> fmt::Debug for PathsOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathsOptions")
            .field("transform", &self.transform)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A partial update for [`Paths::set_options`]. Unset fields keep their value.
pub struct PathsUpdate<T> {
    data: Option<Vec<T>>,
    get_path: Option<PathFn<T>>,
    get_style: Option<StyleFn<T>>,
    transform: Option<CoordinateTransform>,
    throughput: Option<Throughput>,
}

impl<T> Default for PathsUpdate<T> {
    fn default() -> Self {
        Self {
            data: None,
            get_path: None,
            get_style: None,
            transform: None,
            throughput: None,
        }
    }
}

impl<T> PathsUpdate<T> {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the items.
    #[must_use]
    pub fn data(mut self, data: Vec<T>) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace the path accessor.
    #[must_use]
    pub fn path(mut self, get_path: impl Fn(&T) -> Vec<Point> + 'static) -> Self {
        self.get_path = Some(Rc::new(get_path));
        self
    }

    /// Replace the style accessor.
    #[must_use]
    pub fn style(mut self, get_style: impl Fn(&T) -> LineStyle + 'static) -> Self {
        self.get_style = Some(Rc::new(get_style));
        self
    }

    /// Replace the coordinate transform.
    #[must_use]
    pub fn transform(mut self, transform: impl Into<CoordinateTransform>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    /// Replace the scheduler throughput.
    #[must_use]
    pub fn throughput(mut self, throughput: impl Into<Throughput>) -> Self {
        self.throughput = Some(throughput.into());
        self
    }
}

impl<T> fmt::Debug for PathsUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathsUpdate")
            .field("data", &self.data.as_ref().map(Vec::len))
            .field("get_path", &self.get_path.is_some())
            .field("get_style", &self.get_style.is_some())
            .field("transform", &self.transform)
            .field("throughput", &self.throughput)
            .finish()
    }
}

struct Accessors<T> {
    get_path: PathFn<T>,
    get_style: StyleFn<T>,
    transform: CoordinateTransform,
}

/// Strokes one polyline per item in idle-time slices.
pub struct Paths<T: 'static, S: 'static> {
    surface: Rc<RefCell<S>>,
    accessors: Rc<RefCell<Accessors<T>>>,
    scheduler: IdleWorkScheduler<T>,
}

impl<T: 'static, S: Surface + 'static> Paths<T, S> {
    /// Set up rendering of `data` into `surface`. Nothing is drawn until
    /// [`render`](Self::render).
    pub fn new<H: IdleHost + 'static>(
        host: Rc<H>,
        surface: Rc<RefCell<S>>,
        data: Vec<T>,
        options: PathsOptions<T>,
    ) -> Result<Self, MarksError> {
        let accessors = Rc::new(RefCell::new(Accessors {
            get_path: options.get_path,
            get_style: options.get_style,
            transform: options.transform,
        }));
        let handler = {
            let surface = Rc::clone(&surface);
            let accessors = Rc::clone(&accessors);
            move |item: &T| draw_path(&surface, &accessors, item)
        };
        let scheduler =
            IdleWorkScheduler::new(host, PagedSequence::from_vec(data), handler, options.config)?;
        Ok(Self {
            surface,
            accessors,
            scheduler,
        })
    }

    /// Clear the surface and draw every item from the first.
    pub fn render(&self) {
        self.surface.borrow_mut().clear();
        self.scheduler.start();
    }

    /// Apply `update` and draw again from the first item.
    ///
    /// The surface is not cleared; call [`render`](Self::render) for that.
    /// Returns which parts changed. An invalid throughput is rejected before
    /// anything changes.
    pub fn set_options(&self, update: PathsUpdate<T>) -> Result<Changed, MarksError> {
        let PathsUpdate {
            data,
            get_path,
            get_style,
            transform,
            throughput,
        } = update;
        let mut changed = Changed::empty();
        let mut change = Reconfigure::new();
        if let Some(throughput) = throughput {
            if throughput != self.scheduler.throughput() {
                changed |= Changed::THROUGHPUT;
            }
            change = change.throughput(throughput);
        }
        change.validate()?;
        if let Some(data) = data {
            changed |= Changed::DATA;
            change = change.dataset(PagedSequence::from_vec(data));
        }
        {
            let mut acc = self.accessors.borrow_mut();
            if let Some(get_path) = get_path {
                changed |= Changed::GEOMETRY;
                acc.get_path = get_path;
            }
            if let Some(get_style) = get_style {
                changed |= Changed::STYLE;
                acc.get_style = get_style;
            }
            if let Some(transform) = transform {
                if !transform.same_as(&acc.transform) {
                    changed |= Changed::TRANSFORM;
                }
                acc.transform = transform;
            }
        }
        self.scheduler.reconfigure(change)?;
        Ok(changed)
    }

    /// Stop drawing. The cursor is kept.
    pub fn pause(&self) {
        self.scheduler.pause();
    }

    /// Continue after [`pause`](Self::pause).
    pub fn resume(&self) {
        self.scheduler.resume();
    }

    /// The drawing surface.
    pub fn surface(&self) -> &Rc<RefCell<S>> {
        &self.surface
    }

    /// The scheduler driving the draw callback.
    pub fn scheduler(&self) -> &IdleWorkScheduler<T> {
        &self.scheduler
    }
}

impl<T: 'static, S: 'static> fmt::Debug for Paths<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paths")
            .field("transform", &self.accessors.borrow().transform)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

fn draw_path<T, S: Surface>(surface: &RefCell<S>, accessors: &RefCell<Accessors<T>>, item: &T) {
    // Accessors may call `set_options`, so none of them runs under the borrow.
    let (get_path, get_style, transform) = {
        let acc = accessors.borrow();
        (
            Rc::clone(&acc.get_path),
            Rc::clone(&acc.get_style),
            acc.transform.clone(),
        )
    };
    let points: Vec<Point> = get_path(item)
        .into_iter()
        .map(|p| transform.apply(p))
        .collect();
    let style = get_style(item);
    if points.is_empty() {
        return;
    }
    surface.borrow_mut().stroke_polyline(&points, style);
}
