// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arcs that grow from one endpoint to the other, for origin-destination
//! overlays.
//!
//! Every endpoint pair has two circles through it for a given rate (see
//! [`crate::arc`]). Of the short arcs those circles cut, only the ones bulging
//! above their center are drawn, so each pair gets a single arc that rises
//! over the chord. Each arc is a [`Spirit`] sweeping its end angle from the
//! start angle to the far endpoint; the whole surface is cleared at the start
//! of every frame and all arcs are redrawn.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::{Circle, Point};
use trickle_schedule::{
    ConfigError, Curve, DEFAULT_SPLIT_COUNT, FrameAnimationScheduler, FrameHost, Spirit,
};

use crate::arc::{self, CanvasArc};
use crate::error::MarksError;
use crate::surface::{LineStyle, Surface};
use crate::types::{Changed, CoordinateTransform};

/// An arc's two endpoints in data coordinates.
pub type Endpoints = [Point; 2];

type ArcEndHook = Rc<RefCell<Option<Box<dyn FnMut(usize)>>>>;

/// Options for [`AnimatedArcs`].
#[derive(Clone, Debug)]
pub struct AnimatedArcsOptions {
    /// Chord length over radius, in `(0, 2]`. Smaller rates give flatter arcs.
    pub rate: f64,
    /// Stroke of every arc.
    pub stroke: LineStyle,
    /// Frames an arc takes to grow, minus one.
    pub split_count: usize,
    /// Easing of the growth.
    pub curve: Curve,
}

impl Default for AnimatedArcsOptions {
    fn default() -> Self {
        Self {
            rate: 0.5,
            stroke: LineStyle::default(),
            split_count: DEFAULT_SPLIT_COUNT,
            curve: Curve::Linear,
        }
    }
}

/// A partial update for [`AnimatedArcs::set_options`].
#[derive(Clone, Debug, Default)]
pub struct ArcsUpdate {
    data: Option<Vec<Endpoints>>,
    transform: Option<CoordinateTransform>,
    rate: Option<f64>,
    stroke: Option<LineStyle>,
}

impl ArcsUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the endpoint pairs.
    #[must_use]
    pub fn data(mut self, data: Vec<Endpoints>) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace the coordinate transform.
    #[must_use]
    pub fn transform(mut self, transform: impl Into<CoordinateTransform>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    /// Replace the rate.
    #[must_use]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Replace the stroke.
    #[must_use]
    pub fn stroke(mut self, stroke: LineStyle) -> Self {
        self.stroke = Some(stroke);
        self
    }
}

/// Animated arc overlay over a shared surface.
pub struct AnimatedArcs<S: 'static> {
    surface: Rc<RefCell<S>>,
    frames: FrameAnimationScheduler,
    stroke: Rc<Cell<LineStyle>>,
    data: Vec<Endpoints>,
    transform: CoordinateTransform,
    options: AnimatedArcsOptions,
    unit: [Circle; 2],
    on_arc_end: ArcEndHook,
}

impl<S: Surface + 'static> AnimatedArcs<S> {
    /// Set up arcs for `data`. Nothing is drawn until [`render`](Self::render).
    pub fn new<H: FrameHost + 'static>(
        host: Rc<H>,
        surface: Rc<RefCell<S>>,
        data: Vec<Endpoints>,
        transform: impl Into<CoordinateTransform>,
        options: AnimatedArcsOptions,
    ) -> Result<Self, MarksError> {
        if options.split_count == 0 {
            return Err(ConfigError::ZeroSplitCount.into());
        }
        let unit = arc::unit_circles(options.rate)?;
        let transform = transform.into();
        check_endpoints(&data, &transform)?;

        let frames = FrameAnimationScheduler::new(host);
        let clear = Rc::clone(&surface);
        frames.set_on_frame_start(move || clear.borrow_mut().clear());
        Ok(Self {
            surface,
            frames,
            stroke: Rc::new(Cell::new(options.stroke)),
            data,
            transform,
            options,
            unit,
            on_arc_end: Rc::default(),
        })
    }

    /// Run `hook` once each time every arc has finished growing.
    pub fn set_on_animation_end(&self, hook: impl FnMut() + 'static) {
        self.frames.set_on_animation_end(hook);
    }

    /// Run `hook` with the index of an endpoint pair when its arc reaches the
    /// far endpoint.
    pub fn set_on_arc_end(&self, hook: impl FnMut(usize) + 'static) {
        *self.on_arc_end.borrow_mut() = Some(Box::new(hook));
    }

    /// Drop the current arcs and grow every arc again from its start.
    pub fn render(&self) {
        self.frames.clear();
        let mut spirits = 0_usize;
        for (index, &[p1, p2]) in self.data.iter().enumerate() {
            let (p1, p2) = (self.transform.apply(p1), self.transform.apply(p2));
            for unit in self.unit {
                let circle = arc::transformed_circle(p1, p2, unit);
                if let Some(arc) = arc::upper_arc(circle, p1, p2) {
                    self.grow(index, arc);
                    spirits += 1;
                }
            }
        }
        log::debug!("rendering {spirits} arcs for {} endpoint pairs", self.data.len());
        self.frames.start();
    }

    fn grow(&self, index: usize, arc: CanvasArc) {
        let surface = Rc::clone(&self.surface);
        let stroke = Rc::clone(&self.stroke);
        let on_arc_end = Rc::clone(&self.on_arc_end);
        let spirit = Spirit::animated(arc.start_angle, arc.end_angle, move |angle, _| {
            let partial = CanvasArc {
                end_angle: angle,
                ..arc
            };
            surface.borrow_mut().stroke_arc(&partial, stroke.get());
        })
        .with_split_count(self.options.split_count)
        .with_curve(self.options.curve.clone())
        .on_settle(move || {
            // The hook may replace itself; keep the replacement if so.
            let taken = on_arc_end.borrow_mut().take();
            if let Some(mut hook) = taken {
                hook(index);
                on_arc_end.borrow_mut().get_or_insert(hook);
            }
        });
        if let Err(err) = self.frames.add_spirit(spirit) {
            log::warn!("arc spirit rejected: {err}");
        }
    }

    /// Apply `update` and re-render if anything changed.
    ///
    /// Everything is validated before anything changes. Returns what changed.
    pub fn set_options(&mut self, update: ArcsUpdate) -> Result<Changed, MarksError> {
        let ArcsUpdate {
            data,
            transform,
            rate,
            stroke,
        } = update;
        let unit = rate
            .filter(|r| *r != self.options.rate)
            .map(arc::unit_circles)
            .transpose()?;
        let transform = transform.filter(|t| !t.same_as(&self.transform));
        check_endpoints(
            data.as_deref().unwrap_or(&self.data),
            transform.as_ref().unwrap_or(&self.transform),
        )?;

        let mut changed = Changed::empty();
        if let Some(data) = data {
            self.data = data;
            changed |= Changed::DATA;
        }
        if let Some(transform) = transform {
            self.transform = transform;
            changed |= Changed::TRANSFORM;
        }
        if let (Some(unit), Some(rate)) = (unit, rate) {
            self.unit = unit;
            self.options.rate = rate;
            changed |= Changed::RATE;
        }
        if let Some(stroke) = stroke.filter(|s| *s != self.options.stroke) {
            self.options.stroke = stroke;
            self.stroke.set(stroke);
            changed |= Changed::STYLE;
        }
        if !changed.is_empty() {
            self.render();
        }
        Ok(changed)
    }

    /// Stop animating and drop every arc. The surface keeps its last frame.
    pub fn clear(&self) {
        self.frames.clear();
    }

    /// Endpoint pairs in data coordinates.
    pub fn data(&self) -> &[Endpoints] {
        &self.data
    }

    /// Current options.
    pub fn options(&self) -> &AnimatedArcsOptions {
        &self.options
    }

    /// The frame scheduler driving the arcs.
    pub fn frames(&self) -> &FrameAnimationScheduler {
        &self.frames
    }

    /// The drawing surface.
    pub fn surface(&self) -> &Rc<RefCell<S>> {
        &self.surface
    }
}

impl<S: 'static> fmt::Debug for AnimatedArcs<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedArcs")
            .field("pairs", &self.data.len())
            .field("transform", &self.transform)
            .field("options", &self.options)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

fn check_endpoints(data: &[Endpoints], transform: &CoordinateTransform) -> Result<(), MarksError> {
    let degenerate = data
        .iter()
        .any(|&[p1, p2]| transform.apply(p1) == transform.apply(p2));
    if degenerate {
        return Err(MarksError::CoincidentPoints);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingSurface};
    use crate::surface::Rgba;
    use alloc::vec;
    use core::f64::consts::PI;
    use kurbo::Affine;
    use trickle_schedule::testing::ManualHost;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn setup(
        data: Vec<Endpoints>,
        split_count: usize,
    ) -> (Rc<ManualHost>, Rc<RefCell<RecordingSurface>>, AnimatedArcs<RecordingSurface>) {
        let host = Rc::new(ManualHost::new());
        let surface = Rc::new(RefCell::new(RecordingSurface::new(200, 200)));
        let options = AnimatedArcsOptions {
            rate: 1.0,
            split_count,
            ..AnimatedArcsOptions::default()
        };
        let arcs = AnimatedArcs::new(
            host.clone(),
            surface.clone(),
            data,
            CoordinateTransform::identity(),
            options,
        )
        .unwrap();
        (host, surface, arcs)
    }

    fn arcs_drawn(surface: &RefCell<RecordingSurface>) -> Vec<CanvasArc> {
        surface
            .borrow()
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokeArc(arc, _) => Some(*arc),
                _ => None,
            })
            .collect()
    }

    fn pair() -> Endpoints {
        [Point::new(0.0, 100.0), Point::new(100.0, 100.0)]
    }

    #[test]
    fn one_upper_arc_grows_then_ends() {
        let (host, surface, arcs) = setup(vec![pair()], 4);
        let ended = Rc::new(Cell::new(0));
        let e = Rc::clone(&ended);
        arcs.set_on_animation_end(move || e.set(e.get() + 1));
        arcs.render();
        assert_eq!(host.run_frames(100), 6);
        assert_eq!(ended.get(), 1);

        let drawn = arcs_drawn(&surface);
        assert_eq!(drawn.len(), 6);
        let first = drawn[0];
        assert!(close(first.start_angle, 4.0 * PI / 3.0));
        assert!(close(first.end_angle, first.start_angle));
        assert!(!first.anticlockwise);
        assert!(close(first.radius, 100.0));
        assert!(close(drawn[5].end_angle, 5.0 * PI / 3.0));
        assert!(close_pt(drawn[5].point_at(drawn[5].end_angle), pair()[1]));
        assert_eq!(
            surface.borrow().count(|c| matches!(c, DrawCommand::ClearRect(_))),
            6
        );
    }

    #[test]
    fn arc_end_hook_reports_each_pair_once_it_lands() {
        let second = [Point::new(20.0, 150.0), Point::new(180.0, 150.0)];
        let (host, _surface, arcs) = setup(vec![pair(), second], 4);
        let landed: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = Rc::clone(&landed);
        arcs.set_on_arc_end(move |index| sink.borrow_mut().push(index));
        arcs.render();
        assert_eq!(host.run_frames(5), 5);
        assert!(landed.borrow().is_empty());
        host.run_frames(100);
        let mut seen = landed.borrow().clone();
        seen.sort_unstable();
        assert_eq!(seen, [0, 1]);
    }

    fn close_pt(a: Point, b: Point) -> bool {
        close(a.x, b.x) && close(a.y, b.y)
    }

    #[test]
    fn reversed_pair_still_rises_above_the_chord() {
        let [a, b] = pair();
        let (host, surface, arcs) = setup(vec![[b, a]], 2);
        arcs.render();
        host.run_frames(100);
        let last = *arcs_drawn(&surface).last().unwrap();
        assert!(last.center.y > 100.0);
        assert!(last.anticlockwise);
        assert!(last.point_at(1.5 * PI).y < 100.0);
        assert!(close_pt(last.point_at(last.start_angle), b));
        assert!(close_pt(last.point_at(last.end_angle), a));
    }

    #[test]
    fn transform_moves_the_arcs() {
        let (host, surface, mut arcs) = setup(vec![pair()], 1);
        let changed = arcs
            .set_options(ArcsUpdate::new().transform(Affine::scale(0.5)))
            .unwrap();
        assert_eq!(changed, Changed::TRANSFORM);
        host.run_frames(100);
        let last = *arcs_drawn(&surface).last().unwrap();
        assert!(close(last.radius, 50.0));
        assert!(close_pt(last.point_at(last.end_angle), Point::new(50.0, 50.0)));
    }

    #[test]
    fn unchanged_options_do_not_rerender() {
        let (host, _surface, mut arcs) = setup(vec![pair()], 1);
        let stroke = arcs.options().stroke;
        let update = ArcsUpdate::new().rate(1.0).stroke(stroke);
        let changed = arcs.set_options(update).unwrap();
        assert_eq!(changed, Changed::empty());
        assert_eq!(host.pending_frames(), 0);

        let changed = arcs.set_options(ArcsUpdate::new().rate(0.5)).unwrap();
        assert_eq!(changed, Changed::RATE);
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(arcs.frames().spirit_counts(), (1, 0));
    }

    #[test]
    fn bad_updates_change_nothing() {
        let (_host, _surface, mut arcs) = setup(vec![pair()], 1);
        let update = ArcsUpdate::new()
            .rate(3.0)
            .stroke(LineStyle::new(4.0, Rgba::WHITE));
        assert_eq!(arcs.set_options(update), Err(MarksError::RateOutOfRange(3.0)));
        let p = Point::new(1.0, 1.0);
        assert_eq!(
            arcs.set_options(ArcsUpdate::new().data(vec![[p, p]])),
            Err(MarksError::CoincidentPoints)
        );
        assert_eq!(arcs.options().rate, 1.0);
        assert_eq!(arcs.options().stroke, LineStyle::default());
        assert_eq!(arcs.data(), &[pair()]);
    }

    #[test]
    fn construction_checks_inputs() {
        let host = Rc::new(ManualHost::new());
        let surface = Rc::new(RefCell::new(RecordingSurface::new(10, 10)));
        let zero = AnimatedArcsOptions {
            split_count: 0,
            ..AnimatedArcsOptions::default()
        };
        let identity = CoordinateTransform::identity();
        let made = AnimatedArcs::new(host.clone(), surface.clone(), vec![pair()], identity, zero);
        assert!(matches!(made, Err(MarksError::Config(ConfigError::ZeroSplitCount))));
        let collapse = CoordinateTransform::new(|_| Point::ORIGIN);
        let options = AnimatedArcsOptions::default();
        let made = AnimatedArcs::new(host, surface, vec![pair()], collapse, options);
        assert!(matches!(made, Err(MarksError::CoincidentPoints)));
    }

    #[test]
    fn empty_render_clears_once_and_ends() {
        let (host, surface, arcs) = setup(Vec::new(), 3);
        let ended = Rc::new(Cell::new(false));
        let e = Rc::clone(&ended);
        arcs.set_on_animation_end(move || e.set(true));
        arcs.render();
        assert_eq!(host.run_frames(10), 1);
        assert!(ended.get());
        assert_eq!(surface.borrow().commands().len(), 1);
    }
}
