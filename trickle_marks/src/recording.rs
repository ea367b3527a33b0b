// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`Surface`] that records what was drawn.
//!
//! [`RecordingSurface`] logs every call as a [`DrawCommand`] and keeps an RGBA
//! raster that honors clears, rectangle fills and outlines, and disc fills.
//! Arcs and polylines are only logged. The raster is what makes pixel
//! read-back, and so the grid image cache, observable in tests and demos.

use alloc::vec::Vec;
use core::ops::Range;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Circle, Point, Rect, Shape};

use crate::arc::CanvasArc;
use crate::surface::{LineStyle, PixelBlock, Rgba, Surface};

/// One recorded surface call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`Surface::clear_rect`].
    ClearRect(Rect),
    /// [`Surface::fill_rect`].
    FillRect(Rect, Rgba),
    /// [`Surface::stroke_rect`].
    StrokeRect(Rect, LineStyle),
    /// [`Surface::fill_circle`].
    FillCircle(Circle, Rgba),
    /// [`Surface::stroke_arc`].
    StrokeArc(CanvasArc, LineStyle),
    /// [`Surface::stroke_polyline`].
    StrokePolyline(Vec<Point>, LineStyle),
    /// [`Surface::write_pixels`], with the covered rectangle.
    WritePixels(Rect),
}

/// In-memory surface for tests, benches and demos.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    raster: PixelBlock,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: PixelBlock::new(width, height),
            commands: Vec::new(),
        }
    }

    /// Commands recorded so far, oldest first.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Number of recorded commands matching `pred`.
    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// The raster pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.raster.pixel(x, y)
    }

    fn paint(&mut self, rect: Rect, color: Rgba) {
        let (xs, ys) = self.cover(rect);
        for y in ys {
            for x in xs.clone() {
                self.raster.set_pixel(x, y, color);
            }
        }
    }

    /// Pixels whose centers fall inside `rect`, clipped to the surface.
    fn cover(&self, rect: Rect) -> (Range<u32>, Range<u32>) {
        let rect = rect.abs();
        (
            span(rect.x0, rect.x1, self.raster.width()),
            span(rect.y0, rect.y1, self.raster.height()),
        )
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Values are clamped to the surface extent, which fits in u32."
)]
fn span(lo: f64, hi: f64, limit: u32) -> Range<u32> {
    let clamp = |v: f64| (v - 0.5).ceil().clamp(0.0, f64::from(limit)) as u32;
    clamp(lo)..clamp(hi)
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.paint(rect, Rgba::TRANSPARENT);
        self.commands.push(DrawCommand::ClearRect(rect));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.paint(rect, color);
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, style: LineStyle) {
        let (xs, ys) = self.cover(rect);
        if !xs.is_empty() && !ys.is_empty() {
            let (x_last, y_last) = (xs.end - 1, ys.end - 1);
            for x in xs.clone() {
                self.raster.set_pixel(x, ys.start, style.color);
                self.raster.set_pixel(x, y_last, style.color);
            }
            for y in ys {
                self.raster.set_pixel(xs.start, y, style.color);
                self.raster.set_pixel(x_last, y, style.color);
            }
        }
        self.commands.push(DrawCommand::StrokeRect(rect, style));
    }

    fn fill_circle(&mut self, circle: Circle, color: Rgba) {
        let (xs, ys) = self.cover(circle.bounding_box());
        for y in ys {
            for x in xs.clone() {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if center.distance(circle.center) <= circle.radius {
                    self.raster.set_pixel(x, y, color);
                }
            }
        }
        self.commands.push(DrawCommand::FillCircle(circle, color));
    }

    fn stroke_arc(&mut self, arc: &CanvasArc, style: LineStyle) {
        self.commands.push(DrawCommand::StrokeArc(*arc, style));
    }

    fn stroke_polyline(&mut self, points: &[Point], style: LineStyle) {
        self.commands.push(DrawCommand::StrokePolyline(points.to_vec(), style));
    }

    fn read_pixels(&self, origin: Point, width: u32, height: u32) -> PixelBlock {
        let mut block = PixelBlock::new(width, height);
        let (xs, ys) = self.cover(Rect::from_origin_size(
            origin,
            (f64::from(width), f64::from(height)),
        ));
        let (ox, oy) = (origin.x.round(), origin.y.round());
        for y in ys {
            for x in xs.clone() {
                if let Some(color) = self.raster.pixel(x, y) {
                    let (bx, by) = block_coords(x, y, ox, oy);
                    block.set_pixel(bx, by, color);
                }
            }
        }
        block
    }

    fn write_pixels(&mut self, block: &PixelBlock, origin: Point) {
        let rect = Rect::from_origin_size(
            origin,
            (f64::from(block.width()), f64::from(block.height())),
        );
        let (xs, ys) = self.cover(rect);
        let (ox, oy) = (origin.x.round(), origin.y.round());
        for y in ys {
            for x in xs.clone() {
                let (bx, by) = block_coords(x, y, ox, oy);
                if let Some(color) = block.pixel(bx, by) {
                    self.raster.set_pixel(x, y, color);
                }
            }
        }
        self.commands.push(DrawCommand::WritePixels(rect));
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Covered pixels lie at or after the rounded origin, inside a u32-sized block."
)]
fn block_coords(x: u32, y: u32, ox: f64, oy: f64) -> (u32, u32) {
    (
        (f64::from(x) - ox).max(0.0) as u32,
        (f64::from(y) - oy).max(0.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_cover_pixel_centers() {
        let mut s = RecordingSurface::new(8, 8);
        let red = Rgba::opaque(255, 0, 0);
        s.fill_rect(Rect::new(2.0, 2.0, 5.0, 4.0), red);
        assert_eq!(s.pixel(2, 2), Some(red));
        assert_eq!(s.pixel(4, 3), Some(red));
        assert_eq!(s.pixel(5, 3), Some(Rgba::TRANSPARENT));
        assert_eq!(s.pixel(4, 4), Some(Rgba::TRANSPARENT));
        s.clear();
        assert_eq!(s.pixel(2, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(s.commands().len(), 2);
    }

    #[test]
    fn stroke_rect_draws_only_the_outline() {
        let mut s = RecordingSurface::new(8, 8);
        s.stroke_rect(Rect::new(1.0, 1.0, 5.0, 5.0), LineStyle::default());
        assert_eq!(s.pixel(1, 1), Some(Rgba::BLACK));
        assert_eq!(s.pixel(4, 2), Some(Rgba::BLACK));
        assert_eq!(s.pixel(2, 2), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn pixels_round_trip_to_another_spot() {
        let mut s = RecordingSurface::new(10, 10);
        let blue = Rgba::opaque(0, 0, 255);
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), blue);
        s.stroke_rect(Rect::new(0.0, 0.0, 2.0, 2.0), LineStyle::new(1.0, Rgba::WHITE));
        s.fill_rect(Rect::new(1.0, 1.0, 2.0, 2.0), blue);
        let block = s.read_pixels(Point::ORIGIN, 2, 2);
        s.write_pixels(&block, Point::new(6.0, 7.0));
        assert_eq!(s.pixel(6, 7), Some(Rgba::WHITE));
        assert_eq!(s.pixel(7, 8), Some(blue));
        assert_eq!(s.pixel(8, 8), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn reads_past_the_edge_are_transparent() {
        let mut s = RecordingSurface::new(4, 4);
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::WHITE);
        let block = s.read_pixels(Point::new(3.0, 3.0), 2, 2);
        assert_eq!(block.pixel(0, 0), Some(Rgba::WHITE));
        assert_eq!(block.pixel(1, 1), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn discs_and_strokes_are_logged() {
        let mut s = RecordingSurface::new(16, 16);
        s.fill_circle(Circle::new((8.0, 8.0), 3.0), Rgba::WHITE);
        s.stroke_polyline(&[Point::ORIGIN, Point::new(4.0, 4.0)], LineStyle::default());
        assert_eq!(s.pixel(8, 8), Some(Rgba::WHITE));
        assert_eq!(s.pixel(10, 8), Some(Rgba::WHITE));
        assert_eq!(s.pixel(11, 8), Some(Rgba::TRANSPARENT));
        assert_eq!(s.pixel(0, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(s.count(|c| matches!(c, DrawCommand::StrokePolyline(..))), 1);
        assert_eq!(s.take_commands().len(), 2);
        assert!(s.commands().is_empty());
    }
}
