// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing surface the consumers render into.
//!
//! [`Surface`] is the small immediate-mode subset the renderers need: clears,
//! rectangles, circles, arcs, polylines, and pixel read-back for caching. It
//! uses Kurbo geometry throughout. A browser binding would forward each call to
//! a 2D canvas context; [`RecordingSurface`](crate::recording::RecordingSurface)
//! keeps a command log and a small RGBA raster for tests.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Circle, Point, Rect};

use crate::arc::CanvasArc;

/// An 8-bit RGBA color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 255 is opaque.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the cleared state.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    /// A color from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Channels in `[r, g, b, a]` order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Color from `[r, g, b, a]`.
    pub const fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

/// Width and color of a stroked outline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineStyle {
    /// Line width in surface units.
    pub width: f64,
    /// Stroke color.
    pub color: Rgba,
}

impl LineStyle {
    /// A style with the given width and color.
    pub const fn new(width: f64, color: Rgba) -> Self {
        Self { width, color }
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::new(1.0, Rgba::BLACK)
    }
}

/// A rectangle of RGBA8 pixels, row-major, four bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBlock {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBlock {
    /// A transparent block.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap existing RGBA8 data. Returns `None` when the length does not
    /// match `width * height * 4`.
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The pixel at `(x, y)`, or `None` outside the block.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let at = self.offset(x, y)?;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[at..at + 4]);
        Some(Rgba::from_array(px))
    }

    /// Overwrite the pixel at `(x, y)`. Out-of-range writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(at) = self.offset(x, y) {
            self.data[at..at + 4].copy_from_slice(&color.to_array());
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }
}

/// An immediate-mode 2D drawing target.
///
/// Coordinates are in surface pixels with the origin at the top left and `y`
/// growing downward, so angles grow clockwise on screen.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Reset `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect);

    /// Reset the whole surface.
    fn clear(&mut self) {
        let (w, h) = self.size();
        self.clear_rect(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
    }

    /// Fill `rect` with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Outline `rect`.
    fn stroke_rect(&mut self, rect: Rect, style: LineStyle);

    /// Fill a disc.
    fn fill_circle(&mut self, circle: Circle, color: Rgba);

    /// Stroke a circular arc.
    fn stroke_arc(&mut self, arc: &CanvasArc, style: LineStyle);

    /// Stroke an open polyline through `points`.
    fn stroke_polyline(&mut self, points: &[Point], style: LineStyle);

    /// Copy the `width` by `height` pixels whose top-left corner is at
    /// `origin`. Pixels outside the surface read as transparent.
    fn read_pixels(&self, origin: Point, width: u32, height: u32) -> PixelBlock;

    /// Paste `block` with its top-left corner at `origin`, clipped to the
    /// surface.
    fn write_pixels(&mut self, block: &PixelBlock, origin: Point);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_block_addresses_rows() {
        let mut block = PixelBlock::new(3, 2);
        block.set_pixel(2, 1, Rgba::WHITE);
        block.set_pixel(3, 0, Rgba::WHITE);
        assert_eq!(block.pixel(2, 1), Some(Rgba::WHITE));
        assert_eq!(block.pixel(0, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(block.pixel(3, 0), None);
        assert_eq!(&block.data()[20..24], &[255, 255, 255, 255]);
    }

    #[test]
    fn from_data_checks_length() {
        assert!(PixelBlock::from_data(2, 2, vec![0; 16]).is_some());
        assert!(PixelBlock::from_data(2, 2, vec![0; 15]).is_none());
    }
}
