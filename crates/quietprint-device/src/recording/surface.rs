// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offscreen surface rasterising rectangle fills into an RGBA buffer.

use image::{Rgba, RgbaImage};
use quietprint_core::{Color, Dpi, Matrix, Rect};

use super::Tracked;
use crate::traits::{DrawTarget, OffscreenSurface};

/// Pixel-backed surface; fills are composited source-over.
#[derive(Debug)]
pub struct RecordingSurface {
    image: RgbaImage,
    dpi: Dpi,
    transform: Matrix,
    /// Active clips in pixel space, innermost last.
    clips: Vec<Rect>,
    _tracked: Tracked,
}

impl RecordingSurface {
    pub(crate) fn new(width: u32, height: u32, dpi: Dpi, tracked: Tracked) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
            dpi,
            transform: Matrix::identity(),
            clips: Vec::new(),
            _tracked: tracked,
        }
    }

    /// Colour of the pixel containing `(x, y)`; transparent outside.
    pub fn sample(&self, x: f32, y: f32) -> Color {
        if x < 0.0 || y < 0.0 {
            return Color::rgba(0, 0, 0, 0);
        }
        match self.image.get_pixel_checked(x as u32, y as u32) {
            Some(Rgba([r, g, b, a])) => Color::rgba(*r, *g, *b, *a),
            None => Color::rgba(0, 0, 0, 0),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }

    fn visible_region(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        let mut area = self.transform.transform_rect(rect);
        for clip in &self.clips {
            area = intersect(&area, clip)?;
        }
        let x0 = area.x.round().max(0.0) as u32;
        let y0 = area.y.round().max(0.0) as u32;
        let x1 = (area.right().round().max(0.0) as u32).min(self.image.width());
        let y1 = (area.bottom().round().max(0.0) as u32).min(self.image.height());
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

impl DrawTarget for RecordingSurface {
    fn transform(&self) -> Matrix {
        self.transform
    }

    fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }

    fn push_clip(&mut self, rect: Rect) {
        let clip = self.transform.transform_rect(&rect);
        self.clips.push(clip);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, _antialias: bool) {
        let Some((x0, y0, x1, y1)) = self.visible_region(&rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let dst = self.image.get_pixel_mut(x, y);
                *dst = blend_over(*dst, color);
            }
        }
    }
}

impl OffscreenSurface for RecordingSurface {
    fn pixel_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn dpi(&self) -> Dpi {
        self.dpi
    }

    fn clear(&mut self, color: Color) {
        let fill = Rgba([color.r, color.g, color.b, color.a]);
        for pixel in self.image.pixels_mut() {
            *pixel = fill;
        }
        self.transform = Matrix::identity();
        self.clips.clear();
    }
}

fn intersect(a: &Rect, b: &Rect) -> Option<Rect> {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = a.right().min(b.right());
    let y1 = a.bottom().min(b.bottom());
    (x0 < x1 && y0 < y1).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

/// Straight-alpha source-over.
fn blend_over(dst: Rgba<u8>, src: Color) -> Rgba<u8> {
    let sa = f32::from(src.a) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |s: u8, d: u8| {
        let v = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.r, dst[0]),
        channel(src.g, dst[1]),
        channel(src.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::recording::{Ledger, ResourceKind};

    fn surface(width: u32, height: u32) -> RecordingSurface {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        RecordingSurface::new(
            width,
            height,
            Dpi::uniform(300.0),
            Tracked::new(ResourceKind::Surface, &ledger),
        )
    }

    #[test]
    fn half_alpha_over_white_blends() {
        let mut s = surface(4, 4);
        s.clear(Color::WHITE);
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::rgba(0, 0, 0, 128), true);
        let c = s.sample(1.0, 1.0);
        assert_eq!(c.a, 255);
        assert!((126..=128).contains(&c.r));
    }

    #[test]
    fn clip_limits_fill() {
        let mut s = surface(10, 10);
        s.push_clip(Rect::new(0.0, 0.0, 5.0, 10.0));
        s.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK, true);
        s.pop_clip();
        assert_eq!(s.sample(2.0, 2.0), Color::BLACK);
        assert_eq!(s.sample(7.0, 2.0).a, 0);
    }

    #[test]
    fn transform_scales_fill() {
        let mut s = surface(10, 10);
        s.set_transform(Matrix::scale(2.0, 2.0));
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::BLACK, true);
        assert_eq!(s.sample(3.0, 3.0), Color::BLACK);
        assert_eq!(s.sample(5.0, 5.0).a, 0);
    }
}
