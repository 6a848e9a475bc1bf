// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Draws one page into an open page of the device context.
//
// Opaque pages are drawn straight into the print command stream under the
// placement transform.  Pages using transparency are rendered onto an
// offscreen surface at the raster resolution and then composited.

use quietprint_core::{Color, Dpi, LOGICAL_DPI, Matrix, PrintError, Rect, Result};
use quietprint_device::{DrawContext, OffscreenSurface, Page, RenderCache, RenderFlags};
use tracing::{debug, trace};

use crate::geometry::{PlacementSettings, compute_page_transform};

/// How a page reached the command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    Direct,
    Offscreen,
}

/// Per-job page renderer. Keeps one offscreen surface alive across pages.
pub struct PageRenderer<S: OffscreenSurface> {
    placement: PlacementSettings,
    raster_dpi: Dpi,
    antialias: bool,
    surface: Option<S>,
}

impl<S: OffscreenSurface> PageRenderer<S> {
    pub fn new(placement: PlacementSettings, raster_dpi: Dpi, antialias: bool) -> Self {
        Self {
            placement,
            raster_dpi,
            antialias,
            surface: None,
        }
    }

    /// Render `page` into the page currently open on `context`.
    pub fn render<C>(
        &mut self,
        context: &mut C,
        page: &dyn Page,
        background: &C::Brush,
        cache: &mut dyn RenderCache,
    ) -> Result<RenderPath>
    where
        C: DrawContext<Surface = S>,
    {
        let antialias = self.antialias;
        let dpi = self.raster_dpi;
        let natural = page.natural_render_size(Dpi::LOGICAL);
        if natural.is_empty() {
            return Err(PrintError::Configuration(format!(
                "page has no drawable area ({} x {})",
                natural.width, natural.height
            )));
        }
        let transform = compute_page_transform(natural, &self.placement);
        let bounds = Rect::from_size(natural);
        debug!(
            rotation = transform.rotation.degrees(),
            scale = transform.scale_x,
            offset_x = transform.offset_x,
            offset_y = transform.offset_y,
            "page placed"
        );

        context.set_transform(transform.matrix());
        context.fill_with_brush(bounds, background);

        if !page.transparency().any() {
            page.draw(&mut *context, bounds, Some(bounds), antialias, cache, RenderFlags::default())?;
            return Ok(RenderPath::Direct);
        }

        let scaled = transform.scaled_size(natural);
        let width = pixels(scaled.width, dpi.x);
        let height = pixels(scaled.height, dpi.y);
        trace!(width, height, "rendering page offscreen");

        let surface = self.surface_for(context, width, height)?;
        surface.clear(Color::WHITE);
        let source = Rect::new(0.0, 0.0, width as f32, height as f32);
        page.draw(&mut *surface, source, None, antialias, cache, RenderFlags::default())?;

        let composite = Matrix::scale(LOGICAL_DPI / dpi.x, LOGICAL_DPI / dpi.y).then(&transform.placement());
        context.set_transform(Matrix::identity());
        context.draw_surface(&*surface, source, composite);
        Ok(RenderPath::Offscreen)
    }

    /// The cached surface, replaced when it is too small for this page.
    fn surface_for<C>(&mut self, context: &mut C, width: u32, height: u32) -> Result<&mut S>
    where
        C: DrawContext<Surface = S>,
    {
        let reusable = self.surface.as_ref().is_some_and(|s| {
            let (w, h) = s.pixel_size();
            w >= width && h >= height
        });
        if !reusable {
            let (w, h) = self
                .surface
                .as_ref()
                .map_or((0, 0), |s| s.pixel_size());
            let (w, h) = (w.max(width), h.max(height));
            // Release the old surface before allocating its replacement.
            self.surface = None;
            debug!(width = w, height = h, "allocating offscreen surface");
            self.surface = Some(context.create_surface(w, h, self.raster_dpi)?);
        }
        self.surface
            .as_mut()
            .ok_or_else(|| PrintError::Configuration("offscreen surface missing".into()))
    }
}

/// Device pixels covering `dips` at `dpi`, at least one.
fn pixels(dips: f32, dpi: f32) -> u32 {
    ((dips * dpi / LOGICAL_DPI).ceil() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use quietprint_core::{Rotation, ScalingMode, Size};
    use quietprint_device::recording::{
        DrawOp, RecordingCache, RecordingGraphics, RecordingSurface, ResourceKind, SyntheticDocument,
        SyntheticPage,
    };
    use quietprint_device::{DeviceKind, Document, GraphicsApi};

    use super::*;

    fn placement() -> PlacementSettings {
        PlacementSettings {
            paper_size: Size::new(816.0, 1056.0),
            printable_area: Rect::new(0.0, 0.0, 816.0, 1056.0),
            scaling_mode: ScalingMode::FitToPrintableArea,
            auto_rotate: true,
            landscape_rotation: Rotation::Deg90,
        }
    }

    fn render_all(doc: &SyntheticDocument) -> (RecordingGraphics, Vec<Vec<DrawOp>>, Vec<RenderPath>) {
        let graphics = RecordingGraphics::new();
        let factory = graphics.create_factory().unwrap();
        let device = graphics.create_device(&factory, DeviceKind::Hardware).unwrap();
        let mut context = graphics.create_context(&device).unwrap();
        let brush = context.create_solid_brush(Color::WHITE).unwrap();
        let mut cache = RecordingCache::detached();
        let mut renderer: PageRenderer<RecordingSurface> =
            PageRenderer::new(placement(), Dpi::uniform(192.0), true);

        let mut lists = Vec::new();
        let mut paths = Vec::new();
        for i in 0..doc.page_count() {
            let page = doc.page(i).unwrap();
            context.begin_page().unwrap();
            paths.push(renderer.render(&mut context, page.as_ref(), &brush, &mut cache).unwrap());
            lists.push(context.end_page().unwrap().ops);
        }
        let offscreen = paths.iter().any(|p| *p == RenderPath::Offscreen);
        assert_eq!(graphics.ledger().live_count(ResourceKind::Surface), usize::from(offscreen));
        (graphics, lists, paths)
    }

    #[test]
    fn opaque_page_draws_directly_over_background() {
        let doc = SyntheticDocument::new(vec![SyntheticPage::opaque(
            Size::new(408.0, 528.0),
            Color::BLACK,
        )]);
        let (_, lists, paths) = render_all(&doc);
        assert_eq!(paths, vec![RenderPath::Direct]);
        let ops = &lists[0];
        assert!(matches!(ops[0], DrawOp::Background { color, .. } if color == Color::WHITE));
        assert!(matches!(ops[1], DrawOp::PushClip { .. }));
        let fill = ops[2].device_bounds().unwrap();
        assert!((fill.width - 816.0).abs() < 1e-3);
        assert!((fill.height - 1056.0).abs() < 1e-3);
        assert!(matches!(ops.last(), Some(DrawOp::PopClip)));
    }

    #[test]
    fn transparent_page_is_composited_at_raster_dpi() {
        let doc = SyntheticDocument::new(vec![SyntheticPage::transparent(
            Size::new(408.0, 528.0),
            Color::BLACK,
        )]);
        let (_, lists, paths) = render_all(&doc);
        assert_eq!(paths, vec![RenderPath::Offscreen]);
        let composite = lists[0]
            .iter()
            .find(|op| matches!(op, DrawOp::Composite { .. }))
            .unwrap();
        let DrawOp::Composite {
            source,
            surface_dpi,
            sample,
            ..
        } = composite
        else {
            unreachable!()
        };
        // 816 x 1056 DIPs at 192 DPI.
        assert_eq!((source.width, source.height), (1632.0, 2112.0));
        assert_eq!(*surface_dpi, Dpi::uniform(192.0));
        // Centre of the page carries the half-white overlay over black.
        assert!((126..=129).contains(&sample.r));
        let bounds = composite.device_bounds().unwrap();
        assert!((bounds.width - 816.0).abs() < 1e-2);
        assert!((bounds.height - 1056.0).abs() < 1e-2);
    }

    #[test]
    fn surface_is_reused_and_grown() {
        let doc = SyntheticDocument::new(vec![
            SyntheticPage::transparent(Size::new(408.0, 528.0), Color::BLACK),
            SyntheticPage::transparent(Size::new(408.0, 528.0), Color::BLACK),
            // Rotated onto the paper, so its unrotated surface is wider.
            SyntheticPage::transparent(Size::new(1056.0, 816.0), Color::BLACK),
        ]);
        let (graphics, _, paths) = render_all(&doc);
        assert!(paths.iter().all(|p| *p == RenderPath::Offscreen));
        let created = graphics
            .ledger()
            .created()
            .into_iter()
            .filter(|k| *k == ResourceKind::Surface)
            .count();
        assert_eq!(created, 2);
    }

    #[test]
    fn empty_page_is_rejected() {
        let doc = SyntheticDocument::new(vec![SyntheticPage::opaque(Size::new(0.0, 10.0), Color::BLACK)]);
        let graphics = RecordingGraphics::new();
        let factory = graphics.create_factory().unwrap();
        let device = graphics.create_device(&factory, DeviceKind::Hardware).unwrap();
        let mut context = graphics.create_context(&device).unwrap();
        let brush = context.create_solid_brush(Color::WHITE).unwrap();
        let mut renderer: PageRenderer<RecordingSurface> =
            PageRenderer::new(placement(), Dpi::uniform(300.0), true);
        context.begin_page().unwrap();
        let page = doc.page(0).unwrap();
        let err = renderer
            .render(&mut context, page.as_ref(), &brush, &mut RecordingCache::detached())
            .unwrap_err();
        assert!(matches!(err, PrintError::Configuration(_)));
    }

    #[test]
    fn pixel_size_rounds_up() {
        assert_eq!(pixels(96.0, 300.0), 300);
        assert_eq!(pixels(1.0, 300.0), 4);
        assert_eq!(pixels(0.0, 300.0), 1);
    }
}
