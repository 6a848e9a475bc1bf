// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic documents: each page is a solid block of colour, optionally
// with a half-transparent overlay standing in for blended content.

use quietprint_core::{Color, Dpi, LOGICAL_DPI, PrintError, Rect, Result, Size};

use crate::traits::{Document, DrawTarget, Page, RenderCache, RenderFlags, TransparencyFeatures};

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPage {
    /// Size at the logical 96 DPI.
    pub size: Size,
    pub color: Color,
    pub transparency: TransparencyFeatures,
}

impl SyntheticPage {
    pub fn opaque(size: Size, color: Color) -> Self {
        Self {
            size,
            color,
            transparency: TransparencyFeatures::NONE,
        }
    }

    pub fn transparent(size: Size, color: Color) -> Self {
        Self {
            size,
            color,
            transparency: TransparencyFeatures {
                alpha_blending: true,
                ..TransparencyFeatures::NONE
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticDocument {
    pages: Vec<SyntheticPage>,
}

impl SyntheticDocument {
    pub fn new(pages: Vec<SyntheticPage>) -> Self {
        Self { pages }
    }

    /// `count` opaque pages of the same size.
    pub fn uniform(count: u32, size: Size) -> Self {
        Self::new(
            (0..count)
                .map(|_| SyntheticPage::opaque(size, Color::BLACK))
                .collect(),
        )
    }
}

impl Document for SyntheticDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, index: u32) -> Result<Box<dyn Page + '_>> {
        let page = self.pages.get(index as usize).ok_or_else(|| {
            PrintError::Configuration(format!(
                "page index {index} out of range (document has {} pages)",
                self.pages.len()
            ))
        })?;
        Ok(Box::new(PageView { page, index }))
    }
}

struct PageView<'a> {
    page: &'a SyntheticPage,
    index: u32,
}

impl Page for PageView<'_> {
    fn natural_render_size(&self, dpi: Dpi) -> Size {
        Size::new(
            self.page.size.width * dpi.x / LOGICAL_DPI,
            self.page.size.height * dpi.y / LOGICAL_DPI,
        )
    }

    fn transparency(&self) -> TransparencyFeatures {
        self.page.transparency
    }

    fn draw(
        &self,
        target: &mut dyn DrawTarget,
        bounds: Rect,
        clip: Option<Rect>,
        antialias: bool,
        cache: &mut dyn RenderCache,
        _flags: RenderFlags,
    ) -> Result<()> {
        cache.remember(u64::from(self.index));
        if let Some(clip) = clip {
            target.push_clip(clip);
        }
        target.fill_rect(bounds, self.page.color, antialias);
        if self.page.transparency.any() {
            let overlay = Rect::new(
                bounds.x + bounds.width / 4.0,
                bounds.y + bounds.height / 4.0,
                bounds.width / 2.0,
                bounds.height / 2.0,
            );
            target.fill_rect(overlay, Color::rgba(255, 255, 255, 128), antialias);
        }
        if clip.is_some() {
            target.pop_clip();
        }
        Ok(())
    }
}
