// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator contracts consumed by the print engine.
//
// The engine never renders page content, talks to a driver, or creates GPU
// objects itself.  Those services sit behind the traits below: a document
// provider, a driver-settings provider, a print-ticket provider, and the
// graphics device layer.  Graphics resources are associated types that
// release themselves on `Drop`, so ownership alone encodes which resource
// must be torn down and in what order.

use quietprint_core::{Color, DevMode, Dpi, Matrix, PageSettings, PrinterSettings, Rect, Result, Size};

// ---------------------------------------------------------------------------
// Document provider
// ---------------------------------------------------------------------------

/// A paginated document supplied by the document library.
pub trait Document {
    fn page_count(&self) -> u32;

    /// Load a page by 0-based index.
    fn page(&self, index: u32) -> Result<Box<dyn Page + '_>>;
}

/// Content properties that direct drawing into a print command stream
/// cannot reproduce faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransparencyFeatures {
    pub alpha_blending: bool,
    pub soft_masks: bool,
    pub blend_modes: bool,
}

impl TransparencyFeatures {
    pub const NONE: TransparencyFeatures = TransparencyFeatures {
        alpha_blending: false,
        soft_masks: false,
        blend_modes: false,
    };

    pub fn any(&self) -> bool {
        self.alpha_blending || self.soft_masks || self.blend_modes
    }
}

/// Options forwarded to the page renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags {
    /// Render for print output rather than screen.
    pub printing: bool,
    pub annotations: bool,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            printing: true,
            annotations: true,
        }
    }
}

/// One page of a [`Document`].
pub trait Page {
    /// Size of the page when rendered at `dpi`.
    fn natural_render_size(&self, dpi: Dpi) -> Size;

    fn transparency(&self) -> TransparencyFeatures;

    /// Draw the page so that its content fills `bounds` in the target's
    /// current coordinate space.
    fn draw(
        &self,
        target: &mut dyn DrawTarget,
        bounds: Rect,
        clip: Option<Rect>,
        antialias: bool,
        cache: &mut dyn RenderCache,
        flags: RenderFlags,
    ) -> Result<()>;
}

/// Font and glyph-path caches shared with the document renderer.
///
/// Opaque to the engine: it only passes the cache through and manages its
/// lifetime when it created the cache itself.
pub trait RenderCache {
    /// Number of cached entries, for diagnostics.
    fn entries(&self) -> usize;

    /// Record use of an entry; returns `true` if it was not cached yet.
    fn remember(&mut self, key: u64) -> bool;
}

/// Immediate-mode drawing surface handed to [`Page::draw`].
///
/// Drawing calls do not fail individually; a device reports failures when
/// the enclosing draw is ended.
pub trait DrawTarget {
    fn transform(&self) -> Matrix;

    fn set_transform(&mut self, transform: Matrix);

    fn push_clip(&mut self, rect: Rect);

    fn pop_clip(&mut self);

    fn fill_rect(&mut self, rect: Rect, color: Color, antialias: bool);
}

// ---------------------------------------------------------------------------
// Printer driver
// ---------------------------------------------------------------------------

/// Printer and driver-settings provider.
pub trait PrinterDriver {
    fn is_installed(&self, printer_name: &str) -> bool;

    /// The driver's default printer settings, including its default page
    /// settings and landscape angle.
    fn default_settings(&self, printer_name: &str) -> Result<PrinterSettings>;

    /// DEVMODE-equivalent block for the given settings.
    fn dev_mode(&self, printer: &PrinterSettings, page: &PageSettings) -> Result<DevMode>;
}

/// Source of print-ticket conversion sessions, one per printer.
pub trait TicketProvider {
    type Session: TicketSession;

    fn open(&self, printer_name: &str) -> Result<Self::Session>;
}

/// An open print-ticket provider handle.
pub trait TicketSession {
    /// Convert a raw driver-settings blob into a print-ticket stream.
    fn convert_dev_mode(&mut self, dev_mode_blob: &[u8]) -> Result<Vec<u8>>;

    /// Release the provider handle.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Graphics device layer
// ---------------------------------------------------------------------------

/// Which kind of graphics device to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Hardware,
    /// Emulated device used when the hardware lacks the feature level.
    Software,
}

/// How fonts are embedded into the spooled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSubsetMode {
    #[default]
    Default,
    EachPage,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    ScRgb,
}

/// Options for binding a print control to its package target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintControlProperties {
    pub font_subset: FontSubsetMode,
    /// Resolution used when the device has to rasterise content.
    pub raster_dpi: f32,
    pub color_space: ColorSpace,
}

/// Factory for every graphics resource a print job needs.
///
/// Creation order follows the dependency chain; each resource type releases
/// itself when dropped.
pub trait GraphicsApi {
    /// Streaming document package the spooler consumes.
    type PackageTarget;
    type Factory;
    type ImagingFactory;
    type TextFactory;
    type Device;
    type Context: DrawContext;
    type PrintControl: PrintControl<CommandList = <Self::Context as DrawContext>::CommandList>;
    type Cache: RenderCache;

    /// Start a spooler job on `printer_name`.
    fn create_package_target(
        &self,
        printer_name: &str,
        job_name: &str,
        print_ticket: &[u8],
    ) -> Result<Self::PackageTarget>;

    fn create_factory(&self) -> Result<Self::Factory>;

    fn create_imaging_factory(&self) -> Result<Self::ImagingFactory>;

    fn create_text_factory(&self) -> Result<Self::TextFactory>;

    /// Fails with `DeviceFault::UnsupportedFeatureLevel` when hardware
    /// creation is impossible but a software device may work.
    fn create_device(&self, factory: &Self::Factory, kind: DeviceKind) -> Result<Self::Device>;

    fn create_context(&self, device: &Self::Device) -> Result<Self::Context>;

    fn create_print_control(
        &self,
        device: &Self::Device,
        imaging: &Self::ImagingFactory,
        target: &Self::PackageTarget,
        properties: &PrintControlProperties,
    ) -> Result<Self::PrintControl>;

    /// Default font/glyph caches, used when the caller supplies none.
    fn create_render_cache(&self, text: &Self::TextFactory) -> Result<Self::Cache>;
}

/// Device context that records each page into a command list.
pub trait DrawContext: DrawTarget {
    type CommandList;
    type Brush;
    type Surface: OffscreenSurface;

    fn create_solid_brush(&mut self, color: Color) -> Result<Self::Brush>;

    /// Offscreen bitmap of `width` x `height` pixels at `dpi`.
    fn create_surface(&mut self, width: u32, height: u32, dpi: Dpi) -> Result<Self::Surface>;

    /// Open a fresh command list and start drawing into it.
    fn begin_page(&mut self) -> Result<()>;

    fn fill_with_brush(&mut self, rect: Rect, brush: &Self::Brush);

    /// Composite `source` (pixels) of `surface` using `transform`.
    fn draw_surface(&mut self, surface: &Self::Surface, source: Rect, transform: Matrix);

    /// End drawing and close the command list; failures here mean the page
    /// did not render.
    fn end_page(&mut self) -> Result<Self::CommandList>;
}

/// Offscreen bitmap the page renderer composes transparent pages on.
pub trait OffscreenSurface: DrawTarget {
    fn pixel_size(&self) -> (u32, u32);

    fn dpi(&self) -> Dpi;

    fn clear(&mut self, color: Color);
}

/// Streams finished pages to the package target.
pub trait PrintControl {
    type CommandList;

    fn add_page(&mut self, commands: Self::CommandList, paper_size: Size) -> Result<()>;

    /// Finalise the document; the spooler treats the job as complete.
    fn close(&mut self) -> Result<()>;
}
