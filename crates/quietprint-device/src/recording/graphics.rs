// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recording implementation of the graphics device layer.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use quietprint_core::{Color, DeviceFault, Dpi, Matrix, PrintError, Rect, Result, Size};
use tracing::{debug, warn};

use super::surface::RecordingSurface;
use super::{FaultPlan, Ledger, ResourceKind, Tracked};
use crate::traits::{
    DeviceKind, DrawContext, DrawTarget, GraphicsApi, OffscreenSurface, PrintControl,
    PrintControlProperties, RenderCache,
};

/// One recorded drawing operation, in the order it was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Page background painted with a brush.
    Background {
        rect: Rect,
        color: Color,
        transform: Matrix,
    },
    /// Content fill issued by the document renderer.
    Fill {
        rect: Rect,
        color: Color,
        transform: Matrix,
    },
    /// Offscreen surface composited onto the page.
    Composite {
        source: Rect,
        transform: Matrix,
        surface_dpi: Dpi,
        /// Colour at the centre of `source`.
        sample: Color,
    },
    PushClip {
        rect: Rect,
        transform: Matrix,
    },
    PopClip,
}

impl DrawOp {
    /// Device-space bounding box of a fill or composite.
    pub fn device_bounds(&self) -> Option<Rect> {
        match self {
            Self::Background { rect, transform, .. } | Self::Fill { rect, transform, .. } => {
                Some(transform.transform_rect(rect))
            }
            Self::Composite {
                source, transform, ..
            } => Some(transform.transform_rect(source)),
            Self::PushClip { .. } | Self::PopClip => None,
        }
    }
}

/// A page as the print control received it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpooledPage {
    pub paper_size: Size,
    pub ops: Vec<DrawOp>,
}

impl SpooledPage {
    /// Content operations (fills and composites), background excluded.
    pub fn content(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Fill { .. } | DrawOp::Composite { .. }))
    }

    /// Whether the page went through an offscreen surface.
    pub fn is_composited(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, DrawOp::Composite { .. }))
    }
}

/// Everything the spooler side saw during one job.
#[derive(Debug, Clone, Default)]
pub struct Spool {
    pub printer: Option<String>,
    pub job_name: Option<String>,
    pub print_ticket: Vec<u8>,
    pub device_kind: Option<DeviceKind>,
    pub properties: Option<PrintControlProperties>,
    pub pages: Vec<SpooledPage>,
    /// Set once the print control has been closed.
    pub closed: bool,
}

/// Recording graphics device layer.
///
/// Cloning shares the ledger and spool, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingGraphics {
    ledger: Rc<RefCell<Ledger>>,
    spool: Rc<RefCell<Spool>>,
    faults: Rc<FaultPlan>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: FaultPlan) -> Self {
        Self {
            faults: Rc::new(faults),
            ..Self::default()
        }
    }

    /// Snapshot of the resource ledger.
    pub fn ledger(&self) -> Ledger {
        self.ledger.borrow().clone()
    }

    /// Snapshot of the spool.
    pub fn spool(&self) -> Spool {
        self.spool.borrow().clone()
    }

    /// A render cache owned by the caller but tracked in this ledger.
    pub fn caller_cache(&self) -> RecordingCache {
        RecordingCache {
            keys: HashSet::new(),
            _tracked: Some(Tracked::new(ResourceKind::RenderCache, &self.ledger)),
        }
    }

    fn acquire(&self, kind: ResourceKind) -> Result<Tracked> {
        check_fault(&self.faults, kind)?;
        Ok(Tracked::new(kind, &self.ledger))
    }
}

fn check_fault(faults: &FaultPlan, kind: ResourceKind) -> Result<()> {
    if faults.fail_on_create == Some(kind) {
        warn!(%kind, "injected creation failure");
        return Err(PrintError::device(
            format!("create {kind}"),
            DeviceFault::Unavailable,
            "injected failure",
        ));
    }
    Ok(())
}

/// Factory handles carry no state beyond their ledger entry.
#[derive(Debug)]
pub struct RecordingHandle {
    _tracked: Tracked,
}

#[derive(Debug)]
pub struct RecordingPackageTarget {
    pub printer: String,
    pub job_name: String,
    _tracked: Tracked,
}

#[derive(Debug)]
pub struct RecordingDevice {
    pub kind: DeviceKind,
    _tracked: Tracked,
}

impl GraphicsApi for RecordingGraphics {
    type PackageTarget = RecordingPackageTarget;
    type Factory = RecordingHandle;
    type ImagingFactory = RecordingHandle;
    type TextFactory = RecordingHandle;
    type Device = RecordingDevice;
    type Context = RecordingContext;
    type PrintControl = RecordingPrintControl;
    type Cache = RecordingCache;

    fn create_package_target(
        &self,
        printer_name: &str,
        job_name: &str,
        print_ticket: &[u8],
    ) -> Result<RecordingPackageTarget> {
        if self.faults.rejected_printers.iter().any(|p| p == printer_name) {
            warn!(printer = printer_name, "spooler refused job");
            return Err(PrintError::device(
                "start document package",
                DeviceFault::Rejected,
                "access denied",
            ));
        }
        let tracked = self.acquire(ResourceKind::PackageTarget)?;
        let mut spool = self.spool.borrow_mut();
        spool.printer = Some(printer_name.to_string());
        spool.job_name = Some(job_name.to_string());
        spool.print_ticket = print_ticket.to_vec();
        debug!(printer = printer_name, job_name, "package target opened");
        Ok(RecordingPackageTarget {
            printer: printer_name.to_string(),
            job_name: job_name.to_string(),
            _tracked: tracked,
        })
    }

    fn create_factory(&self) -> Result<RecordingHandle> {
        Ok(RecordingHandle {
            _tracked: self.acquire(ResourceKind::Factory)?,
        })
    }

    fn create_imaging_factory(&self) -> Result<RecordingHandle> {
        Ok(RecordingHandle {
            _tracked: self.acquire(ResourceKind::ImagingFactory)?,
        })
    }

    fn create_text_factory(&self) -> Result<RecordingHandle> {
        Ok(RecordingHandle {
            _tracked: self.acquire(ResourceKind::TextFactory)?,
        })
    }

    fn create_device(&self, _factory: &RecordingHandle, kind: DeviceKind) -> Result<RecordingDevice> {
        if kind == DeviceKind::Hardware && self.faults.hardware_unsupported {
            return Err(PrintError::device(
                "create hardware device",
                DeviceFault::UnsupportedFeatureLevel,
                "feature level 10.0 not available",
            ));
        }
        let tracked = self.acquire(ResourceKind::Device)?;
        self.spool.borrow_mut().device_kind = Some(kind);
        Ok(RecordingDevice {
            kind,
            _tracked: tracked,
        })
    }

    fn create_context(&self, _device: &RecordingDevice) -> Result<RecordingContext> {
        Ok(RecordingContext {
            ledger: Rc::clone(&self.ledger),
            faults: Rc::clone(&self.faults),
            transform: Matrix::identity(),
            clip_depth: 0,
            ops: None,
            pages_ended: 0,
            _tracked: self.acquire(ResourceKind::Context)?,
        })
    }

    fn create_print_control(
        &self,
        _device: &RecordingDevice,
        _imaging: &RecordingHandle,
        _target: &RecordingPackageTarget,
        properties: &PrintControlProperties,
    ) -> Result<RecordingPrintControl> {
        let tracked = self.acquire(ResourceKind::PrintControl)?;
        self.spool.borrow_mut().properties = Some(*properties);
        Ok(RecordingPrintControl {
            spool: Rc::clone(&self.spool),
            faults: Rc::clone(&self.faults),
            pages_added: 0,
            _tracked: tracked,
        })
    }

    fn create_render_cache(&self, _text: &RecordingHandle) -> Result<RecordingCache> {
        Ok(RecordingCache {
            keys: HashSet::new(),
            _tracked: Some(self.acquire(ResourceKind::RenderCache)?),
        })
    }
}

/// Font/glyph cache stand-in that remembers which keys it has seen.
#[derive(Debug, Default)]
pub struct RecordingCache {
    keys: HashSet<u64>,
    _tracked: Option<Tracked>,
}

impl RecordingCache {
    /// A cache outside any ledger.
    pub fn detached() -> Self {
        Self::default()
    }
}

impl RenderCache for RecordingCache {
    fn entries(&self) -> usize {
        self.keys.len()
    }

    fn remember(&mut self, key: u64) -> bool {
        self.keys.insert(key)
    }
}

#[derive(Debug)]
pub struct RecordingBrush {
    pub color: Color,
    _tracked: Tracked,
}

/// Closed command list for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingCommandList {
    pub ops: Vec<DrawOp>,
}

/// Device context recording each page's operations.
#[derive(Debug)]
pub struct RecordingContext {
    ledger: Rc<RefCell<Ledger>>,
    faults: Rc<FaultPlan>,
    transform: Matrix,
    clip_depth: usize,
    /// Operations of the open page, if any.
    ops: Option<Vec<DrawOp>>,
    pages_ended: usize,
    _tracked: Tracked,
}

impl RecordingContext {
    fn record(&mut self, op: DrawOp) {
        match self.ops.as_mut() {
            Some(ops) => ops.push(op),
            None => warn!(?op, "draw call outside begin/end page ignored"),
        }
    }
}

impl DrawTarget for RecordingContext {
    fn transform(&self) -> Matrix {
        self.transform
    }

    fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clip_depth += 1;
        let transform = self.transform;
        self.record(DrawOp::PushClip { rect, transform });
    }

    fn pop_clip(&mut self) {
        self.clip_depth = self.clip_depth.saturating_sub(1);
        self.record(DrawOp::PopClip);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, _antialias: bool) {
        let transform = self.transform;
        self.record(DrawOp::Fill {
            rect,
            color,
            transform,
        });
    }
}

impl DrawContext for RecordingContext {
    type CommandList = RecordingCommandList;
    type Brush = RecordingBrush;
    type Surface = RecordingSurface;

    fn create_solid_brush(&mut self, color: Color) -> Result<RecordingBrush> {
        check_fault(&self.faults, ResourceKind::Brush)?;
        Ok(RecordingBrush {
            color,
            _tracked: Tracked::new(ResourceKind::Brush, &self.ledger),
        })
    }

    fn create_surface(&mut self, width: u32, height: u32, dpi: Dpi) -> Result<RecordingSurface> {
        check_fault(&self.faults, ResourceKind::Surface)?;
        if width == 0 || height == 0 {
            return Err(PrintError::device(
                "create offscreen surface",
                DeviceFault::Rejected,
                format!("invalid size {width}x{height}"),
            ));
        }
        Ok(RecordingSurface::new(
            width,
            height,
            dpi,
            Tracked::new(ResourceKind::Surface, &self.ledger),
        ))
    }

    fn begin_page(&mut self) -> Result<()> {
        if self.ops.is_some() {
            return Err(PrintError::device(
                "begin draw",
                DeviceFault::Rejected,
                "a page is already open",
            ));
        }
        self.transform = Matrix::identity();
        self.clip_depth = 0;
        self.ops = Some(Vec::new());
        Ok(())
    }

    fn fill_with_brush(&mut self, rect: Rect, brush: &RecordingBrush) {
        let transform = self.transform;
        self.record(DrawOp::Background {
            rect,
            color: brush.color,
            transform,
        });
    }

    fn draw_surface(&mut self, surface: &RecordingSurface, source: Rect, transform: Matrix) {
        let sample = surface.sample(
            source.x + source.width / 2.0,
            source.y + source.height / 2.0,
        );
        self.record(DrawOp::Composite {
            source,
            transform,
            surface_dpi: surface.dpi(),
            sample,
        });
    }

    fn end_page(&mut self) -> Result<RecordingCommandList> {
        let ops = self.ops.take().ok_or_else(|| {
            PrintError::device("end draw", DeviceFault::Rejected, "no page is open")
        })?;
        self.pages_ended += 1;
        if self.faults.end_draw_fails_on_page == Some(self.pages_ended) {
            warn!(page = self.pages_ended, "injected end-draw failure");
            return Err(PrintError::device(
                "end draw",
                DeviceFault::Rejected,
                "D2DERR_RECREATE_TARGET",
            ));
        }
        if self.clip_depth != 0 {
            return Err(PrintError::device(
                "end draw",
                DeviceFault::Rejected,
                format!("{} clip(s) left pushed", self.clip_depth),
            ));
        }
        Ok(RecordingCommandList { ops })
    }
}

/// Print control appending pages to the shared spool.
#[derive(Debug)]
pub struct RecordingPrintControl {
    spool: Rc<RefCell<Spool>>,
    faults: Rc<FaultPlan>,
    pages_added: usize,
    _tracked: Tracked,
}

impl PrintControl for RecordingPrintControl {
    type CommandList = RecordingCommandList;

    fn add_page(&mut self, commands: RecordingCommandList, paper_size: Size) -> Result<()> {
        self.pages_added += 1;
        if self.faults.add_page_fails_on_page == Some(self.pages_added) {
            return Err(PrintError::device(
                "add page",
                DeviceFault::Rejected,
                "spooler stream closed",
            ));
        }
        self.spool.borrow_mut().pages.push(SpooledPage {
            paper_size,
            ops: commands.ops,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut spool = self.spool.borrow_mut();
        debug!(pages = spool.pages.len(), "print control closed");
        spool.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_draw_failure_is_injected_on_requested_page() {
        let graphics = RecordingGraphics::with_faults(FaultPlan {
            end_draw_fails_on_page: Some(2),
            ..Default::default()
        });
        let factory = graphics.create_factory().unwrap();
        let device = graphics.create_device(&factory, DeviceKind::Hardware).unwrap();
        let mut context = graphics.create_context(&device).unwrap();

        context.begin_page().unwrap();
        assert!(context.end_page().is_ok());
        context.begin_page().unwrap();
        let err = context.end_page().unwrap_err();
        assert_eq!(err.device_fault(), Some(DeviceFault::Rejected));
    }

    #[test]
    fn ops_outside_a_page_are_not_recorded() {
        let graphics = RecordingGraphics::new();
        let factory = graphics.create_factory().unwrap();
        let device = graphics.create_device(&factory, DeviceKind::Software).unwrap();
        let mut context = graphics.create_context(&device).unwrap();

        context.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK, true);
        context.begin_page().unwrap();
        context.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::BLACK, true);
        let list = context.end_page().unwrap();
        assert_eq!(list.ops.len(), 1);
    }

    #[test]
    fn unbalanced_clip_fails_end_draw() {
        let graphics = RecordingGraphics::new();
        let factory = graphics.create_factory().unwrap();
        let device = graphics.create_device(&factory, DeviceKind::Hardware).unwrap();
        let mut context = graphics.create_context(&device).unwrap();

        context.begin_page().unwrap();
        context.push_clip(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert!(context.end_page().is_err());
    }

    #[test]
    fn dropping_resources_empties_ledger() {
        let graphics = RecordingGraphics::new();
        {
            let factory = graphics.create_factory().unwrap();
            let _device = graphics.create_device(&factory, DeviceKind::Hardware).unwrap();
            assert_eq!(graphics.ledger().live_total(), 2);
        }
        assert_eq!(graphics.ledger().live_total(), 0);
    }
}
