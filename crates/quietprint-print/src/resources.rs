// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Graphics resources owned by one print job.
//
// Resources are created along their dependency chain and released in the
// reverse order.  Creation uses locals, so an early `?` return drops the
// partial chain newest first; the finished stack declares its fields newest
// first, so dropping it does the same.  A default render cache is created
// from the stack afterwards and must be dropped before it.

use quietprint_core::{Color, DeviceFault, PrintError, Result};
use quietprint_device::{
    ColorSpace, DeviceKind, DrawContext, FontSubsetMode, GraphicsApi, PrintControl,
    PrintControlProperties,
};
use tracing::{debug, info, instrument, warn};

/// Parameters for standing up a [`DeviceStack`].
#[derive(Debug, Clone, Copy)]
pub struct StackRequest<'a> {
    pub printer_name: &'a str,
    pub job_name: &'a str,
    pub print_ticket: &'a [u8],
    pub raster_dpi: f32,
}

type BrushOf<G> = <<G as GraphicsApi>::Context as DrawContext>::Brush;

/// The graphics device stack bound to one spooler job.
pub struct DeviceStack<G: GraphicsApi> {
    // Field order is drop order.
    pub(crate) background: BrushOf<G>,
    pub(crate) print_control: G::PrintControl,
    pub(crate) context: G::Context,
    _device: G::Device,
    text_factory: G::TextFactory,
    _imaging_factory: G::ImagingFactory,
    _factory: G::Factory,
    _target: G::PackageTarget,
    device_kind: DeviceKind,
}

impl<G: GraphicsApi> DeviceStack<G> {
    #[instrument(skip_all, fields(printer = request.printer_name))]
    pub fn open(api: &G, request: &StackRequest<'_>) -> Result<Self> {
        let target = api
            .create_package_target(request.printer_name, request.job_name, request.print_ticket)
            .map_err(|err| PrintError::JobCreation {
                printer: request.printer_name.to_string(),
                message: err.to_string(),
            })?;
        let factory = api.create_factory()?;
        let imaging_factory = api.create_imaging_factory()?;
        let text_factory = api.create_text_factory()?;
        let (device, device_kind) = create_device(api, &factory)?;
        let mut context = api.create_context(&device)?;
        let properties = PrintControlProperties {
            font_subset: FontSubsetMode::Default,
            raster_dpi: request.raster_dpi,
            color_space: ColorSpace::Srgb,
        };
        let print_control = api.create_print_control(&device, &imaging_factory, &target, &properties)?;
        let background = context.create_solid_brush(Color::WHITE)?;

        info!(?device_kind, raster_dpi = request.raster_dpi, "device stack ready");
        Ok(Self {
            background,
            print_control,
            context,
            _device: device,
            text_factory,
            _imaging_factory: imaging_factory,
            _factory: factory,
            _target: target,
            device_kind,
        })
    }

    /// Default font/glyph caches for jobs whose caller brings none.
    pub fn create_render_cache(&self, api: &G) -> Result<G::Cache> {
        api.create_render_cache(&self.text_factory)
    }

    pub fn device_kind(&self) -> DeviceKind {
        self.device_kind
    }

    /// Finalise the spooled document. Dropping without closing abandons it.
    pub fn close(&mut self) -> Result<()> {
        self.print_control.close()
    }
}

pub(crate) fn create_device<G: GraphicsApi>(api: &G, factory: &G::Factory) -> Result<(G::Device, DeviceKind)> {
    match api.create_device(factory, DeviceKind::Hardware) {
        Ok(device) => Ok((device, DeviceKind::Hardware)),
        Err(err) if err.device_fault() == Some(DeviceFault::UnsupportedFeatureLevel) => {
            warn!(error = %err, "hardware device unavailable, falling back to software");
            let device = api.create_device(factory, DeviceKind::Software)?;
            debug!("software device created");
            Ok((device, DeviceKind::Software))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use quietprint_device::recording::{FaultPlan, RecordingGraphics, ResourceKind};

    use super::*;

    fn request() -> StackRequest<'static> {
        StackRequest {
            printer_name: "Laser",
            job_name: "test",
            print_ticket: b"<ticket/>",
            raster_dpi: 300.0,
        }
    }

    const CREATION_ORDER: [ResourceKind; 9] = [
        ResourceKind::PackageTarget,
        ResourceKind::Factory,
        ResourceKind::ImagingFactory,
        ResourceKind::TextFactory,
        ResourceKind::Device,
        ResourceKind::Context,
        ResourceKind::PrintControl,
        ResourceKind::Brush,
        ResourceKind::RenderCache,
    ];

    #[test]
    fn stack_releases_in_reverse_creation_order() {
        let graphics = RecordingGraphics::new();
        let stack = DeviceStack::open(&graphics, &request()).unwrap();
        let cache = stack.create_render_cache(&graphics).unwrap();
        assert_eq!(stack.device_kind(), DeviceKind::Hardware);
        assert_eq!(graphics.ledger().created(), CREATION_ORDER.to_vec());
        drop(cache);
        drop(stack);

        let ledger = graphics.ledger();
        let mut expected = CREATION_ORDER.to_vec();
        expected.reverse();
        assert_eq!(ledger.released(), expected);
        assert_eq!(ledger.live_total(), 0);
    }

    #[test]
    fn stack_creates_no_cache_by_itself() {
        let graphics = RecordingGraphics::new();
        let _stack = DeviceStack::open(&graphics, &request()).unwrap();
        assert_eq!(graphics.ledger().live_count(ResourceKind::RenderCache), 0);
    }

    #[test]
    fn partial_stack_is_released_on_failure() {
        let graphics = RecordingGraphics::with_faults(FaultPlan {
            fail_on_create: Some(ResourceKind::PrintControl),
            ..Default::default()
        });
        let err = DeviceStack::open(&graphics, &request()).err().unwrap();
        assert_eq!(err.device_fault(), Some(DeviceFault::Unavailable));

        let ledger = graphics.ledger();
        assert_eq!(ledger.live_total(), 0);
        assert_eq!(
            ledger.released(),
            vec![
                ResourceKind::Context,
                ResourceKind::Device,
                ResourceKind::TextFactory,
                ResourceKind::ImagingFactory,
                ResourceKind::Factory,
                ResourceKind::PackageTarget,
            ]
        );
    }

    #[test]
    fn unsupported_hardware_falls_back_to_software() {
        let graphics = RecordingGraphics::with_faults(FaultPlan {
            hardware_unsupported: true,
            ..Default::default()
        });
        let stack = DeviceStack::open(&graphics, &request()).unwrap();
        assert_eq!(stack.device_kind(), DeviceKind::Software);
        assert_eq!(graphics.spool().device_kind, Some(DeviceKind::Software));
    }

    #[test]
    fn rejected_printer_is_job_creation_error() {
        let graphics = RecordingGraphics::with_faults(FaultPlan {
            rejected_printers: vec!["Laser".into()],
            ..Default::default()
        });
        let err = DeviceStack::open(&graphics, &request()).err().unwrap();
        match err {
            PrintError::JobCreation { printer, message } => {
                assert_eq!(printer, "Laser");
                assert!(message.contains("access denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(graphics.ledger().live_total(), 0);
    }

    #[test]
    fn close_finalises_spool() {
        let graphics = RecordingGraphics::new();
        let mut stack = DeviceStack::open(&graphics, &request()).unwrap();
        stack.close().unwrap();
        assert!(graphics.spool().closed);
    }
}
