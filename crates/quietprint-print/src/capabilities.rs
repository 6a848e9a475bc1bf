// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver capability queries: who collates, and whether a printer can take
// a job at all.

use quietprint_core::{DevMode, Result};
use quietprint_device::{DeviceKind, GraphicsApi, PrinterDriver, TicketProvider};
use tracing::{debug, instrument, warn};

use crate::resources::create_device;
use crate::ticket::dev_mode_to_ticket;

/// Whether the application must produce copies itself.
///
/// Drivers are trusted with copies only when they report honouring both the
/// collate and the copies fields.  Some drivers claim collation support and
/// still print uncollated; this check cannot detect them.
pub fn application_must_collate(dev_mode: &DevMode) -> bool {
    !(dev_mode.fields.collate && dev_mode.fields.copies)
}

/// True if `printer_name` is installed, yields driver settings that convert
/// to a print ticket, and a graphics device with a draw context can be
/// created for it.
///
/// No spooler job is started; every resource is released before returning.
#[instrument(skip(graphics, driver, tickets))]
pub fn probe_printer<G, D, T>(graphics: &G, driver: &D, tickets: &T, printer_name: &str) -> bool
where
    G: GraphicsApi,
    D: PrinterDriver + ?Sized,
    T: TicketProvider,
{
    if !driver.is_installed(printer_name) {
        debug!("printer not installed");
        return false;
    }
    let settings = match driver.default_settings(printer_name) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "no default settings");
            return false;
        }
    };
    let dev_mode = match driver.dev_mode(&settings, &settings.default_page_settings) {
        Ok(mode) => mode,
        Err(e) => {
            warn!(error = %e, "no driver settings block");
            return false;
        }
    };
    if let Err(e) = dev_mode_to_ticket(tickets, printer_name, &dev_mode) {
        warn!(error = %e, "print ticket conversion failed");
        return false;
    }
    match probe_device(graphics) {
        Ok(device_kind) => {
            debug!(?device_kind, collate = !application_must_collate(&dev_mode), "printer usable");
            true
        }
        Err(e) => {
            warn!(error = %e, "graphics device unavailable");
            false
        }
    }
}

/// Factory, device and draw context, released again on return.
fn probe_device<G: GraphicsApi>(graphics: &G) -> Result<DeviceKind> {
    let factory = graphics.create_factory()?;
    let (device, device_kind) = create_device(graphics, &factory)?;
    let _context = graphics.create_context(&device)?;
    Ok(device_kind)
}

#[cfg(test)]
mod tests {
    use quietprint_core::{DevModeFields, PrinterSettings};
    use quietprint_device::recording::{
        FaultPlan, RecordingDriver, RecordingGraphics, RecordingTickets, ResourceKind,
        dev_mode_with_collation, dev_mode_without_collation,
    };

    use super::*;

    fn laser() -> (RecordingDriver, RecordingTickets) {
        (
            RecordingDriver::new().with_printer(PrinterSettings::new("Laser"), dev_mode_with_collation()),
            RecordingTickets::new().with_printer("Laser"),
        )
    }

    #[test]
    fn collation_needs_both_fields() {
        assert!(!application_must_collate(&dev_mode_with_collation()));
        assert!(application_must_collate(&dev_mode_without_collation()));
        let copies_only = DevMode {
            fields: DevModeFields {
                collate: true,
                copies: false,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(application_must_collate(&copies_only));
    }

    #[test]
    fn probe_accepts_working_printer() {
        let (driver, tickets) = laser();
        let graphics = RecordingGraphics::new();
        assert!(probe_printer(&graphics, &driver, &tickets, "Laser"));

        let ledger = graphics.ledger();
        assert_eq!(ledger.live_total(), 0);
        assert!(!ledger.created().contains(&ResourceKind::PackageTarget));
        assert!(ledger.created().contains(&ResourceKind::Context));
    }

    #[test]
    fn probe_rejects_missing_or_broken_printers() {
        let (driver, tickets) = laser();
        let graphics = RecordingGraphics::new();
        assert!(!probe_printer(&graphics, &driver, &tickets, "Inkjet"));

        let broken = RecordingTickets::new().with_printer("Laser").failing_conversion();
        assert!(!probe_printer(&graphics, &driver, &broken, "Laser"));
        assert_eq!(broken.stats().closed, 1);
    }

    #[test]
    fn probe_rejects_printer_without_graphics_device() {
        let (driver, tickets) = laser();
        for kind in [ResourceKind::Factory, ResourceKind::Device, ResourceKind::Context] {
            let graphics = RecordingGraphics::with_faults(FaultPlan {
                fail_on_create: Some(kind),
                ..Default::default()
            });
            assert!(!probe_printer(&graphics, &driver, &tickets, "Laser"), "{kind} failure");
            assert_eq!(graphics.ledger().live_total(), 0);
        }
    }

    #[test]
    fn probe_accepts_software_fallback() {
        let (driver, tickets) = laser();
        let graphics = RecordingGraphics::with_faults(FaultPlan {
            hardware_unsupported: true,
            ..Default::default()
        });
        assert!(probe_printer(&graphics, &driver, &tickets, "Laser"));
        assert_eq!(graphics.ledger().live_total(), 0);
    }
}
