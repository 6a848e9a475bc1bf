// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recording printer driver and print-ticket provider.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use quietprint_core::{
    DevMode, DevModeFields, DeviceFault, PageSettings, PrintError, PrinterSettings, Result,
};
use tracing::debug;

use crate::traits::{PrinterDriver, TicketProvider, TicketSession};

/// DEVMODE of a driver that honours collate and copies together.
pub fn dev_mode_with_collation() -> DevMode {
    DevMode {
        fields: DevModeFields {
            collate: true,
            copies: true,
            print_quality: true,
            y_resolution: true,
        },
        copies: 1,
        collate: false,
        print_quality: 600,
        y_resolution: 600,
        extra: Vec::new(),
    }
}

/// DEVMODE of a driver that cannot collate multiple copies itself.
pub fn dev_mode_without_collation() -> DevMode {
    DevMode {
        fields: DevModeFields {
            collate: false,
            copies: true,
            print_quality: true,
            y_resolution: false,
        },
        copies: 1,
        collate: false,
        print_quality: 300,
        y_resolution: 0,
        extra: Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct InstalledPrinter {
    pub settings: PrinterSettings,
    pub dev_mode: DevMode,
}

/// Table of installed printers with fixed driver capabilities.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    printers: HashMap<String, InstalledPrinter>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(mut self, settings: PrinterSettings, dev_mode: DevMode) -> Self {
        self.printers.insert(
            settings.printer_name.clone(),
            InstalledPrinter { settings, dev_mode },
        );
        self
    }

    fn lookup(&self, printer_name: &str) -> Result<&InstalledPrinter> {
        self.printers.get(printer_name).ok_or_else(|| {
            PrintError::device(
                "open printer",
                DeviceFault::Unavailable,
                format!("printer '{printer_name}' is not installed"),
            )
        })
    }
}

impl PrinterDriver for RecordingDriver {
    fn is_installed(&self, printer_name: &str) -> bool {
        self.printers.contains_key(printer_name)
    }

    fn default_settings(&self, printer_name: &str) -> Result<PrinterSettings> {
        Ok(self.lookup(printer_name)?.settings.clone())
    }

    fn dev_mode(&self, printer: &PrinterSettings, _page: &PageSettings) -> Result<DevMode> {
        let installed = self.lookup(&printer.printer_name)?;
        let mut mode = installed.dev_mode.clone();
        mode.copies = printer.copies;
        mode.collate = printer.collate;
        Ok(mode)
    }
}

/// Open/close/conversion counters of a [`RecordingTickets`] provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketStats {
    pub opened: u32,
    pub closed: u32,
    pub conversions: u32,
}

/// Print-ticket provider that emits a minimal Print Schema document.
#[derive(Debug, Clone, Default)]
pub struct RecordingTickets {
    printers: Vec<String>,
    fail_conversion: bool,
    stats: Rc<RefCell<TicketStats>>,
}

impl RecordingTickets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a printer the provider can be opened for.
    pub fn with_printer(mut self, printer_name: impl Into<String>) -> Self {
        self.printers.push(printer_name.into());
        self
    }

    /// Every conversion fails after the provider opened.
    pub fn failing_conversion(mut self) -> Self {
        self.fail_conversion = true;
        self
    }

    pub fn stats(&self) -> TicketStats {
        *self.stats.borrow()
    }
}

impl TicketProvider for RecordingTickets {
    type Session = RecordingTicketSession;

    fn open(&self, printer_name: &str) -> Result<RecordingTicketSession> {
        if !self.printers.iter().any(|p| p == printer_name) {
            return Err(PrintError::device(
                "open print ticket provider",
                DeviceFault::Unavailable,
                format!("no provider for '{printer_name}'"),
            ));
        }
        self.stats.borrow_mut().opened += 1;
        debug!(printer = printer_name, "print ticket provider opened");
        Ok(RecordingTicketSession {
            fail_conversion: self.fail_conversion,
            stats: Rc::clone(&self.stats),
        })
    }
}

#[derive(Debug)]
pub struct RecordingTicketSession {
    fail_conversion: bool,
    stats: Rc<RefCell<TicketStats>>,
}

impl TicketSession for RecordingTicketSession {
    fn convert_dev_mode(&mut self, dev_mode_blob: &[u8]) -> Result<Vec<u8>> {
        self.stats.borrow_mut().conversions += 1;
        if self.fail_conversion {
            return Err(PrintError::device(
                "convert DEVMODE to print ticket",
                DeviceFault::Rejected,
                "E_PRINTTICKET_FORMAT",
            ));
        }
        let mode = DevMode::from_blob(dev_mode_blob).map_err(|err| {
            PrintError::device(
                "convert DEVMODE to print ticket",
                DeviceFault::Rejected,
                err.to_string(),
            )
        })?;
        Ok(render_ticket(&mode).into_bytes())
    }

    fn close(&mut self) {
        self.stats.borrow_mut().closed += 1;
    }
}

fn render_ticket(mode: &DevMode) -> String {
    let collate = if mode.collate { "Collated" } else { "Uncollated" };
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<psf:PrintTicket xmlns:psf=\"http://schemas.microsoft.com/windows/2003/08/printing/printschemaframework\" ",
            "xmlns:psk=\"http://schemas.microsoft.com/windows/2003/08/printing/printschemakeywords\" version=\"1\">\n",
            "  <psf:ParameterInit name=\"psk:JobCopiesAllDocuments\"><psf:Value>{copies}</psf:Value></psf:ParameterInit>\n",
            "  <psf:Feature name=\"psk:DocumentCollate\"><psf:Option name=\"psk:{collate}\"/></psf:Feature>\n",
            "</psf:PrintTicket>\n"
        ),
        copies = mode.copies,
        collate = collate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_carries_copies_and_collation() {
        let tickets = RecordingTickets::new().with_printer("Laser");
        let mut session = tickets.open("Laser").unwrap();
        let mode = DevMode {
            copies: 4,
            collate: true,
            ..dev_mode_with_collation()
        };
        let ticket = String::from_utf8(session.convert_dev_mode(&mode.to_blob().unwrap()).unwrap()).unwrap();
        session.close();
        assert!(ticket.contains("<psf:Value>4</psf:Value>"));
        assert!(ticket.contains("psk:Collated"));
        assert_eq!(
            tickets.stats(),
            TicketStats {
                opened: 1,
                closed: 1,
                conversions: 1
            }
        );
    }

    #[test]
    fn unknown_printer_cannot_open() {
        let tickets = RecordingTickets::new();
        assert!(tickets.open("Ghost").is_err());
        assert_eq!(tickets.stats().opened, 0);
    }

    #[test]
    fn driver_merges_copy_settings_into_devmode() {
        let mut settings = PrinterSettings::new("Laser");
        let driver = RecordingDriver::new().with_printer(settings.clone(), dev_mode_with_collation());
        settings.copies = 3;
        settings.collate = true;
        let mode = driver.dev_mode(&settings, &PageSettings::default()).unwrap();
        assert_eq!(mode.copies, 3);
        assert!(mode.collate);
    }
}
