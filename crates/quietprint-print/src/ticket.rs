// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DEVMODE to print-ticket conversion.

use std::ops::{Deref, DerefMut};

use quietprint_core::{DevMode, DeviceFault, PrintError, Result};
use quietprint_device::{TicketProvider, TicketSession};
use tracing::{debug, instrument};

/// Open provider handle that is closed on every exit path.
struct SessionGuard<S: TicketSession>(S);

impl<S: TicketSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: TicketSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S: TicketSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Convert driver settings into a print-ticket stream for `printer_name`.
///
/// Every failure surfaces as a device error; the provider session is closed
/// whether or not conversion succeeds.
#[instrument(skip_all, fields(printer = printer_name))]
pub fn dev_mode_to_ticket<P: TicketProvider>(
    provider: &P,
    printer_name: &str,
    dev_mode: &DevMode,
) -> Result<Vec<u8>> {
    let blob = dev_mode
        .to_blob()
        .map_err(|err| as_device_error("serialise DEVMODE", err))?;
    let mut session = SessionGuard(
        provider
            .open(printer_name)
            .map_err(|err| as_device_error("open print ticket provider", err))?,
    );
    let ticket = session
        .convert_dev_mode(&blob)
        .map_err(|err| as_device_error("convert DEVMODE to print ticket", err))?;
    debug!(bytes = ticket.len(), "print ticket ready");
    Ok(ticket)
}

fn as_device_error(operation: &str, err: PrintError) -> PrintError {
    match err {
        PrintError::Device { .. } => err,
        other => PrintError::device(operation, DeviceFault::Other, other.to_string()),
    }
}
