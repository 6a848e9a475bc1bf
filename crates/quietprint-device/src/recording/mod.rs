// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory recording backend for headless runs, tests and benchmarks.
//
// Implements every collaborator trait without touching a real spooler.
// Graphics resources are registered in a shared ledger when created and
// when dropped, so a caller can check that a job released everything it
// acquired, and in which order.  Faults can be injected at any creation
// step, at hardware device creation, at end-of-draw, and at page
// submission.

mod document;
mod driver;
mod graphics;
mod surface;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use document::{SyntheticDocument, SyntheticPage};
pub use driver::{
    InstalledPrinter, RecordingDriver, RecordingTicketSession, RecordingTickets, TicketStats,
    dev_mode_with_collation, dev_mode_without_collation,
};
pub use graphics::{
    DrawOp, RecordingBrush, RecordingCache, RecordingCommandList, RecordingContext,
    RecordingDevice, RecordingGraphics, RecordingHandle, RecordingPackageTarget,
    RecordingPrintControl, Spool, SpooledPage,
};
pub use surface::RecordingSurface;

/// Kinds of graphics resources the ledger tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PackageTarget,
    Factory,
    ImagingFactory,
    TextFactory,
    Device,
    Context,
    PrintControl,
    Brush,
    Surface,
    RenderCache,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PackageTarget => "package target",
            Self::Factory => "device factory",
            Self::ImagingFactory => "imaging factory",
            Self::TextFactory => "text factory",
            Self::Device => "device",
            Self::Context => "device context",
            Self::PrintControl => "print control",
            Self::Brush => "brush",
            Self::Surface => "offscreen surface",
            Self::RenderCache => "render cache",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEvent {
    Created(ResourceKind),
    Released(ResourceKind),
}

/// Creation/release history of every tracked resource.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    events: Vec<LedgerEvent>,
}

impl Ledger {
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Kinds in creation order.
    pub fn created(&self) -> Vec<ResourceKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LedgerEvent::Created(kind) => Some(*kind),
                LedgerEvent::Released(_) => None,
            })
            .collect()
    }

    /// Kinds in release order.
    pub fn released(&self) -> Vec<ResourceKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LedgerEvent::Released(kind) => Some(*kind),
                LedgerEvent::Created(_) => None,
            })
            .collect()
    }

    /// How many resources of `kind` are still alive.
    pub fn live_count(&self, kind: ResourceKind) -> usize {
        let created = self.created().iter().filter(|k| **k == kind).count();
        let released = self.released().iter().filter(|k| **k == kind).count();
        created.saturating_sub(released)
    }

    /// Total number of live resources.
    pub fn live_total(&self) -> usize {
        self.created().len().saturating_sub(self.released().len())
    }
}

/// Ledger registration owned by a resource; releases on drop.
#[derive(Debug)]
pub(crate) struct Tracked {
    kind: ResourceKind,
    ledger: Rc<RefCell<Ledger>>,
}

impl Tracked {
    pub(crate) fn new(kind: ResourceKind, ledger: &Rc<RefCell<Ledger>>) -> Self {
        ledger.borrow_mut().events.push(LedgerEvent::Created(kind));
        tracing::trace!(%kind, "resource created");
        Self {
            kind,
            ledger: Rc::clone(ledger),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger
            .borrow_mut()
            .events
            .push(LedgerEvent::Released(self.kind));
        tracing::trace!(kind = %self.kind, "resource released");
    }
}

/// Failures to inject into a recording run.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// Fail the first creation of this resource kind.
    pub fail_on_create: Option<ResourceKind>,
    /// Hardware device creation reports an unsupported feature level.
    pub hardware_unsupported: bool,
    /// The n-th (1-based) end-of-draw call fails.
    pub end_draw_fails_on_page: Option<usize>,
    /// The n-th (1-based) page submission fails.
    pub add_page_fails_on_page: Option<usize>,
    /// Printers whose spooler refuses to start a job.
    pub rejected_printers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_tracks_live_resources() {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        let a = Tracked::new(ResourceKind::Factory, &ledger);
        let b = Tracked::new(ResourceKind::Device, &ledger);
        assert_eq!(ledger.borrow().live_total(), 2);
        drop(b);
        drop(a);
        let snapshot = ledger.borrow().clone();
        assert_eq!(snapshot.live_total(), 0);
        assert_eq!(
            snapshot.released(),
            vec![ResourceKind::Device, ResourceKind::Factory]
        );
    }
}
