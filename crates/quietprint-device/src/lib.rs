// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quietprint — collaborator contracts for the print engine.
//
// `traits` defines what the engine needs from the document library, the
// printer driver, the print-ticket subsystem, and the graphics device layer.
// `recording` implements all of them in memory so the engine can run
// headless in CI, tests and benchmarks.

pub mod recording;
pub mod traits;

pub use traits::*;
