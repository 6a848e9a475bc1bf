// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quietprint Print — direct printing of paginated documents without a
// dialog.  Places pages on paper, decides who produces copies, owns the
// graphics device stack for the lifetime of a job, and streams pages to the
// spooler.  Collaborators are reached through the contracts in
// `quietprint-device`.

pub mod capabilities;
pub mod geometry;
pub mod job;
pub mod renderer;
pub mod resources;
pub mod sequence;
pub mod ticket;

pub use capabilities::{application_must_collate, probe_printer};
pub use job::{DirectPrint, JobReport, ProgressCallback};
pub use renderer::{PageRenderer, RenderPath};
pub use sequence::{Collation, PageSequence, SubmissionPlan};
pub use ticket::dev_mode_to_ticket;
