// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Direct print job orchestration.
//
// One `print()` call resolves settings, decides who collates, converts the
// driver settings into a print ticket, stands up the device stack, and
// submits every page in sequence.  The device stack and any offscreen
// surface are owned by the call and released on every exit path.

use chrono::{DateTime, Utc};
use quietprint_core::human_errors::humanize_error;
use quietprint_core::{
    DevMode, Dpi, JobId, JobOutcome, JobState, OutputRange, PageSettings, PrintConfig, PrintError,
    PrinterSettings, Rect, Result, Rotation, ScalingMode, Size,
};
use quietprint_device::{
    DeviceKind, Document, DrawContext, GraphicsApi, PrintControl, PrinterDriver, RenderCache,
    TicketProvider,
};
use tracing::{debug, error, info, instrument, warn};

use crate::capabilities::application_must_collate;
use crate::geometry::{PlacementSettings, paper_rotation_angle, rotate_printable_area};
use crate::renderer::{PageRenderer, RenderPath};
use crate::resources::{DeviceStack, StackRequest};
use crate::sequence::SubmissionPlan;
use crate::ticket::dev_mode_to_ticket;

/// Share of the progress scale reserved for setup.
const SETUP_PROGRESS: f32 = 0.2;

/// Progress callback: receives the completed fraction and whether the job
/// can still be cancelled; returning `false` cancels.
pub type ProgressCallback<'a> = Box<dyn FnMut(f32, bool) -> bool + 'a>;

/// Summary of a `print()` call that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub job_id: JobId,
    pub printer: String,
    pub outcome: JobOutcome,
    /// Pages handed to the print control.
    pub pages_submitted: u32,
    /// Pages the job would have submitted had it run to completion.
    pub pages_planned: u32,
    /// Pages that went through an offscreen surface.
    pub pages_composited: u32,
    pub device_kind: DeviceKind,
    pub raster_dpi: Dpi,
    /// Every state the job passed through, starting at `Idle`.
    pub state_trail: Vec<JobState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Everything a job needs, resolved once per `print()` call.
#[derive(Debug, Clone)]
struct ResolvedJob {
    printer: PrinterSettings,
    /// Paper and printable area in the orientation pages are drawn in.
    paper_size: Size,
    printable_area: Rect,
    dev_mode: DevMode,
    plan: SubmissionPlan,
    raster_dpi: Dpi,
    landscape_rotation: Rotation,
}

struct Submitted {
    outcome: JobOutcome,
    planned: u32,
    pages: u32,
    composited: u32,
}

/// Prints a [`Document`] straight to a printer's spooler.
///
/// ```ignore
/// let report = DirectPrint::new(&graphics, &driver, &tickets, &document, "Office Laser")
///     .with_config(&config)
///     .output_range(OutputRange::parse("1-3")?)
///     .print()?;
/// ```
pub struct DirectPrint<'a, G: GraphicsApi, T: TicketProvider> {
    graphics: &'a G,
    driver: &'a dyn PrinterDriver,
    tickets: &'a T,
    document: &'a dyn Document,
    printer_name: String,
    printer_settings: Option<PrinterSettings>,
    page_settings: Option<PageSettings>,
    output_range: Option<OutputRange>,
    scaling_mode: ScalingMode,
    auto_rotate: bool,
    auto_collate: Option<bool>,
    antialias: bool,
    job_name: String,
    fallback_raster_dpi: f32,
    render_cache: Option<&'a mut dyn RenderCache>,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a, G: GraphicsApi, T: TicketProvider> DirectPrint<'a, G, T> {
    pub fn new(
        graphics: &'a G,
        driver: &'a dyn PrinterDriver,
        tickets: &'a T,
        document: &'a dyn Document,
        printer_name: impl Into<String>,
    ) -> Self {
        let config = PrintConfig::default();
        Self {
            graphics,
            driver,
            tickets,
            document,
            printer_name: printer_name.into(),
            printer_settings: None,
            page_settings: None,
            output_range: None,
            scaling_mode: config.scaling_mode,
            auto_rotate: config.auto_rotate,
            auto_collate: config.auto_collate,
            antialias: config.antialias,
            job_name: config.job_name,
            fallback_raster_dpi: config.fallback_raster_dpi,
            render_cache: None,
            progress: None,
        }
    }

    /// Apply persisted defaults; later builder calls override them.
    pub fn with_config(mut self, config: &PrintConfig) -> Self {
        self.scaling_mode = config.scaling_mode;
        self.auto_rotate = config.auto_rotate;
        self.auto_collate = config.auto_collate;
        self.antialias = config.antialias;
        self.job_name = config.job_name.clone();
        self.fallback_raster_dpi = config.fallback_raster_dpi;
        self
    }

    /// Use these printer settings instead of the driver defaults.
    pub fn printer_settings(mut self, settings: PrinterSettings) -> Self {
        self.printer_name = settings.printer_name.clone();
        self.printer_settings = Some(settings);
        self
    }

    pub fn page_settings(mut self, settings: PageSettings) -> Self {
        self.page_settings = Some(settings);
        self
    }

    /// Pages to print; defaults to the printer settings' print range.
    pub fn output_range(mut self, range: OutputRange) -> Self {
        self.output_range = Some(range);
        self
    }

    pub fn scaling_mode(mut self, mode: ScalingMode) -> Self {
        self.scaling_mode = mode;
        self
    }

    pub fn auto_rotate(mut self, enabled: bool) -> Self {
        self.auto_rotate = enabled;
        self
    }

    /// Force application-side collation on or off instead of asking the
    /// driver.
    pub fn auto_collate(mut self, enabled: bool) -> Self {
        self.auto_collate = Some(enabled);
        self
    }

    pub fn antialias(mut self, enabled: bool) -> Self {
        self.antialias = enabled;
        self
    }

    pub fn job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = name.into();
        self
    }

    /// Share font/glyph caches with the caller. The job never releases them.
    pub fn render_cache(mut self, cache: &'a mut dyn RenderCache) -> Self {
        self.render_cache = Some(cache);
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(f32, bool) -> bool + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Run the job to completion or cancellation.
    ///
    /// Cancellation through the progress callback is not an error: the
    /// report's outcome says `Cancelled` and the spooled document is
    /// abandoned rather than finalised.
    #[instrument(skip_all, fields(printer = %self.printer_name, job_id = tracing::field::Empty))]
    pub fn print(&mut self) -> Result<JobReport> {
        let job_id = JobId::new();
        tracing::Span::current().record("job_id", tracing::field::display(&job_id));
        let started_at = Utc::now();
        let mut trail = StateTrail::default();

        match self.run(&mut trail) {
            Ok((resolved, device_kind, submitted)) => {
                let report = JobReport {
                    job_id,
                    printer: resolved.printer.printer_name.clone(),
                    outcome: submitted.outcome,
                    pages_submitted: submitted.pages,
                    pages_planned: submitted.planned,
                    pages_composited: submitted.composited,
                    device_kind,
                    raster_dpi: resolved.raster_dpi,
                    state_trail: trail.states,
                    started_at,
                    finished_at: Utc::now(),
                };
                info!(
                    outcome = ?report.outcome,
                    pages = report.pages_submitted,
                    "print job finished"
                );
                Ok(report)
            }
            Err(err) => {
                trail.enter(JobState::Failed);
                let human = humanize_error(&err);
                error!(
                    error = %err,
                    retriable = human.retriable,
                    suggestion = %human.suggestion,
                    "print job failed"
                );
                Err(err)
            }
        }
    }

    fn run(&mut self, trail: &mut StateTrail) -> Result<(ResolvedJob, DeviceKind, Submitted)> {
        let resolved = self.resolve_settings()?;
        trail.enter(JobState::SettingsResolved);

        let total_pages = self.document.page_count();
        if total_pages == 0 {
            return Err(PrintError::Configuration("document has no pages".into()));
        }
        let range = self
            .output_range
            .clone()
            .unwrap_or_else(|| OutputRange::from_print_range(resolved.printer.print_range, total_pages));
        let range_pages = range.page_count(total_pages);
        if range_pages == 0 {
            return Err(PrintError::Configuration(format!(
                "output range {range} selects none of the {total_pages} pages"
            )));
        }
        let planned = resolved.plan.submissions(range_pages)?;
        debug!(%range, range_pages, planned, "output range resolved");
        trail.enter(JobState::RangeResolved);

        let ticket = dev_mode_to_ticket(self.tickets, &resolved.printer.printer_name, &resolved.dev_mode)?;
        let mut stack = DeviceStack::open(
            self.graphics,
            &StackRequest {
                printer_name: &resolved.printer.printer_name,
                job_name: &self.job_name,
                print_ticket: &ticket,
                raster_dpi: resolved.raster_dpi.x,
            },
        )?;
        // Declared after the stack so they are dropped first.
        let mut default_cache;
        let cache: &mut dyn RenderCache = match self.render_cache.as_deref_mut() {
            Some(cache) => cache,
            None => {
                default_cache = stack.create_render_cache(self.graphics)?;
                &mut default_cache
            }
        };
        trail.enter(JobState::DeviceReady);

        let mut renderer = PageRenderer::new(
            PlacementSettings {
                paper_size: resolved.paper_size,
                printable_area: resolved.printable_area,
                scaling_mode: self.scaling_mode,
                auto_rotate: self.auto_rotate,
                landscape_rotation: resolved.landscape_rotation,
            },
            resolved.raster_dpi,
            self.antialias,
        );
        trail.enter(JobState::Submitting);

        let printer = resolved.printer.printer_name.as_str();
        let mut submitted = Submitted {
            outcome: JobOutcome::Completed,
            planned,
            pages: 0,
            composited: 0,
        };
        for page_number in resolved.plan.sequence(range.iter(total_pages)) {
            let page = self.document.page(page_number - 1)?;
            stack
                .context
                .begin_page()
                .map_err(|err| page_failure(printer, "begin draw", page_number, err))?;
            let path = renderer.render(&mut stack.context, page.as_ref(), &stack.background, cache)?;
            let commands = stack
                .context
                .end_page()
                .map_err(|err| page_failure(printer, "end draw", page_number, err))?;
            stack
                .print_control
                .add_page(commands, resolved.paper_size)
                .map_err(|err| page_failure(printer, "add page", page_number, err))?;

            submitted.pages += 1;
            if path == RenderPath::Offscreen {
                submitted.composited += 1;
            }
            debug!(page = page_number, ?path, "page submitted");

            let fraction = SETUP_PROGRESS + (1.0 - SETUP_PROGRESS) * submitted.pages as f32 / planned as f32;
            if let Some(progress) = self.progress.as_mut() {
                if !progress(fraction, true) {
                    warn!(pages = submitted.pages, "print job cancelled by caller");
                    trail.enter(JobState::Cancelled);
                    submitted.outcome = JobOutcome::Cancelled;
                    return Ok((resolved, stack.device_kind(), submitted));
                }
            }
        }

        stack.close().map_err(|err| PrintError::PrintOperation {
            printer: printer.to_string(),
            operation: "close print control".into(),
            detail: err.to_string(),
        })?;
        trail.enter(JobState::Closed);
        let device_kind = stack.device_kind();
        Ok((resolved, device_kind, submitted))
    }

    /// Merge caller settings with driver defaults and decide collation,
    /// orientation and raster resolution.
    fn resolve_settings(&self) -> Result<ResolvedJob> {
        if !self.driver.is_installed(&self.printer_name) {
            return Err(PrintError::JobCreation {
                printer: self.printer_name.clone(),
                message: "printer is not installed".into(),
            });
        }
        let printer = match &self.printer_settings {
            Some(settings) => settings.clone(),
            None => self.driver.default_settings(&self.printer_name)?,
        };
        if printer.copies == 0 {
            return Err(PrintError::Configuration("copies must be at least 1".into()));
        }
        let page = self
            .page_settings
            .clone()
            .unwrap_or_else(|| printer.default_page_settings.clone());
        if page.paper_size.is_empty() {
            return Err(PrintError::Configuration("paper size is empty".into()));
        }
        if !Rect::from_size(page.paper_size).contains_rect(&page.printable_area)
            || page.printable_area.size().is_empty()
        {
            return Err(PrintError::Configuration(format!(
                "printable area {:?} does not fit paper {:?}",
                page.printable_area, page.paper_size
            )));
        }
        let landscape_rotation = Rotation::try_from_degrees(printer.landscape_angle)?;

        let mut dev_mode = self.driver.dev_mode(&printer, &page)?;
        let auto_collate = self
            .auto_collate
            .unwrap_or_else(|| application_must_collate(&dev_mode));
        let plan = SubmissionPlan::new(auto_collate, printer.collate, printer.copies);
        dev_mode.copies = plan.driver_copies;
        dev_mode.collate = plan.driver_collate;

        // Drivers report landscape paper in the portrait frame.
        let (paper_size, printable_area) = if page.landscape {
            rotate_printable_area(
                paper_rotation_angle(printer.landscape_angle)?,
                page.paper_size,
                page.printable_area,
            )?
        } else {
            (page.paper_size, page.printable_area)
        };

        let raster_dpi = resolve_raster_dpi(&page, &dev_mode, self.fallback_raster_dpi)?;
        info!(
            copies = printer.copies,
            collation = ?plan.collation,
            landscape = page.landscape,
            dpi = raster_dpi.x,
            "settings resolved"
        );

        Ok(ResolvedJob {
            printer,
            paper_size,
            printable_area,
            dev_mode,
            plan,
            raster_dpi,
            landscape_rotation,
        })
    }
}

/// Caller hint first, then the driver's hardware resolution, then the
/// configured fallback.
fn resolve_raster_dpi(page: &PageSettings, dev_mode: &DevMode, fallback: f32) -> Result<Dpi> {
    let dpi = match (page.resolution, dev_mode.resolution()) {
        (Some(dpi), _) => dpi,
        (None, Some(dpi)) => dpi,
        (None, None) => {
            warn!(fallback, "driver reports no resolution, using fallback");
            Dpi::uniform(fallback)
        }
    };
    if dpi.x > 0.0 && dpi.y > 0.0 {
        Ok(dpi)
    } else {
        Err(PrintError::Configuration(format!(
            "raster resolution must be positive, got {} x {}",
            dpi.x, dpi.y
        )))
    }
}

fn page_failure(printer: &str, operation: &str, page_number: u32, err: PrintError) -> PrintError {
    PrintError::PrintOperation {
        printer: printer.to_string(),
        operation: format!("{operation} (page {page_number})"),
        detail: err.to_string(),
    }
}

/// Job lifecycle, logged as it advances.
#[derive(Debug)]
struct StateTrail {
    states: Vec<JobState>,
}

impl Default for StateTrail {
    fn default() -> Self {
        Self {
            states: vec![JobState::Idle],
        }
    }
}

impl StateTrail {
    fn current(&self) -> JobState {
        self.states.last().copied().unwrap_or(JobState::Idle)
    }

    fn enter(&mut self, next: JobState) {
        let from = self.current();
        debug_assert!(from.can_transition_to(next), "{from:?} -> {next:?}");
        debug!(?from, to = ?next, "job state");
        self.states.push(next);
    }
}
