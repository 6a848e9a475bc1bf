// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page placement, submission ordering, and whole
// jobs against the recording backend.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use quietprint_core::{
    Color, Dpi, OutputRange, PageSettings, PrinterSettings, Rect, Rotation, ScalingMode, Size,
};
use quietprint_device::recording::{
    RecordingDriver, RecordingGraphics, RecordingTickets, SyntheticDocument, SyntheticPage,
    dev_mode_without_collation,
};
use quietprint_print::DirectPrint;
use quietprint_print::geometry::{PlacementSettings, compute_page_transform};
use quietprint_print::sequence::SubmissionPlan;

const PRINTER: &str = "Bench Laser";

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

fn bench_page_transform(c: &mut Criterion) {
    let settings = PlacementSettings {
        paper_size: Size::new(816.0, 1056.0),
        printable_area: Rect::new(24.0, 24.0, 768.0, 1008.0),
        scaling_mode: ScalingMode::FitToPrintableArea,
        auto_rotate: true,
        landscape_rotation: Rotation::Deg90,
    };
    let pages = [
        Size::new(612.0, 792.0),
        Size::new(792.0, 612.0),
        Size::new(595.0, 842.0),
    ];

    c.bench_function("compute_page_transform", |b| {
        b.iter(|| {
            for page in &pages {
                black_box(compute_page_transform(black_box(*page), &settings).matrix());
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Sequencing
// ---------------------------------------------------------------------------

fn bench_collated_sequence(c: &mut Criterion) {
    let range = OutputRange::parse("1-50, 75, 90-").unwrap_or_default();
    let plan = SubmissionPlan::new(true, true, 10);

    c.bench_function("collated_sequence_10_copies", |b| {
        b.iter(|| plan.sequence(range.iter(black_box(200))).sum::<u32>());
    });
}

// ---------------------------------------------------------------------------
// Whole jobs
// ---------------------------------------------------------------------------

fn bench_print_job(c: &mut Criterion) {
    let driver = RecordingDriver::new().with_printer(
        PrinterSettings {
            copies: 2,
            collate: true,
            ..PrinterSettings::new(PRINTER)
        },
        dev_mode_without_collation(),
    );
    let tickets = RecordingTickets::new().with_printer(PRINTER);
    let opaque = SyntheticDocument::uniform(20, Size::new(612.0, 792.0));
    let transparent = SyntheticDocument::new(
        (0..4)
            .map(|_| SyntheticPage::transparent(Size::new(96.0, 96.0), Color::BLACK))
            .collect(),
    );

    // Keeps offscreen surfaces small so the bench measures the engine.
    let screen_resolution = PageSettings {
        resolution: Some(Dpi::LOGICAL),
        ..PageSettings::letter()
    };

    c.bench_function("print_20_opaque_pages_2_copies", |b| {
        b.iter(|| {
            let graphics = RecordingGraphics::new();
            DirectPrint::new(&graphics, &driver, &tickets, &opaque, PRINTER)
                .print()
                .map(|report| report.pages_submitted)
        });
    });

    c.bench_function("print_4_transparent_pages", |b| {
        b.iter(|| {
            let graphics = RecordingGraphics::new();
            DirectPrint::new(&graphics, &driver, &tickets, &transparent, PRINTER)
                .page_settings(screen_resolution.clone())
                .print()
                .map(|report| report.pages_composited)
        });
    });
}

criterion_group!(
    benches,
    bench_page_transform,
    bench_collated_sequence,
    bench_print_job
);
criterion_main!(benches);
