// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Quietprint engine.
//
// All lengths are device independent pixels (DIPs, 1/96 inch) unless a
// constructor says otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PrintError, Result};

/// Logical resolution of the drawing context, in dots per inch.
pub const LOGICAL_DPI: f32 = 96.0;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Convert from hundredths of an inch, the unit drivers report paper in.
    pub fn from_hundredths_of_inch(width: f32, height: f32) -> Self {
        Self::new(width * LOGICAL_DPI / 100.0, height * LOGICAL_DPI / 100.0)
    }

    /// Landscape means strictly wider than tall; a square is portrait.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering `size` from the origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Convert from hundredths of an inch.
    pub fn from_hundredths_of_inch(x: f32, y: f32, width: f32, height: f32) -> Self {
        let k = LOGICAL_DPI / 100.0;
        Self::new(x * k, y * k, width * k, height * k)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_landscape(&self) -> bool {
        self.size().is_landscape()
    }

    /// Same origin, width and height exchanged.
    pub fn swapped(&self) -> Self {
        Self::new(self.x, self.y, self.height, self.width)
    }

    /// Whether `other` lies fully inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Quarter-turn rotations the engine applies to pages and paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Deg90,
    Deg270,
}

impl Rotation {
    /// Accepts 0, 90 and 270; anything else is a configuration error.
    pub fn try_from_degrees(degrees: i32) -> Result<Self> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Deg90),
            270 => Ok(Self::Deg270),
            other => Err(PrintError::Configuration(format!(
                "rotation must be 0, 90 or 270 degrees, got {other}"
            ))),
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Deg90 => 90,
            Self::Deg270 => 270,
        }
    }
}

/// 3x2 affine matrix in row-vector form: `[x y 1] * M`.
///
/// Positive rotations turn clockwise on a y-down surface, matching the
/// convention of print device contexts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn identity() -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            m11: sx,
            m12: 0.0,
            m21: 0.0,
            m22: sy,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub const fn translation(dx: f32, dy: f32) -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx,
            dy,
        }
    }

    /// Rotation about the origin with exact coefficients.
    pub const fn rotation(rotation: Rotation) -> Self {
        let (cos, sin) = match rotation {
            Rotation::None => (1.0, 0.0),
            Rotation::Deg90 => (0.0, 1.0),
            Rotation::Deg270 => (0.0, -1.0),
        };
        Self {
            m11: cos,
            m12: sin,
            m21: -sin,
            m22: cos,
            dx: 0.0,
            dy: 0.0,
        }
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            m11: self.m11 * next.m11 + self.m12 * next.m21,
            m12: self.m11 * next.m12 + self.m12 * next.m22,
            m21: self.m21 * next.m11 + self.m22 * next.m21,
            m22: self.m21 * next.m12 + self.m22 * next.m22,
            dx: self.dx * next.m11 + self.dy * next.m21 + next.dx,
            dy: self.dx * next.m12 + self.dy * next.m22 + next.dy,
        }
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.m11 + y * self.m21 + self.dx,
            x * self.m12 + y * self.m22 + self.dy,
        )
    }

    /// Bounding box of `rect` after transformation.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.transform_point(rect.x, rect.y),
            self.transform_point(rect.right(), rect.y),
            self.transform_point(rect.x, rect.bottom()),
            self.transform_point(rect.right(), rect.bottom()),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Resolution pair in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dpi {
    pub x: f32,
    pub y: f32,
}

impl Dpi {
    pub const LOGICAL: Dpi = Dpi {
        x: LOGICAL_DPI,
        y: LOGICAL_DPI,
    };

    pub const fn uniform(dpi: f32) -> Self {
        Self { x: dpi, y: dpi }
    }
}

/// Straight-alpha RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How a page is fitted onto paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScalingMode {
    /// Fit to the full sheet, ignoring hardware margins.
    FitToPaper,
    /// Fit inside the area the printer can actually mark.
    #[default]
    FitToPrintableArea,
}

/// Paper geometry for one job, as the driver reports it.
///
/// Drivers report paper and printable area in the portrait frame even when
/// `landscape` is set; the engine rotates them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub paper_size: Size,
    pub printable_area: Rect,
    pub landscape: bool,
    /// Resolution hint from the caller; `None` defers to the driver.
    pub resolution: Option<Dpi>,
}

impl PageSettings {
    pub fn new(paper_size: Size, printable_area: Rect) -> Self {
        Self {
            paper_size,
            printable_area,
            landscape: false,
            resolution: None,
        }
    }

    /// Portrait paper with a uniform hardware margin on every edge.
    pub fn with_margin(paper_size: Size, margin: f32) -> Self {
        Self::new(
            paper_size,
            Rect::new(
                margin,
                margin,
                paper_size.width - 2.0 * margin,
                paper_size.height - 2.0 * margin,
            ),
        )
    }

    /// US Letter with quarter-inch margins.
    pub fn letter() -> Self {
        Self::with_margin(Size::from_hundredths_of_inch(850.0, 1100.0), 24.0)
    }

    /// ISO A4 with quarter-inch margins.
    pub fn a4() -> Self {
        Self::with_margin(Size::from_hundredths_of_inch(827.0, 1169.0), 24.0)
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::letter()
    }
}

/// The driver's page-range selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrintRange {
    #[default]
    AllPages,
    /// 1-based inclusive span.
    SomePages { from: u32, to: u32 },
}

/// Printer-level settings for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterSettings {
    pub printer_name: String,
    pub copies: u16,
    pub collate: bool,
    pub print_range: PrintRange,
    /// Degrees portrait is turned counterclockwise to produce landscape
    /// (90 or 270); 0 when the driver has no landscape support.
    pub landscape_angle: i32,
    pub default_page_settings: PageSettings,
}

impl PrinterSettings {
    pub fn new(printer_name: impl Into<String>) -> Self {
        Self {
            printer_name: printer_name.into(),
            copies: 1,
            collate: false,
            print_range: PrintRange::AllPages,
            landscape_angle: 90,
            default_page_settings: PageSettings::default(),
        }
    }
}

/// Which DEVMODE members the driver honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DevModeFields {
    pub collate: bool,
    pub copies: bool,
    pub print_quality: bool,
    pub y_resolution: bool,
}

/// DEVMODE-equivalent driver settings block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DevMode {
    pub fields: DevModeFields,
    pub copies: u16,
    pub collate: bool,
    /// Positive values are dots per inch; negative values are the driver's
    /// draft/low/medium/high presets.
    pub print_quality: i16,
    pub y_resolution: i16,
    /// Driver-private trailing bytes, carried through untouched.
    #[serde(default)]
    pub extra: Vec<u8>,
}

impl DevMode {
    /// Serialise into the raw blob handed to print-ticket conversion.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(blob)?)
    }

    /// Positive hardware resolution, if the driver reports one.
    pub fn resolution(&self) -> Option<Dpi> {
        if !self.fields.print_quality || self.print_quality <= 0 {
            return None;
        }
        let x = f32::from(self.print_quality);
        let y = if self.fields.y_resolution && self.y_resolution > 0 {
            f32::from(self.y_resolution)
        } else {
            x
        };
        Some(Dpi { x, y })
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a single `print()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    /// Printer and page settings merged with driver defaults.
    SettingsResolved,
    /// Concrete output range known.
    RangeResolved,
    /// Device stack stood up.
    DeviceReady,
    /// Pages are being drawn and handed to the print control.
    Submitting,
    /// Print control closed; the spooler owns the job.
    Closed,
    Failed,
    /// Caller aborted through the progress callback.
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed | Self::Cancelled)
    }

    /// Whether `next` may follow `self` within one job.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Idle, SettingsResolved)
            | (SettingsResolved, RangeResolved)
            | (RangeResolved, DeviceReady)
            | (DeviceReady, Submitting)
            | (Submitting, Closed)
            | (Submitting, Cancelled) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// How a `print()` call that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    Completed,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_is_portrait() {
        assert!(!Size::new(100.0, 100.0).is_landscape());
        assert!(Size::new(101.0, 100.0).is_landscape());
    }

    #[test]
    fn hundredths_convert_to_dips() {
        let letter = Size::from_hundredths_of_inch(850.0, 1100.0);
        assert_eq!(letter, Size::new(816.0, 1056.0));
    }

    #[test]
    fn rotation_rejects_other_angles() {
        assert_eq!(Rotation::try_from_degrees(90).unwrap(), Rotation::Deg90);
        assert!(matches!(
            Rotation::try_from_degrees(180),
            Err(PrintError::Configuration(_))
        ));
    }

    #[test]
    fn quarter_turn_maps_axes() {
        let m = Matrix::rotation(Rotation::Deg90);
        assert_eq!(m.transform_point(1.0, 0.0), (0.0, 1.0));
        let m = Matrix::rotation(Rotation::Deg270);
        assert_eq!(m.transform_point(1.0, 0.0), (0.0, -1.0));
    }

    #[test]
    fn then_applies_left_to_right() {
        let m = Matrix::scale(2.0, 2.0).then(&Matrix::translation(10.0, 5.0));
        assert_eq!(m.transform_point(1.0, 1.0), (12.0, 7.0));
        let m = Matrix::translation(10.0, 5.0).then(&Matrix::scale(2.0, 2.0));
        assert_eq!(m.transform_point(1.0, 1.0), (22.0, 12.0));
    }

    #[test]
    fn devmode_blob_round_trips_driver_bytes() {
        let mode = DevMode {
            fields: DevModeFields {
                collate: true,
                copies: true,
                ..Default::default()
            },
            copies: 3,
            collate: true,
            extra: vec![1, 2, 3],
            ..Default::default()
        };
        let back = DevMode::from_blob(&mode.to_blob().unwrap()).unwrap();
        assert_eq!(back, mode);
    }

    #[test]
    fn devmode_resolution_ignores_presets() {
        let mut mode = DevMode {
            fields: DevModeFields {
                print_quality: true,
                ..Default::default()
            },
            print_quality: -4,
            ..Default::default()
        };
        assert_eq!(mode.resolution(), None);
        mode.print_quality = 600;
        assert_eq!(mode.resolution(), Some(Dpi::uniform(600.0)));
        mode.fields.y_resolution = true;
        mode.y_resolution = 300;
        assert_eq!(mode.resolution(), Some(Dpi { x: 600.0, y: 300.0 }));
    }

    #[test]
    fn job_state_transitions_follow_lifecycle() {
        use JobState::*;
        let happy = [Idle, SettingsResolved, RangeResolved, DeviceReady, Submitting, Closed];
        for pair in happy.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        assert!(Submitting.can_transition_to(Cancelled));
        assert!(!DeviceReady.can_transition_to(Cancelled));
        assert!(Idle.can_transition_to(Failed));
        assert!(!Closed.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Submitting));
    }
}
