// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-to-paper geometry: orientation decisions, paper rotation, and the
// per-page placement transform.

use quietprint_core::error::{PrintError, Result};
use quietprint_core::{Matrix, Rect, Rotation, ScalingMode, Size};

/// True iff exactly one of paper and page is landscape.
pub fn should_rotate(paper_size: Size, page_size: Size) -> bool {
    paper_size.is_landscape() != page_size.is_landscape()
}

pub fn rotated_paper_size(size: Size) -> Size {
    size.swapped()
}

/// Rotate paper and printable area counterclockwise by `angle` degrees.
///
/// The printable area keeps its position relative to the physical sheet, so
/// rotating by 90 and then by 270 restores the original geometry.
pub fn rotate_printable_area(angle: i32, paper_size: Size, printable_area: Rect) -> Result<(Size, Rect)> {
    let Rect {
        x,
        y,
        width,
        height,
    } = printable_area;
    match Rotation::try_from_degrees(angle)? {
        Rotation::None => Ok((paper_size, printable_area)),
        Rotation::Deg90 => Ok((
            rotated_paper_size(paper_size),
            Rect::new(y, paper_size.width - x - width, height, width),
        )),
        Rotation::Deg270 => Ok((
            rotated_paper_size(paper_size),
            Rect::new(paper_size.height - y - height, x, height, width),
        )),
    }
}

/// Paper rotation that compensates a page rotation: 90 and 270 swap, 0 stays.
pub fn paper_rotation_angle(page_rotation_angle: i32) -> Result<i32> {
    match page_rotation_angle {
        0 => Ok(0),
        90 => Ok(270),
        270 => Ok(90),
        other => Err(PrintError::Configuration(format!(
            "page rotation must be 0, 90 or 270 degrees, got {other}"
        ))),
    }
}

/// Uniform scale and absolute offset placing content inside a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

/// Scale `content_width` x `content_height` to fit `container`, keeping the
/// aspect ratio and centring on the axis that has slack.
pub fn align_in_rect(container: Rect, content_width: f32, content_height: f32) -> Alignment {
    let container_ratio = container.width / container.height;
    let content_ratio = content_width / content_height;

    if content_ratio > container_ratio {
        // Relatively wider: width fills, height centres.
        let scale = container.width / content_width;
        Alignment {
            offset_x: container.x,
            offset_y: container.y + (container.height - content_height * scale) / 2.0,
            scale,
        }
    } else {
        let scale = container.height / content_height;
        Alignment {
            offset_x: container.x + (container.width - content_width * scale) / 2.0,
            offset_y: container.y,
            scale,
        }
    }
}

/// Placement of one page on paper. Only lives for one page's render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    /// Translation applied after scaling and rotation.
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: Rotation,
}

impl PageTransform {
    /// Page space to paper space: scale, then rotate, then translate.
    pub fn matrix(&self) -> Matrix {
        Matrix::scale(self.scale_x, self.scale_y).then(&self.placement())
    }

    /// Rotation and translation only, for content that is already scaled.
    pub fn placement(&self) -> Matrix {
        Matrix::rotation(self.rotation).then(&Matrix::translation(self.offset_x, self.offset_y))
    }

    /// Page size after scaling, before rotation.
    pub fn scaled_size(&self, natural: Size) -> Size {
        Size::new(natural.width * self.scale_x, natural.height * self.scale_y)
    }
}

/// Inputs that decide where pages land on the paper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSettings {
    pub paper_size: Size,
    pub printable_area: Rect,
    pub scaling_mode: ScalingMode,
    pub auto_rotate: bool,
    /// Rotation used for pages whose orientation differs from the paper.
    pub landscape_rotation: Rotation,
}

impl PlacementSettings {
    /// Rectangle pages are fitted into.
    pub fn target_rect(&self) -> Rect {
        match self.scaling_mode {
            ScalingMode::FitToPaper => Rect::from_size(self.paper_size),
            ScalingMode::FitToPrintableArea => self.printable_area,
        }
    }
}

/// Compute the transform placing a page of `page_size` onto the paper.
///
/// Each rotation case carries its own translation: the rotated page must
/// land inside the target rectangle under the device's clockwise rotation
/// convention, and the compensation differs per direction.
pub fn compute_page_transform(page_size: Size, settings: &PlacementSettings) -> PageTransform {
    let target = settings.target_rect();
    let rotation = if settings.auto_rotate && should_rotate(target.size(), page_size) {
        settings.landscape_rotation
    } else {
        Rotation::None
    };

    match rotation {
        Rotation::None => {
            let a = align_in_rect(target, page_size.width, page_size.height);
            PageTransform {
                offset_x: a.offset_x,
                offset_y: a.offset_y,
                scale_x: a.scale,
                scale_y: a.scale,
                rotation,
            }
        }
        Rotation::Deg90 => {
            // x' = -y, y' = x: the page's top edge ends up on the right.
            let a = align_in_rect(target.swapped(), page_size.width, page_size.height);
            let slack_along_width = a.offset_x - target.x;
            let slack_along_height = a.offset_y - target.y;
            let scaled_height = page_size.height * a.scale;
            PageTransform {
                offset_x: target.x + slack_along_height + scaled_height,
                offset_y: target.y + slack_along_width,
                scale_x: a.scale,
                scale_y: a.scale,
                rotation,
            }
        }
        Rotation::Deg270 => {
            // x' = y, y' = -x: the page's top edge ends up on the left.
            let a = align_in_rect(target.swapped(), page_size.width, page_size.height);
            let slack_along_width = a.offset_x - target.x;
            let slack_along_height = a.offset_y - target.y;
            let scaled_width = page_size.width * a.scale;
            PageTransform {
                offset_x: target.x + slack_along_height,
                offset_y: target.y + slack_along_width + scaled_width,
                scale_x: a.scale,
                scale_y: a.scale,
                rotation,
            }
        }
    }
}
