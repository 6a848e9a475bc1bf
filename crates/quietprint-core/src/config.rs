// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ScalingMode;

/// Persistent defaults applied to every print job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// How pages are fitted onto paper.
    pub scaling_mode: ScalingMode,
    /// Rotate pages whose orientation differs from the paper.
    pub auto_rotate: bool,
    /// Force application-side collation on or off; `None` probes the driver.
    pub auto_collate: Option<bool>,
    /// Spooler job name used when the caller does not give one.
    pub job_name: String,
    /// Raster resolution for offscreen pages when neither the caller nor the
    /// driver reports one.
    pub fallback_raster_dpi: f32,
    /// Antialias page content.
    pub antialias: bool,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            scaling_mode: ScalingMode::FitToPrintableArea,
            auto_rotate: true,
            auto_collate: None,
            job_name: "Quietprint Document".into(),
            fallback_raster_dpi: 300.0,
            antialias: true,
        }
    }
}

impl PrintConfig {
    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
