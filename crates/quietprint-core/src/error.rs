// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quietprint.

use std::fmt;

use thiserror::Error;

/// Classification of a failure reported by the graphics device layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFault {
    /// The hardware cannot provide the required feature level; a software
    /// device may still work.
    UnsupportedFeatureLevel,
    /// The resource or service could not be reached at all.
    Unavailable,
    /// The device refused the call (bad state, bad parameters, end-of-draw
    /// failure).
    Rejected,
    /// Anything else the device layer reports.
    Other,
}

impl fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnsupportedFeatureLevel => "unsupported feature level",
            Self::Unavailable => "unavailable",
            Self::Rejected => "rejected",
            Self::Other => "failed",
        };
        f.write_str(label)
    }
}

/// Top-level error type for all Quietprint operations.
#[derive(Debug, Error)]
pub enum PrintError {
    // -- Setup errors --
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{operation} {fault}: {detail}")]
    Device {
        operation: String,
        fault: DeviceFault,
        detail: String,
    },

    // -- Job errors --
    #[error("printer '{printer}': {operation} failed: {detail}")]
    PrintOperation {
        printer: String,
        operation: String,
        detail: String,
    },

    #[error("printer '{printer}' could not start the job: {message}")]
    JobCreation { printer: String, message: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrintError {
    /// Shorthand for a device-layer failure.
    pub fn device(operation: impl Into<String>, fault: DeviceFault, detail: impl Into<String>) -> Self {
        Self::Device {
            operation: operation.into(),
            fault,
            detail: detail.into(),
        }
    }

    /// The device fault classification, if this is a device-layer failure.
    pub fn device_fault(&self) -> Option<DeviceFault> {
        match self {
            Self::Device { fault, .. } => Some(*fault),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_message_names_operation_and_fault() {
        let err = PrintError::device("create print control", DeviceFault::Rejected, "E_INVALIDARG");
        assert_eq!(err.to_string(), "create print control rejected: E_INVALIDARG");
        assert_eq!(err.device_fault(), Some(DeviceFault::Rejected));
    }

    #[test]
    fn job_creation_wraps_printer_identity() {
        let err = PrintError::JobCreation {
            printer: "Office Laser".into(),
            message: "access denied".into(),
        };
        assert!(err.to_string().contains("Office Laser"));
        assert!(err.to_string().contains("access denied"));
        assert_eq!(err.device_fault(), None);
    }
}
