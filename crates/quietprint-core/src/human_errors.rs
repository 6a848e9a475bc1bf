// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for applications embedding the engine.
//
// Every engine error is mapped to a short message and a suggestion the host
// application can show without interpreting device codes itself.

use crate::error::{DeviceFault, PrintError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying the same job again may work.
    Transient,
    /// Something must change first (settings, printer, driver).
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A human-readable error with plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether resubmitting the job unchanged might succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `PrintError` into a `HumanError`.
pub fn humanize_error(err: &PrintError) -> HumanError {
    match err {
        PrintError::Configuration(detail) => HumanError {
            message: "The print settings aren't valid.".into(),
            suggestion: format!("Check the page range, copies and orientation, then try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PrintError::Device { fault, detail, .. } => match fault {
            DeviceFault::UnsupportedFeatureLevel | DeviceFault::Unavailable => HumanError {
                message: "This computer's graphics system couldn't prepare the printout.".into(),
                suggestion: format!("Updating the graphics or printer driver usually fixes this. ({detail})"),
                retriable: false,
                severity: Severity::Permanent,
            },
            DeviceFault::Rejected | DeviceFault::Other => HumanError {
                message: "The printer driver refused the print settings.".into(),
                suggestion: "Try printing with the printer's default settings, or reinstall the printer driver.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        PrintError::PrintOperation { printer, .. } => HumanError {
            message: format!("A page couldn't be sent to {printer}."),
            suggestion: "Nothing was printed from this job. Check the printer is online and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PrintError::JobCreation { printer, .. } => HumanError {
            message: format!("{printer} didn't accept the print job."),
            suggestion: "Make sure the printer is installed, switched on, and that you're allowed to print to it.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PrintError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The settings file couldn't be opened.".into(),
                    suggestion: "Check the file permissions, or save the settings somewhere else.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PrintError::Serialization(_) => HumanError {
            message: "Saved print settings couldn't be read.".into(),
            suggestion: "The settings file may be damaged. Delete it to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_settings_need_action() {
        let human = humanize_error(&PrintError::Configuration("rotation 45".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_hardware_support_is_permanent() {
        let err = PrintError::device("create device", DeviceFault::UnsupportedFeatureLevel, "no 10_0");
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }

    #[test]
    fn failed_page_names_printer() {
        let err = PrintError::PrintOperation {
            printer: "Office Laser".into(),
            operation: "end draw".into(),
            detail: "device lost".into(),
        };
        let human = humanize_error(&err);
        assert!(human.message.contains("Office Laser"));
        assert!(human.retriable);
    }

    #[test]
    fn rejected_job_needs_action() {
        let err = PrintError::JobCreation {
            printer: "Office Laser".into(),
            message: "offline".into(),
        };
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}
