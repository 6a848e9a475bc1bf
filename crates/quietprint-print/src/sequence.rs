// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page submission order.
//
// When the application collates, every copy is produced by submitting pages
// again: `1 2 3 1 2 3` for collated output, `1 1 2 2 3 3` otherwise.  When
// the driver handles copies, each page is submitted once and the copy count
// travels in the driver settings instead.

use quietprint_core::range::Pages;
use quietprint_core::{PrintError, Result};

/// Who produces copies, and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collation {
    /// Application repeats the whole range per copy.
    Collated,
    /// Application repeats each page per copy.
    Uncollated,
    /// The driver produces copies; pages go out once.
    DriverCopies,
}

/// Decided split of copy handling between application and driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPlan {
    pub collation: Collation,
    /// Copies the application submits itself.
    pub application_copies: u16,
    /// Copy count written into the driver settings.
    pub driver_copies: u16,
    /// Collate flag written into the driver settings.
    pub driver_collate: bool,
}

impl SubmissionPlan {
    pub fn new(auto_collate: bool, collate: bool, copies: u16) -> Self {
        let copies = copies.max(1);
        if auto_collate {
            Self {
                collation: if collate {
                    Collation::Collated
                } else {
                    Collation::Uncollated
                },
                application_copies: copies,
                driver_copies: 1,
                driver_collate: false,
            }
        } else {
            Self {
                collation: Collation::DriverCopies,
                application_copies: 1,
                driver_copies: copies,
                driver_collate: collate,
            }
        }
    }

    /// Pages the application submits for a range of `range_pages` pages.
    pub fn submissions(&self, range_pages: u32) -> Result<u32> {
        range_pages
            .checked_mul(u32::from(self.application_copies))
            .ok_or_else(|| {
                PrintError::Configuration(format!(
                    "{range_pages} pages x {} copies exceeds the submission limit",
                    self.application_copies
                ))
            })
    }

    pub fn sequence<'a>(&self, pages: Pages<'a>) -> PageSequence<'a> {
        PageSequence::new(pages, self.collation, self.application_copies)
    }
}

/// Lazy generator of 1-based page numbers in submission order.
#[derive(Debug, Clone)]
pub struct PageSequence<'a> {
    range: Pages<'a>,
    current: Pages<'a>,
    collation: Collation,
    copies: u16,
    /// Copies already emitted: of the range when collated, of the current
    /// page when uncollated.
    emitted: u16,
    page: Option<u32>,
}

impl<'a> PageSequence<'a> {
    pub fn new(range: Pages<'a>, collation: Collation, copies: u16) -> Self {
        let copies = match collation {
            Collation::DriverCopies => 1,
            Collation::Collated | Collation::Uncollated => copies.max(1),
        };
        Self {
            current: range.clone(),
            range,
            collation,
            copies,
            emitted: 0,
            page: None,
        }
    }
}

impl Iterator for PageSequence<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match self.collation {
            Collation::DriverCopies => self.current.next(),
            Collation::Collated => {
                if let Some(page) = self.current.next() {
                    return Some(page);
                }
                self.emitted += 1;
                if self.emitted >= self.copies {
                    return None;
                }
                self.current = self.range.clone();
                self.current.next()
            }
            Collation::Uncollated => {
                if let Some(page) = self.page.filter(|_| self.emitted < self.copies) {
                    self.emitted += 1;
                    return Some(page);
                }
                let page = self.current.next()?;
                self.page = Some(page);
                self.emitted = 1;
                Some(page)
            }
        }
    }
}
