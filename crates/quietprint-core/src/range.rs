// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output page ranges.
//
// A range is a list of 1-based inclusive spans kept in the order the caller
// gave them.  Spans may be open-ended ("8-" runs to the last page); the
// concrete page numbers are only known once the document's page count is.
// Spans may overlap; each page is yielded once, where it first appears.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PrintError, Result};
use crate::types::PrintRange;

/// One inclusive span; `end == None` means "through the last page".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: u32,
    pub end: Option<u32>,
}

/// Ordered, possibly sparse set of 1-based pages to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRange {
    segments: Vec<Segment>,
}

impl OutputRange {
    /// Every page of the document.
    pub fn all() -> Self {
        Self {
            segments: vec![Segment {
                start: 1,
                end: None,
            }],
        }
    }

    /// Pages `from..=to`.
    pub fn pages(from: u32, to: u32) -> Result<Self> {
        Self::from_segments(vec![Segment {
            start: from,
            end: Some(to),
        }])
    }

    pub fn single(page: u32) -> Result<Self> {
        Self::pages(page, page)
    }

    pub fn from_segments(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(PrintError::Configuration("output range is empty".into()));
        }
        for seg in &segments {
            if seg.start == 0 {
                return Err(PrintError::Configuration(
                    "page numbers start at 1".into(),
                ));
            }
            if let Some(end) = seg.end.filter(|end| *end < seg.start) {
                return Err(PrintError::Configuration(format!(
                    "page span {}-{} is reversed",
                    seg.start, end
                )));
            }
        }
        Ok(Self { segments })
    }

    /// Parse a page list such as `"1-3, 5, 8-"`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for part in text.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let segment = match part.split_once('-') {
                Some((start, end)) => Segment {
                    start: parse_page(start)?,
                    end: match end.trim() {
                        "" => None,
                        e => Some(parse_page(e)?),
                    },
                },
                None => {
                    let page = parse_page(part)?;
                    Segment {
                        start: page,
                        end: Some(page),
                    }
                }
            };
            segments.push(segment);
        }
        Self::from_segments(segments)
    }

    /// Derive a range from the driver's print-range selection, clamping the
    /// span into `[1, total_pages]`.
    pub fn from_print_range(range: PrintRange, total_pages: u32) -> Self {
        match range {
            PrintRange::AllPages => Self::all(),
            PrintRange::SomePages { from, to } => {
                let last = total_pages.max(1);
                let from = from.clamp(1, last);
                let to = to.clamp(from, last);
                Self {
                    segments: vec![Segment {
                        start: from,
                        end: Some(to),
                    }],
                }
            }
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Forward iterator over the concrete pages, clipped to the document.
    ///
    /// The iterator is `Clone`, so a caller can restart it from any point.
    pub fn iter(&self, total_pages: u32) -> Pages<'_> {
        Pages {
            segments: &self.segments,
            total_pages,
            index: 0,
            next: None,
        }
    }

    /// Number of pages `iter(total_pages)` yields, never more than
    /// `total_pages`.
    pub fn page_count(&self, total_pages: u32) -> u32 {
        let mut spans: Vec<(u32, u32)> = self
            .segments
            .iter()
            .filter_map(|seg| clip(seg, total_pages))
            .collect();
        spans.sort_unstable();

        let mut count = 0_u64;
        let mut covered = 0_u64;
        for (start, end) in spans {
            let start = u64::from(start).max(covered + 1);
            let end = u64::from(end);
            if start <= end {
                count += end - start + 1;
                covered = end;
            }
        }
        u32::try_from(count).unwrap_or(total_pages)
    }
}

impl Default for OutputRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for OutputRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match seg.end {
                Some(end) if end == seg.start => write!(f, "{}", seg.start)?,
                Some(end) => write!(f, "{}-{}", seg.start, end)?,
                None => write!(f, "{}-", seg.start)?,
            }
        }
        Ok(())
    }
}

/// Iterator returned by [`OutputRange::iter`].
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    segments: &'a [Segment],
    total_pages: u32,
    index: usize,
    /// Next page and the last page of the current segment.
    next: Option<(u32, u32)>,
}

impl Iterator for Pages<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some((page, end)) = self.next {
                self.next = (page < end).then_some((page + 1, end));
                if !self.seen(page) {
                    return Some(page);
                }
                continue;
            }
            let seg = self.segments.get(self.index)?;
            self.index += 1;
            self.next = clip(seg, self.total_pages);
        }
    }
}

impl Pages<'_> {
    /// Whether a segment before the current one already covered `page`.
    fn seen(&self, page: u32) -> bool {
        self.segments[..self.index.saturating_sub(1)]
            .iter()
            .filter_map(|seg| clip(seg, self.total_pages))
            .any(|(start, end)| (start..=end).contains(&page))
    }
}

/// The part of `seg` that lies inside the document, if any.
fn clip(seg: &Segment, total_pages: u32) -> Option<(u32, u32)> {
    let end = seg.end.unwrap_or(total_pages).min(total_pages);
    (seg.start <= end).then_some((seg.start, end))
}

fn parse_page(text: &str) -> Result<u32> {
    let text = text.trim();
    let page: u32 = text
        .parse()
        .map_err(|_| PrintError::Configuration(format!("'{text}' is not a page number")))?;
    if page == 0 {
        return Err(PrintError::Configuration("page numbers start at 1".into()));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_range_iterates_in_order() {
        let range = OutputRange::parse("1-3, 5, 8-").unwrap();
        let pages: Vec<u32> = range.iter(10).collect();
        assert_eq!(pages, vec![1, 2, 3, 5, 8, 9, 10]);
        assert_eq!(range.page_count(10), 7);
        assert_eq!(range.to_string(), "1-3,5,8-");
    }

    #[test]
    fn overlapping_spans_yield_each_page_once() {
        let range = OutputRange::parse("1-3, 2-4").unwrap();
        assert_eq!(range.iter(5).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(range.page_count(5), 4);

        let range = OutputRange::parse("5, 2-, 1-3").unwrap();
        assert_eq!(range.iter(6).collect::<Vec<_>>(), vec![5, 2, 3, 4, 6, 1]);
        assert_eq!(range.page_count(6), 6);
    }

    #[test]
    fn repeated_open_spans_count_at_most_the_document() {
        let text = vec!["1-"; 64].join(",");
        let range = OutputRange::parse(&text).unwrap();
        assert_eq!(range.page_count(u32::MAX / 8), u32::MAX / 8);
    }

    #[test]
    fn pages_beyond_document_are_clipped() {
        let range = OutputRange::parse("2-6, 9").unwrap();
        assert_eq!(range.iter(4).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(range.page_count(4), 3);
    }

    #[test]
    fn iterator_restarts_from_clone() {
        let range = OutputRange::pages(1, 3).unwrap();
        let mut pages = range.iter(3);
        assert_eq!(pages.next(), Some(1));
        let rest = pages.clone();
        assert_eq!(pages.collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(rest.collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn invalid_spans_rejected() {
        assert!(OutputRange::parse("0-2").is_err());
        assert!(OutputRange::parse("5-2").is_err());
        assert!(OutputRange::parse("a").is_err());
        assert!(OutputRange::parse(" , ").is_err());
    }

    #[test]
    fn driver_selection_is_clamped() {
        let range = OutputRange::from_print_range(PrintRange::SomePages { from: 0, to: 40 }, 12);
        assert_eq!(range.iter(12).count(), 12);
        let range = OutputRange::from_print_range(PrintRange::SomePages { from: 7, to: 3 }, 12);
        assert_eq!(range.iter(12).collect::<Vec<_>>(), vec![7]);
    }
}
