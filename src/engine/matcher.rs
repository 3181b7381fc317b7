//! Ordered-marker template matching.
//!
//! A template matches when each of its markers can be found, in order, at a
//! position strictly greater than the position of the previous marker:
//!
//! ```text
//! markers:  ["日期:", "位置/区域:", "阈值条件:"]
//! text:     日期:2024-03-18 … 位置/区域:1号冷库/A区 阈值条件:高于8.0°C
//!           ^0                ^26                  ^49
//! cursor:   -1 ──> 0 ────────> 26 ─────────────────> 49      (matched)
//! ```
//!
//! Each search starts one character past the previous marker's *start*, not
//! its end, so markers are allowed to overlap here. The splitter is stricter
//! and reports overlap as malformed text.
//!
//! The catalog is walked in declaration order and the first survivor wins.
//! That is the whole tie-break policy: repeated variants are declared before
//! the plain templates they would otherwise be mistaken for.

use crate::catalog::Catalog;
use crate::TemplateDefinition;

/// Outcome of matching a message against a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult<'c> {
    NoMatch,
    /// `positions[i]` is the byte offset where `template.markers[i]` was found.
    /// Always strictly increasing.
    Matched { template: &'c TemplateDefinition, positions: Vec<usize> },
}

impl MatchResult<'_> {
    pub fn template(&self) -> Option<&TemplateDefinition> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::Matched { template, .. } => Some(*template),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// How far a single candidate got before succeeding or failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CandidateOutcome {
    Matched(Vec<usize>),
    /// Index of the first marker that could not be placed.
    FailedAt(usize),
}

/// Find the first catalog entry whose markers all occur in order in `text`.
///
/// `text` is expected to be normalized already.
pub fn find_template<'c>(text: &str, catalog: &'c Catalog) -> MatchResult<'c> {
    for template in catalog.iter() {
        if let CandidateOutcome::Matched(positions) = locate_markers(text, template.markers) {
            tracing::debug!(template = template.id, ?positions, "template matched");
            return MatchResult::Matched { template, positions };
        }
    }

    tracing::debug!(candidates = catalog.len(), "no template matched");
    MatchResult::NoMatch
}

/// Try every catalog entry up to and including the winner.
///
/// Used for verbose reports; `find_template` stops at the winner without
/// collecting anything.
pub(crate) fn trace_candidates<'c>(text: &str, catalog: &'c Catalog) -> Vec<(&'c TemplateDefinition, CandidateOutcome)> {
    let mut trace = Vec::new();
    for template in catalog.iter() {
        let outcome = locate_markers(text, template.markers);
        let matched = matches!(outcome, CandidateOutcome::Matched(_));
        trace.push((template, outcome));
        if matched {
            break;
        }
    }
    trace
}

/// Place `markers` in `text` with the strictly-increasing cursor rule.
fn locate_markers(text: &str, markers: &[&str]) -> CandidateOutcome {
    let mut positions = Vec::with_capacity(markers.len());
    let mut cursor: Option<usize> = None;

    for (idx, marker) in markers.iter().enumerate() {
        let from = match cursor {
            None => 0,
            Some(at) => next_char_boundary(text, at),
        };
        let found = text.get(from..).and_then(|rest| rest.find(marker)).map(|offset| from + offset);

        match found {
            // `from` is past the cursor, so any hit is strictly greater.
            Some(at) => {
                positions.push(at);
                cursor = Some(at);
            }
            None => return CandidateOutcome::FailedAt(idx),
        }
    }

    CandidateOutcome::Matched(positions)
}

/// Byte offset of the character after the one starting at `at`.
fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..].chars().next().map(|c| at + c.len_utf8()).unwrap_or(text.len() + 1)
}
