use crate::catalog::{self, Catalog};
use crate::engine::{self, CandidateOutcome, MatchResult, StageMetrics};
use crate::normalize::{Rewrites, normalize, normalize_with_report};
use crate::{AlarmError, Extraction, FieldMap, TemplateDefinition, extract};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(catalog::builtin);

pub(crate) fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// A recognized alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// The message after punctuation canonicalization.
    pub normalized: String,
    /// The winning catalog entry.
    pub template: TemplateDefinition,
    /// One map per alarm instance; more than one only for fan-out templates.
    pub fields: Vec<FieldMap>,
    /// Whether the template's rule fans out per location.
    pub fan_out: bool,
}

/// How far one catalog entry got against the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTrace {
    pub template: &'static str,
    pub markers: usize,
    /// Markers placed before the candidate failed (all of them on success).
    pub markers_found: usize,
    pub matched: bool,
}

/// Extra details returned by [`parse_verbose`] and [`parse_verbose_with`].
///
/// Meant for the CLI report and for debugging catalog changes; the plain
/// [`parse_with`] path does not collect any of this.
#[derive(Debug, Clone)]
pub struct ParseDetails {
    pub normalized: String,
    pub rewrites: Rewrites,
    /// Candidates tried in catalog order, up to and including the winner.
    pub candidates: Vec<CandidateTrace>,
    /// Byte offsets of the winner's markers.
    pub positions: Vec<usize>,
    /// Untrimmed segments of the winner.
    pub segments: Vec<String>,
    pub total: Duration,
    pub normalize: Duration,
    pub matching: Duration,
    pub split: Duration,
    pub extract: Duration,
}

/// Result from [`parse_verbose`] and [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseVerbose {
    pub result: Result<Parsed, AlarmError>,
    pub details: ParseDetails,
}

/// Parse `text` against the built-in catalog.
///
/// # Example
/// ```
/// let parsed = alarmsms::parse("系统警报：磁盘空间不足 日期：2024-03-18 09:15:02+08:00 详细信息：C盘剩余 2%").unwrap();
/// assert_eq!(parsed.template.id, "system");
/// assert_eq!(parsed.fields[0]["Date"], "2024-03-18");
/// ```
pub fn parse(text: &str) -> Result<Parsed, AlarmError> {
    parse_with(text, &DEFAULT_CATALOG)
}

/// Parse `text` against `catalog`.
pub fn parse_with(text: &str, catalog: &Catalog) -> Result<Parsed, AlarmError> {
    let normalized = normalize(text);

    let MatchResult::Matched { template, .. } = engine::find_template(&normalized, catalog) else {
        return Err(AlarmError::NoMatch);
    };
    let segments = engine::split_segments(&normalized, template)?;
    let extraction = extract::extract(template, &segments)?;

    Ok(into_parsed(normalized, template, extraction))
}

pub fn parse_verbose(text: &str) -> ParseVerbose {
    parse_verbose_with(text, &DEFAULT_CATALOG)
}

/// Parse `text` against `catalog` and keep per-stage traces and timings.
pub fn parse_verbose_with(text: &str, catalog: &Catalog) -> ParseVerbose {
    let mut metrics = StageMetrics::default();

    let started = Instant::now();
    let (normalized, rewrites) = normalize_with_report(text);
    metrics.normalize = started.elapsed();

    let started = Instant::now();
    let trace = engine::trace_candidates(&normalized, catalog);
    metrics.matching = started.elapsed();

    let candidates: Vec<CandidateTrace> = trace
        .iter()
        .map(|(template, outcome)| {
            let markers = template.markers.len();
            let (markers_found, matched) = match outcome {
                CandidateOutcome::Matched(_) => (markers, true),
                CandidateOutcome::FailedAt(idx) => (*idx, false),
            };
            CandidateTrace { template: template.id, markers, markers_found, matched }
        })
        .collect();

    let winner = trace.into_iter().find_map(|(template, outcome)| match outcome {
        CandidateOutcome::Matched(positions) => Some((template, positions)),
        CandidateOutcome::FailedAt(_) => None,
    });

    let mut positions = Vec::new();
    let mut segment_texts: Vec<String> = Vec::new();

    let result = match winner {
        None => Err(AlarmError::NoMatch),
        Some((template, found)) => {
            positions = found;

            let started = Instant::now();
            let segments = engine::split_segments(&normalized, template);
            metrics.split = started.elapsed();

            match segments {
                Err(err) => Err(err),
                Ok(segments) => {
                    segment_texts = segments.parts().iter().map(|s| s.to_string()).collect();

                    let started = Instant::now();
                    let extraction = extract::extract(template, &segments);
                    metrics.extract = started.elapsed();

                    extraction.map(|extraction| into_parsed(normalized.clone(), template, extraction))
                }
            }
        }
    };

    let details = ParseDetails {
        normalized,
        rewrites,
        candidates,
        positions,
        segments: segment_texts,
        total: metrics.total(),
        normalize: metrics.normalize,
        matching: metrics.matching,
        split: metrics.split,
        extract: metrics.extract,
    };

    ParseVerbose { result, details }
}

fn into_parsed(normalized: String, template: &TemplateDefinition, extraction: Extraction) -> Parsed {
    let fan_out = matches!(extraction, Extraction::FanOut(_));
    Parsed { normalized, template: *template, fields: extraction.into_maps(), fan_out }
}
