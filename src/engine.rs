//! Matching and segmentation engine.
//!
//! This module is the operational core: it decides which catalog entry a
//! normalized message belongs to and cuts the message into the pieces the
//! template-specific extractors (`src/extract/`) consume.
//!
//! ## How the parts work together
//!
//! ```text
//! raw text ── normalize (normalize.rs)
//!                 │
//!                 v
//!        find_template (matcher.rs)      catalog order = precedence
//!          - cursor starts at -1
//!          - each marker must start strictly after the previous one
//!          - first entry that survives wins
//!                 │
//!                 v
//!        split_segments (segment.rs)     markers.len() + 1 slices
//!                 │
//!                 v
//!        extract (extract.rs)            Single / FanOut field maps
//! ```
//!
//! Everything here is synchronous and allocation-only. Nothing keeps state
//! between calls, so a single `Catalog` can be shared by any number of
//! threads.
//!
//! ## Responsibilities by module
//!
//! - `matcher.rs`: ordered-marker search over the catalog, plus a per-candidate
//!   trace for the verbose API.
//! - `segment.rs`: offset-based splitting around the winning markers.
//! - `metrics.rs`: stage timings collected by `parse_verbose_with`.

#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/segment.rs"]
mod segment;

pub use matcher::{MatchResult, find_template};
pub(crate) use matcher::{CandidateOutcome, trace_candidates};
pub(crate) use metrics::StageMetrics;
pub use segment::{Segments, split_segments};
