extern crate self as alarmsms;

use indexmap::IndexMap;

#[macro_use]
mod macros;
mod api;
mod assemble;
mod catalog;
mod config;
mod dispatch;
mod engine;
mod error;
mod event;
mod extract;
mod normalize;

pub use api::{CandidateTrace, ParseDetails, ParseVerbose, Parsed, parse, parse_verbose, parse_verbose_with, parse_with};
pub use assemble::{SmsRequest, TruncationLoss, VALUE_CAP, assemble, truncate_value};
pub use catalog::{Catalog, PrecedenceViolation, builtin};
pub use config::{Config, ConfigError};
pub use dispatch::{
    AlarmTask, CycleGuard, CycleReport, Dispatcher, EventSource, Plan, SmsTransport, TaskStatus, TransportError,
    operator_notice, plan_event, plan_event_with,
};
pub use engine::{MatchResult, Segments, find_template, split_segments};
pub use error::AlarmError;
pub use event::{AlarmEvent, EventBody, ExtraField, classify, find_phone_numbers, unwrap_sms_text};
pub use normalize::{Rewrites, normalize, normalize_with_report};

// --- Shared types -----------------------------------------------------------

/// Parameter name to extracted value, in insertion order.
///
/// Order is kept so the serialized template parameters are stable from one
/// run to the next.
pub type FieldMap = IndexMap<&'static str, String>;

/// Field extraction rule attached to a catalog entry.
///
/// One variant per alarm kind. The matcher never looks at this; it only
/// decides which entry wins, and `extract` dispatches on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extractor {
    ThresholdRepeated,
    Threshold,
    DeviceCommRepeated,
    DeviceComm,
    DeviceConfigRepeated,
    DeviceConfig,
    CalibrationRepeated,
    Calibration,
    HostCommRepeated,
    HostComm,
    SystemRepeated,
    System,
}

impl Extractor {
    /// Whether the rule fans a single message out into one map per location.
    pub fn fans_out(self) -> bool {
        matches!(
            self,
            Extractor::DeviceCommRepeated
                | Extractor::DeviceComm
                | Extractor::DeviceConfigRepeated
                | Extractor::DeviceConfig
        )
    }
}

/// A cataloged alarm kind: an ordered marker sequence plus the rule that
/// pulls fields out of the text between those markers.
///
/// Definitions are plain static data so they can be copied freely into
/// results without borrowing the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDefinition {
    /// Stable template name, e.g. `"threshold_repeated"`.
    pub id: &'static str,
    /// SMS provider template code the extracted fields are rendered into.
    pub sms_code: &'static str,
    /// Literal markers; order is significant and the list is never empty.
    pub markers: &'static [&'static str],
    /// Id of the more general entry this one must be tried before.
    pub shadows: Option<&'static str>,
    pub extractor: Extractor,
}

/// Output of a field extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// One alarm instance.
    Single(FieldMap),
    /// One map per affected location, shared fields repeated in each.
    FanOut(Vec<FieldMap>),
}

impl Extraction {
    pub fn len(&self) -> usize {
        match self {
            Extraction::Single(_) => 1,
            Extraction::FanOut(maps) => maps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_maps(self) -> Vec<FieldMap> {
        match self {
            Extraction::Single(map) => vec![map],
            Extraction::FanOut(maps) => maps,
        }
    }
}
