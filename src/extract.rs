//! Template-specific field extraction.
//!
//! Once the matcher has picked a template and the splitter has cut the text,
//! the template's [`Extractor`] variant decides which segment feeds which
//! parameter. Every rule is a fixed positional table, not a general parser:
//!
//! ```text
//! Extractor::Threshold
//!   seg 1  "2024-03-18 09:15:02+08:00"  -> Date, Time
//!   seg 2  "1号冷库/A区"                 -> LocationName, LocationZone
//!   seg 3  "高于8.0°C"                   -> ThresholdCondition
//!   seg 4  "9.2°C-2024-03-18 09:14:58…"  -> Value, ValueTime
//! ```
//!
//! Fan-out rules (device communication and configuration alarms) produce one
//! map per affected location; the device-level fields are copied into each.
//!
//! Rules never truncate. Capping values for the SMS provider happens in the
//! assembler, uniformly for every template.
//!
//! ## Layout
//!
//! - `helpers.rs`: the shared sub-splitting conventions (timestamps, slash
//!   compounds, quoted names, readings, location lists).
//! - `rules.rs`: one function per [`Extractor`] variant.
//! - `tests.rs`: table-driven cases per template.

#[path = "extract/helpers.rs"]
mod helpers;
#[path = "extract/rules.rs"]
mod rules;

use crate::engine::Segments;
use crate::{AlarmError, Extraction, Extractor, TemplateDefinition};

/// Parameter names shared by the SMS templates.
pub(crate) mod fields {
    pub const DATE: &str = "Date";
    pub const TIME: &str = "Time";
    pub const ALARM_NAME: &str = "AlarmName";
    pub const LOCATION_NAME: &str = "LocationName";
    pub const LOCATION_ZONE: &str = "LocationZone";
    pub const LOCATION_CODE: &str = "LocationCode";
    pub const LOCATION_TIME: &str = "LocationTime";
    pub const THRESHOLD_CONDITION: &str = "ThresholdCondition";
    pub const VALUE: &str = "Value";
    pub const VALUE_TIME: &str = "ValueTime";
    pub const DEVICE_NAME: &str = "DeviceName";
    pub const CHANNEL: &str = "Channel";
    pub const DESCRIPTION: &str = "Description";
    pub const SERIAL: &str = "Serial";
    pub const ADDRESS: &str = "Address";
    pub const HOST: &str = "Host";
    pub const HOST_NAME: &str = "HostName";
    pub const DEVICES: &str = "Devices";
    pub const DUE_DATE: &str = "DueDate";
    pub const DETAIL: &str = "Detail";
}

/// Run `template`'s extraction rule over `segments`.
pub(crate) fn extract(template: &TemplateDefinition, segments: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let extraction = match template.extractor {
        Extractor::ThresholdRepeated => rules::threshold_repeated(segments),
        Extractor::Threshold => rules::threshold(segments),
        Extractor::DeviceCommRepeated => rules::device_comm_repeated(segments),
        Extractor::DeviceComm => rules::device_comm(segments),
        Extractor::DeviceConfigRepeated => rules::device_config_repeated(segments),
        Extractor::DeviceConfig => rules::device_config(segments),
        Extractor::CalibrationRepeated => rules::calibration_repeated(segments),
        Extractor::Calibration => rules::calibration(segments),
        Extractor::HostCommRepeated => rules::host_comm_repeated(segments),
        Extractor::HostComm => rules::host_comm(segments),
        Extractor::SystemRepeated => rules::system_repeated(segments),
        Extractor::System => rules::system(segments),
    };

    match &extraction {
        Ok(out) => tracing::debug!(template = template.id, maps = out.len(), "extracted fields"),
        Err(err) => tracing::warn!(template = template.id, error = %err, "extraction failed"),
    }
    extraction
}
