//! Monitoring-platform events and how their SMS body and recipients are read.
//!
//! The platform logs every SMS it tries to send as a system event. Two
//! classes matter:
//!
//! ```text
//! success   msg: SMS text: "<alarm text>" sent.
//!           msg: SMS text: \"<alarm text>\" One or more recipients were refused.
//! failure   msg: ... failed to send sms ...
//!           extra field "SMS text" carries the alarm text
//! ```
//!
//! Recipients are the phone numbers found anywhere in the extra fields.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Deserialize;

const FAILURE_MARKER: &str = "failed to send sms";
const SMS_TEXT_FIELD: &str = "SMS text";

/// One event item as returned by the platform's event query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlarmEvent {
    /// Monotonic sequence number.
    pub num: u64,
    /// Unix seconds.
    pub timestamp: i64,
    pub msg: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtraField {
    pub name: String,
    pub value: String,
}

impl AlarmEvent {
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    pub fn is_failure(&self) -> bool {
        self.msg.contains(FAILURE_MARKER)
    }
}

/// The alarm text and recipients of an event, by class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventBody {
    /// The platform sent the SMS; the body goes through the template catalog.
    Success { body: String, targets: Vec<String> },
    /// The platform failed to send; the body is resent as-is.
    Failure { body: String, targets: Vec<String> },
}

impl EventBody {
    pub fn body(&self) -> &str {
        match self {
            EventBody::Success { body, .. } | EventBody::Failure { body, .. } => body,
        }
    }

    pub fn targets(&self) -> &[String] {
        match self {
            EventBody::Success { targets, .. } | EventBody::Failure { targets, .. } => targets,
        }
    }
}

/// Split an event into its alarm text and recipient numbers.
pub fn classify(event: &AlarmEvent) -> EventBody {
    let targets = extra_field_targets(event);

    if event.is_failure() {
        // a later field of the same name wins
        let body = event
            .extra_fields
            .iter()
            .rev()
            .find(|f| f.name == SMS_TEXT_FIELD)
            .map(|f| f.value.clone())
            .unwrap_or_default();
        return EventBody::Failure { body, targets };
    }

    EventBody::Success { body: unwrap_sms_text(&event.msg), targets }
}

/// Strip the `SMS text: "..." sent.` wrapper, unescaping `\"`.
///
/// Text without the wrapper is returned unchanged.
pub fn unwrap_sms_text(msg: &str) -> String {
    let wrapper =
        regex!(r#"(?s)^\s*SMS text:\s*\\?"(.*?)\\?"\s*(?:sent\.|One or more recipients were refused\.)\s*$"#);

    match wrapper.captures(msg).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().replace("\\\"", "\""),
        None => msg.to_string(),
    }
}

/// Mainland mobile numbers in `text`, left to right.
///
/// A number is exactly 11 ASCII digits, `1[34578]` followed by nine more, and
/// must not be part of a longer digit run.
pub fn find_phone_numbers(text: &str) -> Vec<String> {
    regex!(r"[0-9]+")
        .find_iter(text)
        .map(|run| run.as_str())
        .filter(|run| regex!(r"^1[34578][0-9]{9}$").is_match(run))
        .map(str::to_string)
        .collect()
}

fn extra_field_targets(event: &AlarmEvent) -> Vec<String> {
    let targets: IndexSet<String> = event.extra_fields.iter().flat_map(|f| find_phone_numbers(&f.value)).collect();
    targets.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(msg: &str, fields: &[(&str, &str)]) -> AlarmEvent {
        AlarmEvent {
            num: 1,
            timestamp: 1_710_724_502,
            msg: msg.to_string(),
            category: "system".to_string(),
            extra_fields: fields
                .iter()
                .map(|(name, value)| ExtraField { name: name.to_string(), value: value.to_string() })
                .collect(),
        }
    }

    #[test]
    fn phone_numbers_must_stand_alone() {
        assert_eq!(find_phone_numbers("张三 13812345678, 李四:15987654321"), vec!["13812345678", "15987654321"]);
        assert!(find_phone_numbers("id 138123456789").is_empty());
        assert!(find_phone_numbers("913812345678").is_empty());
        assert!(find_phone_numbers("12812345678 1381234567").is_empty());
        assert_eq!(find_phone_numbers("a17712345678b"), vec!["17712345678"]);
        assert!(find_phone_numbers("").is_empty());
    }

    #[test]
    fn unwraps_both_quote_styles() {
        assert_eq!(unwrap_sms_text(r#"SMS text: "系统警报:x" sent."#), "系统警报:x");
        assert_eq!(
            unwrap_sms_text(r#"SMS text: \"设备\"SZ608\"的通道1\" One or more recipients were refused."#),
            "设备\"SZ608\"的通道1"
        );
        assert_eq!(unwrap_sms_text("no wrapper here"), "no wrapper here");
    }

    #[test]
    fn success_events_read_body_from_msg() {
        let ev = event(r#"SMS text: "系统警报:x" sent."#, &[("Recipients", "13812345678;15987654321"), ("Other", "13812345678")]);
        assert!(!ev.is_failure());
        assert_eq!(
            classify(&ev),
            EventBody::Success {
                body: "系统警报:x".to_string(),
                targets: vec!["13812345678".to_string(), "15987654321".to_string()],
            }
        );
    }

    #[test]
    fn failure_events_read_body_from_extra_field() {
        let ev = event(
            "Alarm notification failed to send sms",
            &[("SMS text", "原始警报内容"), ("Recipient", "王五 17700000000")],
        );
        let body = classify(&ev);
        assert!(matches!(body, EventBody::Failure { .. }));
        assert_eq!(body.body(), "原始警报内容");
        assert_eq!(body.targets(), ["17700000000".to_string()]);
    }

    #[test]
    fn deserializes_platform_json() {
        let json = r#"{
            "category": "system",
            "num": 246397,
            "msg": "SMS text: \"x\" sent.",
            "timestamp": 1710724502,
            "extra_fields": [{"name": "Recipients", "value": "13812345678"}]
        }"#;
        let ev: AlarmEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.num, 246397);
        assert_eq!(ev.extra_fields.len(), 1);
        assert_eq!(ev.occurred_at().unwrap().to_rfc3339(), "2024-03-18T01:15:02+00:00");

        let bare: AlarmEvent = serde_json::from_str(r#"{"num": 1, "msg": "", "timestamp": 0}"#).unwrap();
        assert!(bare.extra_fields.is_empty());
    }
}
