//! Field maps to SMS provider requests.
//!
//! The provider rejects template parameters longer than its per-variable
//! limit, so every value is capped here, uniformly for every template. A cut
//! is never silent: it is recorded on the request and logged.

use crate::FieldMap;
use serde::Serialize;

/// Provider limit on a single template variable, in characters.
pub const VALUE_CAP: usize = 35;

/// A value that was cut to fit the provider limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncationLoss {
    pub field: &'static str,
    /// Length before the cut, in characters.
    pub original_len: usize,
}

/// One outgoing SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsRequest {
    /// Comma-joined recipient list.
    pub phone_numbers: String,
    pub template_code: String,
    pub params: FieldMap,
    #[serde(skip)]
    pub truncated: Vec<TruncationLoss>,
}

impl SmsRequest {
    /// Build a request from `params`, capping every value at `cap` characters.
    pub fn new(template_code: &str, targets: &[String], params: &FieldMap, cap: usize) -> Self {
        let mut capped = FieldMap::with_capacity(params.len());
        let mut truncated = Vec::new();

        for (field, value) in params {
            let (value, loss) = truncate_value(*field, value, cap);
            capped.insert(*field, value);
            truncated.extend(loss);
        }

        SmsRequest {
            phone_numbers: targets.join(","),
            template_code: template_code.to_string(),
            params: capped,
            truncated,
        }
    }

    /// The parameters as the flat JSON object the provider expects.
    pub fn template_param_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.params)
    }

    pub fn was_truncated(&self) -> bool {
        !self.truncated.is_empty()
    }
}

/// One request per field map, all addressed to `targets`.
pub fn assemble(template_code: &str, maps: &[FieldMap], targets: &[String], cap: usize) -> Vec<SmsRequest> {
    maps.iter().map(|params| SmsRequest::new(template_code, targets, params, cap)).collect()
}

/// Cut `value` to at most `cap` characters.
pub fn truncate_value(field: &'static str, value: &str, cap: usize) -> (String, Option<TruncationLoss>) {
    let original_len = value.chars().count();
    if original_len <= cap {
        return (value.to_string(), None);
    }

    tracing::warn!(field, original_len, cap, "template parameter truncated");
    (value.chars().take(cap).collect(), Some(TruncationLoss { field, original_len }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&'static str, &str)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn long_values_are_cut_to_exactly_the_cap() {
        let long = "冷".repeat(50);
        let (value, loss) = truncate_value("Description", &long, VALUE_CAP);
        assert_eq!(value.chars().count(), 35);
        assert_eq!(loss, Some(TruncationLoss { field: "Description", original_len: 50 }));

        let exact = "x".repeat(35);
        assert_eq!(truncate_value("Detail", &exact, VALUE_CAP), (exact.clone(), None));

        assert_eq!(truncate_value("Date", "2024-03-18", VALUE_CAP), ("2024-03-18".to_string(), None));
    }

    #[test]
    fn request_records_every_cut_field() {
        let params = map(&[("Description", "a".repeat(40).as_str()), ("Host", "VL-HOST01"), ("Detail", "b".repeat(36).as_str())]);
        let request = SmsRequest::new("SMS_1", &["13800000000".to_string()], &params, VALUE_CAP);

        assert!(request.was_truncated());
        assert_eq!(request.truncated.len(), 2);
        assert_eq!(request.truncated[0].field, "Description");
        assert_eq!(request.truncated[1].original_len, 36);
        assert_eq!(request.params["Host"], "VL-HOST01");
        assert!(request.params.values().all(|v| v.chars().count() <= VALUE_CAP));
    }

    #[test]
    fn one_request_per_map_with_joined_targets() {
        let maps = vec![map(&[("LocationName", "locA")]), map(&[("LocationName", "locB")])];
        let targets = vec!["13800000000".to_string(), "15900000000".to_string()];
        let requests = assemble("SMS_461930103", &maps, &targets, VALUE_CAP);

        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.phone_numbers == "13800000000,15900000000"));
        assert!(requests.iter().all(|r| r.template_code == "SMS_461930103"));
        assert_eq!(requests[1].params["LocationName"], "locB");
    }

    #[test]
    fn params_serialize_flat_in_insertion_order() {
        let request = SmsRequest::new("SMS_1", &[], &map(&[("Time", "09:15:02"), ("Date", "2024-03-18")]), VALUE_CAP);
        assert_eq!(request.template_param_json().unwrap(), r#"{"Time":"09:15:02","Date":"2024-03-18"}"#);
    }
}
