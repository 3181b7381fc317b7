//! Engine error taxonomy.

/// Why a message could not be turned into field maps.
///
/// Neither case is worth retrying: the engine is deterministic, so the same
/// text fails the same way every time. Callers route both to an operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlarmError {
    /// No catalog entry's markers occur in order in the text.
    #[error("alarm text matches no known template")]
    NoMatch,

    /// A template matched but the text between its markers has the wrong shape.
    #[error("alarm text matched template `{template}` but is malformed: {reason}")]
    MalformedAlarmText { template: &'static str, reason: String },
}

impl AlarmError {
    pub(crate) fn malformed(template: &'static str, reason: impl Into<String>) -> Self {
        AlarmError::MalformedAlarmText { template, reason: reason.into() }
    }
}
