//! Marker-delimited segmentation.
//!
//! Given a matched message and its template's markers, cut the message into
//! `markers.len() + 1` slices:
//!
//! ```text
//! markers:   [M0,        M1,        M2]
//! text:      pre M0 aaaa M1 bbbb M2 post
//! segments:  ["pre ", " aaaa ", " bbbb ", " post"]
//! ```
//!
//! Each marker is consumed at its first occurrence at or after the end of the
//! previously consumed marker. This is the same result as substituting each
//! marker, in order, with a sentinel and splitting once, but it works on byte
//! offsets so no sentinel can ever collide with alarm content.
//!
//! Segments are slices of the normalized text, untrimmed, so that gluing them
//! back together with the markers reproduces the text exactly.

use crate::{AlarmError, TemplateDefinition};

/// Text around the markers of a matched template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments<'t> {
    template: &'static str,
    parts: Vec<&'t str>,
}

impl<'t> Segments<'t> {
    /// Id of the template these segments were cut for.
    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Raw, untrimmed slices.
    pub fn parts(&self) -> &[&'t str] {
        &self.parts
    }

    /// Trimmed segment `idx`, or `MalformedAlarmText` if there is none.
    pub fn get(&self, idx: usize) -> Result<&'t str, AlarmError> {
        self.parts
            .get(idx)
            .map(|s| s.trim())
            .ok_or_else(|| AlarmError::malformed(self.template, format!("missing segment {idx}")))
    }

    /// Like [`Segments::get`], but an empty segment is also malformed.
    pub fn non_empty(&self, idx: usize) -> Result<&'t str, AlarmError> {
        let value = self.get(idx)?;
        if value.is_empty() {
            return Err(AlarmError::malformed(self.template, format!("segment {idx} is empty")));
        }
        Ok(value)
    }
}

/// Split `text` around `template`'s markers.
///
/// Fails only when a marker cannot be found after the previous one ends,
/// which happens when the matcher accepted overlapping occurrences.
pub fn split_segments<'t>(text: &'t str, template: &TemplateDefinition) -> Result<Segments<'t>, AlarmError> {
    let mut parts = Vec::with_capacity(template.markers.len() + 1);
    let mut start = 0;

    for marker in template.markers {
        let at = text[start..].find(marker).map(|offset| start + offset).ok_or_else(|| {
            AlarmError::malformed(template.id, format!("marker {marker:?} overlaps the previous marker"))
        })?;
        parts.push(&text[start..at]);
        start = at + marker.len();
    }
    parts.push(&text[start..]);

    tracing::debug!(template = template.id, segments = ?parts, "split segments");
    Ok(Segments { template: template.id, parts })
}
