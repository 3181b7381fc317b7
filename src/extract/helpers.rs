//! Sub-splitting conventions shared by the extraction rules.
//!
//! All helpers take the template id so failures can name the template, and
//! return trimmed slices of their input where possible.

use crate::{AlarmError, FieldMap};

use super::fields::{ADDRESS, DATE, DESCRIPTION, HOST, SERIAL, TIME};

/// Drop a `+<tz>` suffix: `"2024-03-18 09:15:02+08:00"` -> `"2024-03-18 09:15:02"`.
pub fn strip_tz(raw: &str) -> &str {
    raw.split_once('+').map_or(raw, |(local, _)| local).trim()
}

/// Split `"<date> <time>+<tz>"` into date and time.
pub fn split_stamp<'a>(template: &'static str, raw: &'a str) -> Result<(&'a str, &'a str), AlarmError> {
    let local = strip_tz(raw);
    match local.split_once(' ') {
        Some((date, time)) if !date.trim().is_empty() && !time.trim().is_empty() => Ok((date.trim(), time.trim())),
        _ => Err(AlarmError::malformed(template, format!("timestamp {raw:?} is not \"<date> <time>\""))),
    }
}

/// Insert `Date` and `Time` from a timestamp segment.
pub fn insert_stamp(map: &mut FieldMap, template: &'static str, raw: &str) -> Result<(), AlarmError> {
    let (date, time) = split_stamp(template, raw)?;
    map.insert(DATE, date.to_string());
    map.insert(TIME, time.to_string());
    Ok(())
}

/// Insert `Date` and `Time` from the text before a device or host alarm's
/// first marker.
///
/// That text is often just the timestamp, but the platform also sends these
/// alarms without one. Both fields are then inserted empty so every message
/// of a template fills the same SMS parameters.
pub fn insert_leading_stamp(map: &mut FieldMap, template: &'static str, raw: &str) {
    let (date, time) = split_stamp(template, raw).unwrap_or(("", ""));
    if date.is_empty() && !raw.trim().is_empty() {
        tracing::debug!(template, leading = raw.trim(), "no timestamp before the first marker");
    }
    map.insert(DATE, date.to_string());
    map.insert(TIME, time.to_string());
}

/// Split `"<left>/<right>"` at the first slash.
pub fn split_pair<'a>(template: &'static str, raw: &'a str) -> Result<(&'a str, &'a str), AlarmError> {
    match raw.split_once('/') {
        Some((left, right)) if !left.trim().is_empty() => Ok((left.trim(), right.trim())),
        _ => Err(AlarmError::malformed(template, format!("{raw:?} is not \"<name>/<zone>\""))),
    }
}

/// A `serial/address.../host` compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound {
    pub serial: String,
    /// Interior parts re-joined with `/`; there may be one or several.
    pub address: String,
    pub host: String,
}

pub fn split_compound(template: &'static str, raw: &str) -> Result<Compound, AlarmError> {
    let parts: Vec<&str> = raw.split('/').map(str::trim).collect();
    match parts.as_slice() {
        [serial, address @ .., host] if !address.is_empty() => {
            Ok(Compound { serial: serial.to_string(), address: address.join("/"), host: host.to_string() })
        }
        _ => Err(AlarmError::malformed(template, format!("{raw:?} is not \"<serial>/<address>/<host>\""))),
    }
}

/// Split a device description segment: `"<description> <serial>/<addr>/<host>."`.
///
/// The free-text description is optional; a bare compound yields an empty one.
pub fn split_description<'a>(template: &'static str, raw: &'a str) -> Result<(&'a str, Compound), AlarmError> {
    let body = trim_period(raw);
    let (description, compound) = match body.rsplit_once(char::is_whitespace) {
        Some((description, compound)) => (description.trim(), compound),
        None => ("", body),
    };
    Ok((description, split_compound(template, compound)?))
}

/// Insert `Description`, `Serial`, `Address` and `Host` from a description segment.
pub fn insert_description(map: &mut FieldMap, template: &'static str, raw: &str) -> Result<(), AlarmError> {
    let (description, compound) = split_description(template, raw)?;
    map.insert(DESCRIPTION, description.to_string());
    map.insert(SERIAL, compound.serial);
    map.insert(ADDRESS, compound.address);
    map.insert(HOST, compound.host);
    Ok(())
}

/// Strip quotes and whitespace from a quoted name: `" SZ 608"` -> `SZ608`.
pub fn clean_name(template: &'static str, raw: &str) -> Result<String, AlarmError> {
    let name: String = raw.chars().filter(|c| *c != '"' && !c.is_whitespace()).collect();
    if name.is_empty() {
        return Err(AlarmError::malformed(template, format!("name {raw:?} is empty")));
    }
    Ok(name)
}

/// Split a reading `"<number>°C-<timestamp>"` into `"<number>°C"` and the timestamp.
pub fn split_reading<'a>(template: &'static str, raw: &'a str) -> Result<(String, &'a str), AlarmError> {
    match raw.split_once("°C-") {
        Some((number, stamp)) if !number.trim().is_empty() => Ok((format!("{}°C", number.trim()), stamp.trim())),
        _ => Err(AlarmError::malformed(template, format!("reading {raw:?} is not \"<number>°C-<timestamp>\""))),
    }
}

/// One entry of an affected-location list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub name: &'a str,
    /// Zone with its `(label)` suffix kept.
    pub zone: &'a str,
    /// Third slash part: an error code or a timestamp, depending on the alarm.
    pub tail: &'a str,
}

/// Split `"a/b(c)/d, e/f(g)/h"` into one [`Location`] per comma-separated entry.
///
/// Blank entries (a trailing comma) are skipped; an empty list is malformed.
pub fn split_locations<'a>(template: &'static str, raw: &'a str) -> Result<Vec<Location<'a>>, AlarmError> {
    let mut locations = Vec::new();

    for entry in trim_period(raw).split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.splitn(3, '/').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(zone), Some(tail)) if !name.is_empty() => locations.push(Location { name, zone, tail }),
            _ => {
                return Err(AlarmError::malformed(template, format!("location {entry:?} is not \"<name>/<zone>/<code>\"")));
            }
        }
    }

    if locations.is_empty() {
        return Err(AlarmError::malformed(template, "no affected locations listed"));
    }
    Ok(locations)
}

/// Trim whitespace and a trailing sentence period.
pub fn trim_period(raw: &str) -> &str {
    raw.trim().trim_end_matches('.').trim_end()
}
