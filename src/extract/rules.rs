//! One extraction rule per catalog entry.
//!
//! Segment indices below refer to the `Segments` cut by the template's own
//! markers, so the same alarm field can sit at a different index in the
//! repeated and the plain variant of a template.
//!
//! Device and host alarms put their timestamp before the first marker, and
//! it may be missing (`[<ts>]`). Their description segment may be a bare
//! `serial/address/host` compound without free text.

use crate::engine::Segments;
use crate::{AlarmError, Extraction, FieldMap};

use super::fields::*;
use super::helpers::{
    clean_name, insert_description, insert_leading_stamp, insert_stamp, split_locations, split_pair, split_reading,
    split_stamp, strip_tz, trim_period,
};

// --- Threshold ----------------------------------------------------------------

/// `阈值重复警报:<name> 日期:<ts> 位置/区域:<loc> 阈值条件:<cond> 阈值警报:<reading>`
pub fn threshold_repeated(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let mut map = FieldMap::new();
    map.insert(ALARM_NAME, s.non_empty(1)?.to_string());
    insert_threshold(&mut map, s, 2)?;
    Ok(Extraction::Single(map))
}

/// `日期:<ts> 位置/区域:<loc> 阈值条件:<cond> 阈值警报:<reading>`
pub fn threshold(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let mut map = FieldMap::new();
    insert_threshold(&mut map, s, 1)?;
    Ok(Extraction::Single(map))
}

/// Timestamp, location, condition and reading from four consecutive segments.
fn insert_threshold(map: &mut FieldMap, s: &Segments<'_>, first: usize) -> Result<(), AlarmError> {
    let template = s.template();

    insert_stamp(map, template, s.non_empty(first)?)?;

    let (name, zone) = split_pair(template, s.non_empty(first + 1)?)?;
    map.insert(LOCATION_NAME, name.to_string());
    map.insert(LOCATION_ZONE, zone.to_string());

    map.insert(THRESHOLD_CONDITION, s.non_empty(first + 2)?.to_string());

    let (value, stamp) = split_reading(template, s.non_empty(first + 3)?)?;
    let (_, value_time) = split_stamp(template, stamp)?;
    map.insert(VALUE, value);
    map.insert(VALUE_TIME, value_time.to_string());
    Ok(())
}

// --- Device communication (fan-out) ---------------------------------------------

/// `[<ts>] 重复消息:设备<dev>的<channel>上有通信警报.设备描述:<desc> 因此,以下位置不可用:<locs>`
pub fn device_comm_repeated(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    device_comm_fan_out(s)
}

/// `[<ts>] 设备<dev>的<channel>上有通信警报.设备描述:<desc> 因此,以下位置不可用:<locs>`
pub fn device_comm(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    device_comm_fan_out(s)
}

fn device_comm_fan_out(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let template = s.template();

    let mut shared = FieldMap::new();
    insert_leading_stamp(&mut shared, template, s.get(0)?);
    shared.insert(DEVICE_NAME, clean_name(template, s.get(1)?)?);
    shared.insert(CHANNEL, s.get(2)?.to_string());
    insert_description(&mut shared, template, s.get(3)?)?;

    let maps = split_locations(template, s.get(4)?)?
        .into_iter()
        .map(|loc| {
            let mut map = shared.clone();
            map.insert(LOCATION_NAME, loc.name.to_string());
            map.insert(LOCATION_ZONE, loc.zone.to_string());
            map.insert(LOCATION_CODE, loc.tail.to_string());
            map
        })
        .collect();
    Ok(Extraction::FanOut(maps))
}

// --- Device configuration (fan-out) ---------------------------------------------

/// `[<ts>] 重复消息:设备<dev>上的配置警报.设备描述:<desc> 因此,以下位置可能受影响:<locs>`
pub fn device_config_repeated(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    device_config_fan_out(s)
}

/// `[<ts>] 设备<dev>上的配置警报.设备描述:<desc> 因此,以下位置可能受影响:<locs>`
pub fn device_config(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    device_config_fan_out(s)
}

fn device_config_fan_out(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let template = s.template();

    let mut shared = FieldMap::new();
    insert_leading_stamp(&mut shared, template, s.get(0)?);
    shared.insert(DEVICE_NAME, clean_name(template, s.get(1)?)?);
    insert_description(&mut shared, template, s.get(2)?)?;

    let maps = split_locations(template, s.get(3)?)?
        .into_iter()
        .map(|loc| {
            let mut map = shared.clone();
            map.insert(LOCATION_NAME, loc.name.to_string());
            map.insert(LOCATION_ZONE, loc.zone.to_string());
            map.insert(LOCATION_TIME, strip_tz(loc.tail).to_string());
            map
        })
        .collect();
    Ok(Extraction::FanOut(maps))
}

// --- Calibration ------------------------------------------------------------------

/// `[<ts>] 重复消息:设备<dev>上的校准警报.设备描述:<desc> 校准到期日期:<date>`
pub fn calibration_repeated(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    calibration_single(s)
}

/// `[<ts>] 设备<dev>上的校准警报.设备描述:<desc> 校准到期日期:<date>`
pub fn calibration(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    calibration_single(s)
}

fn calibration_single(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let template = s.template();

    let mut map = FieldMap::new();
    insert_leading_stamp(&mut map, template, s.get(0)?);
    map.insert(DEVICE_NAME, clean_name(template, s.get(1)?)?);
    insert_description(&mut map, template, s.get(2)?)?;

    let due = trim_period(s.get(3)?);
    if due.is_empty() {
        return Err(AlarmError::malformed(template, "calibration due date is empty"));
    }
    map.insert(DUE_DATE, due.to_string());
    Ok(Extraction::Single(map))
}

// --- Host communication -------------------------------------------------------------

/// `[<ts>] 重复消息:主机<host>上有通信警报.主机描述:<desc>.因此,以下设备不可用:<devs>`
pub fn host_comm_repeated(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    host_comm_single(s)
}

/// `[<ts>] 主机<host>上有通信警报.主机描述:<desc>.因此,以下设备不可用:<devs>`
pub fn host_comm(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    host_comm_single(s)
}

fn host_comm_single(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let template = s.template();

    let mut map = FieldMap::new();
    insert_leading_stamp(&mut map, template, s.get(0)?);
    map.insert(HOST_NAME, clean_name(template, s.get(1)?)?);
    map.insert(DESCRIPTION, trim_period(s.get(2)?).to_string());

    let devices = trim_period(s.get(3)?)
        .split(',')
        .filter(|d| !d.trim().is_empty())
        .map(|d| clean_name(template, d))
        .collect::<Result<Vec<_>, _>>()?;
    if devices.is_empty() {
        return Err(AlarmError::malformed(template, "no unavailable devices listed"));
    }
    map.insert(DEVICES, devices.join(","));
    Ok(Extraction::Single(map))
}

// --- System ---------------------------------------------------------------------------

/// `重复消息:系统警报:<name> 日期:<ts> 详细信息:<detail>`
pub fn system_repeated(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    system_single(s)
}

/// `系统警报:<name> 日期:<ts> 详细信息:<detail>`
pub fn system(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    system_single(s)
}

fn system_single(s: &Segments<'_>) -> Result<Extraction, AlarmError> {
    let template = s.template();

    let mut map = FieldMap::new();
    map.insert(ALARM_NAME, s.non_empty(1)?.to_string());
    insert_stamp(&mut map, template, s.non_empty(2)?)?;
    // detail may legitimately be blank
    map.insert(DETAIL, s.get(3)?.to_string());
    Ok(Extraction::Single(map))
}
