// SPDX-License-Identifier: MIT OR Apache-2.0
//! Numeric and identifier parameter extraction (§4.2).
//!
//! `distance_cm` and `angle_deg` are extracted **raw, unclamped** — §8's
//! boundary table requires `"19センチ"`/`"501センチ"` to parse ok and then
//! fail at dispatch time as `precondition_failed` (`dgw-router`'s
//! `ParameterInRange`), not be silently rounded into range here with no
//! error at all. `altitude_cm` is the one field §4.2/§4.3 document as
//! clamped at extraction time, so it alone keeps that behavior.

use regex::Regex;
use std::sync::LazyLock;

/// `[20, 500]` per §4.2 — enforced by `dgw-router`'s `ParameterInRange`
/// precondition, not by extraction.
pub const DISTANCE_CM_RANGE: std::ops::RangeInclusive<u32> = 20..=500;
/// `[1, 360]` per §4.2 — enforced by `dgw-router`'s `ParameterInRange`
/// precondition, not by extraction.
pub const ANGLE_DEG_RANGE: std::ops::RangeInclusive<u32> = 1..=360;
/// `[20, 300]` per §4.2/§4.3, clamped at extraction time (unlike distance/angle).
pub const ALTITUDE_CM_RANGE: std::ops::RangeInclusive<u32> = 20..=300;

fn clamp(value: u32, range: std::ops::RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

static DISTANCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*(cm|センチ|m|メートル)").unwrap());
static ANGLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*(度|deg|degrees?)").unwrap());
static ALTITUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"高度\D{0,4}([0-9]+)\s*(cm|センチ|m|メートル)?").unwrap());
static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*(秒|sec|seconds?)").unwrap());
static DRONE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:ドローン|drone)\s*[:＃#]?\s*([A-Za-z0-9_-]+)").unwrap());

/// Extract a raw, unclamped `distance_cm` from normalized text, converting
/// meters to centimeters when the `m`/`メートル` unit is used. Out-of-range
/// values are returned as-is; `dgw-router`'s `ParameterInRange` precondition
/// is what rejects them.
#[must_use]
pub fn extract_distance_cm(text: &str) -> Option<u32> {
    let caps = DISTANCE_PATTERN.captures(text)?;
    let value: u32 = caps[1].parse().ok()?;
    let scaled = match &caps[2] {
        "m" | "メートル" => value.saturating_mul(100),
        _ => value,
    };
    Some(scaled)
}

/// Extract a raw, unclamped `angle_deg` from normalized text. Out-of-range
/// values are returned as-is; `dgw-router`'s `ParameterInRange` precondition
/// is what rejects them.
#[must_use]
pub fn extract_angle_deg(text: &str) -> Option<u32> {
    let caps = ANGLE_PATTERN.captures(text)?;
    caps[1].parse().ok()
}

/// Extract a clamped `altitude_cm` from normalized text, requiring the
/// `高度`/altitude keyword to precede the number so a bare distance isn't
/// misread as an altitude.
#[must_use]
pub fn extract_altitude_cm(text: &str) -> Option<u32> {
    let caps = ALTITUDE_PATTERN.captures(text)?;
    let value: u32 = caps[1].parse().ok()?;
    let scaled = match caps.get(2).map(|m| m.as_str()) {
        Some("m") | Some("メートル") => value.saturating_mul(100),
        _ => value,
    };
    Some(clamp(scaled, ALTITUDE_CM_RANGE))
}

/// Extract an unclamped `duration_s` — no range is specified for this field
/// in the parameter model.
#[must_use]
pub fn extract_duration_s(text: &str) -> Option<u32> {
    let caps = DURATION_PATTERN.captures(text)?;
    caps[1].parse().ok()
}

/// Extract an explicit `target_drone_id`, e.g. `ドローンA2` or `drone: a2`.
#[must_use]
pub fn extract_target_drone_id(text: &str) -> Option<String> {
    DRONE_ID_PATTERN
        .captures(text)
        .map(|caps| caps[1].to_string())
}
