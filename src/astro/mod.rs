//! Astronomical calculations backing the forecast records.
//!
//! Positions, illumination and per-day rise/set instants for the sun and the
//! moon, computed from the standard low-precision ephemeris expansions
//! (Montenbruck & Pflanz / Meeus). Accuracy is on the order of a minute for
//! event times, which is plenty for forecast annotation.
//!
//! All public functions take and return Unix epoch milliseconds. Absence of
//! an event (polar day, polar night, a day the moon neither rises nor sets)
//! is expressed as `None`, never as an error.

pub mod events;
pub mod moon;
pub mod sun;

use crate::types::position::Position;
use serde::Serialize;

pub(crate) const RAD: f64 = std::f64::consts::PI / 180.0;
pub(crate) const DAY_MS: f64 = 86_400_000.0;

const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const OBLIQUITY: f64 = RAD * 23.4397;

/// The two bodies the event search knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CelestialBody {
    Sun,
    Moon,
}

/// Rise and set instants for one body on one day, epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RiseSet {
    pub rise: Option<i64>,
    pub set: Option<i64>,
}

/// Horizontal position of the sun, in radians.
///
/// Azimuth is measured from south, positive towards the west.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPosition {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Horizontal position of the moon, in radians, plus its distance in
/// kilometers. Altitude includes atmospheric refraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPosition {
    pub azimuth: f64,
    pub altitude: f64,
    pub distance: f64,
    pub parallactic_angle: f64,
}

/// Illuminated state of the moon.
///
/// `fraction` is the illuminated share of the disk in `[0, 1]`; `phase` runs
/// from 0 (new) through 0.5 (full) back towards 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoonIllumination {
    pub fraction: f64,
    pub phase: f64,
    pub angle: f64,
}

/// Per-day rise/set computation for `body` around the instant `ms`.
pub fn rise_set(ms: i64, position: &Position, body: CelestialBody) -> RiseSet {
    match body {
        CelestialBody::Sun => sun::rise_set(ms, position),
        CelestialBody::Moon => moon::rise_set(ms, position),
    }
}

pub(crate) fn to_days(ms: f64) -> f64 {
    ms / DAY_MS - 0.5 + J1970 - J2000
}

pub(crate) fn from_julian(j: f64) -> i64 {
    ((j + 0.5 - J1970) * DAY_MS).round() as i64
}

pub(crate) fn right_ascension(l: f64, b: f64) -> f64 {
    (l.sin() * OBLIQUITY.cos() - b.tan() * OBLIQUITY.sin()).atan2(l.cos())
}

pub(crate) fn declination(l: f64, b: f64) -> f64 {
    (b.sin() * OBLIQUITY.cos() + b.cos() * OBLIQUITY.sin() * l.sin()).asin()
}

pub(crate) fn azimuth(h: f64, phi: f64, dec: f64) -> f64 {
    h.sin().atan2(h.cos() * phi.sin() - dec.tan() * phi.cos())
}

pub(crate) fn altitude(h: f64, phi: f64, dec: f64) -> f64 {
    (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).asin()
}

pub(crate) fn sidereal_time(d: f64, lw: f64) -> f64 {
    RAD * (280.16 + 360.985_623_5 * d) - lw
}

/// Refraction correction for an apparent altitude `h` in radians.
pub(crate) fn astro_refraction(h: f64) -> f64 {
    let h = h.max(0.0);
    0.0002967 / (h + 0.00312536 / (h + 0.08901179)).tan()
}
