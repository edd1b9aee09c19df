//! The canonical forecast record served to callers and held by the cache.
//!
//! Field names and the epoch-millisecond timestamp encoding match the wire
//! format consumed by downstream clients, so the struct serializes directly
//! with `serde_json`. Non-finite sample values come out as `null`.

use crate::astro::{MoonIllumination, MoonPosition, SunPosition};
use crate::types::position::Position;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rise and set instants for one celestial body, as Unix epoch milliseconds.
///
/// Both lists are sorted ascending and free of duplicates. When the event
/// search terminated normally each list spans at least 24 hours past the
/// query instant; when the search budget ran out (polar conditions) a list
/// may be short or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CelestialEvents {
    pub rises: Vec<i64>,
    pub sets: Vec<i64>,
}

/// One forecast hour: astronomical context plus the upstream variables.
///
/// The upstream variable map is flattened into the serialized object, one
/// key per variable name. Values the upstream could not provide are NaN and
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    #[serde(with = "ts_milliseconds")]
    pub time: DateTime<Utc>,
    pub sun_position: SunPosition,
    pub moon_position: MoonPosition,
    pub moon_illumination: MoonIllumination,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// A fully assembled point forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub version: String,
    pub status: String,
    /// Uppercased location identity; equals the key the record is cached
    /// under once inserted.
    pub location: String,
    pub country: Option<String>,
    /// Capture instant of the upstream response.
    #[serde(with = "ts_milliseconds")]
    pub time: DateTime<Utc>,
    /// IANA timezone name of the forecast location.
    pub time_zone: String,
    /// UTC offset at capture time, in hours. Fractional for zones like
    /// Asia/Kolkata.
    pub time_zone_offset: f64,
    pub position: Position,
    pub sun_events: CelestialEvents,
    pub moon_events: CelestialEvents,
    /// One sample per forecast hour, ordered by time.
    pub values: Vec<WeatherSample>,
}
