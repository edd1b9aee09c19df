//! Assembly of a canonical [`WeatherData`] record from upstream scalar
//! tokens.

use crate::astro::events::find_celestial_events;
use crate::astro::{moon, sun, CelestialBody};
use crate::types::position::Position;
use crate::types::weather_data::{WeatherData, WeatherSample};
use bon::bon;
use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use thiserror::Error;

/// Version tag of the serialized record format.
pub const FORMAT_VERSION: &str = "1.0";

const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    /// The flat value list does not divide evenly over the headers, so the
    /// samples cannot be reconstructed. Rejected outright rather than
    /// truncated to the last complete sample.
    #[error("value count {values} is not a positive multiple of header count {headers}")]
    FormatMismatch { headers: usize, values: usize },

    #[error("malformed position string {0:?}, expected \"<latitude> <longitude>\"")]
    PositionFormat(String),

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

fn parse_position(field: &str) -> Result<Position, AssembleError> {
    let mut tokens = field.split_whitespace();
    let (Some(lat), Some(lon), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(AssembleError::PositionFormat(field.to_string()));
    };
    let latitude = lat
        .parse::<f64>()
        .map_err(|_| AssembleError::PositionFormat(field.to_string()))?;
    let longitude = lon
        .parse::<f64>()
        .map_err(|_| AssembleError::PositionFormat(field.to_string()))?;
    Ok(Position::new(latitude, longitude))
}

#[bon]
impl WeatherData {
    /// Builds a record from the scalar tokens of one upstream response.
    ///
    /// `headers` name the forecast variables; `values` is the flat
    /// whitespace-separated token list, sample-major, whose length must be
    /// an exact multiple of the header count. Tokens that fail to parse as a
    /// number become NaN rather than failing the build. Sample `i` is
    /// stamped `start_time + i` hours and annotated with sun and moon
    /// positions and moon illumination at that instant; rise/set event lists
    /// are searched once per body from `timestamp`.
    #[builder]
    pub fn assemble(
        timestamp: DateTime<Utc>,
        start_time: DateTime<Utc>,
        location: String,
        country: Option<String>,
        position_field: &str,
        timezone: &str,
        headers: &[String],
        values: &[String],
    ) -> Result<WeatherData, AssembleError> {
        let position = parse_position(position_field)?;

        let tz: Tz = timezone
            .parse()
            .map_err(|_| AssembleError::UnknownTimezone(timezone.to_string()))?;
        let time_zone_offset =
            tz.offset_from_utc_datetime(&timestamp.naive_utc())
                .fix()
                .local_minus_utc() as f64
                / 3600.0;

        if headers.is_empty() || values.len() % headers.len() != 0 {
            return Err(AssembleError::FormatMismatch {
                headers: headers.len(),
                values: values.len(),
            });
        }

        let sun_events = find_celestial_events(timestamp, &position, CelestialBody::Sun);
        let moon_events = find_celestial_events(timestamp, &position, CelestialBody::Moon);

        let sample_count = values.len() / headers.len();
        let mut samples = Vec::with_capacity(sample_count);
        for i in 0..sample_count {
            let time = start_time + Duration::hours(i as i64);
            let ms = time.timestamp_millis();

            let mut sample_values = BTreeMap::new();
            for (j, header) in headers.iter().enumerate() {
                let token = &values[i * headers.len() + j];
                sample_values.insert(header.clone(), token.parse::<f64>().unwrap_or(f64::NAN));
            }

            samples.push(WeatherSample {
                time,
                sun_position: sun::position(ms, &position),
                moon_position: moon::position(ms, &position),
                moon_illumination: moon::illumination(ms),
                values: sample_values,
            });
        }

        Ok(WeatherData {
            version: FORMAT_VERSION.to_string(),
            status: STATUS_SUCCESS.to_string(),
            location,
            country,
            time: timestamp,
            time_zone: timezone.to_string(),
            time_zone_offset,
            position,
            sun_events,
            moon_events,
            values: samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn assemble_helsinki(headers: &[String], values: &[String]) -> Result<WeatherData, AssembleError> {
        WeatherData::assemble()
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .start_time(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .location("Helsinki".to_string())
            .country("Finland".to_string())
            .position_field("60.17 24.94")
            .timezone("Europe/Helsinki")
            .headers(headers)
            .values(values)
            .call()
    }

    #[test]
    fn samples_are_hourly_and_carry_their_variables() {
        let headers = strings(&["Temperature", "WindSpeedMS"]);
        let values = strings(&["1.5", "3.2", "2.0", "3.4", "-1.0", "4.5"]);

        let record = assemble_helsinki(&headers, &values).unwrap();

        assert_eq!(record.values.len(), 3);
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        for (i, sample) in record.values.iter().enumerate() {
            assert_eq!(sample.time, start + Duration::hours(i as i64));
        }
        assert_eq!(record.values[1].values["Temperature"], 2.0);
        assert_eq!(record.values[2].values["WindSpeedMS"], 4.5);
    }

    #[test]
    fn unparseable_token_becomes_nan_instead_of_failing() {
        let headers = strings(&["Temperature"]);
        let values = strings(&["1.5", "NaN?", "2.5"]);

        let record = assemble_helsinki(&headers, &values).unwrap();
        assert!(record.values[1].values["Temperature"].is_nan());
        assert_eq!(record.values[2].values["Temperature"], 2.5);
    }

    #[test]
    fn uneven_value_count_is_rejected() {
        let headers = strings(&["Temperature", "WindSpeedMS"]);
        let values = strings(&["1.0", "2.0", "3.0", "4.0", "5.0"]);

        let err = assemble_helsinki(&headers, &values).unwrap_err();
        assert_eq!(
            err,
            AssembleError::FormatMismatch {
                headers: 2,
                values: 5
            }
        );
    }

    #[test]
    fn empty_header_list_is_rejected() {
        let err = assemble_helsinki(&[], &strings(&["1.0"])).unwrap_err();
        assert!(matches!(err, AssembleError::FormatMismatch { headers: 0, .. }));
    }

    #[test]
    fn winter_offset_for_helsinki_is_plus_two() {
        let record = assemble_helsinki(&strings(&["T"]), &strings(&["0.0"])).unwrap();
        assert_eq!(record.time_zone_offset, 2.0);
        assert_eq!(record.time_zone, "Europe/Helsinki");
    }

    #[test]
    fn fractional_offsets_survive() {
        let record = WeatherData::assemble()
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .start_time(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .location("Mumbai".to_string())
            .position_field("19.08 72.88")
            .timezone("Asia/Kolkata")
            .headers(&strings(&["T"]))
            .values(&strings(&["30.0"]))
            .call()
            .unwrap();
        assert_eq!(record.time_zone_offset, 5.5);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = WeatherData::assemble()
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .start_time(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .location("Nowhere".to_string())
            .position_field("60.0 24.0")
            .timezone("Europe/Atlantis")
            .headers(&strings(&["T"]))
            .values(&strings(&["0.0"]))
            .call()
            .unwrap_err();
        assert_eq!(err, AssembleError::UnknownTimezone("Europe/Atlantis".to_string()));
    }

    #[test]
    fn malformed_position_is_rejected() {
        let err = WeatherData::assemble()
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .start_time(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
            .location("Helsinki".to_string())
            .position_field("60.17")
            .timezone("Europe/Helsinki")
            .headers(&strings(&["T"]))
            .values(&strings(&["0.0"]))
            .call()
            .unwrap_err();
        assert!(matches!(err, AssembleError::PositionFormat(_)));
    }

    #[test]
    fn celestial_event_lists_are_populated_at_mid_latitudes() {
        let record = assemble_helsinki(&strings(&["T"]), &strings(&["0.0"])).unwrap();
        assert!(record.sun_events.rises.len() >= 2);
        assert!(record.sun_events.sets.len() >= 2);
        assert!(record.moon_events.rises.len() >= 2);
        assert!(record.moon_events.sets.len() >= 2);
    }

    #[test]
    fn record_carries_version_and_success_status() {
        let record = assemble_helsinki(&strings(&["T"]), &strings(&["0.0"])).unwrap();
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.status, "success");
        assert_eq!(record.location, "Helsinki");
        assert_eq!(record.country.as_deref(), Some("Finland"));
    }

    #[test]
    fn serialized_record_uses_the_wire_field_names() {
        let headers = strings(&["Temperature"]);
        let values = strings(&["bad-token"]);
        let record = assemble_helsinki(&headers, &values).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["timeZone"], "Europe/Helsinki");
        assert_eq!(json["timeZoneOffset"], 2.0);
        assert_eq!(json["position"]["latitude"], 60.17);
        assert!(json["sunEvents"]["rises"].is_array());
        assert!(json["moonEvents"]["sets"].is_array());
        // Capture instant serializes as epoch milliseconds.
        assert_eq!(
            json["time"],
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        // NaN sample values serialize as null.
        assert!(json["values"][0]["Temperature"].is_null());
        assert!(json["values"][0]["sunPosition"]["altitude"].is_number());
    }
}
