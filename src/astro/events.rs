//! Forward search for upcoming rise and set events.

use crate::astro::{rise_set, CelestialBody};
use crate::types::position::Position;
use crate::types::weather_data::CelestialEvents;
use chrono::{DateTime, Utc};

/// Upper bound on rise/set samples per search, about 250 days of forward
/// coverage at the 12-hour stride. Keeps the search finite near the poles,
/// where a body can stay above or below the horizon for months.
pub const MAX_SEARCH_SAMPLES: usize = 500;

const SAMPLE_STEP_MS: i64 = 12 * 3_600_000;
const DAY_SPAN_MS: i64 = 24 * 3_600_000;

/// Collects rise and set epochs for `body`, starting at `timestamp` and
/// stepping forward twelve hours per sample.
///
/// The search stops once both lists hold at least two entries and the most
/// recent entry of each lies at least 24 hours past `timestamp`. If the
/// sample budget runs out first the accumulated (possibly empty) lists are
/// returned as they are; that is an expected outcome at polar latitudes, not
/// an error.
pub fn find_celestial_events(
    timestamp: DateTime<Utc>,
    position: &Position,
    body: CelestialBody,
) -> CelestialEvents {
    let origin = timestamp.timestamp_millis();

    let mut rises: Vec<i64> = Vec::new();
    let mut sets: Vec<i64> = Vec::new();

    for i in 0..MAX_SEARCH_SAMPLES {
        let events = rise_set(origin + i as i64 * SAMPLE_STEP_MS, position, body);

        if let Some(rise) = events.rise {
            if rise != 0 && !rises.contains(&rise) {
                rises.push(rise);
            }
        }
        if let Some(set) = events.set {
            if set != 0 && !sets.contains(&set) {
                sets.push(set);
            }
        }

        if rises.len() > 1 && sets.len() > 1 {
            let enough_rise_span = rises[rises.len() - 1] - origin >= DAY_SPAN_MS;
            let enough_set_span = sets[sets.len() - 1] - origin >= DAY_SPAN_MS;
            if enough_rise_span && enough_set_span {
                break;
            }
        }
    }

    rises.sort_unstable();
    sets.sort_unstable();

    CelestialEvents { rises, sets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assert_ascending_distinct(epochs: &[i64]) {
        for pair in epochs.windows(2) {
            assert!(pair[0] < pair[1], "epochs not strictly ascending: {pair:?}");
        }
    }

    #[test]
    fn sun_search_terminates_at_mid_latitudes() {
        let position = Position::new(60.0, 25.0);
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let events = find_celestial_events(t, &position, CelestialBody::Sun);

        assert!(events.rises.len() >= 2);
        assert!(events.sets.len() >= 2);
        assert_ascending_distinct(&events.rises);
        assert_ascending_distinct(&events.sets);

        let origin = t.timestamp_millis();
        assert!(events.rises.last().unwrap() - origin >= DAY_SPAN_MS);
        assert!(events.sets.last().unwrap() - origin >= DAY_SPAN_MS);
    }

    #[test]
    fn moon_search_terminates_at_mid_latitudes() {
        let position = Position::new(60.0, 25.0);
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let events = find_celestial_events(t, &position, CelestialBody::Moon);

        assert!(events.rises.len() >= 2);
        assert!(events.sets.len() >= 2);
        assert_ascending_distinct(&events.rises);
        assert_ascending_distinct(&events.sets);

        let origin = t.timestamp_millis();
        assert!(events.rises.last().unwrap() - origin >= DAY_SPAN_MS);
        assert!(events.sets.last().unwrap() - origin >= DAY_SPAN_MS);
    }

    #[test]
    fn sun_search_at_the_pole_exhausts_its_budget_without_error() {
        let pole = Position::new(90.0, 0.0);
        let t = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();

        let events = find_celestial_events(t, &pole, CelestialBody::Sun);

        // The sun crosses the rise/set altitude at most a handful of times a
        // year there; the search must give up cleanly rather than loop.
        assert!(events.rises.len() < 2 || events.sets.len() < 2);
        assert_ascending_distinct(&events.rises);
        assert_ascending_distinct(&events.sets);
    }

    #[test]
    fn events_are_not_duplicated_across_overlapping_samples() {
        let position = Position::new(60.0, 25.0);
        let t = Utc.with_ymd_and_hms(2024, 7, 10, 0, 0, 0).unwrap();

        let events = find_celestial_events(t, &position, CelestialBody::Sun);
        let mut deduped = events.rises.clone();
        deduped.dedup();
        assert_eq!(deduped, events.rises);
    }
}
