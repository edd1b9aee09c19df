//! Solar position and sunrise/sunset.

use crate::astro::{
    altitude, azimuth, declination, from_julian, right_ascension, sidereal_time, to_days, RiseSet,
    SunPosition, RAD,
};
use crate::types::position::Position;
use std::f64::consts::{PI, TAU};

const J0: f64 = 0.0009;
const J2000: f64 = 2_451_545.0;

/// Altitude of the sun's upper limb at rise/set, refraction included.
const HORIZON: f64 = -0.833 * RAD;

fn mean_anomaly(d: f64) -> f64 {
    RAD * (357.5291 + 0.985_600_28 * d)
}

fn ecliptic_longitude(m: f64) -> f64 {
    let center = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    let perihelion = RAD * 102.9372;
    m + center + perihelion + PI
}

/// Equatorial coordinates (declination, right ascension) at `d` days since
/// J2000.
pub(crate) fn coords(d: f64) -> (f64, f64) {
    let l = ecliptic_longitude(mean_anomaly(d));
    (declination(l, 0.0), right_ascension(l, 0.0))
}

/// Horizontal sun position at `ms` as seen from `position`.
pub fn position(ms: i64, position: &Position) -> SunPosition {
    let lw = RAD * -position.longitude;
    let phi = RAD * position.latitude;
    let d = to_days(ms as f64);

    let (dec, ra) = coords(d);
    let h = sidereal_time(d, lw) - ra;

    SunPosition {
        azimuth: azimuth(h, phi, dec),
        altitude: altitude(h, phi, dec),
    }
}

fn julian_cycle(d: f64, lw: f64) -> f64 {
    (d - J0 - lw / TAU).round()
}

fn approx_transit(ht: f64, lw: f64, n: f64) -> f64 {
    J0 + (ht + lw) / TAU + n
}

fn solar_transit_j(ds: f64, m: f64, l: f64) -> f64 {
    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

/// Hour angle at which the sun reaches altitude `h`. `None` when the sun
/// stays entirely above or below that altitude for the whole day.
fn hour_angle(h: f64, phi: f64, dec: f64) -> Option<f64> {
    let cos_h = (h.sin() - phi.sin() * dec.sin()) / (phi.cos() * dec.cos());
    if cos_h.is_finite() && (-1.0..=1.0).contains(&cos_h) {
        Some(cos_h.acos())
    } else {
        None
    }
}

/// Sunrise and sunset for the solar day nearest to `ms`.
///
/// Both events are absent together during polar day and polar night.
pub(crate) fn rise_set(ms: i64, position: &Position) -> RiseSet {
    let lw = RAD * -position.longitude;
    let phi = RAD * position.latitude;
    let d = to_days(ms as f64);

    let n = julian_cycle(d, lw);
    let ds = approx_transit(0.0, lw, n);
    let m = mean_anomaly(ds);
    let l = ecliptic_longitude(m);
    let dec = declination(l, 0.0);
    let j_noon = solar_transit_j(ds, m, l);

    match hour_angle(HORIZON, phi, dec) {
        Some(w) => {
            let j_set = solar_transit_j(approx_transit(w, lw, n), m, l);
            let j_rise = j_noon - (j_set - j_noon);
            RiseSet {
                rise: Some(from_julian(j_rise)),
                set: Some(from_julian(j_set)),
            }
        }
        None => RiseSet::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ms(y: i32, mo: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn midsummer_sun_is_high_over_helsinki_at_midday() {
        let helsinki = Position::new(60.17, 24.94);
        let pos = position(ms(2024, 6, 21, 10), &helsinki);
        // Solar altitude peaks around 53 degrees at that latitude.
        assert!(
            pos.altitude > 0.75 && pos.altitude < 1.05,
            "altitude {} out of range",
            pos.altitude
        );
    }

    #[test]
    fn midwinter_sun_stays_below_horizon_at_night() {
        let helsinki = Position::new(60.17, 24.94);
        let pos = position(ms(2024, 1, 15, 0), &helsinki);
        assert!(pos.altitude < 0.0);
    }

    #[test]
    fn helsinki_has_both_events_in_march() {
        let helsinki = Position::new(60.17, 24.94);
        let events = rise_set(ms(2024, 3, 1, 0), &helsinki);
        let rise = events.rise.expect("sunrise");
        let set = events.set.expect("sunset");
        assert!(rise < set);
        // Roughly 10.5 hours of daylight at the start of March.
        let daylight_h = (set - rise) as f64 / 3_600_000.0;
        assert!(
            daylight_h > 9.0 && daylight_h < 12.0,
            "daylight {daylight_h}h"
        );
    }

    #[test]
    fn polar_night_has_no_events() {
        let longyearbyen = Position::new(78.22, 15.63);
        let events = rise_set(ms(2024, 12, 15, 12), &longyearbyen);
        assert_eq!(events, RiseSet::default());
    }

    #[test]
    fn midnight_sun_has_no_events() {
        let longyearbyen = Position::new(78.22, 15.63);
        let events = rise_set(ms(2024, 6, 21, 12), &longyearbyen);
        assert_eq!(events, RiseSet::default());
    }
}
