//! Lunar position, illumination and moonrise/moonset.

use crate::astro::{
    altitude, astro_refraction, azimuth, declination, right_ascension, sidereal_time, sun, to_days,
    MoonIllumination, MoonPosition, RiseSet, RAD,
};
use crate::types::position::Position;
use std::f64::consts::PI;

const DAY_MS: i64 = 86_400_000;
const HOUR_MS: f64 = 3_600_000.0;

/// Mean distance from the Earth to the Sun, km.
const SUN_DISTANCE: f64 = 149_598_000.0;

struct MoonCoords {
    ra: f64,
    dec: f64,
    distance: f64,
}

/// Geocentric ecliptic coordinates at `d` days since J2000.
fn coords(d: f64) -> MoonCoords {
    let l = RAD * (218.316 + 13.176_396 * d);
    let m = RAD * (134.963 + 13.064_993 * d);
    let f = RAD * (93.272 + 13.229_350 * d);

    let lon = l + RAD * 6.289 * m.sin();
    let lat = RAD * 5.128 * f.sin();
    let distance = 385_001.0 - 20_905.0 * m.cos();

    MoonCoords {
        ra: right_ascension(lon, lat),
        dec: declination(lon, lat),
        distance,
    }
}

/// Horizontal moon position at `ms` as seen from `position`.
pub fn position(ms: i64, position: &Position) -> MoonPosition {
    let lw = RAD * -position.longitude;
    let phi = RAD * position.latitude;
    let d = to_days(ms as f64);

    let c = coords(d);
    let h = sidereal_time(d, lw) - c.ra;
    let parallactic_angle = h
        .sin()
        .atan2(phi.tan() * c.dec.cos() - c.dec.sin() * h.cos());

    let alt = altitude(h, phi, c.dec);

    MoonPosition {
        azimuth: azimuth(h, phi, c.dec),
        altitude: alt + astro_refraction(alt),
        distance: c.distance,
        parallactic_angle,
    }
}

/// Illuminated fraction, phase and bright-limb angle at `ms`.
pub fn illumination(ms: i64) -> MoonIllumination {
    let d = to_days(ms as f64);
    let (sun_dec, sun_ra) = sun::coords(d);
    let m = coords(d);

    let elongation = (sun_dec.sin() * m.dec.sin()
        + sun_dec.cos() * m.dec.cos() * (sun_ra - m.ra).cos())
    .acos();
    let inclination =
        (SUN_DISTANCE * elongation.sin()).atan2(m.distance - SUN_DISTANCE * elongation.cos());
    let angle = (sun_dec.cos() * (sun_ra - m.ra).sin()).atan2(
        sun_dec.sin() * m.dec.cos() - sun_dec.cos() * m.dec.sin() * (sun_ra - m.ra).cos(),
    );

    MoonIllumination {
        fraction: (1.0 + inclination.cos()) / 2.0,
        phase: 0.5 + 0.5 * inclination * angle.signum() / PI,
        angle,
    }
}

fn altitude_above_horizon(ms: i64, observer: &Position) -> f64 {
    // Mean rise/set altitude of the moon's center, refraction included.
    const RISE_SET_ALTITUDE: f64 = 0.133 * RAD;
    position(ms, observer).altitude - RISE_SET_ALTITUDE
}

/// Moonrise and moonset within the UTC day containing `ms`.
///
/// Scans the day in two-hour steps and locates horizon crossings by fitting
/// a parabola through each altitude triple. Either event may be absent: the
/// moon rises roughly 50 minutes later each day, so about once a month a day
/// has no rise (and likewise no set).
pub(crate) fn rise_set(ms: i64, observer: &Position) -> RiseSet {
    let day_start = ms.div_euclid(DAY_MS) * DAY_MS;

    let mut rise: Option<f64> = None;
    let mut set: Option<f64> = None;
    let mut h0 = altitude_above_horizon(day_start, observer);

    let mut i = 1;
    while i <= 24 {
        let h1 = altitude_above_horizon(day_start + (i as f64 * HOUR_MS) as i64, observer);
        let h2 = altitude_above_horizon(day_start + ((i + 1) as f64 * HOUR_MS) as i64, observer);

        let a = (h0 + h2) / 2.0 - h1;
        let b = (h2 - h0) / 2.0;
        let xe = -b / (2.0 * a);
        let ye = (a * xe + b) * xe + h1;
        let discriminant = b * b - 4.0 * a * h1;

        let mut roots = 0;
        let mut x1 = 0.0;
        let mut x2 = 0.0;
        if discriminant >= 0.0 {
            let dx = discriminant.sqrt() / (a.abs() * 2.0);
            x1 = xe - dx;
            x2 = xe + dx;
            if x1.abs() <= 1.0 {
                roots += 1;
            }
            if x2.abs() <= 1.0 {
                roots += 1;
            }
            if x1 < -1.0 {
                x1 = x2;
            }
        }

        if roots == 1 {
            if h0 < 0.0 {
                rise = Some(i as f64 + x1);
            } else {
                set = Some(i as f64 + x1);
            }
        } else if roots == 2 {
            rise = Some(i as f64 + if ye < 0.0 { x2 } else { x1 });
            set = Some(i as f64 + if ye < 0.0 { x1 } else { x2 });
        }

        if rise.is_some() && set.is_some() {
            break;
        }

        h0 = h2;
        i += 2;
    }

    RiseSet {
        rise: rise.map(|h| day_start + (h * HOUR_MS).round() as i64),
        set: set.map(|h| day_start + (h * HOUR_MS).round() as i64),
    }
}
