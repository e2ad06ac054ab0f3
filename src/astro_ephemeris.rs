// Ephemeris backed by the `astro` crate: VSOP87 for the planets (and Earth,
// which stands in for the Sun) and the ELP-2000 lunar theory for the Moon.

use std::f64::consts::PI;

use astro::angle::limit_to_two_PI;
use astro::coords::asc_frm_ecl;
use astro::ecliptic::mn_oblq_laskar;
use astro::lunar;
use astro::planet::{heliocent_coords, Planet};
use astro::time::{CalType, Date, julian_day};
use canonical_error::{CanonicalError, internal_error};
use chrono::{Datelike, NaiveDate};

use crate::ephemeris_trait::{Body, BodyPosition, EphemerisTrait};

#[derive(Clone, Copy, Debug, Default)]
pub struct AstroEphemeris {}

impl AstroEphemeris {
    pub fn new() -> Self {
        AstroEphemeris{}
    }
}

impl EphemerisTrait for AstroEphemeris {
    fn compute(&self, body: Body, date: NaiveDate)
               -> Result<BodyPosition, CanonicalError> {
        let jd = julian_day_from_date(date)?;
        let (earth_long, earth_lat, earth_rad) =
            heliocent_coords(&Planet::Earth, jd);
        let earth = to_rectangular(earth_long, earth_lat, earth_rad);

        // (heliocentric longitude, geocentric ecliptic longitude and latitude)
        let (hlon, geo_long, geo_lat) = match body {
            // Seen from Earth the Sun sits opposite Earth's heliocentric
            // position. Its own heliocentric longitude is undefined; we report
            // Earth's.
            Body::Sun => (earth_long, earth_long + PI, -earth_lat),
            // The Moon reports its geocentric ecliptic longitude as hlon.
            Body::Moon => {
                let (ecl_point, _distance_km) = lunar::geocent_ecl_pos(jd);
                (ecl_point.long, ecl_point.long, ecl_point.lat)
            },
            _ => {
                let planet = vsop_planet(body).ok_or_else(|| internal_error(
                    format!("No planetary theory for {}", body.name()).as_str()))?;
                let (long, lat, rad) = heliocent_coords(&planet, jd);
                let helio = to_rectangular(long, lat, rad);
                let geo = [helio[0] - earth[0], helio[1] - earth[1], helio[2] - earth[2]];
                let (geo_long, geo_lat) = from_rectangular(&geo);
                (long, geo_long, geo_lat)
            },
        };

        let oblq_eclip = mn_oblq_laskar(jd);
        let position = BodyPosition{
            hlon: limit_to_two_PI(hlon),
            ra: limit_to_two_PI(asc_frm_ecl(geo_long, geo_lat, oblq_eclip)),
        };
        if !position.hlon.is_finite() || !position.ra.is_finite() {
            return Err(internal_error(
                format!("Non-finite position for {} at {}", body.name(), date).as_str()));
        }
        Ok(position)
    }
}

fn vsop_planet(body: Body) -> Option<Planet> {
    match body {
        Body::Mercury => Some(Planet::Mercury),
        Body::Venus => Some(Planet::Venus),
        Body::Mars => Some(Planet::Mars),
        Body::Jupiter => Some(Planet::Jupiter),
        Body::Saturn => Some(Planet::Saturn),
        Body::Uranus => Some(Planet::Uranus),
        Body::Neptune => Some(Planet::Neptune),
        Body::Moon | Body::Sun => None,
    }
}

// 0h UT on `date`.
fn julian_day_from_date(date: NaiveDate) -> Result<f64, CanonicalError> {
    let year = i16::try_from(date.year()).map_err(|_| internal_error(
        format!("Year {} is outside the supported ephemeris range", date.year()).as_str()))?;
    let astro_date = Date{year,
                          month: date.month() as u8,
                          decimal_day: date.day() as f64,
                          cal_type: CalType::Gregorian};
    Ok(julian_day(&astro_date))
}

// Ecliptic spherical (radians, AU) to rectangular.
fn to_rectangular(long: f64, lat: f64, rad: f64) -> [f64; 3] {
    [rad * lat.cos() * long.cos(),
     rad * lat.cos() * long.sin(),
     rad * lat.sin()]
}

// Returns (longitude, latitude), radians.
fn from_rectangular(v: &[f64; 3]) -> (f64, f64) {
    let long = v[1].atan2(v[0]);
    let lat = v[2].atan2((v[0] * v[0] + v[1] * v[1]).sqrt());
    (long, lat)
}

#[cfg(test)]
mod tests {
    extern crate approx;
    use approx::assert_abs_diff_eq;
    use super::*;

    fn compute(body: Body, y: i32, m: u32, d: u32) -> BodyPosition {
        AstroEphemeris::new().compute(
            body, NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
    }

    // Smallest separation between two angles, radians.
    fn separation(a: f64, b: f64) -> f64 {
        let diff = (a - b).rem_euclid(2.0 * PI);
        diff.min(2.0 * PI - diff)
    }

    #[test]
    fn test_sun() {
        let sun = compute(Body::Sun, 2024, 1, 1);
        // Almanac: Sun at RA 18h43m; Earth at heliocentric longitude ~100deg.
        assert_abs_diff_eq!(sun.ra, (18.0 + 43.0 / 60.0) * 15_f64.to_radians(),
                            epsilon = 0.02);
        assert_abs_diff_eq!(sun.hlon, 100_f64.to_radians(), epsilon = 0.02);
    }

    #[test]
    fn test_moon_geocentric_longitude() {
        // New moon at 11:57 UT on 2024-01-11; at 0h the Moon trails the Sun by
        // about 6.5 degrees of ecliptic longitude.
        let sun = compute(Body::Sun, 2024, 1, 11);
        let moon = compute(Body::Moon, 2024, 1, 11);
        let sun_geo_long = sun.hlon + PI;
        assert!(separation(moon.hlon, sun_geo_long) < 0.15);
        assert!(separation(moon.hlon, sun_geo_long) > 0.05);
        // Full moon two weeks later: opposite the Sun.
        let sun = compute(Body::Sun, 2024, 1, 26);
        let moon = compute(Body::Moon, 2024, 1, 26);
        assert!(separation(moon.hlon, sun.hlon) < 0.2);
    }

    #[test]
    fn test_inner_planet_elongation() {
        for day in [1, 10, 20, 28] {
            let sun = compute(Body::Sun, 2023, 2, day);
            let mercury = compute(Body::Mercury, 2023, 2, day);
            let venus = compute(Body::Venus, 2023, 2, day);
            // Greatest elongations (28 and 47 degrees), with slack for RA
            // stretching away from the equinoxes.
            assert!(separation(mercury.ra, sun.ra) < 0.6);
            assert!(separation(venus.ra, sun.ra) < 0.95);
        }
    }

    #[test]
    fn test_normalized() {
        for body in Body::ALL {
            let pos = compute(body, 1987, 4, 10);
            assert!(pos.hlon >= 0.0 && pos.hlon < 2.0 * PI, "{:?}", body);
            assert!(pos.ra >= 0.0 && pos.ra < 2.0 * PI, "{:?}", body);
        }
    }

    #[test]
    fn test_deterministic() {
        for body in Body::ALL {
            assert_eq!(compute(body, 2000, 1, 1), compute(body, 2000, 1, 1));
        }
    }

    #[test]
    fn test_unsupported_year() {
        let date = NaiveDate::from_ymd_opt(40000, 1, 1).unwrap();
        assert!(AstroEphemeris::new().compute(Body::Mars, date).is_err());
    }

}  // mod tests.
