// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use chrono::NaiveDate;
use log::debug;
use serde::{Serialize, Serializer};

use crate::ephemeris_trait::{Body, EphemerisTrait};
use crate::error::OrreryError;

/// One body's position on a given date, along with how it is placed and
/// labelled in each chart view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    #[serde(skip)]
    pub body: Body,
    pub name: &'static str,
    pub geocentric_label: &'static str,
    pub heliocentric_label: &'static str,

    // Heliocentric chart radius: index in Body::ALL.
    #[serde(rename = "radius")]
    pub ring_radius: usize,
    // Geocentric chart radius.
    pub geo_radius: f64,

    // Radians, [0, 2pi). Serialized to 2 decimal places.
    #[serde(serialize_with = "serialize_rounded")]
    pub hlon: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub ra: f64,
}

// Geocentric radius of the Moon; keeps it next to the chart center whatever
// its ring.
pub const MOON_GEO_RADIUS: f64 = 0.5;

/// Computes an Observation for each body in `Body::ALL`, in that order.
pub fn resolve(ephemeris: &dyn EphemerisTrait, date: NaiveDate)
               -> Result<Vec<Observation>, OrreryError> {
    debug!("Resolving positions for {}", date);
    let mut observations = Vec::with_capacity(Body::ALL.len());
    for body in Body::ALL {
        let position = ephemeris.compute(body, date)?;
        let ring_radius = body.ring();
        observations.push(Observation{
            body,
            name: body.name(),
            geocentric_label: body.name(),
            heliocentric_label: heliocentric_label(body),
            ring_radius,
            geo_radius: if body == Body::Moon {
                MOON_GEO_RADIUS
            } else {
                ring_radius as f64
            },
            hlon: position.hlon,
            ra: position.ra,
        });
    }
    Ok(observations)
}

// In the heliocentric chart the Sun's slot carries Earth's longitude, and the
// Moon's slot (ring 0, the center) stands for the Sun.
fn heliocentric_label(body: Body) -> &'static str {
    match body {
        Body::Sun => "Earth",
        Body::Moon => "Sun",
        _ => body.name(),
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S)
                                    -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

// mod tests.
