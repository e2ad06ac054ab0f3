// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::CanonicalError;
use chrono::NaiveDate;

/// The bodies we chart. `Body::ALL` order is significant: a body's index
/// in it is its ring in the heliocentric chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Body {
    Moon,
    Mercury,
    Venus,
    Sun,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Body {
    pub const ALL: [Body; 9] = [
        Body::Moon, Body::Mercury, Body::Venus, Body::Sun, Body::Mars,
        Body::Jupiter, Body::Saturn, Body::Uranus, Body::Neptune,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Sun => "Sun",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
        }
    }

    // Position within `ALL`.
    pub fn ring(&self) -> usize {
        *self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyPosition {
    // Radians, [0, 2pi).
    pub hlon: f64,  // Heliocentric longitude.
    pub ra: f64,  // Geocentric right ascension.
}

// If a BodyPosition is not returned, an error is returned:
//   Internal: the date is outside the range the implementation supports, or
//     the computation did not converge.
pub trait EphemerisTrait {
    // Must be a deterministic function of (body, date). Evaluated at 0h UT.
    fn compute(&self, body: Body, date: NaiveDate)
               -> Result<BodyPosition, CanonicalError>;
}

// mod tests.
