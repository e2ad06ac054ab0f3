// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use image::Rgba;

use crate::ephemeris_trait::Body;
use crate::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    // Angle is heliocentric longitude, radius is ring index.
    Heliocentric,
    // Angle is right ascension, Moon drawn next to the center.
    Geocentric,
}

impl ViewMode {
    pub fn from_geocentric_flag(geocentric: bool) -> Self {
        if geocentric { ViewMode::Geocentric } else { ViewMode::Heliocentric }
    }

    // Used to name output files.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ViewMode::Heliocentric => "solar",
            ViewMode::Geocentric => "geo",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Cross,
    Star,
}

impl Marker {
    // Matplotlib marker code.
    pub fn symbol(&self) -> char {
        match self {
            Marker::Circle => 'o',
            Marker::Cross => 'x',
            Marker::Star => '*',
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolarPoint {
    pub angle: f64,  // Radians, counter-clockwise from the +x axis.
    pub radius: f64,  // Chart units; not to scale.
    pub marker: Marker,
    pub label: &'static str,
    pub color: Rgba<u8>,
}

/// What to draw for one snapshot in one view mode. Legend entries are the
/// points' labels, in point order.
#[derive(Clone, Debug, PartialEq)]
pub struct PolarChart {
    pub title: String,
    pub points: Vec<PolarPoint>,
}

// Matplotlib's default "tab10" color cycle.
const COLOR_CYCLE: [[u8; 3]; 10] = [
    [0x1f, 0x77, 0xb4], [0xff, 0x7f, 0x0e], [0x2c, 0xa0, 0x2c], [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd], [0x8c, 0x56, 0x4b], [0xe3, 0x77, 0xc2], [0x7f, 0x7f, 0x7f],
    [0xbc, 0xbd, 0x22], [0x17, 0xbe, 0xcf],
];

fn cycle_color(index: usize) -> Rgba<u8> {
    let [r, g, b] = COLOR_CYCLE[index % COLOR_CYCLE.len()];
    Rgba([r, g, b, 255])
}

fn marker_for(body: Body, view_mode: ViewMode) -> Marker {
    match (view_mode, body) {
        (ViewMode::Heliocentric, Body::Moon) => Marker::Star,
        (ViewMode::Heliocentric, Body::Sun) => Marker::Cross,
        (ViewMode::Geocentric, Body::Moon) => Marker::Cross,
        (ViewMode::Geocentric, Body::Sun) => Marker::Star,
        _ => Marker::Circle,
    }
}

/// Selects the angle, radius, label and marker of each observation, and the
/// title, according to `view_mode`.
pub fn chart_for(snapshot: &Snapshot, view_mode: ViewMode) -> PolarChart {
    let title = match view_mode {
        ViewMode::Heliocentric => format!("Solar system at {}", snapshot.date),
        ViewMode::Geocentric => format!("Geocentric view at {}", snapshot.date),
    };
    let points = snapshot.planets.iter().enumerate().map(|(index, obs)| {
        let (angle, radius, label) = match view_mode {
            ViewMode::Heliocentric =>
                (obs.hlon, obs.ring_radius as f64, obs.heliocentric_label),
            ViewMode::Geocentric =>
                (obs.ra, obs.geo_radius, obs.geocentric_label),
        };
        PolarPoint{angle, radius, label,
                   marker: marker_for(obs.body, view_mode),
                   color: cycle_color(index)}
    }).collect();
    PolarChart{title, points}
}

// mod tests.
