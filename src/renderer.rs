// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::f64::consts::PI;
use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontArc, FontRef, FontVec, PxScale};
use canonical_error::{CanonicalError, failed_precondition_error,
                      internal_error, invalid_argument_error};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut,
                         draw_hollow_rect_mut, draw_line_segment_mut,
                         draw_polygon_mut, draw_text_mut, text_size};
use imageproc::point::Point;
use imageproc::rect::Rect;
use log::info;

use crate::chart::{Marker, PolarChart, ViewMode, chart_for};
use crate::snapshot::Snapshot;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 600;

// Polar plot area, pixels.
const CENTER: (f32, f32) = (300.0, 320.0);
const PLOT_RADIUS: f32 = 230.0;

// Legend box, to the right of the plot area.
const LEGEND_LEFT: i32 = 590;
const LEGEND_TOP: i32 = 70;
const LEGEND_WIDTH: u32 = 190;
const LEGEND_ROW_HEIGHT: i32 = 24;
const LEGEND_TEXT_OFFSET: i32 = 36;

const TITLE_TOP: i32 = 16;

const MARKER_SIZE: f32 = 7.0;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRID: Rgba<u8> = Rgba([210, 210, 210, 255]);
const FRAME: Rgba<u8> = Rgba([40, 40, 40, 255]);
const TEXT: Rgba<u8> = Rgba([0, 0, 0, 255]);

// DejaVu Sans; see assets/DejaVuSans-LICENSE.
static DEFAULT_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Draws polar charts with a title, angle labels and a legend.
pub struct Renderer {
    font: FontArc,
}

impl Renderer {
    pub fn new(font: FontArc) -> Self {
        Renderer{font}
    }

    /// Uses the font at `font_path` if given (failing if it cannot be
    /// loaded), otherwise the bundled font.
    pub fn with_font_file(font_path: Option<&Path>) -> Result<Self, CanonicalError> {
        let font = match font_path {
            Some(path) => {
                let font = load_font(path)?;
                info!("Using font {:?}", path);
                FontArc::new(font)
            },
            None => default_font()?,
        };
        Ok(Renderer::new(font))
    }

    pub fn render(&self, snapshot: &Snapshot, view_mode: ViewMode) -> RgbaImage {
        self.draw_chart(&chart_for(snapshot, view_mode))
    }

    pub fn draw_chart(&self, chart: &PolarChart) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
        let max_radius = chart.points.iter()
            .map(|p| p.radius)
            .fold(1.0_f64, f64::max) + 0.5;

        self.draw_grid(&mut image, max_radius);
        for point in &chart.points {
            let (x, y) = chart_position(point.angle, point.radius, max_radius);
            draw_marker(&mut image, point.marker, x, y, point.color);
        }
        self.draw_legend(&mut image, chart);
        let scale = PxScale::from(22.0);
        let (width, _) = text_size(scale, &self.font, &chart.title);
        draw_text_mut(&mut image, TEXT,
                      CENTER.0 as i32 - width as i32 / 2, TITLE_TOP,
                      scale, &self.font, &chart.title);
        image
    }

    // Concentric ring per integer radius, spokes every 45 degrees. No radial
    // tick labels: only relative placement is meaningful.
    fn draw_grid(&self, image: &mut RgbaImage, max_radius: f64) {
        let center = (CENTER.0 as i32, CENTER.1 as i32);
        let mut ring = 1.0;
        while ring < max_radius {
            let r = (ring / max_radius) as f32 * PLOT_RADIUS;
            draw_hollow_circle_mut(image, center, r.round() as i32, GRID);
            ring += 1.0;
        }
        for step in 0..8 {
            let angle = step as f64 * PI / 4.0;
            let end = chart_position(angle, max_radius, max_radius);
            draw_line_segment_mut(image, CENTER, end, GRID);
            let label = format!("{}°", step * 45);
            let scale = PxScale::from(14.0);
            let (w, h) = text_size(scale, &self.font, &label);
            let (x, y) = chart_position(angle, max_radius * 1.08, max_radius);
            draw_text_mut(image, TEXT,
                          x as i32 - w as i32 / 2, y as i32 - h as i32 / 2,
                          scale, &self.font, &label);
        }
        draw_hollow_circle_mut(image, center, PLOT_RADIUS as i32, FRAME);
    }

    fn draw_legend(&self, image: &mut RgbaImage, chart: &PolarChart) {
        let rows = chart.points.len() as i32;
        let height = (rows * LEGEND_ROW_HEIGHT + 8) as u32;
        draw_hollow_rect_mut(image,
                             Rect::at(LEGEND_LEFT, LEGEND_TOP).of_size(LEGEND_WIDTH, height),
                             FRAME);
        for (row, point) in chart.points.iter().enumerate() {
            let y = LEGEND_TOP + 4 + row as i32 * LEGEND_ROW_HEIGHT + LEGEND_ROW_HEIGHT / 2;
            draw_marker(image, point.marker, (LEGEND_LEFT + 18) as f32, y as f32,
                        point.color);
            let scale = PxScale::from(16.0);
            let (_, h) = text_size(scale, &self.font, point.label);
            draw_text_mut(image, TEXT, LEGEND_LEFT + LEGEND_TEXT_OFFSET, y - h as i32 / 2,
                          scale, &self.font, point.label);
        }
    }
}

// Pixel position of (angle, radius); angle increases counter-clockwise from
// the +x axis.
fn chart_position(angle: f64, radius: f64, max_radius: f64) -> (f32, f32) {
    let r = (radius / max_radius) as f32 * PLOT_RADIUS;
    (CENTER.0 + r * angle.cos() as f32, CENTER.1 - r * angle.sin() as f32)
}

fn draw_marker(image: &mut RgbaImage, marker: Marker, x: f32, y: f32, color: Rgba<u8>) {
    match marker {
        Marker::Circle => {
            draw_filled_circle_mut(image, (x.round() as i32, y.round() as i32),
                                   (MARKER_SIZE * 0.8) as i32, color);
        },
        Marker::Cross => {
            let s = MARKER_SIZE;
            // Three pixels wide.
            for offset in [-1.0, 0.0, 1.0] {
                draw_line_segment_mut(image, (x - s + offset, y - s),
                                      (x + s + offset, y + s), color);
                draw_line_segment_mut(image, (x - s + offset, y + s),
                                      (x + s + offset, y - s), color);
            }
        },
        Marker::Star => {
            // Five-pointed star; vertices alternate outer and inner radius.
            let vertices: Vec<Point<i32>> = (0..10).map(|i| {
                let r = if i % 2 == 0 { MARKER_SIZE * 1.3 } else { MARKER_SIZE * 0.55 };
                let theta = PI / 2.0 + i as f64 * PI / 5.0;
                Point::new((x + r * theta.cos() as f32).round() as i32,
                           (y - r * theta.sin() as f32).round() as i32)
            }).collect();
            draw_polygon_mut(image, &vertices, color);
        },
    }
}

pub fn default_font() -> Result<FontArc, CanonicalError> {
    let font = FontRef::try_from_slice(DEFAULT_FONT).map_err(|e| internal_error(
        format!("Could not parse bundled font: {:?}", e).as_str()))?;
    Ok(FontArc::new(font))
}

pub fn load_font(path: &Path) -> Result<FontVec, CanonicalError> {
    let data = std::fs::read(path).map_err(|e| failed_precondition_error(
        format!("Could not read font {:?}: {:?}", path, e).as_str()))?;
    FontVec::try_from_vec(data).map_err(|e| invalid_argument_error(
        format!("Could not parse font {:?}: {:?}", path, e).as_str()))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CanonicalError> {
    let mut png_buf = Vec::<u8>::new();
    image.write_to(&mut Cursor::new(&mut png_buf), ImageFormat::Png)
        .map_err(|e| internal_error(format!("PNG encoding failed: {:?}", e).as_str()))?;
    Ok(png_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PolarPoint;

    const RED: Rgba<u8> = Rgba([200, 10, 10, 255]);
    const BLUE: Rgba<u8> = Rgba([10, 10, 200, 255]);

    fn chart(points: Vec<PolarPoint>) -> PolarChart {
        PolarChart{title: "Test chart".to_string(), points}
    }

    fn point(angle: f64, radius: f64, marker: Marker, color: Rgba<u8>) -> PolarPoint {
        PolarPoint{angle, radius, marker, label: "x", color}
    }

    fn renderer() -> Renderer {
        Renderer::with_font_file(None).unwrap()
    }

    // Number of near-black pixels in [x0, x1) x [y0, y1).
    fn dark_pixels(image: &RgbaImage, x0: u32, x1: u32, y0: u32, y1: u32) -> usize {
        let mut count = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = image.get_pixel(x, y);
                if p[0] < 100 && p[1] < 100 && p[2] < 100 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_dimensions_and_background() {
        let image = renderer().draw_chart(&chart(vec![]));
        assert_eq!(image.dimensions(), (CHART_WIDTH, CHART_HEIGHT));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*image.get_pixel(CHART_WIDTH - 1, CHART_HEIGHT - 1), BACKGROUND);
    }

    #[test]
    fn test_marker_placement() {
        // max_radius is 4.5, so radius 4 lands at 4/4.5 of PLOT_RADIUS.
        let image = renderer().draw_chart(&chart(vec![
            point(0.0, 4.0, Marker::Circle, RED),
            point(PI / 2.0, 2.0, Marker::Star, BLUE),
        ]));
        let r4 = 4.0 / 4.5 * PLOT_RADIUS;
        assert_eq!(*image.get_pixel((CENTER.0 + r4) as u32, CENTER.1 as u32), RED);
        let r2 = 2.0 / 4.5 * PLOT_RADIUS;
        assert_eq!(*image.get_pixel(CENTER.0 as u32, (CENTER.1 - r2) as u32), BLUE);
    }

    #[test]
    fn test_cross_marker_center() {
        let image = renderer().draw_chart(&chart(vec![
            point(PI, 1.0, Marker::Cross, RED),
        ]));
        let r = 1.0 / 1.5 * PLOT_RADIUS;
        assert_eq!(*image.get_pixel((CENTER.0 - r) as u32, CENTER.1 as u32), RED);
    }

    #[test]
    fn test_legend_swatches() {
        let image = renderer().draw_chart(&chart(vec![
            point(0.0, 1.0, Marker::Circle, RED),
            point(0.0, 2.0, Marker::Circle, BLUE),
        ]));
        let x = (LEGEND_LEFT + 18) as u32;
        let first_row = (LEGEND_TOP + 4 + LEGEND_ROW_HEIGHT / 2) as u32;
        assert_eq!(*image.get_pixel(x, first_row), RED);
        assert_eq!(*image.get_pixel(x, first_row + LEGEND_ROW_HEIGHT as u32), BLUE);
    }

    #[test]
    fn test_view_modes_differ() {
        use chrono::NaiveDate;
        use crate::ephemeris_trait::Body;
        use crate::position_resolver::Observation;

        let planets = Body::ALL.iter().map(|body| Observation{
            body: *body,
            name: body.name(),
            geocentric_label: body.name(),
            heliocentric_label: body.name(),
            ring_radius: body.ring(),
            geo_radius: body.ring() as f64,
            hlon: 0.0,
            ra: PI,
        }).collect();
        let snapshot = Snapshot{date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                                planets};
        let renderer = renderer();
        assert_ne!(renderer.render(&snapshot, ViewMode::Heliocentric),
                   renderer.render(&snapshot, ViewMode::Geocentric));
    }

    #[test]
    fn test_encode_png() {
        let image = renderer().draw_chart(&chart(vec![
            point(1.0, 3.0, Marker::Circle, RED),
        ]));
        let png = encode_png(&image).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_title_drawn() {
        let titled = renderer().draw_chart(&chart(vec![]));
        let untitled = renderer().draw_chart(
            &PolarChart{title: String::new(), points: vec![]});
        let band = (100, 500, TITLE_TOP as u32 - 4, TITLE_TOP as u32 + 30);
        assert!(dark_pixels(&titled, band.0, band.1, band.2, band.3) > 50);
        assert_eq!(dark_pixels(&untitled, band.0, band.1, band.2, band.3), 0);
    }

    #[test]
    fn test_legend_labels_drawn() {
        let mut labelled = point(0.0, 1.0, Marker::Circle, RED);
        labelled.label = "Mars";
        let image = renderer().draw_chart(&chart(vec![labelled]));
        let row_center = (LEGEND_TOP + 4 + LEGEND_ROW_HEIGHT / 2) as u32;
        let left = (LEGEND_LEFT + LEGEND_TEXT_OFFSET) as u32;
        assert!(dark_pixels(&image, left, left + 80,
                            row_center - 10, row_center + 10) > 20);
    }

    #[test]
    fn test_bundled_font() {
        assert!(default_font().is_ok());
    }

    #[test]
    fn test_missing_font_file() {
        let result = Renderer::with_font_file(Some(Path::new("/nonexistent/font.ttf")));
        assert!(result.is_err());
    }

}  // mod tests.
