// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use log::info;

use crate::chart::ViewMode;
use crate::error::OrreryError;
use crate::query::{SequenceSpan, add_days};
use crate::renderer::Renderer;
use crate::snapshot::{Snapshot, SnapshotBuilder};

pub const DEFAULT_FPS: u32 = 20;

// NeuQuant sampling factor, 1 (best) ..= 30 (fastest).
const GIF_QUANTIZER_SPEED: i32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceRequest {
    pub span: SequenceSpan,
    pub view_mode: ViewMode,
}

/// `start + k * interval` for k = 0, 1, ... while `k * interval <= duration`.
/// Always contains `start`. Fails without a partial result if any date is
/// past the representable range.
pub fn sample_dates(span: &SequenceSpan) -> Result<Vec<NaiveDate>, OrreryError> {
    let interval = span.interval_days.max(1) as u64;
    let duration = span.duration_days as u64;
    let mut dates = Vec::with_capacity((duration / interval + 1) as usize);
    let mut offset = 0_u64;
    while offset <= duration {
        dates.push(add_days(span.start, offset)?);
        offset += interval;
    }
    Ok(dates)
}

/// One Snapshot per sample date, in date order.
pub fn snapshots_for(builder: &SnapshotBuilder, span: &SequenceSpan)
                     -> Result<Vec<Arc<Snapshot>>, OrreryError> {
    sample_dates(span)?.into_iter().map(|date| builder.build(date)).collect()
}

/// Renders each sample date of `request` and encodes the frames as a looping
/// GIF at `fps` frames per second. `progress` is called with (frames done,
/// frame count) after each frame is rendered.
pub fn build_sequence(builder: &SnapshotBuilder,
                      renderer: &Renderer,
                      request: &SequenceRequest,
                      fps: u32,
                      mut progress: impl FnMut(usize, usize))
                      -> Result<Vec<u8>, OrreryError> {
    let start_time = Instant::now();
    let dates = sample_dates(&request.span)?;
    let total = dates.len();
    let mut frames = Vec::<RgbaImage>::with_capacity(total);
    for date in dates {
        let snapshot = builder.build(date)?;
        frames.push(renderer.render(&snapshot, request.view_mode));
        progress(frames.len(), total);
    }
    let gif = encode_gif(frames, fps)?;
    info!("Built {} frame {:?} sequence from {} in {:?} ({} bytes)",
          total, request.view_mode, request.span.start,
          start_time.elapsed(), gif.len());
    Ok(gif)
}

pub fn encode_gif(frames: Vec<RgbaImage>, fps: u32) -> Result<Vec<u8>, OrreryError> {
    let encode_error = |e: image::ImageError| OrreryError::Computation(
        format!("GIF encoding failed: {:?}", e));
    let delay = Delay::from_numer_denom_ms(1000, fps.max(1));
    let mut gif_buf = Vec::<u8>::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut gif_buf, GIF_QUANTIZER_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;
        encoder.encode_frames(
            frames.into_iter().map(|image| Frame::from_parts(image, 0, 0, delay)))
            .map_err(encode_error)?;
    }
    Ok(gif_buf)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use canonical_error::CanonicalError;
    use chrono::Datelike;
    use image::AnimationDecoder;
    use image::codecs::gif::GifDecoder;

    use crate::ephemeris_trait::{Body, BodyPosition, EphemerisTrait};
    use super::*;

    struct CountingEphemeris {
        calls: Arc<AtomicUsize>,
    }

    impl EphemerisTrait for CountingEphemeris {
        fn compute(&self, body: Body, date: NaiveDate)
                   -> Result<BodyPosition, CanonicalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BodyPosition{hlon: date.ordinal() as f64 / 58.0,
                            ra: body.ring() as f64 * 0.7})
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn span(start: NaiveDate, duration_days: u32, interval_days: u32) -> SequenceSpan {
        SequenceSpan{start, duration_days, interval_days}
    }

    #[test]
    fn test_sample_dates() {
        let dates = sample_dates(&span(ymd(2024, 1, 1), 10, 2)).unwrap();
        assert_eq!(dates.len(), 6);
        assert_eq!(dates[0], ymd(2024, 1, 1));
        assert_eq!(dates[5], ymd(2024, 1, 11));
        for pair in dates.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), 2);
        }
    }

    #[test]
    fn test_interval_longer_than_duration() {
        let dates = sample_dates(&span(ymd(2024, 1, 1), 2, 10)).unwrap();
        assert_eq!(dates, vec![ymd(2024, 1, 1)]);
    }

    #[test]
    fn test_last_sample_not_past_end() {
        let dates = sample_dates(&span(ymd(2024, 1, 1), 10, 3)).unwrap();
        assert_eq!(dates.len(), 4);
        assert_eq!(*dates.last().unwrap(), ymd(2024, 1, 10));
    }

    #[test]
    fn test_overflow() {
        let result = sample_dates(&span(ymd(9999, 12, 30), 1000, 1));
        assert!(matches!(result, Err(OrreryError::RangeOverflow(_))));
    }

    #[test]
    fn test_build_sequence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let builder = SnapshotBuilder::new(
            Box::new(CountingEphemeris{calls: calls.clone()}), 100);
        let request = SequenceRequest{span: span(ymd(2024, 3, 1), 4, 2),
                                      view_mode: ViewMode::Geocentric};
        let mut reports = Vec::new();
        let gif = build_sequence(&builder, &Renderer::with_font_file(None).unwrap(), &request, 10,
                                 |done, total| reports.push((done, total))).unwrap();
        assert_eq!(reports, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(calls.load(Ordering::SeqCst), 27);

        let decoder = GifDecoder::new(Cursor::new(gif)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        let (numer, denom) = frames[0].delay().numer_denom_ms();
        assert_eq!(numer / denom, 100);

        // A second pass is served from the snapshot cache.
        build_sequence(&builder, &Renderer::with_font_file(None).unwrap(), &request, 10, |_, _| {}).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 27);
    }

    #[test]
    fn test_overflow_renders_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let builder = SnapshotBuilder::new(
            Box::new(CountingEphemeris{calls: calls.clone()}), 100);
        let request = SequenceRequest{span: span(ymd(9999, 12, 1), 100, 5),
                                      view_mode: ViewMode::Heliocentric};
        let mut frame_count = 0;
        let result = build_sequence(&builder, &Renderer::with_font_file(None).unwrap(), &request,
                                    DEFAULT_FPS, |_, _| frame_count += 1);
        assert!(matches!(result, Err(OrreryError::RangeOverflow(_))));
        assert_eq!(frame_count, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_snapshots_for() {
        let calls = Arc::new(AtomicUsize::new(0));
        let builder = SnapshotBuilder::new(
            Box::new(CountingEphemeris{calls: calls.clone()}), 100);
        let snapshots = snapshots_for(&builder, &span(ymd(2024, 1, 1), 4, 2)).unwrap();
        let dates: Vec<NaiveDate> = snapshots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 3), ymd(2024, 1, 5)]);
    }

}  // mod tests.
