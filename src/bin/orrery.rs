// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use log::{error, info};
use tracing_subscriber::EnvFilter;

use orrery::astro_ephemeris::AstroEphemeris;
use orrery::chart::ViewMode;
use orrery::error::OrreryError;
use orrery::query::{SequenceSpan, parse_date_or, parse_integer};
use orrery::renderer::{Renderer, encode_png};
use orrery::sequence::{DEFAULT_FPS, SequenceRequest, build_sequence};
use orrery::snapshot::{DEFAULT_CACHE_CAPACITY, SnapshotBuilder};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Date to plot, YYYY-MM-DD. Defaults to today. Without --gif a single
    /// PNG chart, {solar|geo}_{date}.png, is written to --output-dir.
    #[arg(long)]
    date: Option<String>,

    /// Plot right ascension as seen from Earth instead of heliocentric
    /// longitude.
    #[arg(long, default_value_t = false)]
    geocentric: bool,

    /// Write an animated GIF, {solar|geo}_{date}.gif, starting at --date
    /// instead of a single PNG chart.
    #[arg(long, default_value_t = false)]
    gif: bool,

    /// Animation length, days (1-1000).
    #[arg(long, default_value = "1000", allow_hyphen_values = true)]
    duration: String,

    /// Days between animation frames (1-20).
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    interval: String,

    /// Directory the chart or animation is written to. Created if needed.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Animation playback rate, frames per second.
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// TrueType font for chart text. Defaults to the bundled DejaVu Sans.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn write_output(dir: &Path, file_name: String, data: &[u8])
                -> Result<PathBuf, OrreryError> {
    let path = dir.join(file_name);
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, data))
        .map_err(|e| OrreryError::Computation(
            format!("Could not write {:?}: {}", path, e)))?;
    Ok(path)
}

fn run(args: &Args) -> Result<PathBuf, OrreryError> {
    let date = parse_date_or(args.date.as_deref(), Local::now().date_naive())?;
    let duration = parse_integer(Some(&args.duration), 0)?;
    let interval = parse_integer(Some(&args.interval), 0)?;
    let view_mode = ViewMode::from_geocentric_flag(args.geocentric);

    // Validate everything before doing any work.
    let span = if args.gif {
        Some(SequenceSpan::validate(date, duration, interval)?)
    } else {
        None
    };
    let renderer = Renderer::with_font_file(args.font.as_deref())?;
    let builder = SnapshotBuilder::new(Box::new(AstroEphemeris::new()),
                                       DEFAULT_CACHE_CAPACITY);

    let file_stem = format!("{}_{}", view_mode.file_prefix(), date);
    match span {
        Some(span) => {
            let request = SequenceRequest{span, view_mode};
            let gif = build_sequence(&builder, &renderer, &request, args.fps,
                                     |done, total| {
                                         print!("\rRendering: {}%", done * 100 / total);
                                         let _ = std::io::stdout().flush();
                                     })?;
            println!();
            write_output(&args.output_dir, format!("{}.gif", file_stem), &gif)
        },
        None => {
            let snapshot = builder.build(date)?;
            let png = encode_png(&renderer.render(&snapshot, view_mode))?;
            write_output(&args.output_dir, format!("{}.png", file_stem), &png)
        },
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
                         .unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    match run(&args) {
        Ok(path) => {
            info!("Wrote {:?}", path);
            println!("{}", path.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(if e.is_client_fault() { 2 } else { 1 })
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use super::*;

    #[test]
    fn test_help_names_outputs() {
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("{solar|geo}_{date}.png"));
        assert!(help.contains("{solar|geo}_{date}.gif"));
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let args = Args::try_parse_from(
            ["orrery", "--gif", "--duration", "-5", "--interval", "2"]).unwrap();
        assert_eq!(args.duration, "-5");
        assert!(matches!(run(&args), Err(OrreryError::OutOfRange(_))));
    }

}  // mod tests.
