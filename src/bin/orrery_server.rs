// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use orrery::astro_ephemeris::AstroEphemeris;
use orrery::http_server::{AppState, router};
use orrery::renderer::Renderer;
use orrery::sequence::DEFAULT_FPS;
use orrery::snapshot::{DEFAULT_CACHE_CAPACITY, SnapshotBuilder};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Directory of static content. Its index.html is served at /.
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Maximum number of dates whose positions are memoized.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Animation playback rate, frames per second.
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// TrueType font for chart text. Defaults to the bundled DejaVu Sans.
    #[arg(long)]
    font: Option<PathBuf>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
                         .unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let renderer = match Renderer::with_font_file(args.font.as_deref()) {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("Error: {}", e.message);
            std::process::exit(1);
        },
    };
    let state = Arc::new(AppState{
        snapshots: SnapshotBuilder::new(Box::new(AstroEphemeris::new()),
                                        args.cache_capacity),
        renderer,
        fps: args.fps,
    });
    if !args.static_dir.join("index.html").exists() {
        warn!("No index.html in {:?}", args.static_dir);
    }
    let app = router(state, &args.static_dir);

    let addr = SocketAddr::new(args.host, args.port);
    info!("Listening at {:?}", addr);
    if let Err(e) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
