// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

// HTTP API. Routes:
//   GET /api?date=&gif=&duration=&interval=  JSON array of snapshots
//   GET /plot?date=&geocentric=              PNG chart
//   GET /plot_gif?date=&duration=&interval=&geocentric=  GIF animation
// Anything else is served from the static directory (index.html at /).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use canonical_error::{CanonicalError, CanonicalErrorCode};
use chrono::{Local, NaiveDate};
use log::{debug, error};
use serde_json::json;
use tower_http::{cors::Any, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::chart::ViewMode;
use crate::error::OrreryError;
use crate::query::{DEFAULT_DURATION, DEFAULT_INTERVAL, SequenceSpan,
                   parse_date_or, parse_flag, parse_integer};
use crate::renderer::{Renderer, encode_png};
use crate::sequence::{SequenceRequest, build_sequence, snapshots_for};
use crate::snapshot::{Snapshot, SnapshotBuilder};

pub struct AppState {
    pub snapshots: SnapshotBuilder,
    pub renderer: Renderer,
    pub fps: u32,
}

type QueryParams = HashMap<String, String>;

pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/api", get(api))
        .route("/plot", get(plot))
        .route("/plot_gif", get(plot_gif))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

/// Error response: `{"error": message}` with a status derived from the
/// canonical error code.
pub struct ApiError(CanonicalError);

impl From<OrreryError> for ApiError {
    fn from(err: OrreryError) -> Self {
        ApiError(err.into())
    }
}

impl From<CanonicalError> for ApiError {
    fn from(err: CanonicalError) -> Self {
        ApiError(err)
    }
}

fn http_status(code: CanonicalErrorCode) -> StatusCode {
    match code {
        CanonicalErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        CanonicalErrorCode::OutOfRange => StatusCode::BAD_REQUEST,
        CanonicalErrorCode::FailedPrecondition => StatusCode::BAD_REQUEST,
        CanonicalErrorCode::NotFound => StatusCode::NOT_FOUND,
        CanonicalErrorCode::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        CanonicalErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = http_status(self.0.code);
        if status.is_server_error() {
            error!("Request failed: {}", self.0.message);
        } else {
            debug!("Rejected request: {}", self.0.message);
        }
        (status, Json(json!({"error": self.0.message}))).into_response()
    }
}

// Evaluated per request, never cached.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn param<'a>(params: &'a QueryParams, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

fn sequence_span(params: &QueryParams, start: NaiveDate)
                 -> Result<SequenceSpan, OrreryError> {
    let duration = parse_integer(param(params, "duration"), DEFAULT_DURATION)?;
    let interval = parse_integer(param(params, "interval"), DEFAULT_INTERVAL)?;
    SequenceSpan::validate(start, duration, interval)
}

// Runs CPU-bound rendering off the async worker threads.
async fn blocking<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, OrreryError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || f(&state)).await {
        Ok(result) => Ok(result?),
        Err(e) => Err(ApiError(canonical_error::internal_error(
            format!("Worker task failed: {:?}", e).as_str()))),
    }
}

async fn api(State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>)
             -> Result<Json<Vec<Arc<Snapshot>>>, ApiError> {
    let date = parse_date_or(param(&params, "date"), today())?;
    let gif = parse_flag(param(&params, "gif"));
    // Duration and interval must be integers even when unused; their bounds
    // only matter for a sequence.
    let duration = parse_integer(param(&params, "duration"), DEFAULT_DURATION)?;
    let interval = parse_integer(param(&params, "interval"), DEFAULT_INTERVAL)?;
    let snapshots = if gif {
        let span = SequenceSpan::validate(date, duration, interval)?;
        blocking(state, move |s| snapshots_for(&s.snapshots, &span)).await?
    } else {
        blocking(state, move |s| Ok(vec![s.snapshots.build(date)?])).await?
    };
    Ok(Json(snapshots))
}

async fn plot(State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>)
              -> Result<Response, ApiError> {
    let date = parse_date_or(param(&params, "date"), today())?;
    let view_mode = ViewMode::from_geocentric_flag(parse_flag(param(&params, "geocentric")));
    let png = blocking(state, move |s| {
        let snapshot = s.snapshots.build(date)?;
        Ok(encode_png(&s.renderer.render(&snapshot, view_mode))?)
    }).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn plot_gif(State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>)
                  -> Result<Response, ApiError> {
    let date = parse_date_or(param(&params, "date"), today())?;
    let view_mode = ViewMode::from_geocentric_flag(parse_flag(param(&params, "geocentric")));
    let request = SequenceRequest{span: sequence_span(&params, date)?, view_mode};
    let gif = blocking(state, move |s| {
        build_sequence(&s.snapshots, &s.renderer, &request, s.fps, |_, _| {})
    }).await?;
    Ok(([(header::CONTENT_TYPE, "image/gif")], gif).into_response())
}

// mod tests.
