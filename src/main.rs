//! Kiosk Charts - production chart data for the kiosk display.
//!
//! Every request re-reads the uploaded spreadsheet, normalizes it and answers
//! with plot-ready series or the machine catalog.

mod catalog;
mod config;
mod dataset;
mod error;
mod layout;
mod normalizer;
mod series;
mod sheet_parser;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use catalog::CatalogEntry;
use config::{AppConfig, PipelineConfig};
use dataset::load_dataset_blocking;
use serde::{Deserialize, Serialize};
use series::{ChartSeries, DayWindow};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<PipelineConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "kiosk_charts=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    info!(
        "Chart source: {:?} (sheets tried: {:?})",
        config.pipeline.source_path, config.pipeline.sheet_candidates
    );

    let state = AppState {
        pipeline: Arc::new(config.pipeline),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chart-data", get(chart_data))
        .route("/api/series", get(all_series))
        .route("/api/machines", get(machines))
        .route("/api/axis", get(axis_range))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ChartDataQuery {
    kod: Option<String>,
    start_day: Option<u32>,
    days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChartDataResponse {
    series: Vec<ChartSeries>,
}

/// Windowed bar/line series for one machine, rounded for labeling.
async fn chart_data(
    State(state): State<AppState>,
    Query(query): Query<ChartDataQuery>,
) -> Json<ChartDataResponse> {
    let kod = query.kod.unwrap_or_else(|| state.pipeline.default_code.clone());
    let window = DayWindow::new(
        query.start_day.unwrap_or(1),
        query.days.unwrap_or(state.pipeline.window_days),
    );

    let dataset = load_dataset_blocking(state.pipeline.clone()).await;
    let series = series::windowed_series(&dataset.records, &kod, window, &state.pipeline);
    debug!("chart-data kod={} window={:?}: {} series", kod, window, series.len());

    Json(ChartDataResponse { series })
}

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    #[serde(default)]
    kod: String,
}

#[derive(Debug, Serialize)]
struct SeriesResponse {
    series: Vec<ChartSeries>,
    kod: String,
    nazwa: String,
}

/// All days for one machine at full precision, with axis assignment.
async fn all_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Json<SeriesResponse> {
    let kod = query.kod;
    if kod.is_empty() {
        return Json(SeriesResponse {
            series: Vec::new(),
            kod,
            nazwa: String::new(),
        });
    }

    let dataset = load_dataset_blocking(state.pipeline.clone()).await;
    let series = series::full_series(&dataset.records, &kod, &state.pipeline);
    let nazwa = series::display_name(&dataset.records, &kod);

    Json(SeriesResponse { series, kod, nazwa })
}

/// Machines available in the current upload.
async fn machines(State(state): State<AppState>) -> Json<Vec<CatalogEntry>> {
    let dataset = load_dataset_blocking(state.pipeline.clone()).await;
    Json(catalog::build_catalog(&dataset.records))
}

#[derive(Debug, Deserialize)]
struct AxisQuery {
    kod: Option<String>,
}

#[derive(Debug, Serialize)]
struct AxisResponse {
    kod: String,
    max: i64,
}

/// Shared Y-axis ceiling for a machine; defaults to the first catalog entry.
async fn axis_range(
    State(state): State<AppState>,
    Query(query): Query<AxisQuery>,
) -> Json<AxisResponse> {
    let dataset = load_dataset_blocking(state.pipeline.clone()).await;
    let kod = query
        .kod
        .or_else(|| catalog::default_entry(&dataset.records).map(|e| e.kod))
        .unwrap_or_default();
    let max = series::axis_ceiling(&dataset.records, &kod);

    Json(AxisResponse { kod, max })
}
