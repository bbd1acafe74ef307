//! Load → resolve → normalize, with the degrade-to-empty policy.
//!
//! The kiosk runs unattended, so a missing, half-written or malformed upload
//! must render as "no data" instead of failing the request. Each stage
//! reports its own `PipelineError`; this is the only place that swallows them.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::layout::resolve_layout;
use crate::normalizer::{normalize, LongRecord};
use crate::sheet_parser::load_grid;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The normalized dataset for the current upload. Recomputed per request.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<LongRecord>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Run the full pipeline, surfacing the first stage failure.
pub fn try_load_dataset(cfg: &PipelineConfig) -> Result<Dataset, PipelineError> {
    let grid = load_grid(&cfg.source_path, &cfg.sheet_candidates)?;
    let layout = resolve_layout(&grid, cfg.header_row)?;
    let records = normalize(&grid, &layout, cfg.header_row);
    Ok(Dataset { records })
}

/// Run the full pipeline; any failure is logged and yields an empty dataset.
pub fn load_dataset(cfg: &PipelineConfig) -> Dataset {
    match try_load_dataset(cfg) {
        Ok(dataset) if dataset.is_empty() => {
            warn!("No usable values in {:?}", cfg.source_path);
            dataset
        }
        Ok(dataset) => {
            info!(
                "Loaded {} records from {:?}",
                dataset.records.len(),
                cfg.source_path
            );
            dataset
        }
        Err(e) if e.is_missing_source() => {
            warn!("{}; serving empty dataset", e);
            Dataset::default()
        }
        Err(e) => {
            error!("Failed to load {:?}: {}; serving empty dataset", cfg.source_path, e);
            Dataset::default()
        }
    }
}

/// [`load_dataset`] on the blocking pool, for use from async handlers.
pub async fn load_dataset_blocking(cfg: Arc<PipelineConfig>) -> Dataset {
    match tokio::task::spawn_blocking(move || load_dataset(&cfg)).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Dataset load task failed: {}; serving empty dataset", e);
            Dataset::default()
        }
    }
}
