//! `POST /api/v1/sizing/runs` (SPEC_FULL.md §1, §6): the one HTTP entry
//! point into the orchestrator. A thin transport adapter — it performs no
//! optimization itself, matching the teacher's `api/optimize.rs` pattern of
//! handlers that just marshal requests into a controller/engine call.

use std::str::FromStr;

use axum::{extract::State, Json};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::api::{error::ApiError, AppState};
use crate::normalize::{self, NormalizeOptions, RawReading};
use crate::result::SizingRunResult;
use crate::{catalog, orchestrator};

#[derive(Debug, Deserialize)]
pub struct IntervalReading {
    pub timestamp: String,
    pub kw: f64,
}

/// Everything one sizing run needs beyond the server's loaded `AppConfig`
/// (SPEC_FULL.md §6, "Transport envelope"): the load series, the catalog
/// (inline CSV text, matching the file-path entry point's own parser), the
/// trailing-12-month site peak used by the overlay plan's eligibility gate,
/// and an optional override of the configured tariff rate code.
#[derive(Debug, Deserialize)]
pub struct SizingRunRequest {
    pub readings: Vec<IntervalReading>,
    pub zone: String,
    pub catalog_csv: String,
    pub trailing_12mo_peak_kw: f64,
    #[serde(default)]
    pub tariff_rate_code: Option<String>,
}

/// POST /api/v1/sizing/runs
pub async fn run_sizing(
    State(state): State<AppState>,
    Json(request): Json<SizingRunRequest>,
) -> Result<Json<SizingRunResult>, ApiError> {
    let zone = Tz::from_str(&request.zone).map_err(|_| ApiError::BadRequest(format!("unknown time zone: {}", request.zone)))?;

    let readings: Vec<RawReading> = request
        .readings
        .into_iter()
        .map(|r| RawReading {
            timestamp_raw: r.timestamp,
            kw: r.kw,
        })
        .collect();

    let series = normalize::normalize(&readings, NormalizeOptions { zone, ..Default::default() });

    let skus = catalog::load_catalog(request.catalog_csv.as_bytes()).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut config = (*state.config).clone();
    if let Some(code) = request.tariff_rate_code {
        config.sizing.tariff_rate_code = code;
    }

    let result = orchestrator::run(&config, &series, &skus, request.trailing_12mo_peak_kw);
    Ok(Json(result))
}
