//! Types shared by the dispatch LP builder and its reporting step.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bill::DemandCharge;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch LP returned non-optimal status: {status}")]
    SolverFailure { status: String },
    #[error("dispatch horizon is empty")]
    EmptyHorizon,
}

/// Knobs that don't come from the bundle or the rate plan (spec.md §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub no_export: bool,
    pub interconnect_kw: Option<f64>,
    /// Fraction of `E_bundle` the battery starts the horizon at.
    pub initial_soc_frac: f64,
    /// Linear degradation proxy applied to every kWh discharged.
    pub degradation_usd_per_kwh: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            no_export: true,
            interconnect_kw: None,
            initial_soc_frac: 0.5,
            degradation_usd_per_kwh: 0.02,
        }
    }
}

/// One interval of the solved dispatch series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalDispatch {
    pub timestamp: DateTime<Tz>,
    pub base_kw: f64,
    pub charge_kw: f64,
    pub discharge_kw: f64,
    pub net_kw: f64,
    pub soc_kwh: f64,
}

/// The full result of solving the dispatch LP for one (bundle, scenario)
/// pair, already annualized is the caller's job — this is the raw solve
/// over the input horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub energy_usd: f64,
    pub demand_usd: f64,
    pub fixed_usd: f64,
    pub demand_charges: Vec<DemandCharge>,
    pub intervals: Vec<IntervalDispatch>,
    pub throughput_mwh: f64,
    pub month_peaks_kw: BTreeMap<String, f64>,
    pub day_peaks_kw: BTreeMap<String, f64>,
}

impl DispatchResult {
    pub fn total_usd(&self) -> f64 {
        self.energy_usd + self.demand_usd + self.fixed_usd
    }

    pub fn peak_kw(&self) -> f64 {
        self.intervals.iter().map(|i| i.net_kw).fold(f64::MIN, f64::max)
    }
}
