//! The result envelope (SPEC_FULL.md §3): what one orchestrator run
//! returns, regardless of whether it was invoked in-process or over HTTP.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bill::BillBreakdown;
use crate::config::AppConfig;
use crate::dispatch::DispatchResult;
use crate::domain::{Bundle, EngineWarning, Offer};

/// One bundle's evaluation against one scenario that survived every skip
/// condition in spec.md §4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedOffer {
    pub scenario_name: String,
    pub bundle: Bundle,
    pub baseline_annual_bill_usd: f64,
    pub baseline_peak_kw: f64,
    pub optimized_annual_bill_usd: f64,
    pub optimized_peak_kw: f64,
    pub annual_savings_usd: f64,
    pub offers: Vec<Offer>,
    pub dispatch: DispatchResult,
}

/// Per-scenario baseline, computed once and shared across every bundle
/// evaluated against that scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBaseline {
    pub scenario_name: String,
    pub bill: BillBreakdown,
    pub peak_kw: f64,
}

/// Everything one `POST /api/v1/sizing/runs` call (or in-process
/// orchestrator invocation) returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingRunResult {
    pub run_id: Uuid,
    pub config: AppConfig,
    pub baselines: Vec<ScenarioBaseline>,
    pub results: Vec<RankedOffer>,
    pub warnings: Vec<EngineWarning>,
    /// Set when the wall-clock deadline was hit before every bundle ×
    /// scenario pair could be evaluated (spec.md §5).
    pub truncated: bool,
}
