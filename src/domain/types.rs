//! Plain value types shared by every component: physical units, intervals,
//! and the normalized series the rest of the pipeline consumes.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ============================================================================
// Physical unit newtypes
// ============================================================================

/// Power in kilowatts. Positive = import from the grid, negative = export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Kw(pub f64);

impl Kw {
    pub fn as_kw(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Kw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} kW", self.0)
    }
}

impl Add for Kw {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Kw {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Energy in kilowatt-hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Kwh(pub f64);

impl Kwh {
    pub fn as_kwh(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Kwh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} kWh", self.0)
    }
}

impl Add for Kwh {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

/// Dollar amount; kept as a distinct newtype so capex/price/savings are
/// never accidentally mixed with kW/kWh quantities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Usd(pub f64);

impl Usd {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Usd {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

// ============================================================================
// Calendar keys and TOU classification
// ============================================================================

/// `YYYY-MM` key used to group demand components billed monthly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(pub String);

/// `YYYY-MM-DD` key used to group demand components billed daily.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(pub String);

impl MonthKey {
    pub fn from_datetime(dt: &DateTime<Tz>) -> Self {
        Self(format!("{:04}-{:02}", dt.year(), dt.month()))
    }
}

impl DayKey {
    pub fn from_datetime(dt: &DateTime<Tz>) -> Self {
        Self(format!("{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day()))
    }
}

/// Time-of-use bucket an interval falls into under a rate plan's TOU table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TouBucket {
    On,
    Part,
    Off,
}

/// Season used by the shipped commercial TOU plan (summer = months 6-9).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    pub fn of_month(month: u32) -> Self {
        if (6..=9).contains(&month) {
            Season::Summer
        } else {
            Season::Winter
        }
    }
}

// ============================================================================
// Raw and normalized intervals
// ============================================================================

/// A single raw interval reading: an instant and a demand in kW.
/// Immutable; positive kW is import, negative is net export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    pub timestamp: DateTime<Tz>,
    pub kw: f64,
}

/// A warning accumulated during normalization or bundle/offer evaluation.
/// Carried in the result envelope rather than aborting the request, per
/// the per-bundle error-handling design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineWarning {
    UnparseableTimestamp { raw: String },
    NetExportInterval { index: usize },
    GapNotFilled { index: usize, missing_count: usize },
    InfeasibleBundle { cap_kw: String, mode: String },
    SolverFailure { bundle_id: String, scenario: String },
    Unsellable { bundle_id: String },
    ResourceExhaustion { bundle_id: String },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableTimestamp { raw } => {
                write!(f, "dropped interval with unparseable timestamp: {raw}")
            }
            Self::NetExportInterval { index } => {
                write!(f, "interval {index} has negative (net export) demand")
            }
            Self::GapNotFilled { index, missing_count } => {
                write!(f, "gap of {missing_count} intervals at position {index} exceeds fill threshold")
            }
            Self::InfeasibleBundle { cap_kw, mode } => {
                write!(f, "no feasible bundle at cap {cap_kw} kW under preference mode {mode}")
            }
            Self::SolverFailure { bundle_id, scenario } => {
                write!(f, "dispatch LP did not reach optimal for bundle {bundle_id} / scenario {scenario}")
            }
            Self::Unsellable { bundle_id } => {
                write!(f, "bundle {bundle_id} has no sellable price under the payback ceiling")
            }
            Self::ResourceExhaustion { bundle_id } => {
                write!(f, "bundle {bundle_id} hit the unit cap before meeting its shave target")
            }
        }
    }
}

/// A raw interval enriched with derived calendar keys and detected cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedInterval {
    pub timestamp: DateTime<Tz>,
    pub kw: f64,
    pub month_key: MonthKey,
    pub day_key: DayKey,
}

/// The output of the interval normalizer: an ordered, gap-policed series
/// plus the detected cadence and any warnings raised along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSeries {
    pub intervals: Vec<NormalizedInterval>,
    pub cadence_hours: f64,
    pub warnings: Vec<EngineWarning>,
}

impl NormalizedSeries {
    /// Number of distinct calendar days spanned by the series; used to
    /// derive the annualization factor (365 / day_count).
    pub fn day_count(&self) -> usize {
        let mut days: Vec<&DayKey> = self.intervals.iter().map(|i| &i.day_key).collect();
        days.sort();
        days.dedup();
        days.len()
    }

    pub fn month_count(&self) -> usize {
        let mut months: Vec<&MonthKey> = self.intervals.iter().map(|i| &i.month_key).collect();
        months.sort();
        months.dedup();
        months.len()
    }

    pub fn peak_kw(&self) -> f64 {
        self.intervals.iter().map(|i| i.kw).fold(f64::MIN, f64::max)
    }

    /// p-th quantile of the load series (nearest-rank), used by the bundle
    /// generator to choose the deep-shave end of the cap ladder.
    pub fn quantile_kw(&self, p: f64) -> f64 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.intervals.iter().map(|i| i.kw).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = ((sorted.len() as f64 - 1.0) * p.clamp(0.0, 1.0)).round() as usize;
        sorted[idx]
    }
}

/// Resolve the local wall-clock hour for a timestamp already carrying its zone.
pub fn local_hour(dt: &DateTime<Tz>) -> u32 {
    dt.hour()
}

pub fn is_weekday(dt: &DateTime<Tz>) -> bool {
    use chrono::Weekday;
    !matches!(dt.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Parse a zone-aware timestamp from either RFC3339 or a naive
/// `YYYY-MM-DD HH:MM:SS` string interpreted in `zone`. Returns `None` on
/// anything unparseable so the caller can surface an
/// `EngineWarning::UnparseableTimestamp` and drop the row.
pub fn parse_timestamp(raw: &str, zone: Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&zone));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return zone.from_local_datetime(&naive).single();
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return zone.from_local_datetime(&naive).single();
    }
    None
}
