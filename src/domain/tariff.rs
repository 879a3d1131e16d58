//! Rate plans reimplemented as tagged data rather than callable rate
//! functions and predicates (REDESIGN FLAGS, spec.md §9): the energy rate
//! is a table keyed by (season, TOU bucket), and demand-component
//! applicability is a small predicate struct the evaluator interprets
//! directly. This keeps rate plans serializable and deterministic instead
//! of carrying function pointers.

use serde::{Deserialize, Serialize};

use super::types::{is_weekday, local_hour, Season, TouBucket};
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

/// A normalized interval enriched with its TOU bucket under a specific plan.
#[derive(Debug, Clone)]
pub struct TariffInterval {
    pub timestamp: DateTime<Tz>,
    pub base_kw: f64,
    pub base_kwh: f64,
    pub bucket: TouBucket,
    pub season: Season,
}

/// One entry of an hour-window applicability predicate: `[start, end)` in
/// local wall-clock hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl HourWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            // wraps past midnight
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Data-only applicability predicate for a demand component. Every field is
/// optional/`Any`-by-default so a component can be as narrow or as broad as
/// the tariff requires without a function pointer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Applicability {
    pub season: Option<Season>,
    pub bucket: Option<TouBucket>,
    pub hour_windows: Vec<HourWindow>,
    pub weekday_only: bool,
    pub exclude_hour_windows: Vec<HourWindow>,
}

impl Applicability {
    pub fn matches(&self, interval: &TariffInterval) -> bool {
        if let Some(season) = self.season {
            if season != interval.season {
                return false;
            }
        }
        if let Some(bucket) = self.bucket {
            if bucket != interval.bucket {
                return false;
            }
        }
        if self.weekday_only && !is_weekday(&interval.timestamp) {
            return false;
        }
        let hour = local_hour(&interval.timestamp);
        if !self.hour_windows.is_empty() && !self.hour_windows.iter().any(|w| w.contains(hour)) {
            return false;
        }
        if self.exclude_hour_windows.iter().any(|w| w.contains(hour)) {
            return false;
        }
        true
    }
}

/// Whether a demand component's peak is tracked per calendar month or per
/// calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DemandGrouping {
    Monthly,
    Daily,
}

/// A billable demand term: `rate` dollars per kW of the peak demand over
/// `grouping`, restricted to intervals matching `applicability`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandComponent {
    pub name: String,
    pub grouping: DemandGrouping,
    pub rate_usd_per_kw: f64,
    pub applicability: Applicability,
}

/// Energy rate table keyed by (season, TOU bucket), replacing a callable
/// rate function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyRateTable {
    pub summer_on: f64,
    pub summer_part: f64,
    pub summer_off: f64,
    pub winter_on: f64,
    pub winter_part: f64,
    pub winter_off: f64,
}

impl EnergyRateTable {
    pub fn rate_for(&self, season: Season, bucket: TouBucket) -> f64 {
        match (season, bucket) {
            (Season::Summer, TouBucket::On) => self.summer_on,
            (Season::Summer, TouBucket::Part) => self.summer_part,
            (Season::Summer, TouBucket::Off) => self.summer_off,
            (Season::Winter, TouBucket::On) => self.winter_on,
            (Season::Winter, TouBucket::Part) => self.winter_part,
            (Season::Winter, TouBucket::Off) => self.winter_off,
        }
    }
}

/// Eligibility gate evaluated against a candidate bundle before it is
/// allowed to be scored against a scenario (e.g. the overlay plan's
/// peak-share rule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EligibilityRule {
    None,
    /// Bundle total power must be >= `share` of the trailing-12-month site peak.
    MinPeakShare { share: f64, trailing_12mo_peak_kw: f64 },
}

impl EligibilityRule {
    pub fn is_eligible(&self, bundle_power_kw: f64) -> bool {
        match self {
            EligibilityRule::None => true,
            EligibilityRule::MinPeakShare { share, trailing_12mo_peak_kw } => {
                bundle_power_kw >= share * trailing_12mo_peak_kw
            }
        }
    }
}

/// A rate plan: name, TOU-bucketing rules (via `classify`), the energy rate
/// table, an ordered list of demand components, and an optional fixed
/// monthly charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatePlan {
    pub name: String,
    pub energy_rates: EnergyRateTable,
    pub demand_components: Vec<DemandComponent>,
    pub fixed_monthly_usd: f64,
    pub eligibility: EligibilityRule,
    /// TOU windows, summer and winter, weekday-only (weekends are always off).
    pub tou_rules: TouRules,
}

/// Weekday hour windows used to classify an interval's TOU bucket. Weekends
/// are always off-peak regardless of these windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouRules {
    pub summer_on: Vec<HourWindow>,
    pub summer_part: Vec<HourWindow>,
    pub winter_on: Vec<HourWindow>,
    pub winter_part: Vec<HourWindow>,
}

impl RatePlan {
    pub fn classify(&self, timestamp: &DateTime<Tz>) -> (Season, TouBucket) {
        let season = Season::of_month(timestamp.month());
        if !is_weekday(timestamp) {
            return (season, TouBucket::Off);
        }
        let hour = local_hour(timestamp);
        let (on, part) = match season {
            Season::Summer => (&self.tou_rules.summer_on, &self.tou_rules.summer_part),
            Season::Winter => (&self.tou_rules.winter_on, &self.tou_rules.winter_part),
        };
        if on.iter().any(|w| w.contains(hour)) {
            (season, TouBucket::On)
        } else if part.iter().any(|w| w.contains(hour)) {
            (season, TouBucket::Part)
        } else {
            (season, TouBucket::Off)
        }
    }

    pub fn energy_rate_for(&self, timestamp: &DateTime<Tz>) -> f64 {
        let (season, bucket) = self.classify(timestamp);
        self.energy_rates.rate_for(season, bucket)
    }
}

/// The shipped commercial TOU plan: summer months 6-9, weekday on-peak
/// 15-20, part-peak 10-15 and 20-22; winter weekday on-peak 15-20; weekends
/// always off. Five demand components, as specified.
pub fn commercial_tou_plan(fixed_monthly_usd: f64) -> RatePlan {
    RatePlan {
        name: "commercial-tou".to_string(),
        energy_rates: EnergyRateTable {
            summer_on: 0.42,
            summer_part: 0.28,
            summer_off: 0.14,
            winter_on: 0.30,
            winter_part: 0.20,
            winter_off: 0.12,
        },
        tou_rules: TouRules {
            summer_on: vec![HourWindow { start_hour: 15, end_hour: 20 }],
            summer_part: vec![
                HourWindow { start_hour: 10, end_hour: 15 },
                HourWindow { start_hour: 20, end_hour: 22 },
            ],
            winter_on: vec![HourWindow { start_hour: 15, end_hour: 20 }],
            winter_part: vec![],
        },
        demand_components: vec![
            DemandComponent {
                name: "summer-all-hours".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 6.0,
                applicability: Applicability {
                    season: Some(Season::Summer),
                    ..Default::default()
                },
            },
            DemandComponent {
                name: "winter-all-hours".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 4.0,
                applicability: Applicability {
                    season: Some(Season::Winter),
                    ..Default::default()
                },
            },
            DemandComponent {
                name: "summer-on-peak".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 18.0,
                applicability: Applicability {
                    season: Some(Season::Summer),
                    bucket: Some(TouBucket::On),
                    weekday_only: true,
                    ..Default::default()
                },
            },
            DemandComponent {
                name: "summer-part-peak".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 9.0,
                applicability: Applicability {
                    season: Some(Season::Summer),
                    bucket: Some(TouBucket::Part),
                    weekday_only: true,
                    ..Default::default()
                },
            },
            DemandComponent {
                name: "winter-on-peak".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 12.0,
                applicability: Applicability {
                    season: Some(Season::Winter),
                    bucket: Some(TouBucket::On),
                    weekday_only: true,
                    ..Default::default()
                },
            },
        ],
        fixed_monthly_usd,
        eligibility: EligibilityRule::None,
    }
}

/// The overlay (peak-share discount) plan: daily on-peak (16-21) and
/// part-peak (14-16, 21-23) maxima, a monthly all-hours max, and a monthly
/// max restricted to hours outside 09-14 local. Gated on the bundle
/// covering at least 10% of the trailing-12-month site peak.
///
/// Both monthly components (all-hours and the 09-14 exclusion) apply
/// simultaneously and are billed additively — see DESIGN.md for why this
/// resolves the source's ambiguity between the two.
pub fn overlay_plan(trailing_12mo_peak_kw: f64, fixed_monthly_usd: f64) -> RatePlan {
    RatePlan {
        name: "overlay-peak-share".to_string(),
        energy_rates: EnergyRateTable {
            summer_on: 0.38,
            summer_part: 0.24,
            summer_off: 0.13,
            winter_on: 0.27,
            winter_part: 0.19,
            winter_off: 0.11,
        },
        tou_rules: TouRules {
            summer_on: vec![HourWindow { start_hour: 16, end_hour: 21 }],
            summer_part: vec![
                HourWindow { start_hour: 14, end_hour: 16 },
                HourWindow { start_hour: 21, end_hour: 23 },
            ],
            winter_on: vec![HourWindow { start_hour: 16, end_hour: 21 }],
            winter_part: vec![
                HourWindow { start_hour: 14, end_hour: 16 },
                HourWindow { start_hour: 21, end_hour: 23 },
            ],
        },
        demand_components: vec![
            DemandComponent {
                name: "daily-on-peak".to_string(),
                grouping: DemandGrouping::Daily,
                rate_usd_per_kw: 3.5,
                applicability: Applicability {
                    hour_windows: vec![HourWindow { start_hour: 16, end_hour: 21 }],
                    ..Default::default()
                },
            },
            DemandComponent {
                name: "daily-part-peak".to_string(),
                grouping: DemandGrouping::Daily,
                rate_usd_per_kw: 1.5,
                applicability: Applicability {
                    hour_windows: vec![
                        HourWindow { start_hour: 14, end_hour: 16 },
                        HourWindow { start_hour: 21, end_hour: 23 },
                    ],
                    ..Default::default()
                },
            },
            DemandComponent {
                name: "monthly-all-hours".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 5.0,
                applicability: Applicability::default(),
            },
            DemandComponent {
                name: "monthly-outside-offpeak-window".to_string(),
                grouping: DemandGrouping::Monthly,
                rate_usd_per_kw: 2.0,
                applicability: Applicability {
                    exclude_hour_windows: vec![HourWindow { start_hour: 9, end_hour: 14 }],
                    ..Default::default()
                },
            },
        ],
        fixed_monthly_usd,
        eligibility: EligibilityRule::MinPeakShare {
            share: 0.10,
            trailing_12mo_peak_kw,
        },
    }
}
