//! Bundle generator (spec.md §4.3): turns a load curve into a diverse,
//! tractable set of candidate (power, energy) targets and synthesizes
//! integer SKU mixes that meet each target.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{BatterySku, Bundle, EngineWarning, NormalizedSeries};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct BundleGeneratorConfig {
    /// K: number of cap levels in the ladder between near-shave and deep-shave.
    #[validate(range(min = 1, max = 100))]
    pub candidate_caps: usize,
    /// V: tail-spike variants emitted per feasible recipe (0..V-1 extra units).
    #[validate(range(min = 1, max = 100))]
    pub variations_per_cap: usize,
    /// p in the P_base = quantile(L, p) deep-shave anchor.
    #[validate(range(min = 0.0, max = 1.0))]
    pub base_quantile: f64,
    /// Hard unit cap per recipe; exceeding it without meeting targets is a
    /// resource-exhaustion skip, not a failure of the whole request.
    pub max_units_per_recipe: u32,
}

impl Default for BundleGeneratorConfig {
    fn default() -> Self {
        Self {
            candidate_caps: 15,
            variations_per_cap: 8,
            base_quantile: 0.5,
            max_units_per_recipe: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreferenceMode {
    PowerFavored,
    EnergyFavored,
    Balanced,
}

const PREFERENCE_MODES: [PreferenceMode; 3] = [
    PreferenceMode::PowerFavored,
    PreferenceMode::EnergyFavored,
    PreferenceMode::Balanced,
];

impl PreferenceMode {
    fn label(&self) -> &'static str {
        match self {
            PreferenceMode::PowerFavored => "power-favored",
            PreferenceMode::EnergyFavored => "energy-favored",
            PreferenceMode::Balanced => "balanced",
        }
    }

    /// Per-unit score (lower is better): cost / power, cost / energy, or
    /// the 50/50 average of the two.
    fn score(&self, sku: &BatterySku) -> f64 {
        let unit_price = sku.price_for_qty(1).as_f64();
        let power_score = unit_price / sku.continuous_power_kw().max(1e-9);
        let energy_score = unit_price / sku.nameplate_energy_kwh.max(1e-9);
        match self {
            PreferenceMode::PowerFavored => power_score,
            PreferenceMode::EnergyFavored => energy_score,
            PreferenceMode::Balanced => 0.5 * power_score + 0.5 * energy_score,
        }
    }
}

/// P_peak and P_base, and the resulting cap ladder (spec.md §4.3).
/// Collapses to a single level when the load is flat (P_base >= P_peak).
fn cap_ladder(series: &NormalizedSeries, cfg: BundleGeneratorConfig) -> Vec<f64> {
    let p_peak = series.peak_kw();
    let p_base = series.quantile_kw(cfg.base_quantile);

    if p_base >= p_peak || cfg.candidate_caps <= 1 {
        return vec![p_peak];
    }

    let k = cfg.candidate_caps;
    (0..k)
        .map(|i| {
            let frac = i as f64 / (k - 1) as f64;
            p_peak - frac * (p_peak - p_base)
        })
        .collect()
}

fn power_need(p_peak: f64, cap_kw: f64) -> f64 {
    (p_peak - cap_kw).max(0.0)
}

/// Worst-day energy needed to shave every interval above `cap_kw` down to
/// the cap, maximized over calendar days.
fn energy_need(series: &NormalizedSeries, cap_kw: f64) -> f64 {
    let mut by_day: BTreeMap<&str, f64> = BTreeMap::new();
    for interval in &series.intervals {
        let excess = (interval.kw - cap_kw).max(0.0) * series.cadence_hours;
        *by_day.entry(interval.day_key.0.as_str()).or_insert(0.0) += excess;
    }
    by_day.values().cloned().fold(0.0, f64::max)
}

/// Round-robin greedy recipe builder: cycles through SKUs sorted by score,
/// adding one unit per step, until both targets are met or the unit cap is
/// hit.
fn build_recipe(
    skus: &[&BatterySku],
    mode: PreferenceMode,
    power_need_kw: f64,
    energy_need_kwh: f64,
    max_units: u32,
) -> Option<BTreeMap<String, u32>> {
    if skus.is_empty() {
        return None;
    }
    let mut sorted: Vec<&BatterySku> = skus.to_vec();
    sorted.sort_by(|a, b| mode.score(a).partial_cmp(&mode.score(b)).unwrap());

    let mut qty: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_power = 0.0;
    let mut total_energy = 0.0;
    let mut units_added: u32 = 0;

    if power_need_kw <= 0.0 && energy_need_kwh <= 0.0 {
        return None;
    }

    let mut idx = 0usize;
    loop {
        if total_power >= power_need_kw && total_energy >= energy_need_kwh {
            return Some(qty);
        }
        if units_added >= max_units {
            return None;
        }
        let sku = sorted[idx % sorted.len()];
        *qty.entry(sku.id.clone()).or_insert(0) += 1;
        total_power += sku.continuous_power_kw();
        total_energy += sku.nameplate_energy_kwh;
        units_added += 1;
        idx += 1;
    }
}

/// Add `extra` units of the globally cheapest (tier-1 price) active SKU to
/// absorb long-tail spikes. Tier pricing is recomputed on the final
/// quantity (see SPEC_FULL.md / DESIGN.md for why).
fn add_cheapest_units(base: &BTreeMap<String, u32>, cheapest_id: &str, extra: u32) -> BTreeMap<String, u32> {
    let mut qty = base.clone();
    if extra > 0 {
        *qty.entry(cheapest_id.to_string()).or_insert(0) += extra;
    }
    qty
}

/// Generate the candidate bundle set for a load series against an active
/// SKU catalog.
pub fn generate_bundles(
    series: &NormalizedSeries,
    catalog: &[BatterySku],
    cfg: BundleGeneratorConfig,
) -> (Vec<Bundle>, Vec<EngineWarning>) {
    let active: Vec<&BatterySku> = catalog.iter().filter(|s| s.active).collect();
    let mut warnings = Vec::new();
    if active.is_empty() {
        return (Vec::new(), warnings);
    }

    let cheapest_id = active
        .iter()
        .min_by(|a, b| a.price_for_qty(1).as_f64().partial_cmp(&b.price_for_qty(1).as_f64()).unwrap())
        .map(|s| s.id.clone())
        .unwrap();

    let p_peak = series.peak_kw();
    let day_count = series.day_count().max(1);
    let caps = cap_ladder(series, cfg);

    let mut recipes: Vec<BTreeMap<String, u32>> = Vec::new();

    for cap in caps {
        let p_need = power_need(p_peak, cap);
        let e_need = energy_need(series, cap);

        if p_need <= 0.0 && e_need <= 0.0 {
            continue;
        }

        for mode in PREFERENCE_MODES {
            match build_recipe(&active, mode, p_need, e_need, cfg.max_units_per_recipe) {
                Some(recipe) => {
                    for v in 0..cfg.variations_per_cap.max(1) {
                        recipes.push(add_cheapest_units(&recipe, &cheapest_id, v as u32));
                    }
                }
                None => warnings.push(EngineWarning::InfeasibleBundle {
                    cap_kw: format!("{cap:.1}"),
                    mode: mode.label().to_string(),
                }),
            }
        }
    }

    let mut seen: std::collections::HashSet<Vec<(String, u32)>> = std::collections::HashSet::new();
    let mut bundles: Vec<Bundle> = Vec::new();
    for recipe in recipes {
        let bundle = Bundle::from_quantities(recipe, catalog, day_count);
        let key = bundle.dedup_key();
        if seen.insert(key) {
            bundles.push(bundle);
        }
    }

    bundles.sort_by(|a, b| {
        a.capex_usd
            .partial_cmp(&b.capex_usd)
            .unwrap()
            .then(a.total_power_kw.partial_cmp(&b.total_power_kw).unwrap())
            .then(a.total_energy_kwh.partial_cmp(&b.total_energy_kwh).unwrap())
    });

    (bundles, warnings)
}
