//! A bundle: an integer multiset of battery SKUs treated as one installation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::sku::BatterySku;
use super::types::{Kw, Kwh, Usd};

/// A mapping from SKU id to positive integer quantity, plus the derived
/// aggregates the rest of the pipeline needs. Constructed once by the
/// bundle generator and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    /// SKU id -> quantity. Every value is > 0 by construction (`BundleBuilder::build`).
    pub quantities: BTreeMap<String, u32>,
    pub total_power_kw: f64,
    pub total_energy_kwh: f64,
    /// Energy-weighted round-trip efficiency across every unit in the bundle.
    pub weighted_rte: f64,
    pub capex_usd: f64,
    /// kWh of cumulative discharge over the horizon, set only when every
    /// SKU in the bundle declares a daily-cycle cap.
    pub throughput_budget_kwh: Option<f64>,
}

impl Bundle {
    pub fn total_power(&self) -> Kw {
        Kw(self.total_power_kw)
    }

    pub fn total_energy(&self) -> Kwh {
        Kwh(self.total_energy_kwh)
    }

    pub fn capex(&self) -> Usd {
        Usd(self.capex_usd)
    }

    /// Stable sort key for bundle dedup: the sorted (sku_id, qty) tuples.
    pub fn dedup_key(&self) -> Vec<(String, u32)> {
        self.quantities.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Build a bundle's derived aggregates from a resolved quantity map.
    /// `day_count` is the number of distinct days in the horizon, used to
    /// project the per-day cycle cap into a horizon-wide throughput budget.
    pub fn from_quantities(
        quantities: BTreeMap<String, u32>,
        catalog: &[BatterySku],
        day_count: usize,
    ) -> Self {
        let lookup = |id: &str| catalog.iter().find(|s| s.id == id);

        let mut total_power_kw = 0.0;
        let mut total_energy_kwh = 0.0;
        let mut weighted_rte_num = 0.0;
        let mut capex_usd = 0.0;
        let mut all_have_cycle_cap = !quantities.is_empty();
        let mut throughput_kwh = 0.0;

        for (id, &qty) in &quantities {
            let Some(s) = lookup(id) else { continue };
            total_power_kw += s.continuous_power_kw() * qty as f64;
            total_energy_kwh += s.nameplate_energy_kwh * qty as f64;
            weighted_rte_num += s.rte * s.nameplate_energy_kwh * qty as f64;
            capex_usd += s.price_for_qty(qty).as_f64() * qty as f64;

            match s.daily_cycle_cap {
                Some(cap) => {
                    throughput_kwh += qty as f64 * cap * s.nameplate_energy_kwh * day_count as f64;
                }
                None => all_have_cycle_cap = false,
            }
        }

        let weighted_rte = if total_energy_kwh > 0.0 {
            weighted_rte_num / total_energy_kwh
        } else {
            0.0
        };

        Bundle {
            quantities,
            total_power_kw,
            total_energy_kwh,
            weighted_rte,
            capex_usd,
            throughput_budget_kwh: all_have_cycle_cap.then_some(throughput_kwh),
        }
    }
}
