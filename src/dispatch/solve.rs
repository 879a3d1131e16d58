//! Dispatch LP model builder (spec.md §4.5): turns one (bundle, scenario)
//! pair into a linear program over per-interval charge/discharge/SOC, plus
//! one peak-tracking auxiliary per applicable (demand component, group)
//! pair, and reports the solved bill components and dispatch series.

use std::collections::{BTreeMap, HashMap};

use good_lp::{constraint, variable, Expression, ProblemVariables, Variable};

use crate::bill::{group_key, tariff_intervals, DemandCharge};
use crate::domain::{Bundle, NormalizedSeries, RatePlan};

use super::backend::LpBackend;
use super::types::{DispatchConfig, DispatchError, DispatchResult, IntervalDispatch};

/// Solve the dispatch LP for one bundle against one scenario's rate plan
/// over the given load series, and report the solved bill plus series.
pub fn solve_dispatch(
    series: &NormalizedSeries,
    plan: &RatePlan,
    bundle: &Bundle,
    cfg: DispatchConfig,
    backend: &dyn LpBackend,
) -> Result<DispatchResult, DispatchError> {
    let intervals = tariff_intervals(series, plan);
    let n = intervals.len();
    if n == 0 {
        return Err(DispatchError::EmptyHorizon);
    }

    let dt = series.cadence_hours;
    let eta = bundle.weighted_rte.sqrt().clamp(0.01, 0.999);
    let p_bundle = bundle.total_power_kw;
    let e_bundle = bundle.total_energy_kwh;
    let dis_cap = cfg.interconnect_kw.map(|v| v.min(p_bundle)).unwrap_or(p_bundle);
    let initial_soc = (cfg.initial_soc_frac * e_bundle).clamp(0.0, e_bundle);

    let mut vars = ProblemVariables::new();
    let ch = vars.add_vector(variable().min(0.0).max(p_bundle), n);
    let dis = vars.add_vector(variable().min(0.0).max(dis_cap), n);
    let soc = vars.add_vector(variable().min(0.0).max(e_bundle), n + 1);

    // One auxiliary peak variable per (component, group) pair with at
    // least one applicable interval; components that never apply to this
    // series get none, per spec.md §4.5's "auxiliaries" clause.
    let mut demand_group_keys: Vec<Vec<String>> = Vec::with_capacity(plan.demand_components.len());
    for component in &plan.demand_components {
        let mut keys: Vec<String> = Vec::new();
        for interval in &intervals {
            if component.applicability.matches(interval) {
                let key = group_key(interval, component.grouping);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        demand_group_keys.push(keys);
    }

    let mut demand_vars: Vec<HashMap<String, Variable>> = Vec::with_capacity(plan.demand_components.len());
    for keys in &demand_group_keys {
        let mut map = HashMap::new();
        for key in keys {
            map.insert(key.clone(), vars.add(variable().min(0.0)));
        }
        demand_vars.push(map);
    }

    let mut constraints = Vec::new();
    constraints.push(constraint!(soc[0] == initial_soc));

    for t in 0..n {
        constraints.push(constraint!(soc[t + 1] == soc[t] + (eta * ch[t] - dis[t] / eta) * dt));
        if cfg.no_export {
            constraints.push(constraint!(dis[t] <= intervals[t].base_kw));
        }
    }

    if let Some(budget) = bundle.throughput_budget_kwh {
        let total_discharge_kwh: Expression = (0..n).map(|t| dis[t] * dt).sum();
        constraints.push(constraint!(total_discharge_kwh <= budget));
    }

    for (c_idx, component) in plan.demand_components.iter().enumerate() {
        for (t, interval) in intervals.iter().enumerate() {
            if !component.applicability.matches(interval) {
                continue;
            }
            let key = group_key(interval, component.grouping);
            let d = demand_vars[c_idx][&key];
            constraints.push(constraint!(interval.base_kw + ch[t] - dis[t] <= d));
        }
    }

    let rates: Vec<f64> = intervals.iter().map(|i| plan.energy_rates.rate_for(i.season, i.bucket)).collect();

    let energy_cost: Expression = (0..n).map(|t| rates[t] * dt * (ch[t] - dis[t])).sum();
    let degradation_cost: Expression = (0..n).map(|t| cfg.degradation_usd_per_kwh * dt * dis[t]).sum();

    let mut demand_terms: Vec<Expression> = Vec::new();
    for (c_idx, component) in plan.demand_components.iter().enumerate() {
        for key in &demand_group_keys[c_idx] {
            demand_terms.push(component.rate_usd_per_kw * demand_vars[c_idx][key]);
        }
    }
    let demand_cost: Expression = demand_terms.into_iter().sum();

    let objective = energy_cost + degradation_cost + demand_cost;

    let solution = backend.solve(vars, objective, constraints)?;

    let mut result_intervals = Vec::with_capacity(n);
    let mut month_peaks: BTreeMap<String, f64> = BTreeMap::new();
    let mut day_peaks: BTreeMap<String, f64> = BTreeMap::new();
    let mut energy_usd = 0.0;
    let mut throughput_kwh = 0.0;

    for (t, interval) in intervals.iter().enumerate() {
        let charge_kw = solution.value(ch[t]);
        let discharge_kw = solution.value(dis[t]);
        let soc_kwh = solution.value(soc[t]);
        let net_kw = interval.base_kw + charge_kw - discharge_kw;

        energy_usd += rates[t] * net_kw * dt;
        throughput_kwh += discharge_kw * dt;

        let normalized = &series.intervals[t];
        let month_entry = month_peaks.entry(normalized.month_key.0.clone()).or_insert(f64::MIN);
        if net_kw > *month_entry {
            *month_entry = net_kw;
        }
        let day_entry = day_peaks.entry(normalized.day_key.0.clone()).or_insert(f64::MIN);
        if net_kw > *day_entry {
            *day_entry = net_kw;
        }

        result_intervals.push(IntervalDispatch {
            timestamp: interval.timestamp,
            base_kw: interval.base_kw,
            charge_kw,
            discharge_kw,
            net_kw,
            soc_kwh,
        });
    }

    let mut demand_usd = 0.0;
    let mut demand_charges = Vec::new();
    for (c_idx, component) in plan.demand_components.iter().enumerate() {
        for key in &demand_group_keys[c_idx] {
            let peak_kw = solution.value(demand_vars[c_idx][key]);
            let cost = component.rate_usd_per_kw * peak_kw;
            demand_usd += cost;
            demand_charges.push(DemandCharge {
                component_name: component.name.clone(),
                group_key: key.clone(),
                peak_kw,
                cost_usd: cost,
            });
        }
    }

    let fixed_usd = plan.fixed_monthly_usd * series.month_count() as f64;

    Ok(DispatchResult {
        energy_usd,
        demand_usd,
        fixed_usd,
        demand_charges,
        intervals: result_intervals,
        throughput_mwh: throughput_kwh / 1000.0,
        month_peaks_kw: month_peaks,
        day_peaks_kw: day_peaks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{generate_bundles, BundleGeneratorConfig};
    use crate::dispatch::backend::MicroLpBackend;
    use crate::domain::{commercial_tou_plan, BatterySku, DayKey, MonthKey, NormalizedInterval, PriceTiers};
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn flat_series_with_noon_spike() -> NormalizedSeries {
        let zone: Tz = Tz::UTC;
        // 2024-07-15 is a Monday (summer, on-peak 15-20).
        let start = zone.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
        let mut intervals = Vec::new();
        for h in 0..24 {
            let kw = if (15..20).contains(&h) { 300.0 } else { 100.0 };
            let ts = start + chrono::Duration::hours(h as i64);
            intervals.push(NormalizedInterval {
                timestamp: ts,
                kw,
                month_key: MonthKey::from_datetime(&ts),
                day_key: DayKey::from_datetime(&ts),
            });
        }
        NormalizedSeries {
            intervals,
            cadence_hours: 1.0,
            warnings: vec![],
        }
    }

    fn sku() -> BatterySku {
        BatterySku {
            id: "unit".into(),
            manufacturer: "Acme".into(),
            nameplate_energy_kwh: 400.0,
            nameplate_power_kw: 200.0,
            c_rate: 0.5,
            rte: 0.9,
            warranty_years: 10.0,
            daily_cycle_cap: None,
            price_tiers: PriceTiers {
                tier_1_10: 100_000.0,
                tier_11_20: 95_000.0,
                tier_21_50: 90_000.0,
                tier_51_plus: 85_000.0,
            },
            active: true,
        }
    }

    #[test]
    fn solves_and_reports_consistent_totals() {
        let series = flat_series_with_noon_spike();
        let catalog = vec![sku()];
        let (bundles, _warnings) = generate_bundles(&series, &catalog, BundleGeneratorConfig::default());
        let bundle = bundles.first().expect("at least one feasible bundle for a 200kW spike");

        let plan = commercial_tou_plan(100.0);
        let cfg = DispatchConfig::default();
        let backend = MicroLpBackend;

        let result = solve_dispatch(&series, &plan, bundle, cfg, &backend).unwrap();

        assert!((result.total_usd() - (result.energy_usd + result.demand_usd + result.fixed_usd)).abs() < 1e-6);
        assert_eq!(result.intervals.len(), 24);
        for interval in &result.intervals {
            assert!(interval.charge_kw >= -1e-6);
            assert!(interval.discharge_kw >= -1e-6);
        }
    }

    #[test]
    fn no_export_keeps_discharge_within_base_load() {
        let series = flat_series_with_noon_spike();
        let catalog = vec![sku()];
        let (bundles, _) = generate_bundles(&series, &catalog, BundleGeneratorConfig::default());
        let bundle = bundles.first().unwrap();

        let plan = commercial_tou_plan(0.0);
        let cfg = DispatchConfig {
            no_export: true,
            ..Default::default()
        };
        let backend = MicroLpBackend;
        let result = solve_dispatch(&series, &plan, bundle, cfg, &backend).unwrap();

        for interval in &result.intervals {
            assert!(interval.discharge_kw <= interval.base_kw + 1e-6);
        }
    }
}
