//! Orchestrator (spec.md §4.7): the pipeline that turns a load series and a
//! catalog into a ranked list of priced bundle offers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use uuid::Uuid;

use crate::bill::compute_bill;
use crate::bundler::generate_bundles;
use crate::catalog::total_capex;
use crate::config::AppConfig;
use crate::dispatch::{solve_dispatch, DispatchError, MicroLpBackend};
use crate::domain::{commercial_tou_plan, overlay_plan, Bundle, BatterySku, EngineWarning, NormalizedSeries, RatePlan};
use crate::pricing::price_offers;
use crate::result::{RankedOffer, ScenarioBaseline, SizingRunResult};

/// Build the set of tariff scenarios selected by a rate code (spec.md §6,
/// "tariff_rate_code ... selects the set of scenarios"). Only two shipped
/// rate plans exist today; the code names which of them apply.
fn scenario_set(rate_code: &str, trailing_12mo_peak_kw: f64) -> Vec<RatePlan> {
    match rate_code {
        "overlay" => vec![overlay_plan(trailing_12mo_peak_kw, 0.0)],
        "standard_with_overlay" => vec![commercial_tou_plan(0.0), overlay_plan(trailing_12mo_peak_kw, 0.0)],
        _ => vec![commercial_tou_plan(0.0)],
    }
}

fn bundle_id(bundle: &Bundle) -> String {
    bundle
        .quantities
        .iter()
        .map(|(id, qty)| format!("{id}:{qty}"))
        .collect::<Vec<_>>()
        .join(",")
}

struct EvaluatedScenario {
    plan: RatePlan,
    baseline_annual_bill_usd: f64,
    baseline_peak_kw: f64,
}

/// Evaluate every bundle against every scenario and return a ranked,
/// possibly-truncated result envelope.
pub fn run(config: &AppConfig, series: &NormalizedSeries, catalog: &[BatterySku], trailing_12mo_peak_kw: f64) -> SizingRunResult {
    let mut warnings = series.warnings.clone();

    let day_count = series.day_count().max(1);
    let annualization_factor = 365.0 / day_count as f64;

    let (bundles, bundle_warnings) = generate_bundles(series, catalog, config.sizing.bundles);
    warnings.extend(bundle_warnings);

    let scenarios: Vec<EvaluatedScenario> = scenario_set(&config.sizing.tariff_rate_code, trailing_12mo_peak_kw)
        .into_iter()
        .map(|plan| {
            let bill = compute_bill(series, &plan);
            EvaluatedScenario {
                baseline_annual_bill_usd: bill.total_usd() * annualization_factor,
                baseline_peak_kw: series.peak_kw(),
                plan,
            }
        })
        .collect();

    let baselines: Vec<ScenarioBaseline> = scenarios
        .iter()
        .map(|s| ScenarioBaseline {
            scenario_name: s.plan.name.clone(),
            bill: compute_bill(series, &s.plan),
            peak_kw: s.baseline_peak_kw,
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(config.solver.deadline_secs);
    let truncated = AtomicBool::new(false);
    let backend = MicroLpBackend;

    let pairs: Vec<(usize, usize)> = (0..scenarios.len())
        .flat_map(|s_idx| (0..bundles.len()).map(move |b_idx| (s_idx, b_idx)))
        .collect();

    let evaluated: Vec<(Option<RankedOffer>, Vec<EngineWarning>)> = pairs
        .par_iter()
        .map(|&(s_idx, b_idx)| {
            if Instant::now() >= deadline {
                truncated.store(true, Ordering::Relaxed);
                return (None, Vec::new());
            }

            let scenario = &scenarios[s_idx];
            let bundle = &bundles[b_idx];
            let mut local_warnings = Vec::new();

            if !scenario.plan.eligibility.is_eligible(bundle.total_power_kw) {
                return (None, local_warnings);
            }

            let dispatch = match solve_dispatch(series, &scenario.plan, bundle, config.solver.dispatch, &backend) {
                Ok(result) => result,
                Err(DispatchError::SolverFailure { .. }) => {
                    local_warnings.push(EngineWarning::SolverFailure {
                        bundle_id: bundle_id(bundle),
                        scenario: scenario.plan.name.clone(),
                    });
                    return (None, local_warnings);
                }
                Err(DispatchError::EmptyHorizon) => return (None, local_warnings),
            };

            let optimized_annual_bill_usd = dispatch.total_usd() * annualization_factor;
            let annual_savings_usd = scenario.baseline_annual_bill_usd - optimized_annual_bill_usd;
            if annual_savings_usd <= 0.0 {
                return (None, local_warnings);
            }

            let effective_capex =
                total_capex(bundle.capex_usd, config.sizing.install_adder_frac, config.sizing.fixed_soft_costs_usd);
            let unit_count: u32 = bundle.quantities.values().sum();
            let offers = price_offers(effective_capex, annual_savings_usd, unit_count, config.sizing.pricing);
            if offers.is_empty() {
                local_warnings.push(EngineWarning::Unsellable { bundle_id: bundle_id(bundle) });
                return (None, local_warnings);
            }

            let optimized_peak_kw = dispatch.peak_kw();
            let ranked = RankedOffer {
                scenario_name: scenario.plan.name.clone(),
                bundle: bundle.clone(),
                baseline_annual_bill_usd: scenario.baseline_annual_bill_usd,
                baseline_peak_kw: scenario.baseline_peak_kw,
                optimized_annual_bill_usd,
                optimized_peak_kw,
                annual_savings_usd,
                offers,
                dispatch,
            };
            (Some(ranked), local_warnings)
        })
        .collect();

    let mut results: Vec<RankedOffer> = Vec::new();
    for (ranked, local_warnings) in evaluated {
        warnings.extend(local_warnings);
        if let Some(r) = ranked {
            results.push(r);
        }
    }

    results.sort_by(|a, b| {
        let a_tsv = a.offers.iter().find_map(|o| o.expected_total_site_value_usd).unwrap_or(0.0);
        let b_tsv = b.offers.iter().find_map(|o| o.expected_total_site_value_usd).unwrap_or(0.0);
        let a_margin = a.offers.iter().map(|o| o.gross_margin_usd).fold(f64::MIN, f64::max);
        let b_margin = b.offers.iter().map(|o| o.gross_margin_usd).fold(f64::MIN, f64::max);
        b_tsv.partial_cmp(&a_tsv).unwrap().then(b_margin.partial_cmp(&a_margin).unwrap())
    });
    results.truncate(config.sizing.top_n);

    SizingRunResult {
        run_id: Uuid::new_v4(),
        config: config.clone(),
        baselines,
        results,
        warnings,
        truncated: truncated.load(Ordering::Relaxed),
    }
}
