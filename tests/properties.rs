//! Property tests for the dispatch LP invariants (SPEC_FULL.md §8, items
//! 1-3): non-negativity, SOC conservation, and no-export.

mod common;

use bess_offer_engine::dispatch::{solve_dispatch, DispatchConfig, MicroLpBackend};
use bess_offer_engine::domain::{commercial_tou_plan, Bundle};
use chrono_tz::Tz;
use proptest::prelude::*;
use std::collections::BTreeMap;

use common::{sku, spiky_series};

fn bundle_for(power_kw: f64, energy_kwh: f64, rte: f64) -> Bundle {
    let catalog = vec![sku("unit", power_kw, energy_kwh, 1.0, rte, 1.0)];
    let mut qty = BTreeMap::new();
    qty.insert("unit".to_string(), 1u32);
    Bundle::from_quantities(qty, &catalog, 1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// For arbitrary spike heights and bundle sizes, every solved interval
    /// keeps ch/dis non-negative, soc within [0, E_bundle], and SOC
    /// conservation holds to solver tolerance.
    #[test]
    fn dispatch_respects_non_negativity_and_soc_conservation(
        base_kw in 20.0..200.0f64,
        spike_kw in 200.0..800.0f64,
        power_kw in 20.0..300.0f64,
        energy_kwh in 20.0..400.0f64,
        rte in 0.6..0.99f64,
    ) {
        let zone: Tz = Tz::UTC;
        let series = spiky_series(base_kw, 17, spike_kw, zone);
        let bundle = bundle_for(power_kw, energy_kwh, rte);
        let plan = commercial_tou_plan(0.0);
        let backend = MicroLpBackend;
        let cfg = DispatchConfig::default();

        let Ok(result) = solve_dispatch(&series, &plan, &bundle, cfg, &backend) else {
            // Solver failure is a per-bundle skip elsewhere in the pipeline,
            // not a property violation; nothing to check in that case.
            return Ok(());
        };

        let eta = bundle.weighted_rte.sqrt().clamp(0.01, 0.999);
        let dt = series.cadence_hours;
        let e_bundle = bundle.total_energy_kwh;

        let initial_soc = (cfg.initial_soc_frac * e_bundle).clamp(0.0, e_bundle);
        prop_assert!((result.intervals[0].soc_kwh - initial_soc).abs() < 1e-3);

        for interval in &result.intervals {
            prop_assert!(interval.charge_kw >= -1e-6);
            prop_assert!(interval.discharge_kw >= -1e-6);
            prop_assert!(interval.soc_kwh >= -1e-6);
            prop_assert!(interval.soc_kwh <= e_bundle + 1e-6);
        }

        for pair in result.intervals.windows(2) {
            let predicted_next = pair[0].soc_kwh + (eta * pair[0].charge_kw - pair[0].discharge_kw / eta) * dt;
            prop_assert!((pair[1].soc_kwh - predicted_next).abs() < 1e-3);
        }
    }

    /// With `no_export` on, discharge never exceeds base load, for any
    /// spike height and bundle power/energy combination.
    #[test]
    fn no_export_bounds_discharge_by_base_load(
        base_kw in 20.0..200.0f64,
        spike_kw in 200.0..800.0f64,
        power_kw in 20.0..300.0f64,
        energy_kwh in 20.0..400.0f64,
    ) {
        let zone: Tz = Tz::UTC;
        let series = spiky_series(base_kw, 17, spike_kw, zone);
        let bundle = bundle_for(power_kw, energy_kwh, 0.9);
        let plan = commercial_tou_plan(0.0);
        let backend = MicroLpBackend;
        let cfg = DispatchConfig { no_export: true, ..Default::default() };

        let Ok(result) = solve_dispatch(&series, &plan, &bundle, cfg, &backend) else {
            return Ok(());
        };

        for interval in &result.intervals {
            prop_assert!(interval.discharge_kw <= interval.base_kw + 1e-6);
        }
    }
}

/// Monotone savings (SPEC_FULL.md §8, item 4): holding power fixed,
/// doubling a bundle's energy never makes the optimized bill worse.
#[test]
fn increasing_bundle_energy_never_increases_the_optimized_bill() {
    let zone: Tz = Tz::UTC;
    let series = spiky_series(100.0, 17, 500.0, zone);
    let plan = commercial_tou_plan(0.0);
    let backend = MicroLpBackend;
    let cfg = DispatchConfig::default();

    let small = bundle_for(200.0, 100.0, 0.9);
    let large = bundle_for(200.0, 400.0, 0.9);

    let small_bill = solve_dispatch(&series, &plan, &small, cfg, &backend).unwrap().total_usd();
    let large_bill = solve_dispatch(&series, &plan, &large, cfg, &backend).unwrap().total_usd();

    assert!(large_bill <= small_bill + 1e-6);
}
