//! Shared fixtures for the end-to-end scenario tests (S1-S6 of
//! SPEC_FULL.md §8) and the property tests.

use bess_offer_engine::bundler::BundleGeneratorConfig;
use bess_offer_engine::config::{AppConfig, DispatchSolverConfig, ServerConfig, SizingConfig, TelemetryConfig};
use bess_offer_engine::dispatch::DispatchConfig;
use bess_offer_engine::domain::{BatterySku, DayKey, MonthKey, NormalizedInterval, NormalizedSeries, PriceTiers};
use bess_offer_engine::pricing::PricingConfig;
use chrono::TimeZone;
use chrono_tz::Tz;

#[allow(dead_code)]
pub fn test_config(rate_code: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            enable_cors: false,
        },
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
            log_json: false,
        },
        sizing: SizingConfig {
            tariff_rate_code: rate_code.to_string(),
            top_n: 10,
            install_adder_frac: 0.0,
            fixed_soft_costs_usd: 0.0,
            bundles: BundleGeneratorConfig::default(),
            pricing: PricingConfig::default(),
        },
        solver: DispatchSolverConfig {
            deadline_secs: 30,
            dispatch: DispatchConfig::default(),
        },
    }
}

#[allow(dead_code)]
pub fn flat_series(kw: f64, hours: usize, zone: Tz) -> NormalizedSeries {
    let start = zone.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let intervals = (0..hours)
        .map(|h| {
            let ts = start + chrono::Duration::hours(h as i64);
            NormalizedInterval {
                timestamp: ts,
                kw,
                month_key: MonthKey::from_datetime(&ts),
                day_key: DayKey::from_datetime(&ts),
            }
        })
        .collect();
    NormalizedSeries {
        intervals,
        cadence_hours: 1.0,
        warnings: vec![],
    }
}

/// 96 intervals at `base_kw`, except `spike_hour` held at `spike_kw`, on the
/// given day offset from 2024-07-01 (a Monday, summer).
#[allow(dead_code)]
pub fn spiky_series(base_kw: f64, spike_hour: u32, spike_kw: f64, zone: Tz) -> NormalizedSeries {
    let start = zone.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let intervals = (0..24)
        .map(|h| {
            let ts = start + chrono::Duration::hours(h as i64);
            let kw = if h as u32 == spike_hour { spike_kw } else { base_kw };
            NormalizedInterval {
                timestamp: ts,
                kw,
                month_key: MonthKey::from_datetime(&ts),
                day_key: DayKey::from_datetime(&ts),
            }
        })
        .collect();
    NormalizedSeries {
        intervals,
        cadence_hours: 1.0,
        warnings: vec![],
    }
}

/// Two days: day 1 flat at `base_kw`, day 2 plateaued at `plateau_kw` over
/// the `start_hour..end_hour` window (S3's two-day worst-energy scenario).
#[allow(dead_code)]
pub fn two_day_plateau_series(base_kw: f64, plateau_kw: f64, start_hour: u32, end_hour: u32, zone: Tz) -> NormalizedSeries {
    let start = zone.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let intervals = (0..48)
        .map(|h| {
            let ts = start + chrono::Duration::hours(h as i64);
            let hour_of_day = h % 24;
            let day = h / 24;
            let kw = if day == 1 && (start_hour..end_hour).contains(&(hour_of_day as u32)) {
                plateau_kw
            } else {
                base_kw
            };
            NormalizedInterval {
                timestamp: ts,
                kw,
                month_key: MonthKey::from_datetime(&ts),
                day_key: DayKey::from_datetime(&ts),
            }
        })
        .collect();
    NormalizedSeries {
        intervals,
        cadence_hours: 1.0,
        warnings: vec![],
    }
}

#[allow(dead_code)]
pub fn sku(id: &str, power_kw: f64, energy_kwh: f64, c_rate: f64, rte: f64, tier_1_price: f64) -> BatterySku {
    BatterySku {
        id: id.to_string(),
        manufacturer: "Acme".to_string(),
        nameplate_energy_kwh: energy_kwh,
        nameplate_power_kw: power_kw,
        c_rate,
        rte,
        warranty_years: 10.0,
        daily_cycle_cap: None,
        price_tiers: PriceTiers {
            tier_1_10: tier_1_price,
            tier_11_20: tier_1_price * 0.95,
            tier_21_50: tier_1_price * 0.9,
            tier_51_plus: tier_1_price * 0.85,
        },
        active: true,
    }
}
