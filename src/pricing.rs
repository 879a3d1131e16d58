//! Pricing engine (spec.md §4.6): turns a bundle's capex and annualized
//! savings into the three presented offers.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{Offer, OfferMode};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PricingConfig {
    #[validate(range(min = 0.1, max = 100.0))]
    pub payback_ceiling_years: f64,
    #[validate(range(min = 1, max = 1000))]
    pub price_grid_points: usize,
    #[validate(range(min = 0.1, max = 100.0))]
    pub close_prob_mid_payback_years: f64,
    #[validate(range(min = 0.01, max = 100.0))]
    pub close_prob_steepness: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            payback_ceiling_years: 10.0,
            price_grid_points: 21,
            close_prob_mid_payback_years: 6.5,
            close_prob_steepness: 1.2,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn close_probability(price: f64, savings: f64, unit_count: u32, cfg: PricingConfig) -> f64 {
    let payback = price / savings;
    let base = sigmoid((cfg.close_prob_mid_payback_years - payback) / cfg.close_prob_steepness);
    base / (1.0 + 0.05 * (unit_count.saturating_sub(1)) as f64)
}

/// Build one offer's derived identities (spec.md §8 invariant 6) given a
/// price and the bundle's capex/annual savings.
fn offer_from_price(mode: OfferMode, price: f64, capex: f64, savings: f64) -> Offer {
    let gross_margin_usd = price - capex;
    let gross_margin_fraction = if price > 0.0 { gross_margin_usd / price } else { 0.0 };
    let payback_years = price / savings;
    let total_site_value_usd = savings * gross_margin_fraction;
    let roi = savings / price;

    Offer {
        mode,
        price_usd: price,
        annual_savings_usd: savings,
        payback_years,
        gross_margin_usd,
        gross_margin_fraction,
        total_site_value_usd,
        roi,
        close_probability: None,
        expected_total_site_value_usd: None,
    }
}

/// Price a bundle's offers. Returns an empty list if the bundle is
/// unsellable (`P_max < capex`), per spec.md §4.6.
pub fn price_offers(capex: f64, annual_savings: f64, unit_count: u32, cfg: PricingConfig) -> Vec<Offer> {
    if annual_savings <= 0.0 {
        return Vec::new();
    }

    let p_max = cfg.payback_ceiling_years * annual_savings;
    if p_max < capex {
        return Vec::new();
    }

    let customer_benefit = offer_from_price(OfferMode::CustomerBenefit, capex, capex, annual_savings);
    let profit_max = offer_from_price(OfferMode::ProfitMax, p_max, capex, annual_savings);

    let grid_points = cfg.price_grid_points.max(1);
    let mut best: Option<(f64, f64, f64)> = None; // (price, q, expected_tsv)
    for i in 0..grid_points {
        let frac = if grid_points == 1 { 0.0 } else { i as f64 / (grid_points - 1) as f64 };
        let price = capex + frac * (p_max - capex);
        let q = close_probability(price, annual_savings, unit_count, cfg);
        let gross_margin_fraction = if price > 0.0 { (price - capex) / price } else { 0.0 };
        let expected_tsv = q * annual_savings * gross_margin_fraction;
        match &best {
            Some((_, _, best_tsv)) if *best_tsv >= expected_tsv => {}
            _ => best = Some((price, q, expected_tsv)),
        }
    }

    let (engine_price, engine_q, engine_tsv) = best.unwrap_or((capex, 0.0, 0.0));
    let mut engine = offer_from_price(OfferMode::Engine, engine_price, capex, annual_savings);
    engine.close_probability = Some(engine_q);
    engine.expected_total_site_value_usd = Some(engine_tsv);

    vec![profit_max, engine, customer_benefit]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsellable_when_payback_ceiling_caps_below_capex() {
        let cfg = PricingConfig {
            payback_ceiling_years: 10.0,
            ..Default::default()
        };
        let offers = price_offers(100_000.0, 5_000.0, 1, cfg);
        assert!(offers.is_empty());
    }

    #[test]
    fn customer_benefit_price_equals_capex_exactly() {
        let cfg = PricingConfig::default();
        let offers = price_offers(50_000.0, 20_000.0, 1, cfg);
        let customer_benefit = offers.iter().find(|o| o.mode == OfferMode::CustomerBenefit).unwrap();
        assert_eq!(customer_benefit.price_usd, 50_000.0);
        assert_eq!(customer_benefit.gross_margin_usd, 0.0);
    }

    #[test]
    fn engine_price_strictly_between_capex_and_p_max() {
        let cfg = PricingConfig {
            payback_ceiling_years: 10.0,
            price_grid_points: 21,
            close_prob_mid_payback_years: 6.5,
            close_prob_steepness: 1.2,
        };
        let capex = 50_000.0;
        let savings = 20_000.0;
        let p_max = cfg.payback_ceiling_years * savings;
        let offers = price_offers(capex, savings, 1, cfg);
        let engine = offers.iter().find(|o| o.mode == OfferMode::Engine).unwrap();
        assert!(engine.price_usd > capex);
        assert!(engine.price_usd < p_max);

        let profit_max = offers.iter().find(|o| o.mode == OfferMode::ProfitMax).unwrap();
        let customer_benefit = offers.iter().find(|o| o.mode == OfferMode::CustomerBenefit).unwrap();
        let engine_tsv = engine.expected_total_site_value_usd.unwrap();

        let endpoint_tsv = |price: f64| {
            let q = close_probability(price, savings, 1, cfg);
            let gmf = (price - capex) / price;
            q * savings * gmf
        };
        assert!(engine_tsv >= endpoint_tsv(profit_max.price_usd) - 1e-9);
        assert!(engine_tsv >= endpoint_tsv(customer_benefit.price_usd) - 1e-9);
    }

    #[test]
    fn offers_present_in_profit_max_engine_customer_benefit_order() {
        let offers = price_offers(50_000.0, 20_000.0, 1, PricingConfig::default());
        let modes: Vec<OfferMode> = offers.iter().map(|o| o.mode).collect();
        assert_eq!(modes, vec![OfferMode::ProfitMax, OfferMode::Engine, OfferMode::CustomerBenefit]);
    }

    #[test]
    fn non_positive_savings_is_unsellable() {
        let offers = price_offers(10_000.0, 0.0, 1, PricingConfig::default());
        assert!(offers.is_empty());
    }
}
