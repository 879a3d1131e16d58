//! Offer types produced by the pricing engine.

use serde::{Deserialize, Serialize};

use super::types::Usd;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OfferMode {
    CustomerBenefit,
    ProfitMax,
    Engine,
}

/// A single priced offer for a bundle under one of the three pricing
/// objectives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub mode: OfferMode,
    pub price_usd: f64,
    pub annual_savings_usd: f64,
    pub payback_years: f64,
    pub gross_margin_usd: f64,
    pub gross_margin_fraction: f64,
    pub total_site_value_usd: f64,
    pub roi: f64,
    /// Only set for `OfferMode::Engine`.
    pub close_probability: Option<f64>,
    pub expected_total_site_value_usd: Option<f64>,
}

impl Offer {
    pub fn price(&self) -> Usd {
        Usd(self.price_usd)
    }
}
