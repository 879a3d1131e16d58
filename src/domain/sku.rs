//! Battery SKU records and the volume-tier price resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Kw, Kwh, Usd};

#[derive(Debug, Error, PartialEq)]
pub enum SkuError {
    #[error("SKU {id}: nameplate energy must be positive, got {kwh}")]
    NonPositiveEnergy { id: String, kwh: f64 },
    #[error("SKU {id}: nameplate power must be positive, got {kw}")]
    NonPositivePower { id: String, kw: f64 },
    #[error("SKU {id}: round-trip efficiency {rte} is outside [0, 1]")]
    EfficiencyOutOfRange { id: String, rte: f64 },
    #[error("SKU {id}: price tier must be non-negative, got {price}")]
    NegativePrice { id: String, price: f64 },
}

/// One of the four quantity-banded price tiers a SKU is sold under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceTiers {
    pub tier_1_10: f64,
    pub tier_11_20: f64,
    pub tier_21_50: f64,
    pub tier_51_plus: f64,
}

impl PriceTiers {
    /// Per-unit price for buying `qty` units.
    pub fn price_for_qty(&self, qty: u32) -> f64 {
        match qty {
            0 => 0.0,
            1..=10 => self.tier_1_10,
            11..=20 => self.tier_11_20,
            21..=50 => self.tier_21_50,
            _ => self.tier_51_plus,
        }
    }
}

/// A battery SKU from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatterySku {
    pub id: String,
    pub manufacturer: String,
    pub nameplate_energy_kwh: f64,
    pub nameplate_power_kw: f64,
    pub c_rate: f64,
    /// Round-trip efficiency in [0, 1] (catalog stores 0-100%; converted at load time).
    pub rte: f64,
    pub warranty_years: f64,
    /// Daily full-cycle-equivalent cap, when the manufacturer declares one.
    pub daily_cycle_cap: Option<f64>,
    pub price_tiers: PriceTiers,
    pub active: bool,
}

impl BatterySku {
    /// Continuous power usable for a single unit: `min(nameplate power, C-rate * energy)`.
    pub fn continuous_power_kw(&self) -> f64 {
        self.nameplate_power_kw.min(self.c_rate * self.nameplate_energy_kwh)
    }

    pub fn energy(&self) -> Kwh {
        Kwh(self.nameplate_energy_kwh)
    }

    pub fn continuous_power(&self) -> Kw {
        Kw(self.continuous_power_kw())
    }

    pub fn price_for_qty(&self, qty: u32) -> Usd {
        Usd(self.price_tiers.price_for_qty(qty))
    }

    pub fn validate(&self) -> Result<(), SkuError> {
        if self.nameplate_energy_kwh <= 0.0 {
            return Err(SkuError::NonPositiveEnergy {
                id: self.id.clone(),
                kwh: self.nameplate_energy_kwh,
            });
        }
        if self.nameplate_power_kw <= 0.0 {
            return Err(SkuError::NonPositivePower {
                id: self.id.clone(),
                kw: self.nameplate_power_kw,
            });
        }
        if !(0.0..=1.0).contains(&self.rte) {
            return Err(SkuError::EfficiencyOutOfRange {
                id: self.id.clone(),
                rte: self.rte,
            });
        }
        for price in [
            self.price_tiers.tier_1_10,
            self.price_tiers.tier_11_20,
            self.price_tiers.tier_21_50,
            self.price_tiers.tier_51_plus,
        ] {
            if price < 0.0 {
                return Err(SkuError::NegativePrice {
                    id: self.id.clone(),
                    price,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(tiers: PriceTiers) -> BatterySku {
        BatterySku {
            id: "sku-1".into(),
            manufacturer: "Acme".into(),
            nameplate_energy_kwh: 100.0,
            nameplate_power_kw: 50.0,
            c_rate: 0.5,
            rte: 0.9,
            warranty_years: 10.0,
            daily_cycle_cap: Some(1.0),
            price_tiers: tiers,
            active: true,
        }
    }

    #[test]
    fn continuous_power_is_the_tighter_limit() {
        let s = sku(PriceTiers {
            tier_1_10: 500.0,
            tier_11_20: 480.0,
            tier_21_50: 460.0,
            tier_51_plus: 440.0,
        });
        // c_rate * energy = 0.5 * 100 = 50, equal to nameplate power here.
        assert_eq!(s.continuous_power_kw(), 50.0);
    }

    #[test]
    fn price_tier_bands() {
        let tiers = PriceTiers {
            tier_1_10: 500.0,
            tier_11_20: 480.0,
            tier_21_50: 460.0,
            tier_51_plus: 440.0,
        };
        assert_eq!(tiers.price_for_qty(1), 500.0);
        assert_eq!(tiers.price_for_qty(10), 500.0);
        assert_eq!(tiers.price_for_qty(11), 480.0);
        assert_eq!(tiers.price_for_qty(50), 460.0);
        assert_eq!(tiers.price_for_qty(51), 440.0);
        assert_eq!(tiers.price_for_qty(1000), 440.0);
    }

    #[test]
    fn rejects_efficiency_out_of_range() {
        let mut s = sku(PriceTiers {
            tier_1_10: 1.0,
            tier_11_20: 1.0,
            tier_21_50: 1.0,
            tier_51_plus: 1.0,
        });
        s.rte = 1.5;
        assert!(matches!(s.validate(), Err(SkuError::EfficiencyOutOfRange { .. })));
    }
}
