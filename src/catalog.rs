//! Battery catalog loading: parses the tabular SKU source (spec.md §6) into
//! validated `BatterySku` records. Per REDESIGN FLAGS (spec.md §9), the
//! schema is declared up front and checked at load time instead of
//! sniffing columns dynamically — a renamed or missing column is an
//! input-parse error, not a silently-dropped field.

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{BatterySku, PriceTiers, SkuError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog row {row}: {source}")]
    Csv { row: usize, source: csv::Error },
    #[error("catalog row {row} has invalid Active value: {raw:?}")]
    InvalidActiveFlag { row: usize, raw: String },
    #[error("catalog row {row} failed SKU validation: {source}")]
    InvalidSku { row: usize, source: SkuError },
}

/// Exact column schema expected of the catalog CSV (spec.md §6). `csv`'s
/// serde integration rejects rows missing any of these headers.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Model Name")]
    model_name: String,
    #[serde(rename = "Manufacturer")]
    manufacturer: String,
    #[serde(rename = "Capacity (kWh)")]
    capacity_kwh: f64,
    #[serde(rename = "Power (kW)")]
    power_kw: f64,
    #[serde(rename = "C-Rate")]
    c_rate: f64,
    #[serde(rename = "Efficiency (%)")]
    efficiency_pct: f64,
    #[serde(rename = "Warranty (Years)")]
    warranty_years: f64,
    #[serde(rename = "Price 1-10")]
    price_1_10: f64,
    #[serde(rename = "Price 11-20")]
    price_11_20: f64,
    #[serde(rename = "Price 21-50")]
    price_21_50: f64,
    #[serde(rename = "Price 50+")]
    price_50_plus: f64,
    #[serde(rename = "Active")]
    active: String,
    #[serde(rename = "Daily Cycle Cap", default)]
    daily_cycle_cap: Option<f64>,
}

fn parse_active_flag(row: usize, raw: &str) -> Result<bool, CatalogError> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(CatalogError::InvalidActiveFlag {
            row,
            raw: raw.to_string(),
        }),
    }
}

/// Parse a catalog from any reader (file handle, in-memory bytes, ...).
/// Returns only `Active` SKUs that pass validation.
pub fn load_catalog<R: Read>(reader: R) -> Result<Vec<BatterySku>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut skus = Vec::new();

    for (idx, result) in rdr.deserialize::<CatalogRow>().enumerate() {
        let row = result.map_err(|source| CatalogError::Csv { row: idx + 1, source })?;
        let active = parse_active_flag(idx + 1, &row.active)?;
        if !active {
            continue;
        }

        let sku = BatterySku {
            id: row.model_name.clone(),
            manufacturer: row.manufacturer,
            nameplate_energy_kwh: row.capacity_kwh,
            nameplate_power_kw: row.power_kw,
            c_rate: row.c_rate,
            rte: row.efficiency_pct / 100.0,
            warranty_years: row.warranty_years,
            daily_cycle_cap: row.daily_cycle_cap,
            price_tiers: PriceTiers {
                tier_1_10: row.price_1_10,
                tier_11_20: row.price_11_20,
                tier_21_50: row.price_21_50,
                tier_51_plus: row.price_50_plus,
            },
            active: true,
        };
        sku.validate()
            .map_err(|source| CatalogError::InvalidSku { row: idx + 1, source })?;
        skus.push(sku);
    }

    Ok(skus)
}

/// Resolve the per-unit price for buying `qty` of `sku` from the catalog.
pub fn price_for(sku: &BatterySku, qty: u32) -> f64 {
    sku.price_tiers.price_for_qty(qty)
}

/// Total equipment cost for a quantity map, before install adder/soft costs.
pub fn equipment_cost(skus: &[(&BatterySku, u32)]) -> f64 {
    skus.iter().map(|(sku, qty)| price_for(sku, *qty) * *qty as f64).sum()
}

/// Total capex: equipment cost with a multiplicative install adder and an
/// additive fixed soft-cost (spec.md §4.2).
pub fn total_capex(equipment_cost_usd: f64, install_adder_frac: f64, fixed_soft_costs_usd: f64) -> f64 {
    equipment_cost_usd * (1.0 + install_adder_frac) + fixed_soft_costs_usd
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "Model Name,Manufacturer,Capacity (kWh),Power (kW),C-Rate,Efficiency (%),Warranty (Years),Price 1-10,Price 11-20,Price 21-50,Price 50+,Active\n\
BatteryX,Acme,100,50,0.5,90,10,50000,48000,46000,44000,Yes\n\
BatteryY,Acme,50,25,1.0,85,10,25000,24000,23000,22000,No\n";

    #[test]
    fn loads_only_active_rows() {
        let skus = load_catalog(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(skus.len(), 1);
        assert_eq!(skus[0].id, "BatteryX");
        assert_eq!(skus[0].rte, 0.9);
    }

    #[test]
    fn rejects_invalid_active_flag() {
        let csv = "Model Name,Manufacturer,Capacity (kWh),Power (kW),C-Rate,Efficiency (%),Warranty (Years),Price 1-10,Price 11-20,Price 21-50,Price 50+,Active\n\
BatteryX,Acme,100,50,0.5,90,10,50000,48000,46000,44000,maybe\n";
        let err = load_catalog(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidActiveFlag { .. }));
    }

    #[test]
    fn rejects_renamed_columns() {
        let csv = "Name,Manufacturer,Capacity (kWh),Power (kW),C-Rate,Efficiency (%),Warranty (Years),Price 1-10,Price 11-20,Price 21-50,Price 50+,Active\n\
BatteryX,Acme,100,50,0.5,90,10,50000,48000,46000,44000,Yes\n";
        let err = load_catalog(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::Csv { .. }));
    }

    #[test]
    fn capex_applies_adder_and_soft_costs() {
        let total = total_capex(100_000.0, 0.1, 5_000.0);
        assert_eq!(total, 100_000.0 * 1.1 + 5_000.0);
    }
}
