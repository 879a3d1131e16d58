//! Crate-level error aggregation (spec.md §7): input-parse and
//! catalog-invalid conditions abort the whole request. Every other
//! condition spec.md §7 names is a per-bundle skip accumulated as an
//! [`crate::domain::EngineWarning`] on the result envelope instead, and
//! never reaches this type.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::domain::SkuError;

/// Aborts a sizing run outright. Colocated per-module error enums
/// (`CatalogError`, `SkuError`, ...) convert into this at the orchestrator
/// boundary, the same way the teacher's handlers convert module errors into
/// `ApiError`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog invalid: {0}")]
    Catalog(#[from] CatalogError),

    #[error("catalog invalid: {0}")]
    Sku(#[from] SkuError),

    #[error("input parse error: {0}")]
    InputParse(String),

    #[error("configuration invalid: {0}")]
    Config(#[from] validator::ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_converts_into_engine_error() {
        let catalog_err = CatalogError::InvalidActiveFlag {
            row: 3,
            raw: "maybe".to_string(),
        };
        let engine_err: EngineError = catalog_err.into();
        assert!(engine_err.to_string().starts_with("catalog invalid"));
    }
}
