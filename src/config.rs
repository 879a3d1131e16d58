#![allow(dead_code)]
//! Application configuration (spec.md §6's enumerated options, plus the
//! ambient server/telemetry/solver sections every teacher-shaped service
//! carries regardless of feature scope). Loaded with `figment`, validated
//! with `validator`, same as the teacher's `config.rs`.

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

use crate::bundler::BundleGeneratorConfig;
use crate::dispatch::DispatchConfig;
use crate::pricing::PricingConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,

    #[validate(nested)]
    pub telemetry: TelemetryConfig,

    #[validate(nested)]
    pub sizing: SizingConfig,

    #[validate(nested)]
    pub solver: DispatchSolverConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("failed to parse socket address")
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

/// Wall-clock deadline and solver-selection knobs (REDESIGN FLAGS §9's
/// solver-abstraction point).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Validate)]
pub struct DispatchSolverConfig {
    #[serde(default = "default_deadline_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub deadline_secs: u64,

    #[serde(flatten)]
    pub dispatch: DispatchConfig,
}

/// Every configuration option enumerated in spec.md §6, plus the bundle
/// and pricing sub-configs those options feed.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SizingConfig {
    /// Selects the set of tariff scenarios to evaluate each bundle against.
    #[validate(length(min = 1))]
    pub tariff_rate_code: String,

    #[serde(default = "default_top_n")]
    #[validate(range(min = 1, max = 1000))]
    pub top_n: usize,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub install_adder_frac: f64,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fixed_soft_costs_usd: f64,

    #[validate(nested)]
    #[serde(flatten)]
    pub bundles: BundleGeneratorConfig,

    #[validate(nested)]
    #[serde(flatten)]
    pub pricing: PricingConfig,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_deadline_secs() -> u64 {
    60
}

fn default_top_n() -> usize {
    10
}

impl AppConfig {
    /// Load configuration from TOML files and environment variables:
    /// `config/default.toml`, then an optional environment-specific file,
    /// then `BESS__`-prefixed environment variables (later overrides earlier).
    pub fn load() -> Result<Self> {
        Self::load_with_env(None)
    }

    pub fn load_with_env(environment: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config/default.toml"));

        if let Some(env) = environment {
            figment = figment.merge(Toml::file(format!("config/{env}.toml")));
        }

        figment = figment.merge(Env::prefixed("BESS__").split("__"));

        let config: AppConfig = figment.extract().context("failed to parse configuration")?;
        config.validate().context("configuration validation failed")?;
        Ok(config)
    }
}
