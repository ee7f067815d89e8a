//! `robowarehouse-config`: configuration management for the intake service.
//!
//! Provides:
//! - Typed config schema (server, storage, OCR, selector, logging)
//! - YAML loading with `${ENV_VAR}` substitution
//! - `WAREHOUSE_*` environment overrides
//! - Deep validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, read_config_value};
pub use schema::{
    LoggingConfig, OcrConfig, OcrEngineKind, SelectorConfig, ServerConfig, StorageConfig,
    WarehouseConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// A validated config together with the non-fatal findings from loading it.
///
/// Loading usually happens before the logger exists, so warnings are carried
/// out to the caller instead of being emitted on the spot.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: WarehouseConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Emit every collected warning through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!(message = %warning, "Config warning");
        }
    }
}

/// Load, substitute env vars, apply overrides, and validate a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<LoadedConfig> {
    load_and_prepare_with(path, &std::env::vars().collect()).await
}

/// [`load_and_prepare`] against an explicit environment map.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<LoadedConfig> {
    let raw = read_config_value(path).await?;
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let mut config: WarehouseConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;

    let mut warnings = apply_env_overrides(&mut config, env);

    let report = validate(&config);
    if !report.is_valid() {
        let summary: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid configuration:\n  {}", summary.join("\n  "));
    }
    warnings.extend(
        report
            .warnings
            .iter()
            .map(|w| format!("{}: {}", w.path, w.message)),
    );

    Ok(LoadedConfig { config, warnings })
}
