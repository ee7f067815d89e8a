//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside YAML string values, resolved at load
//!   time. Only uppercase `[A-Z_][A-Z0-9_]*` names are matched and `$${}`
//!   escapes to a literal `${}`.
//! - `WAREHOUSE_*` override variables applied on top of the parsed file.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use crate::schema::{OcrEngineKind, WarehouseConfig};

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const ENV_BIND: &str = "WAREHOUSE_BIND";
pub const ENV_PORT: &str = "WAREHOUSE_PORT";
pub const ENV_DB: &str = "WAREHOUSE_DB";
pub const ENV_UPLOAD_DIR: &str = "WAREHOUSE_UPLOAD_DIR";
pub const ENV_OCR_ENGINE: &str = "WAREHOUSE_OCR_ENGINE";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "WAREHOUSE_CONFIDENCE_THRESHOLD";
pub const ENV_LOG_LEVEL: &str = "RUST_LOG";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        if caps[0].starts_with("$$") {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(replaced.into_owned())
}

/// Apply `WAREHOUSE_*` overrides to a parsed config.
///
/// Returns a warning for each override that was set but could not be parsed;
/// those are skipped and the file value is kept.
pub fn apply_env_overrides(config: &mut WarehouseConfig, env: &HashMap<String, String>) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(bind) = non_empty(env, ENV_BIND) {
        config.server.bind_address = bind.to_string();
    }
    if let Some(port) = parse_override::<u16>(env, ENV_PORT, &mut warnings) {
        config.server.port = port;
    }
    if let Some(db) = non_empty(env, ENV_DB) {
        config.storage.db_path = db.to_string();
    }
    if let Some(dir) = non_empty(env, ENV_UPLOAD_DIR) {
        config.storage.upload_dir = dir.to_string();
    }
    if let Some(engine) = parse_override::<OcrEngineKind>(env, ENV_OCR_ENGINE, &mut warnings) {
        config.ocr.engine = engine;
    }
    if let Some(threshold) = parse_override::<f64>(env, ENV_CONFIDENCE_THRESHOLD, &mut warnings) {
        config.selector.confidence_threshold = threshold;
    }
    if let Some(level) = non_empty(env, ENV_LOG_LEVEL) {
        config.logging.level = level.to_string();
    }

    warnings
}

fn non_empty<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_override<T: FromStr>(
    env: &HashMap<String, String>,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let raw = non_empty(env, key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warnings.push(format!("Ignoring {key}={raw}: not a valid value"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"storage": {"dbPath": "${DATA_DIR}/warehouse.db"}});
        let result = resolve_env_vars_with(&v, &env(&[("DATA_DIR", "/var/lib/rw")])).unwrap();
        assert_eq!(result["storage"]["dbPath"], "/var/lib/rw/warehouse.db");
    }

    #[test]
    fn error_on_missing_var_names_path() {
        let v = json!({"ocr": {"tesseractBin": "${TESS_BIN}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("TESS_BIN"));
        assert!(err.contains("ocr.tesseractBin"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"note": "$${NOT_A_VAR}"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["note"], "${NOT_A_VAR}");
    }

    #[test]
    fn substitutes_inside_arrays() {
        let v = json!({"ocr": {"languages": ["eng", "${EXTRA_LANG}"]}});
        let result = resolve_env_vars_with(&v, &env(&[("EXTRA_LANG", "deu")])).unwrap();
        assert_eq!(result["ocr"]["languages"][1], "deu");
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = WarehouseConfig::default();
        let warnings = apply_env_overrides(
            &mut config,
            &env(&[
                (ENV_PORT, "9000"),
                (ENV_DB, "/tmp/w.db"),
                (ENV_OCR_ENGINE, "disabled"),
                (ENV_CONFIDENCE_THRESHOLD, "0.5"),
                (ENV_LOG_LEVEL, "debug"),
            ]),
        );
        assert!(warnings.is_empty());
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.db_path, "/tmp/w.db");
        assert_eq!(config.ocr.engine, OcrEngineKind::Disabled);
        assert_eq!(config.selector.confidence_threshold, 0.5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn unparseable_override_is_skipped_with_warning() {
        let mut config = WarehouseConfig::default();
        let warnings = apply_env_overrides(&mut config, &env(&[(ENV_PORT, "eighty")]));
        assert_eq!(config.server.port, 8000);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains(ENV_PORT));
    }
}
