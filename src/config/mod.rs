//! Configuration module
//!
//! This module handles engine settings, either deserialized from JSON or
//! extracted from Python dicts, and the Python-side attribute helpers shared
//! by the other boundary conversions.

mod engine;

pub use engine::*;

use crate::error::RuleEngineError;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::types::{PyAnyMethods, PyDict, PyDictMethods};
use pyo3::Bound;

/// Process-wide engine configuration
static ENGINE_CONFIG: OnceCell<RwLock<EngineConfig>> = OnceCell::new();

/// Install a configuration, replacing any previous one
pub fn install(config: EngineConfig) {
    if let Some(existing) = ENGINE_CONFIG.get() {
        *existing.write() = config;
    } else if let Err(config) = ENGINE_CONFIG.set(RwLock::new(config)) {
        // lost an initialization race; overwrite the winner
        if let Some(existing) = ENGINE_CONFIG.get() {
            *existing.write() = config.into_inner();
        }
    }
}

/// Current configuration, or defaults if none was installed
pub fn current() -> EngineConfig {
    ENGINE_CONFIG
        .get()
        .map(|config| config.read().clone())
        .unwrap_or_default()
}

/// Configured nesting limit, without cloning the whole configuration
pub fn max_depth() -> usize {
    ENGINE_CONFIG
        .get()
        .map(|config| config.read().max_depth)
        .unwrap_or_else(|| EngineConfig::default().max_depth)
}

pub fn is_initialized() -> bool {
    ENGINE_CONFIG.get().is_some()
}

/// Helper to get optional attribute from either dict or object
pub(crate) fn get_attr_opt<'py>(
    obj: &Bound<'py, pyo3::PyAny>,
    name: &str,
) -> Option<Bound<'py, pyo3::PyAny>> {
    if let Ok(dict) = obj.downcast::<PyDict>() {
        dict.get_item(name).ok().flatten()
    } else {
        obj.getattr(name).ok()
    }
}

/// Optional string attribute; present values of another type are an error
pub(crate) fn optional_string(
    obj: &Bound<'_, pyo3::PyAny>,
    name: &str,
) -> pyo3::PyResult<Option<String>> {
    match get_attr_opt(obj, name) {
        Some(value) if !value.is_none() => value.extract().map(Some).map_err(|_| {
            RuleEngineError::DeserializationError(format!("{} must be a string", name)).into()
        }),
        _ => Ok(None),
    }
}

/// Deserialize engine configuration from a Python dict
/// Missing keys fall back to the defaults
pub fn deserialize_engine_config(config: &Bound<'_, PyDict>) -> pyo3::PyResult<EngineConfig> {
    let defaults = EngineConfig::default();
    let obj = config.as_any();

    let cache_enabled: bool = get_attr_opt(obj, "cache_enabled")
        .and_then(|v| v.extract().ok())
        .unwrap_or(defaults.cache_enabled);
    let cache_capacity: usize = get_attr_opt(obj, "cache_capacity")
        .and_then(|v| v.extract().ok())
        .unwrap_or(defaults.cache_capacity);
    // Support both "require_non_empty_record" and "require_data" field names
    let require_non_empty_record: bool = get_attr_opt(obj, "require_non_empty_record")
        .or_else(|| get_attr_opt(obj, "require_data"))
        .and_then(|v| v.extract().ok())
        .unwrap_or(defaults.require_non_empty_record);
    let combined_rule_name = optional_string(obj, "combined_rule_name")?
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(defaults.combined_rule_name);
    let max_depth: usize = get_attr_opt(obj, "max_depth")
        .and_then(|v| v.extract().ok())
        .unwrap_or(defaults.max_depth);
    let log_filter = optional_string(obj, "log_filter")?;

    if max_depth == 0 {
        return Err(
            RuleEngineError::InvalidArgument("max_depth must be positive".to_string()).into(),
        );
    }

    if cache_capacity == 0 && cache_enabled {
        return Err(RuleEngineError::InvalidArgument(
            "cache_capacity must be positive when the cache is enabled".to_string(),
        )
        .into());
    }

    Ok(EngineConfig {
        cache_enabled,
        cache_capacity,
        combined_rule_name,
        require_non_empty_record,
        max_depth,
        log_filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_defaults_without_install() {
        let config = current();
        assert!(config.cache_capacity > 0);
        assert!(max_depth() > 0);
    }
}
