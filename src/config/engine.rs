//! Engine configuration structures

use serde::Deserialize;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Cache parsed rule text
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Entries kept before the cache is cleared
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Name given to rules produced by combination
    #[serde(default = "default_combined_rule_name")]
    pub combined_rule_name: String,
    /// Reject empty data records before evaluation
    #[serde(default = "default_require_non_empty_record")]
    pub require_non_empty_record: bool,
    /// Deepest tree or parenthesis nesting accepted from any input
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// tracing filter directive, e.g. "rule_engine_core=debug"
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_combined_rule_name() -> String {
    "Combined Rule".to_string()
}

fn default_require_non_empty_record() -> bool {
    true
}

fn default_max_depth() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            cache_capacity: default_cache_capacity(),
            combined_rule_name: default_combined_rule_name(),
            require_non_empty_record: default_require_non_empty_record(),
            max_depth: default_max_depth(),
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EngineConfig::from_json(r#"{"cache_capacity": 8}"#).unwrap();
        assert_eq!(config.cache_capacity, 8);
        assert!(config.cache_enabled);
        assert_eq!(config.combined_rule_name, "Combined Rule");
        assert!(config.require_non_empty_record);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn test_empty_object_matches_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }
}
