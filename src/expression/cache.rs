//! Parsed rule cache - repeated rule text skips tokenizing and parsing

use crate::config;
use crate::data::DataRecord;
use crate::expression::ast::Node;
use crate::expression::evaluator::evaluate;
use crate::expression::parser;
use crate::error::Result;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Global rule cache with fast hashing (ahash)
static RULE_CACHE: Lazy<RwLock<AHashMap<String, Arc<Node>>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(256)));

/// Get or parse rule text, using the cache for repeated rules
#[inline]
pub fn get_or_parse(text: &str) -> Result<Arc<Node>> {
    let settings = config::current();
    let key = text.trim();

    if settings.cache_enabled {
        // Fast path: check read lock first
        let cache = RULE_CACHE.read();
        if let Some(node) = cache.get(key) {
            return Ok(Arc::clone(node));
        }
    }

    // Slow path: parse and cache
    let node = Arc::new(parser::parse_rule(key)?);

    if settings.cache_enabled {
        let mut cache = RULE_CACHE.write();
        if cache.len() >= settings.cache_capacity {
            debug!(entries = cache.len(), "rule cache full, clearing");
            cache.clear();
        }
        cache.insert(key.to_string(), Arc::clone(&node));
    }

    Ok(node)
}

/// Evaluate rule text against a record, using the cached tree
#[inline]
pub fn check_expression(text: &str, record: &DataRecord) -> Result<bool> {
    let node = get_or_parse(text)?;
    evaluate(&node, record)
}

/// Clear the rule cache
pub fn clear_cache() {
    RULE_CACHE.write().clear();
}

/// Number of cached rules
pub fn cache_size() -> usize {
    RULE_CACHE.read().len()
}
