//! Data records supplied for evaluation

use crate::error::{Result, RuleEngineError};
use ahash::AHashMap;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyString};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A data value: numbers and strings only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Number(f64),
    Text(String),
}

impl DataValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Number(_) => "number",
            DataValue::Text(_) => "string",
        }
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Number(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Number(value as f64)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Number(value as f64)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

/// Attribute name to value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRecord {
    values: AHashMap<String, DataValue>,
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DataValue>) {
        self.values.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reject blank keys and, when required, an empty record
    pub fn validate(&self, require_non_empty: bool) -> Result<()> {
        if require_non_empty && self.values.is_empty() {
            warn!("rejected empty data record");
            return Err(RuleEngineError::InvalidArgument(
                "Data map cannot be null or empty".to_string(),
            ));
        }
        if self.values.keys().any(|key| key.trim().is_empty()) {
            warn!("rejected data record with blank key");
            return Err(RuleEngineError::InvalidArgument(
                "Data key cannot be null or empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a record from a JSON object, rejecting anything but numbers and strings
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            RuleEngineError::InvalidArgument("Data must be a JSON object".to_string())
        })?;

        let mut record = Self::new();
        for (key, value) in object {
            let value = match value {
                serde_json::Value::Number(n) => n.as_f64().map(DataValue::Number),
                serde_json::Value::String(s) => Some(DataValue::Text(s.clone())),
                _ => None,
            }
            .ok_or_else(|| invalid_value(key))?;
            record.insert(key.clone(), value);
        }
        Ok(record)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }
}

impl<K, V> FromIterator<(K, V)> for DataRecord
where
    K: Into<String>,
    V: Into<DataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

fn invalid_value(key: &str) -> RuleEngineError {
    RuleEngineError::InvalidArgument(format!(
        "Data value must be a String or Number for key: {}",
        key
    ))
}

/// Extract a data record from a Python dict
pub fn extract_record(dict: &Bound<'_, PyDict>) -> PyResult<DataRecord> {
    let mut record = DataRecord::new();

    for (key, value) in dict.iter() {
        let key: String = key.extract().map_err(|_| {
            RuleEngineError::InvalidArgument("Data keys must be strings".to_string())
        })?;

        // bool is an int subclass in Python, so it must be ruled out first
        let value = if value.is_none() || value.is_instance_of::<PyBool>() {
            return Err(invalid_value(&key).into());
        } else if let Ok(text) = value.downcast::<PyString>() {
            DataValue::Text(text.extract()?)
        } else if value.is_instance_of::<PyInt>() || value.is_instance_of::<PyFloat>() {
            DataValue::Number(value.extract()?)
        } else {
            return Err(invalid_value(&key).into());
        };

        record.insert(key, value);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let record = DataRecord::from_json(&json!({"age": 35, "department": "Sales"})).unwrap();
        assert_eq!(record.get("age"), Some(&DataValue::Number(35.0)));
        assert_eq!(
            record.get("department"),
            Some(&DataValue::Text("Sales".to_string()))
        );
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_from_json_rejects_other_types() {
        for data in [
            json!({"flag": true}),
            json!({"nothing": null}),
            json!({"list": [1, 2]}),
            json!({"nested": {"a": 1}}),
        ] {
            let err = DataRecord::from_json(&data).unwrap_err();
            assert!(
                err.to_string().contains("must be a String or Number"),
                "{}",
                err
            );
        }
        assert!(DataRecord::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(DataRecord::new().validate(true).is_err());
        assert!(DataRecord::new().validate(false).is_ok());
        assert!(DataRecord::new().with(" ", 1).validate(false).is_err());
        assert!(DataRecord::new().with("age", 1).validate(true).is_ok());
    }

    #[test]
    fn test_from_iter_and_json_str() {
        let record: DataRecord = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(record.len(), 2);

        let record = DataRecord::from_json_str(r#"{"salary": 50000.5}"#).unwrap();
        assert_eq!(record.get("salary"), Some(&DataValue::Number(50000.5)));
    }
}
