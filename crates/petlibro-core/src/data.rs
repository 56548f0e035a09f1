//! Cached JSON state for one appliance
//!
//! The cloud answers with loosely-typed JSON objects; the cache keeps the
//! latest merge of every payload and offers typed getters that degrade to
//! `None` instead of failing on missing or oddly-typed fields.

use serde_json::{Map, Value};

/// Merge-on-update cache of the latest device JSON
#[derive(Debug, Clone, Default)]
pub struct DeviceData {
    inner: Map<String, Value>,
}

impl DeviceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from an initial payload; non-object payloads yield an
    /// empty cache
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(inner) => Self { inner },
            _ => Self::default(),
        }
    }

    /// Merge an update payload, overwriting top-level keys
    pub fn merge(&mut self, update: Value) {
        if let Value::Object(update) = update {
            self.inner.extend(update);
        }
    }

    /// Store a payload under a named section (e.g. `realInfo`)
    pub fn insert_section(&mut self, key: &str, value: Value) {
        self.inner.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn str_value(&self, key: &str) -> Option<String> {
        self.inner.get(key)?.as_str().map(str::to_owned)
    }

    pub fn i64_value(&self, key: &str) -> Option<i64> {
        self.inner.get(key)?.as_i64()
    }

    pub fn f64_value(&self, key: &str) -> Option<f64> {
        self.inner.get(key)?.as_f64()
    }

    pub fn bool_value(&self, key: &str) -> Option<bool> {
        self.inner.get(key)?.as_bool()
    }

    /// A nested object section, if present
    pub fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.inner.get(key)?.as_object()
    }

    pub fn section_value(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section)?.get(key)
    }

    /// Read a field from the top level, falling back to the `realInfo`
    /// section; live-state payloads land in either place depending on the
    /// device family
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.inner
            .get(key)
            .or_else(|| self.section_value("realInfo", key))
    }

    pub fn field_str(&self, key: &str) -> Option<String> {
        self.field(key)?.as_str().map(str::to_owned)
    }

    pub fn field_i64(&self, key: &str) -> Option<i64> {
        self.field(key)?.as_i64()
    }

    pub fn field_f64(&self, key: &str) -> Option<f64> {
        self.field(key)?.as_f64()
    }

    pub fn field_bool(&self, key: &str) -> Option<bool> {
        self.field(key)?.as_bool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_unrelated_keys() {
        let mut data = DeviceData::from_value(json!({"deviceSn": "SN1", "name": "Feeder"}));
        data.merge(json!({"name": "Kitchen", "wifiRssi": -60}));

        assert_eq!(data.str_value("deviceSn").as_deref(), Some("SN1"));
        assert_eq!(data.str_value("name").as_deref(), Some("Kitchen"));
        assert_eq!(data.i64_value("wifiRssi"), Some(-60));
    }

    #[test]
    fn test_non_object_payloads_ignored() {
        let mut data = DeviceData::from_value(json!("oops"));
        assert!(data.is_empty());

        data.merge(json!({"a": 1}));
        data.merge(json!(42));
        assert_eq!(data.i64_value("a"), Some(1));
    }

    #[test]
    fn test_field_falls_back_to_real_info() {
        let mut data = DeviceData::from_value(json!({"wifiRssi": -55}));
        data.insert_section("realInfo", json!({"wifiSsid": "cats", "platePosition": 2}));

        assert_eq!(data.field_i64("wifiRssi"), Some(-55));
        assert_eq!(data.field_str("wifiSsid").as_deref(), Some("cats"));
        assert_eq!(data.field_i64("platePosition"), Some(2));
        assert!(data.field("missing").is_none());
    }

    #[test]
    fn test_typed_getters_reject_wrong_types() {
        let data = DeviceData::from_value(json!({"deviceSn": 7}));
        assert!(data.str_value("deviceSn").is_none());
        assert_eq!(data.i64_value("deviceSn"), Some(7));
    }
}
