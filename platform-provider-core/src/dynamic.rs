//! Loosely typed configuration values.
//!
//! Vendor configuration arrives from the declarative front-end as an open
//! ended value. [`DynamicValue`] is the tagged union that carries it;
//! vendors convert a [`ConfigMap`] into their own typed request structs and
//! reject anything they do not understand instead of stringifying it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Generic key/value configuration bag handed to vendor strategies.
pub type ConfigMap = BTreeMap<String, DynamicValue>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    String(String),
    /// Integer or float, kept exactly as it arrived.
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<DynamicValue>),
    /// Homogeneous map-typed value.
    Map(BTreeMap<String, DynamicValue>),
    /// Object-typed value with fixed attribute names.
    Object(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::String(_) => "string",
            DynamicValue::Number(_) => "number",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::List(_) => "list",
            DynamicValue::Map(_) => "map",
            DynamicValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Converts a map- or object-shaped value into a [`ConfigMap`].
    pub fn to_config_map(&self) -> Result<ConfigMap, DispatchError> {
        match self {
            DynamicValue::Map(entries) | DynamicValue::Object(entries) => Ok(entries.clone()),
            DynamicValue::Null => Err(DispatchError::InvalidConfig(
                "configuration is required".into(),
            )),
            other => Err(DispatchError::InvalidConfig(format!(
                "expected a map or object, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn from_config_map(map: ConfigMap) -> Self {
        DynamicValue::Object(map)
    }

    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DynamicValue::List(
            items
                .into_iter()
                .map(|s| DynamicValue::String(s.into()))
                .collect(),
        )
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::String(s)
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}

impl From<i64> for DynamicValue {
    fn from(n: i64) -> Self {
        DynamicValue::Number(n.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`.
impl From<f64> for DynamicValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(DynamicValue::Null, DynamicValue::Number)
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => DynamicValue::Null,
            Value::Bool(b) => DynamicValue::Bool(b),
            Value::Number(n) => DynamicValue::Number(n),
            Value::String(s) => DynamicValue::String(s),
            Value::Array(items) => DynamicValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(entries) => DynamicValue::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<&DynamicValue> for serde_json::Value {
    fn from(value: &DynamicValue) -> Self {
        use serde_json::Value;
        match value {
            DynamicValue::Null => Value::Null,
            DynamicValue::Bool(b) => Value::Bool(*b),
            DynamicValue::Number(n) => Value::Number(n.clone()),
            DynamicValue::String(s) => Value::String(s.clone()),
            DynamicValue::List(items) => Value::Array(items.iter().map(Into::into).collect()),
            DynamicValue::Map(entries) | DynamicValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Into::into)
    }
}

/// Typed accessors vendors use while converting a [`ConfigMap`].
pub trait ConfigMapExt {
    /// A required, non-empty list of strings.
    fn required_string_list(&self, key: &str) -> Result<Vec<String>, String>;
    /// A required, non-blank string.
    fn required_string(&self, key: &str) -> Result<String, String>;
    /// An optional string; present-but-wrong-type is still an error.
    fn optional_string(&self, key: &str) -> Result<Option<String>, String>;
}

impl ConfigMapExt for ConfigMap {
    fn required_string_list(&self, key: &str) -> Result<Vec<String>, String> {
        let not_list = || format!("{key} is required and must be a non-empty list");
        let items = self.get(key).and_then(DynamicValue::as_list).ok_or_else(not_list)?;
        if items.is_empty() {
            return Err(not_list());
        }
        items
            .iter()
            .map(|item| match item {
                DynamicValue::String(s) if !s.trim().is_empty() => Ok(s.clone()),
                other => Err(format!(
                    "{key} must only contain non-empty strings, found {}",
                    other.type_name()
                )),
            })
            .collect()
    }

    fn required_string(&self, key: &str) -> Result<String, String> {
        match self.get(key) {
            Some(DynamicValue::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(DynamicValue::String(_)) | None | Some(DynamicValue::Null) => {
                Err(format!("{key} is required"))
            }
            Some(other) => Err(format!("{key} must be a string, got {}", other.type_name())),
        }
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>, String> {
        match self.get(key) {
            None | Some(DynamicValue::Null) => Ok(None),
            Some(DynamicValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(format!("{key} must be a string, got {}", other.type_name())),
        }
    }
}
