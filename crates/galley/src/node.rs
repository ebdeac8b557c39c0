//! node data
//!
//! Configuration injected by whoever embeds the recipe. Recipe blocks read it while they are
//! evaluated, which happens when the script is requested, not when the recipe is constructed.
//!
//! Values are one of
//! - boolean (true/false)
//! - integer (i64)
//! - decimal (f64)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving map with string keys)
//!
//! There is no `null`.
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// All possible value types
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up `key` when this is an object
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(object) => object.get(key),
            _ => None,
        }
    }
}

/// Strings render raw, everything else renders as json
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
            Value::Array(_) | Value::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<K: ToString, V: Into<Value>> From<IndexMap<K, V>> for Value {
    fn from(value: IndexMap<K, V>) -> Self {
        Value::Object(
            value
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

/// Recipe files see node data as the hcl variable `node`
impl From<&Value> for hcl::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Boolean(b) => hcl::Value::Bool(*b),
            Value::Integer(i) => hcl::Value::Number((*i).into()),
            Value::Decimal(d) => hcl::Number::from_f64(*d)
                .map(hcl::Value::Number)
                .unwrap_or(hcl::Value::Null),
            Value::String(s) => hcl::Value::String(s.clone()),
            Value::Array(a) => hcl::Value::Array(a.iter().map(Into::into).collect()),
            Value::Object(o) => hcl::Value::Object(
                o.iter()
                    .map(|(key, value)| (key.clone(), value.into()))
                    .collect(),
            ),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

/// Key/value mapping readable from every block of a recipe
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NodeData(IndexMap<String, Value>);

impl NodeData {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value of `key` when it is a string
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for NodeData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for NodeData {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<&NodeData> for hcl::Value {
    fn from(node: &NodeData) -> Self {
        hcl::Value::Object(
            node.0
                .iter()
                .map(|(key, value)| (key.clone(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_from_yaml() {
        let node: NodeData = serde_yaml::from_str(
            "dir: /home\nport: 8080\nratio: 0.5\nenabled: true\ngems: [rails, rack]\ndb: { name: app }\n",
        )
        .unwrap();

        assert_eq!(node.str("dir"), Some("/home"));
        assert_eq!(node.get("port"), Some(&Value::Integer(8080)));
        assert_eq!(node.get("ratio"), Some(&Value::Decimal(0.5)));
        assert_eq!(node.get("enabled"), Some(&Value::Boolean(true)));
        assert_eq!(
            node.get("gems"),
            Some(&Value::from(vec!["rails", "rack"]))
        );
        assert_eq!(
            node.get("db").and_then(|db| db.get("name")),
            Some(&Value::from("app"))
        );
    }

    #[test]
    fn keeps_insertion_order() {
        let node = NodeData::from([("b", 1_i64), ("a", 2)]);
        let keys: Vec<_> = node.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn display_for_interpolation() {
        assert_eq!(Value::from("/home").to_string(), "/home");
        assert_eq!(Value::from(3_i64).to_string(), "3");
        assert_eq!(Value::from(vec![1_i64, 2]).to_string(), "[1,2]");
    }

    #[test]
    fn json_round_trip() {
        let node = NodeData::from([("dir", Value::from("/home")), ("n", Value::from(1_i64))]);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"dir":"/home","n":1}"#);
        assert_eq!(serde_json::from_str::<NodeData>(&json).unwrap(), node);
    }
}
