use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar parameter value of an image operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    /// Types a raw value coming from an untrusted query string.
    ///
    /// `"200"` becomes `Int(200)`, `"true"` becomes `Bool(true)`, `"0.5"` becomes
    /// `Float(0.5)`; anything else is kept as text.
    pub fn parse_lossless(raw: &str) -> Self {
        if is_integer_literal(raw) {
            if let Ok(value) = raw.parse::<i64>() {
                return ParamValue::Int(value);
            }
        }

        match raw {
            "true" => return ParamValue::Bool(true),
            "false" => return ParamValue::Bool(false),
            _ => {}
        }

        if raw.contains('.') {
            if let Ok(value) = raw.parse::<f64>() {
                if value.is_finite() {
                    return ParamValue::Float(value);
                }
            }
        }

        ParamValue::Text(raw.to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Stable textual form used by the canonical serializer.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => write!(f, "{}", value),
            ParamValue::Float(value) => write!(f, "{}", value),
            ParamValue::Bool(true) => f.write_str("true"),
            ParamValue::Bool(false) => f.write_str("false"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Parameters of a single operation, in insertion order.
pub type Params = IndexMap<String, ParamValue>;

/// Builds a [`Params`] map from `(name, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Ordered mapping of operation name to its parameters.
///
/// Insertion order is part of the value: two sets holding the same operations
/// in a different order serialize differently and therefore hash differently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSet {
    operations: IndexMap<String, Params>,
}

/// Order-sensitive for both operations and their parameters.
impl PartialEq for OperationSet {
    fn eq(&self, other: &Self) -> bool {
        self.operations.len() == other.operations.len()
            && self
                .operations
                .iter()
                .zip(other.operations.iter())
                .all(|((a, pa), (b, pb))| a == b && pa.iter().eq(pb.iter()))
    }
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation. Re-inserting an existing name replaces its
    /// parameters and keeps the position of the first insertion.
    pub fn insert(&mut self, name: impl Into<String>, params: Params) -> Option<Params> {
        self.operations.insert(name.into(), params)
    }

    pub fn with(mut self, name: impl Into<String>, params: Params) -> Self {
        self.insert(name, params);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Params> {
        self.operations.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Params)> {
        self.operations
            .iter()
            .map(|(name, params)| (name.as_str(), params))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Params)> for OperationSet {
    fn from_iter<I: IntoIterator<Item = (K, Params)>>(iter: I) -> Self {
        let mut set = OperationSet::new();
        for (name, params) in iter {
            set.insert(name, params);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lossless_types_query_values() {
        assert_eq!(ParamValue::parse_lossless("200"), ParamValue::Int(200));
        assert_eq!(ParamValue::parse_lossless("007"), ParamValue::Int(7));
        assert_eq!(ParamValue::parse_lossless("-3"), ParamValue::Int(-3));
        assert_eq!(ParamValue::parse_lossless("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::parse_lossless("0.5"), ParamValue::Float(0.5));
        assert_eq!(
            ParamValue::parse_lossless("center"),
            ParamValue::Text("center".to_string())
        );
        assert_eq!(
            ParamValue::parse_lossless("99999999999999999999"),
            ParamValue::Text("99999999999999999999".to_string())
        );
    }

    #[test]
    fn equal_values_render_identically() {
        assert_eq!(ParamValue::parse_lossless("0150").to_string(), "150");
        assert_eq!(ParamValue::Float(2.0).to_string(), ParamValue::Int(2).to_string());
        assert_eq!(ParamValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn reinsert_keeps_first_position() {
        let mut set = OperationSet::new()
            .with("thumbnail", params([("width", 100)]))
            .with("crop", params([("x", 0)]));
        set.insert("thumbnail", params([("width", 200)]));

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["thumbnail", "crop"]);
        assert_eq!(set.get("thumbnail").and_then(|p| p["width"].as_i64()), Some(200));
    }

    #[test]
    fn equality_respects_order() {
        let a = OperationSet::new()
            .with("crop", params([("x", 1)]))
            .with("flip", params([("axis", "x")]));
        let b = OperationSet::new()
            .with("flip", params([("axis", "x")]))
            .with("crop", params([("x", 1)]));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn json_keeps_operation_order() {
        let set: OperationSet =
            serde_json::from_str(r#"{"crop":{"x":1},"thumbnail":{"width":200,"fit":true}}"#)
                .unwrap();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["crop", "thumbnail"]);
        assert_eq!(set.get("thumbnail").unwrap()["fit"], ParamValue::Bool(true));
    }
}
