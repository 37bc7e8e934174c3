use crate::core::errors::BitcoindeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request parameters as ordered key/value pairs.
///
/// Values are scalars: strings, numbers and booleans. `null` values are left
/// out of the encoded form, nested arrays or objects are rejected when the
/// request is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pairs: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// URL-encode the pairs, in caller order or with keys sorted ascending.
    ///
    /// Sorting is stable, so repeated keys keep their relative order.
    pub fn encode(&self, sorted: bool) -> Result<String, BitcoindeError> {
        let mut pairs = Vec::with_capacity(self.pairs.len());
        for (key, value) in &self.pairs {
            let rendered = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(BitcoindeError::SerializationError(format!(
                        "parameter '{}' must be a scalar value",
                        key
                    )));
                }
            };
            pairs.push((key.as_str(), rendered));
        }

        if sorted {
            pairs.sort_by(|a, b| a.0.cmp(b.0));
        }

        serde_urlencoded::to_string(&pairs).map_err(|e| {
            BitcoindeError::SerializationError(format!("Failed to encode parameters: {}", e))
        })
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Params {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One entry of the `errors` list in a bitcoin.de response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub field: Option<String>,
}

impl ApiErrorEntry {
    /// Read an entry leniently; bare strings are taken as the message
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(message) => Self {
                message: Some(message.clone()),
                code: None,
                field: None,
            },
            Value::Object(map) => Self {
                message: map.get("message").map(|m| match m {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
                code: map.get("code").and_then(Value::as_i64),
                field: map
                    .get("field")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            other => Self {
                message: Some(other.to_string()),
                code: None,
                field: None,
            },
        }
    }
}
