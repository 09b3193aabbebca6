//! Result Records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters
pub type Params = Map<String, Value>;

/// Build parameters from a JSON object; any other value gives no parameters
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// One result row: column name → scalar, list, map, or null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Zip a row with its column names
    pub fn from_row(columns: &[String], row: Vec<Value>) -> Self {
        Self(columns.iter().cloned().zip(row).collect())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).filter(|v| !v.is_null())
    }

    /// Numeric column; numeric strings are parsed
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column)?.as_str()
    }

    /// Column rendered as text, whatever its scalar type
    pub fn get_string(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
