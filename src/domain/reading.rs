// Sample value domain models
use serde_json::Value;
use std::fmt;

/// Field name used when a reading of unexpected shape is treated as a composite
pub const IMPLICIT_FIELD: &str = "value";

/// A single plotted value
#[derive(Debug, Clone)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    /// Numeric view of the reading; text is parsed when it looks like a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(v) => Some(*v),
            Reading::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    fn from_field(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(Reading::Number).unwrap_or_else(|| Reading::Text(n.to_string())),
            Value::String(s) => Reading::Text(s),
            Value::Bool(b) => Reading::Number(if b { 1.0 } else { 0.0 }),
            other => Reading::Text(other.to_string()),
        }
    }
}

// Strict equality: no coercion between numbers and text
impl PartialEq for Reading {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reading::Number(a), Reading::Number(b)) => a == b,
            (Reading::Text(a), Reading::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(v) => write!(f, "{}", v),
            Reading::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(value)
    }
}

impl From<&str> for Reading {
    fn from(value: &str) -> Self {
        Reading::Text(value.to_string())
    }
}

/// A telemetry reading as it enters the core, classified once
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Scalar(Reading),
    /// Named fields in document order
    Composite(Vec<(String, Reading)>),
}

impl TelemetryValue {
    pub fn composite<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        TelemetryValue::Composite(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), Reading::Number(v)))
                .collect(),
        )
    }

    /// Classify a raw JSON payload.
    ///
    /// Numbers and strings are scalars, objects are composites. Any other
    /// shape degrades to a composite with a single implicit field.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(v) => TelemetryValue::Scalar(Reading::Number(v)),
                None => TelemetryValue::Scalar(Reading::Text(n.to_string())),
            },
            Value::String(s) => TelemetryValue::Scalar(Reading::Text(s)),
            Value::Object(map) => TelemetryValue::Composite(
                map.into_iter()
                    .map(|(k, v)| (k, Reading::from_field(v)))
                    .collect(),
            ),
            other => {
                tracing::debug!("Treating unexpected telemetry shape as composite: {}", other);
                TelemetryValue::Composite(vec![(IMPLICIT_FIELD.to_string(), Reading::from_field(other))])
            }
        }
    }
}

impl From<f64> for TelemetryValue {
    fn from(value: f64) -> Self {
        TelemetryValue::Scalar(Reading::Number(value))
    }
}

impl From<&str> for TelemetryValue {
    fn from(value: &str) -> Self {
        TelemetryValue::Scalar(Reading::Text(value.to_string()))
    }
}
