use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

use crate::error::{Result, WeatherCacheError};

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current-weather payload for one location.
///
/// The provider's JSON object is kept as-is so that the disk cache round-trips
/// every field. Only the accessors below are required to find their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherRecord(Value);

impl WeatherRecord {
    /// Wrap a decoded payload. Anything other than a JSON object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        value.is_object().then_some(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// `weather[0].description`
    pub fn description(&self) -> Result<String> {
        self.text_at(&["weather", "0", "description"])
    }

    /// `weather[0].icon`
    pub fn icon(&self) -> Result<String> {
        self.text_at(&["weather", "0", "icon"])
    }

    /// `main.temp`
    pub fn temperature(&self) -> Result<String> {
        self.text_at(&["main", "temp"])
    }

    /// `main.feels_like`
    pub fn feels_like(&self) -> Result<String> {
        self.text_at(&["main", "feels_like"])
    }

    fn text_at(&self, path: &[&str]) -> Result<String> {
        let malformed = || WeatherCacheError::MalformedUpstreamData(render_path(path));

        let mut current = &self.0;
        for segment in path {
            current = match current {
                Value::Object(map) => map.get(*segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(malformed)?;
        }

        match current {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(render_number(n)),
            _ => Err(malformed()),
        }
    }
}

/// Whole floats print without a fraction (`20.0` -> `20`, `-0.0` -> `-0`).
/// Everything else keeps its shortest round-trip form.
fn render_number(n: &Number) -> String {
    let whole = n
        .as_f64()
        .filter(|f| n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64);

    match whole {
        Some(f) if f == 0.0 && f.is_sign_negative() => "-0".to_string(),
        Some(f) => (f as i64).to_string(),
        None => n.to_string(),
    }
}

fn render_path(path: &[&str]) -> String {
    let mut out = String::new();
    for segment in path {
        if segment.parse::<usize>().is_ok() {
            out.push_str(&format!("[{}]", segment));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        }
    }
    out
}
