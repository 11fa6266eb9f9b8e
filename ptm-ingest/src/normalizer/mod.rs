//! Field normalization for imported records
//!
//! Independent, total functions that turn inconsistently formatted input
//! fields into canonical values. Every function returns `None` when a value
//! cannot be normalized; none of them fail, so one bad row never stops a
//! batch.

pub mod dates;
pub mod names;
pub mod price;

use serde::{Deserialize, Serialize};

pub use dates::{parse_flexible_date, parse_flexible_naive_date};
pub use names::{clean_client_name, normalize_technician_name};
pub use price::{clean_price, clean_price_str};

/// Untyped field value as read from an import file or API payload
///
/// JSON `null` maps to `Option::None` at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_from_json_payload() {
        let values: Vec<Option<RawValue>> =
            serde_json::from_str(r#"[125, 99.5, "!00$", null]"#).unwrap();
        assert_eq!(values[0], Some(RawValue::Integer(125)));
        assert_eq!(values[1], Some(RawValue::Number(99.5)));
        assert_eq!(values[2], Some(RawValue::Text("!00$".to_string())));
        assert_eq!(values[3], None);
        assert_eq!(values[2].as_ref().and_then(RawValue::as_text), Some("!00$"));
    }
}
