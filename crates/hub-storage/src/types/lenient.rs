//! Tolerant field decoders for hand-entered profile and revenue values.
//!
//! Profile forms store numbers and strings interchangeably, so a field typed
//! as text may hold `30` and an amount may hold `"150"`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text field that also accepts numbers and booleans. `null` reads as empty.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected text or number, got {}",
                other
            )))
        }
    })
}

/// Amount that also accepts numeric strings. Blank, `null` and unparsable
/// text read as 0.
pub(crate) fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Null => 0.0,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected number, got {}",
                other
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Profile {
        #[serde(default, deserialize_with = "string_or_number")]
        age: String,
        #[serde(default, deserialize_with = "number_or_string")]
        amount: f64,
    }

    fn profile(value: Value) -> Profile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_accepts_numbers() {
        assert_eq!(profile(json!({"age": 30})).age, "30");
        assert_eq!(profile(json!({"age": "31"})).age, "31");
        assert_eq!(profile(json!({"age": null})).age, "");
        assert_eq!(profile(json!({})).age, "");
    }

    #[test]
    fn test_amount_accepts_numeric_text() {
        assert_eq!(profile(json!({"amount": "150"})).amount, 150.0);
        assert_eq!(profile(json!({"amount": " 12.5 "})).amount, 12.5);
        assert_eq!(profile(json!({"amount": 99})).amount, 99.0);
        assert_eq!(profile(json!({"amount": "lots"})).amount, 0.0);
        assert_eq!(profile(json!({"amount": null})).amount, 0.0);
    }

    #[test]
    fn test_structured_values_are_rejected() {
        assert!(serde_json::from_value::<Profile>(json!({"age": ["x"]})).is_err());
        assert!(serde_json::from_value::<Profile>(json!({"amount": {"v": 1}})).is_err());
    }
}
