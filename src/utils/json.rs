//! Lenient field decoders for provider payloads.
//!
//! Providers are inconsistent about types (Scopus sends counts as strings,
//! fields may be `null`, arrays or numbers). These decoders never fail; a value
//! of an unexpected shape decodes to `None`. Use them together with
//! `#[serde(default)]` so missing keys decode to `None` too.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a count given as a JSON number or numeric string
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value))
}

/// Decode a text field given as string or number; anything else is `None`
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(string_from_value(&value))
}

/// Decode a nested block; a block of the wrong shape is `None`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a list element by element, dropping elements that do not decode.
///
/// A value that is not an array at all is `None`.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(list_from_value(value))
}

fn list_from_value<T: DeserializeOwned>(value: Value) -> Option<Vec<T>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    }
}

fn count_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_count")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "lenient_string")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        inner: Option<Inner>,
        #[serde(default, deserialize_with = "lenient_list")]
        items: Option<Vec<Inner>>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        name: String,
    }

    fn inner(name: &str) -> Inner {
        Inner {
            name: name.to_string(),
        }
    }

    fn decode(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_count_variants() {
        assert_eq!(decode(json!({"count": 12})).count, Some(12));
        assert_eq!(decode(json!({"count": "34"})).count, Some(34));
        assert_eq!(decode(json!({"count": " 5 "})).count, Some(5));
        assert_eq!(decode(json!({"count": "many"})).count, None);
        assert_eq!(decode(json!({"count": -3})).count, None);
        assert_eq!(decode(json!({"count": null})).count, None);
        assert_eq!(decode(json!({})).count, None);
    }

    #[test]
    fn test_string_variants() {
        assert_eq!(decode(json!({"text": "abc"})).text.as_deref(), Some("abc"));
        assert_eq!(decode(json!({"text": 2021})).text.as_deref(), Some("2021"));
        assert_eq!(decode(json!({"text": ["a"]})).text, None);
        assert_eq!(decode(json!({"text": null})).text, None);
        assert_eq!(decode(json!({})).text, None);
    }

    #[test]
    fn test_nested_block_variants() {
        assert_eq!(decode(json!({"inner": {"name": "a"}})).inner, Some(inner("a")));
        assert_eq!(decode(json!({"inner": "a"})).inner, None);
        assert_eq!(decode(json!({"inner": {"name": 3}})).inner, None);
        assert_eq!(decode(json!({"inner": null})).inner, None);
        assert_eq!(decode(json!({})).inner, None);
    }

    #[test]
    fn test_list_keeps_decodable_elements() {
        let sample = decode(json!({
            "items": [{"name": "a"}, "stray", {"name": 7}, {"name": "b"}]
        }));
        assert_eq!(sample.items, Some(vec![inner("a"), inner("b")]));

        assert_eq!(decode(json!({"items": []})).items, Some(vec![]));
        assert_eq!(decode(json!({"items": {"name": "a"}})).items, None);
        assert_eq!(decode(json!({"items": null})).items, None);
    }
}
