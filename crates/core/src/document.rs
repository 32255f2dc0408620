//! Helpers for building domain values out of JSON documents.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Failure to build a value from a JSON document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// A field the value cannot exist without is absent.
    #[error("missing mandatory field \"{0}\"")]
    MissingField(&'static str),
    /// The document has the wrong shape for the requested value.
    #[error("invalid document: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Capability of being constructed from a JSON document.
///
/// Database keys and values implement this so a [`crate::database::Table`]
/// can be filled from its backing file.
pub trait FromDocument: Sized {
    /// Build the value, rejecting documents that lack mandatory data.
    fn from_document(document: &Value) -> Result<Self, DocumentError>;
}

impl FromDocument for String {
    fn from_document(document: &Value) -> Result<Self, DocumentError> {
        document
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DocumentError::Invalid(format!("expected a string, found {document}")))
    }
}

/// Deserialize any serde-capable value out of a borrowed document.
pub fn from_serde<T: DeserializeOwned>(document: &Value) -> Result<T, DocumentError> {
    Ok(T::deserialize(document)?)
}

/// Field deserializer that turns a wrong-typed value into `None`.
///
/// Used together with `#[serde(default)]` so a missing field and a malformed
/// one both degrade to "absent".
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Same as [`lenient`] for non optional fields that fall back to their default.
pub fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient")]
        year: Option<String>,
        #[serde(default, deserialize_with = "lenient_or_default")]
        tags: Vec<String>,
    }

    #[test]
    fn lenient_fields_degrade_to_absent() {
        let sample: Sample = from_serde(&json!({"year": 1991, "tags": "oops"})).unwrap();
        assert_eq!(
            sample,
            Sample {
                year: None,
                tags: Vec::new()
            }
        );

        let sample: Sample = from_serde(&json!({"year": "1991", "tags": ["fighting"]})).unwrap();
        assert_eq!(sample.year.as_deref(), Some("1991"));
        assert_eq!(sample.tags, vec!["fighting".to_string()]);
    }

    #[test]
    fn string_keys_require_strings() {
        assert_eq!(String::from_document(&json!("sf2")).unwrap(), "sf2");
        assert!(String::from_document(&json!(42)).is_err());
    }
}
