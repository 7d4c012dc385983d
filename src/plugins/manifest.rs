//! Plugin descriptor format (`<id>.json`)
//!
//! The descriptor body holds the plugin's settings as a JSON object. An empty
//! file is the same as `{}`.

use std::path::Path;

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Read the settings object from a descriptor file
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid JSON, or is not
/// a JSON object
pub fn read_settings(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse descriptor content into a settings object
///
/// # Errors
///
/// Returns error if the content is not a JSON object
pub fn parse_settings(content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match serde_json::from_str::<Value>(content)? {
        value @ Value::Object(_) => Ok(value),
        other => Err(Error::Plugin(format!(
            "descriptor must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_descriptor_is_empty_object() {
        assert_eq!(parse_settings("  \n").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn object_descriptor() {
        let settings = parse_settings(r#"{"api_url": "http://x"}"#).unwrap();
        assert_eq!(settings["api_url"], "http://x");
    }

    #[test]
    fn non_object_rejected() {
        let err = parse_settings("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn invalid_json_rejected() {
        assert!(matches!(
            parse_settings("{ broken"),
            Err(Error::Serialization(_))
        ));
    }
}
