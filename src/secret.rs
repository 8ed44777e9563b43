//! Secret material and nested lookup
//!
//! Both secret strategies collapse onto [`SecretValue`]: parsed JSON becomes
//! a `Document`, anything else stays `Opaque` and answers to the single key
//! `value`.

use serde_json::Value;

/// Key under which opaque (non-JSON) material is exposed
pub const OPAQUE_KEY: &str = "value";

/// Resolved material of one secret group
#[derive(Debug, Clone, PartialEq)]
pub enum SecretValue {
    /// Parsed JSON (usually an object of credentials)
    Document(Value),
    /// Raw text that did not parse as JSON
    Opaque(String),
}

impl SecretValue {
    /// Parse text returned by the remote secret store
    ///
    /// Only a JSON object counts as structured; any other text (including
    /// bare JSON scalars) is kept opaque.
    pub fn from_remote(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => Self::Document(value),
            _ => Self::Opaque(text.to_string()),
        }
    }

    /// Parse material injected directly into the environment
    ///
    /// Text that looks like a JSON object or array is parsed; a parse failure
    /// degrades to opaque text.
    pub fn from_inline(material: &str) -> Self {
        let trimmed = material.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(material) {
                return Self::Document(value);
            }
            tracing::debug!("inline secret material is not valid JSON, treating as opaque");
        }
        Self::Opaque(material.to_string())
    }

    /// Walk `path` through nested objects, stringifying the leaf
    ///
    /// Returns `None` when a segment is missing, when an intermediate value
    /// is not an object, or when the leaf is `null`.
    pub fn lookup(&self, path: &[String]) -> Option<String> {
        match self {
            Self::Opaque(text) => match path {
                [key] if key == OPAQUE_KEY => Some(text.clone()),
                _ => None,
            },
            Self::Document(root) => {
                let mut current = root;
                for segment in path {
                    current = current.as_object()?.get(segment)?;
                }
                stringify(current)
            }
        }
    }
}

/// Plain string form of a JSON leaf
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remote_object_is_document() {
        let v = SecretValue::from_remote(r#"{"username":"gatus","password":"p@ss"}"#);
        assert_eq!(v.lookup(&path(&["password"])), Some("p@ss".into()));
    }

    #[test]
    fn remote_plain_text_is_opaque() {
        let v = SecretValue::from_remote("hunter2");
        assert_eq!(v, SecretValue::Opaque("hunter2".into()));
        assert_eq!(v.lookup(&path(&["value"])), Some("hunter2".into()));
        assert_eq!(v.lookup(&path(&["password"])), None);
    }

    #[test]
    fn remote_json_scalar_is_opaque() {
        assert_eq!(
            SecretValue::from_remote("42"),
            SecretValue::Opaque("42".into())
        );
    }

    #[test]
    fn inline_invalid_json_falls_back_to_opaque() {
        let v = SecretValue::from_inline("{not json");
        assert_eq!(v, SecretValue::Opaque("{not json".into()));
        assert_eq!(v.lookup(&path(&["value"])), Some("{not json".into()));
    }

    #[test]
    fn inline_array_is_document_without_keys() {
        let v = SecretValue::from_inline(r#"["a","b"]"#);
        assert_eq!(v, SecretValue::Document(json!(["a", "b"])));
        assert_eq!(v.lookup(&path(&["0"])), None);
    }

    #[test]
    fn nested_lookup() {
        let v = SecretValue::Document(json!({"client": {"id": "abc", "port": 5432}}));
        assert_eq!(v.lookup(&path(&["client", "id"])), Some("abc".into()));
        assert_eq!(v.lookup(&path(&["client", "port"])), Some("5432".into()));
        assert_eq!(v.lookup(&path(&["client", "id", "deeper"])), None);
        assert_eq!(v.lookup(&path(&["missing"])), None);
    }

    #[test]
    fn non_string_leaves_are_stringified() {
        let v = SecretValue::Document(json!({"tls": true, "ttl": 1.5, "none": null}));
        assert_eq!(v.lookup(&path(&["tls"])), Some("true".into()));
        assert_eq!(v.lookup(&path(&["ttl"])), Some("1.5".into()));
        assert_eq!(v.lookup(&path(&["none"])), None);
    }
}
