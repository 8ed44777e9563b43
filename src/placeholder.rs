//! Placeholder grammar
//!
//! A placeholder is the sentinel followed by a dotted key path:
//!
//! ```text
//! __FETCH_FROM_SECRET__.storage.password
//! └──── sentinel ─────┘ └group┘ └ key ┘
//! ```
//!
//! The first segment names the secret group, the rest is the nested lookup
//! path inside that group's value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SkipReason;

/// Sentinel that opens every placeholder
pub const SENTINEL: &str = "__FETCH_FROM_SECRET__";

/// Pattern for `__FETCH_FROM_SECRET__.<path>` references
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__FETCH_FROM_SECRET__\.([A-Za-z0-9_\-.]+)").unwrap());

/// A placeholder split into its group and nested path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Full key path as written after the sentinel (`storage.password`)
    pub key_path: String,
    /// First segment (`storage`)
    pub group: String,
    /// Remaining segments (`["password"]`)
    pub path: Vec<String>,
}

impl Placeholder {
    /// Parse a key path (the part after `SENTINEL.`)
    ///
    /// Fails with [`SkipReason::Malformed`] when there is no nested segment
    /// or when any segment is empty (`storage..password`, `storage.`).
    pub fn parse(key_path: &str) -> Result<Self, SkipReason> {
        let mut segments = key_path.split('.');
        let group = segments.next().unwrap_or_default();
        let path: Vec<String> = segments.map(str::to_string).collect();

        if group.is_empty() || path.is_empty() || path.iter().any(String::is_empty) {
            return Err(SkipReason::Malformed);
        }

        Ok(Self {
            key_path: key_path.to_string(),
            group: group.to_string(),
            path,
        })
    }

    /// The placeholder exactly as it appears in the template
    pub fn token(&self) -> String {
        token_for(&self.key_path)
    }

    /// Last segment of the nested path
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

/// Render the template token for a key path
pub fn token_for(key_path: &str) -> String {
    format!("{SENTINEL}.{key_path}")
}

/// All key paths in the text, in order of appearance (duplicates kept)
pub fn scan(text: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Distinct key paths in order of first appearance
pub fn scan_unique(text: &str) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    scan(text).into_iter().filter(|k| seen.insert(*k)).collect()
}

/// Replace every token whose key path `lookup` answers for
///
/// Matching is token-aware: a replacement for `storage.password` never
/// touches `storage.password2`. Tokens the lookup declines stay verbatim.
pub fn substitute<'a, F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    PLACEHOLDER_PATTERN
        .replace_all(text, |cap: &regex::Captures| match lookup(&cap[1]) {
            Some(value) => value.to_string(),
            None => cap[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_group_and_nested_path() {
        let p = Placeholder::parse("oidc.client.secret").unwrap();
        assert_eq!(p.group, "oidc");
        assert_eq!(p.path, vec!["client".to_string(), "secret".to_string()]);
        assert_eq!(p.leaf(), "secret");
        assert_eq!(p.token(), "__FETCH_FROM_SECRET__.oidc.client.secret");
    }

    #[test]
    fn group_only_is_malformed() {
        assert_eq!(Placeholder::parse("storage"), Err(SkipReason::Malformed));
    }

    #[test]
    fn empty_segments_are_malformed() {
        assert_eq!(Placeholder::parse("storage."), Err(SkipReason::Malformed));
        assert_eq!(
            Placeholder::parse("storage..password"),
            Err(SkipReason::Malformed)
        );
    }

    #[test]
    fn scan_finds_tokens_in_order() {
        let text = "a: __FETCH_FROM_SECRET__.storage.username\n\
                    b: __FETCH_FROM_SECRET__.oidc.client-id\n\
                    c: __FETCH_FROM_SECRET__.storage.username";
        assert_eq!(
            scan(text),
            vec!["storage.username", "oidc.client-id", "storage.username"]
        );
        assert_eq!(scan_unique(text), vec!["storage.username", "oidc.client-id"]);
    }

    #[test]
    fn scan_ignores_decoys() {
        let text = "__FETCH_FROM_SECRET__ alone, _FETCH_FROM_SECRET_.x.y, __FETCH_FROM_SECRET__:x";
        assert!(scan(text).is_empty());
    }

    #[test]
    fn substitute_is_token_aware() {
        let text = "__FETCH_FROM_SECRET__.s.password / __FETCH_FROM_SECRET__.s.password2";
        let out = substitute(text, |k| (k == "s.password").then_some("one"));
        assert_eq!(out, "one / __FETCH_FROM_SECRET__.s.password2");
    }

    #[test]
    fn substitute_without_tokens_is_identity() {
        let text = "endpoints:\n  - name: web\n    url: https://example.com\n";
        assert_eq!(substitute(text, |_| Some("x")), text);
    }
}
