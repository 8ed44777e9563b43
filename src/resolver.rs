//! Placeholder resolution
//!
//! Scans a template for `__FETCH_FROM_SECRET__.<group>.<path>` tokens,
//! resolves each distinct key path once against the [`SecretSource`] and
//! substitutes the values. Anything that cannot be resolved is left exactly
//! as written and recorded as a warning on the [`Resolution`].

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::error::{BootstrapError, SkipReason};
use crate::placeholder::{self, Placeholder};
use crate::secret_source::{GroupLookup, SecretSource};

/// Group holding the storage connection credentials
pub const STORAGE_GROUP: &str = "storage";

/// Leaf keys that end up inside a connection URL and must be escaped
const URL_CREDENTIAL_KEYS: [&str; 2] = ["username", "password"];

/// A placeholder that was left in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub key_path: String,
    pub reason: SkipReason,
}

/// Result of resolving one template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Template with every resolvable placeholder substituted
    pub text: String,
    /// Key paths that were substituted, in order of first appearance
    pub resolved: Vec<String>,
    /// Key paths left untouched, in order of first appearance
    pub skipped: Vec<Skipped>,
    /// One per unconfigured group, one per other skipped key path
    pub warnings: Vec<String>,
}

impl Resolution {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    fn skip(&mut self, key_path: &str, reason: SkipReason) {
        self.warnings
            .push(format!("{}: {}", placeholder::token_for(key_path), reason));
        self.skipped.push(Skipped {
            key_path: key_path.to_string(),
            reason,
        });
    }

    /// One-line summary for the final log
    pub fn summary(&self) -> String {
        format!(
            "{} placeholder(s) resolved, {} left unresolved",
            self.resolved.len(),
            self.skipped.len()
        )
    }
}

/// Apply the per-group transformation to a resolved value
///
/// Storage credentials are spliced into a connection URL, so every byte
/// outside the unreserved set is percent-encoded.
pub fn transform(placeholder: &Placeholder, value: String) -> String {
    if placeholder.group == STORAGE_GROUP && URL_CREDENTIAL_KEYS.contains(&placeholder.leaf()) {
        urlencoding::encode(&value).into_owned()
    } else {
        value
    }
}

/// Resolve every placeholder in `template`
///
/// Per-placeholder problems (malformed token, unconfigured group, missing
/// key) degrade to a warning. A failing secret fetch is returned as an error
/// so the caller can retry the whole attempt.
pub async fn resolve(
    template: &str,
    source: &mut SecretSource,
) -> Result<Resolution, BootstrapError> {
    let key_paths = placeholder::scan_unique(template);
    if key_paths.is_empty() {
        return Ok(Resolution::unchanged(template));
    }

    info!(
        count = placeholder::scan(template).len(),
        "Detected placeholders, fetching secrets as needed"
    );

    let mut resolution = Resolution::default();
    let mut values: HashMap<&str, String> = HashMap::new();
    let mut warned_groups: HashSet<String> = HashSet::new();

    for key_path in key_paths {
        let placeholder = match Placeholder::parse(key_path) {
            Ok(p) => p,
            Err(reason) => {
                resolution.skip(key_path, reason);
                continue;
            }
        };

        let value = match source.resolve(&placeholder.group).await? {
            GroupLookup::Resolved(secret) => secret.lookup(&placeholder.path),
            GroupLookup::Unconfigured => {
                let reason = SkipReason::UnconfiguredGroup {
                    group: placeholder.group.clone(),
                };
                if warned_groups.insert(placeholder.group.clone()) {
                    resolution.warnings.push(reason.to_string());
                }
                resolution.skipped.push(Skipped {
                    key_path: key_path.to_string(),
                    reason,
                });
                continue;
            }
        };

        match value {
            Some(value) => {
                values.insert(key_path, transform(&placeholder, value));
                info!(placeholder = %placeholder.token(), "Replaced placeholder with secret value");
                resolution.resolved.push(key_path.to_string());
            }
            None => {
                resolution.skip(
                    key_path,
                    SkipReason::KeyNotFound {
                        group: placeholder.group.clone(),
                    },
                );
            }
        }
    }

    resolution.text = placeholder::substitute(template, |k| values.get(k).map(String::as_str));
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_source::{SecretGroups, SecretReference};
    use crate::store::MockStore;
    use std::sync::Arc;

    fn source(groups: SecretGroups, store: &MockStore) -> SecretSource {
        SecretSource::new(groups, Arc::new(store.clone()))
    }

    #[test]
    fn transform_encodes_storage_credentials() {
        let p = Placeholder::parse("storage.password").unwrap();
        assert_eq!(transform(&p, "p@ss:w/rd x".into()), "p%40ss%3Aw%2Frd%20x");
    }

    #[test]
    fn transform_leaves_other_keys_alone() {
        let host = Placeholder::parse("storage.host").unwrap();
        assert_eq!(transform(&host, "db:5432".into()), "db:5432");

        let oidc = Placeholder::parse("oidc.password").unwrap();
        assert_eq!(transform(&oidc, "a/b".into()), "a/b");
    }

    #[tokio::test]
    async fn no_placeholders_is_identity() {
        let store = MockStore::new();
        let mut src = source(SecretGroups::new(), &store);
        let text = "web:\n  port: 8080\n";
        let res = resolve(text, &mut src).await.unwrap();
        assert_eq!(res.text, text);
        assert!(res.resolved.is_empty());
        assert!(res.skipped.is_empty());
    }

    #[tokio::test]
    async fn mixed_outcomes() {
        let store = MockStore::new().with_secret("arn:s", r#"{"username":"gatus","host":"db"}"#);
        let groups = SecretGroups::new().with("storage", SecretReference::Remote("arn:s".into()));
        let mut src = source(groups, &store);

        let text = "u: __FETCH_FROM_SECRET__.storage.username\n\
                    h: __FETCH_FROM_SECRET__.storage.host\n\
                    m: __FETCH_FROM_SECRET__.storage.missing\n\
                    g: __FETCH_FROM_SECRET__.storage\n\
                    o: __FETCH_FROM_SECRET__.oidc.client-id\n";
        let res = resolve(text, &mut src).await.unwrap();

        assert_eq!(
            res.text,
            "u: gatus\n\
             h: db\n\
             m: __FETCH_FROM_SECRET__.storage.missing\n\
             g: __FETCH_FROM_SECRET__.storage\n\
             o: __FETCH_FROM_SECRET__.oidc.client-id\n"
        );
        assert_eq!(res.resolved, vec!["storage.username", "storage.host"]);
        assert_eq!(
            res.skipped.iter().map(|s| s.reason.clone()).collect::<Vec<_>>(),
            vec![
                SkipReason::KeyNotFound {
                    group: "storage".into()
                },
                SkipReason::Malformed,
                SkipReason::UnconfiguredGroup {
                    group: "oidc".into()
                },
            ]
        );
        assert_eq!(res.summary(), "2 placeholder(s) resolved, 3 left unresolved");
        assert_eq!(
            res.warnings,
            vec![
                "__FETCH_FROM_SECRET__.storage.missing: key not found in secret group 'storage'",
                "__FETCH_FROM_SECRET__.storage: placeholder has no nested key after the group name",
                "no secret source configured for group 'oidc'",
            ]
        );
    }

    #[tokio::test]
    async fn unconfigured_group_warns_once() {
        let store = MockStore::new();
        let mut src = source(SecretGroups::new(), &store);
        let text = "__FETCH_FROM_SECRET__.oidc.a __FETCH_FROM_SECRET__.oidc.b \
                    __FETCH_FROM_SECRET__.oidc.a __FETCH_FROM_SECRET__.ldap.a";

        let res = resolve(text, &mut src).await.unwrap();

        assert_eq!(res.text, text);
        assert_eq!(res.skipped.len(), 3);
        assert_eq!(
            res.warnings,
            vec![
                "no secret source configured for group 'oidc'",
                "no secret source configured for group 'ldap'",
            ]
        );
    }

    #[tokio::test]
    async fn secret_fetch_failure_is_an_error() {
        let store = MockStore::new();
        let groups = SecretGroups::new().with("oidc", SecretReference::Remote("arn:o".into()));
        let mut src = source(groups, &store);
        let err = resolve("__FETCH_FROM_SECRET__.oidc.client-id", &mut src)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::SecretFetch { .. }));
    }

    #[tokio::test]
    async fn secret_value_containing_a_token_is_not_reexpanded() {
        let store = MockStore::new();
        let groups = SecretGroups::new()
            .with("a", SecretReference::Inline(r#"{"k":"__FETCH_FROM_SECRET__.b.k"}"#.into()))
            .with("b", SecretReference::Inline(r#"{"k":"second"}"#.into()));
        let mut src = source(groups, &store);
        let res = resolve("__FETCH_FROM_SECRET__.a.k", &mut src).await.unwrap();
        assert_eq!(res.text, "__FETCH_FROM_SECRET__.b.k");
    }
}
