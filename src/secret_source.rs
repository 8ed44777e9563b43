//! Secret groups and their lazily resolved values
//!
//! A group (`storage`, `oidc`, ...) is bound at start to a
//! [`SecretReference`]. The first placeholder that needs the group triggers
//! exactly one fetch or parse; the result is cached for the rest of the run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::BootstrapError;
use crate::secret::SecretValue;
use crate::store::SecretStore;

/// Where a group's material comes from
#[derive(Clone, PartialEq, Eq)]
pub enum SecretReference {
    /// Fetched from the secret store by identifier (ARN)
    Remote(String),
    /// The material itself, injected into the environment
    Inline(String),
}

impl SecretReference {
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Inline(_) => "inline",
        }
    }
}

// Inline material must never reach a log line.
impl fmt::Debug for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(id) => f.debug_tuple("Remote").field(id).finish(),
            Self::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

/// Group name → reference, fixed at process start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretGroups {
    groups: BTreeMap<String, SecretReference>,
}

impl SecretGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a group, replacing any earlier binding
    pub fn insert(&mut self, group: impl Into<String>, reference: SecretReference) {
        self.groups.insert(group.into(), reference);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, group: impl Into<String>, reference: SecretReference) -> Self {
        self.insert(group, reference);
        self
    }

    pub fn get(&self, group: &str) -> Option<&SecretReference> {
        self.groups.get(group)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretReference)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Outcome of asking for a group
#[derive(Debug)]
pub enum GroupLookup<'a> {
    Resolved(&'a SecretValue),
    Unconfigured,
}

/// Resolves groups on first use and caches them for the process lifetime
pub struct SecretSource {
    groups: SecretGroups,
    store: Arc<dyn SecretStore>,
    /// Resolved groups (group name → value)
    cache: HashMap<String, SecretValue>,
}

impl SecretSource {
    pub fn new(groups: SecretGroups, store: Arc<dyn SecretStore>) -> Self {
        Self {
            groups,
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolve a group, fetching or parsing it at most once
    ///
    /// A failed remote fetch is not cached, so a later call tries again.
    pub async fn resolve(&mut self, group: &str) -> Result<GroupLookup<'_>, BootstrapError> {
        let Some(reference) = self.groups.get(group) else {
            return Ok(GroupLookup::Unconfigured);
        };

        if !self.cache.contains_key(group) {
            let value = match reference {
                SecretReference::Remote(id) => {
                    info!(group, reference = %id, "Fetching secret");
                    let text = self.store.get_secret(group, id).await?;
                    SecretValue::from_remote(&text)
                }
                SecretReference::Inline(material) => {
                    info!(group, "Using inline secret material");
                    SecretValue::from_inline(material)
                }
            };
            self.cache.insert(group.to_string(), value);
        }

        Ok(self
            .cache
            .get(group)
            .map_or(GroupLookup::Unconfigured, GroupLookup::Resolved))
    }
}
