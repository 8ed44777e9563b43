//! Runtime configuration
//!
//! Flags come from the CLI (with env fallbacks, see `main.rs`). Secret
//! groups are discovered from the environment:
//!
//! - `<GROUP>_SECRET_ARN` binds `<group>` to the remote secret store
//! - `<GROUP>_SECRET` binds `<group>` to inline material
//!
//! Inline material wins when both are set for the same group.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backoff::Backoff;
use crate::bootstrap::Bootstrapper;
use crate::error::BootstrapError;
use crate::secret_source::{SecretGroups, SecretReference, SecretSource};
use crate::store::AwsCli;

/// Where the rendered config lands by default
pub const DEFAULT_DESTINATION: &str = "/config/user_config.yaml";

const REMOTE_SUFFIX: &str = "_SECRET_ARN";
const INLINE_SUFFIX: &str = "_SECRET";

/// Everything a `run` needs
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub parameter_name: String,
    pub region: String,
    pub destination: PathBuf,
    pub aws_cli: String,
    pub command_timeout: Duration,
    pub backoff: Backoff,
    pub groups: SecretGroups,
}

impl BootstrapConfig {
    /// Reject values clap cannot catch (empty strings from the environment)
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.parameter_name.trim().is_empty() {
            return Err(BootstrapError::Config(
                "parameter name is empty (GATUS_CONFIG_SSM_PARAM)".into(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(BootstrapError::Config("region is empty (AWS_REGION)".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(BootstrapError::Config("destination path is empty".into()));
        }
        Ok(())
    }

    /// Wire the AWS CLI stores into a bootstrapper
    pub fn into_bootstrapper(self) -> Result<Bootstrapper, BootstrapError> {
        self.validate()?;

        let aws = Arc::new(
            AwsCli::new(self.region)
                .with_cli_path(self.aws_cli)
                .with_timeout(self.command_timeout),
        );
        let secrets = SecretSource::new(self.groups, aws.clone());

        Ok(Bootstrapper::new(self.parameter_name, self.destination, aws, secrets)
            .with_backoff(self.backoff))
    }
}

/// Build the secret group registry from environment pairs
pub fn discover_secret_groups<I, K, V>(vars: I) -> SecretGroups
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut remote = BTreeMap::new();
    let mut inline = BTreeMap::new();

    for (key, value) in vars {
        let (key, value) = (key.as_ref(), value.as_ref());
        if value.trim().is_empty() {
            continue;
        }
        if let Some(group) = key.strip_suffix(REMOTE_SUFFIX).and_then(group_name) {
            remote.insert(group, value.trim().to_string());
        } else if let Some(group) = key.strip_suffix(INLINE_SUFFIX).and_then(group_name) {
            inline.insert(group, value.to_string());
        }
    }

    let mut groups = SecretGroups::new();
    for (group, arn) in remote {
        if inline.contains_key(&group) {
            debug!(group = %group, "Inline secret material takes precedence over ARN");
            continue;
        }
        groups.insert(group, SecretReference::Remote(arn));
    }
    for (group, material) in inline {
        groups.insert(group, SecretReference::Inline(material));
    }
    groups
}

/// `STORAGE` → `storage`; rejects empty or non `[A-Z0-9_]` prefixes
fn group_name(prefix: &str) -> Option<String> {
    let valid = !prefix.is_empty()
        && !prefix.starts_with('_')
        && !prefix.ends_with('_')
        && prefix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    valid.then(|| prefix.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_remote_and_inline_groups() {
        let groups = discover_secret_groups([
            ("STORAGE_SECRET_ARN", "arn:aws:secretsmanager:eu-west-1:1:secret:storage"),
            ("OIDC_SECRET", r#"{"client-id":"abc"}"#),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(
            groups.get("storage"),
            Some(&SecretReference::Remote(
                "arn:aws:secretsmanager:eu-west-1:1:secret:storage".into()
            ))
        );
        assert_eq!(
            groups.get("oidc"),
            Some(&SecretReference::Inline(r#"{"client-id":"abc"}"#.into()))
        );
        assert_eq!(groups.iter().count(), 2);
    }

    #[test]
    fn inline_wins_over_arn() {
        let groups = discover_secret_groups([
            ("STORAGE_SECRET_ARN", "arn:s"),
            ("STORAGE_SECRET", "inline"),
        ]);
        assert_eq!(
            groups.get("storage"),
            Some(&SecretReference::Inline("inline".into()))
        );
    }

    #[test]
    fn ignores_empty_values_and_odd_names() {
        let groups = discover_secret_groups([
            ("STORAGE_SECRET_ARN", "  "),
            ("_SECRET", "x"),
            ("lower_SECRET", "x"),
            ("ALERT_WEBHOOK_SECRET", "https://hooks.example.com/x"),
        ]);
        assert!(!groups.contains("storage"));
        assert!(groups.contains("alert_webhook"));
        assert_eq!(groups.iter().count(), 1);
    }

    #[test]
    fn validate_rejects_empty_parameter() {
        let config = BootstrapConfig {
            parameter_name: " ".into(),
            region: "eu-west-1".into(),
            destination: DEFAULT_DESTINATION.into(),
            aws_cli: "aws".into(),
            command_timeout: Duration::from_secs(30),
            backoff: Backoff::default(),
            groups: SecretGroups::new(),
        };
        assert!(matches!(config.validate(), Err(BootstrapError::Config(_))));
    }
}
