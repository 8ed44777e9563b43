//! config-bootstrap - render a secret-templated config before the service starts
//!
//! Fetches a template from SSM Parameter Store, resolves
//! `__FETCH_FROM_SECRET__.<group>.<key>` placeholders against Secrets Manager
//! or inline material, and writes the result to disk.

pub mod backoff;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod placeholder;
pub mod resolver;
pub mod scan;
pub mod secret;
pub mod secret_source;
pub mod store;

pub use backoff::Backoff;
pub use bootstrap::{BootstrapReport, Bootstrapper};
pub use config::{discover_secret_groups, BootstrapConfig};
pub use error::{BootstrapError, FixSuggestion, SkipReason};
pub use resolver::{resolve, Resolution};
pub use scan::{scan_template, ScanReport};
pub use secret::SecretValue;
pub use secret_source::{GroupLookup, SecretGroups, SecretReference, SecretSource};
pub use store::{AwsCli, MockStore, ParameterStore, SecretStore};
