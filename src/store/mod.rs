//! # Remote Store Abstraction
//!
//! Traits for the two remote lookups the bootstrapper performs:
//!
//! - [`ParameterStore`] - fetch the templated config by parameter name
//! - [`SecretStore`] - fetch secret material by reference (ARN)
//!
//! ## Implementations
//!
//! | Store | Use Case |
//! |-------|----------|
//! | [`AwsCli`] | Production, shells out to the `aws` CLI |
//! | [`MockStore`] | Tests, scripted responses and call recording |
//!
//! Neither trait retries. Retry is owned by
//! [`Bootstrapper`](crate::bootstrap::Bootstrapper).

mod aws;
mod mock;

pub use aws::AwsCli;
pub use mock::MockStore;

use async_trait::async_trait;

use crate::error::BootstrapError;

/// Source of the templated configuration document
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch a parameter as decrypted text
    ///
    /// Fails with [`BootstrapError::Fetch`] on any transport, permission or
    /// not-found error.
    async fn get_parameter(&self, name: &str) -> Result<String, BootstrapError>;
}

/// Remote secret lookup by reference identifier
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret string for `reference`
    ///
    /// `group` is only used to label errors.
    async fn get_secret(&self, group: &str, reference: &str) -> Result<String, BootstrapError>;
}
