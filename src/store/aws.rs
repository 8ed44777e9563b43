//! AWS CLI backed stores
//!
//! Runs `aws ssm get-parameter` and `aws secretsmanager get-secret-value`
//! with text output, so the task image needs nothing beyond the CLI and a
//! task role.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{ParameterStore, SecretStore};
use crate::error::BootstrapError;

/// Default timeout for a single CLI invocation (30 seconds)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Both stores, implemented on top of the AWS CLI
#[derive(Debug, Clone)]
pub struct AwsCli {
    /// Path to the aws CLI binary
    cli_path: String,
    /// Region passed as `--region`
    region: String,
    /// Per-invocation timeout
    timeout: Duration,
}

impl AwsCli {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            cli_path: "aws".to_string(),
            region: region.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Set a custom CLI path
    pub fn with_cli_path(mut self, path: impl Into<String>) -> Self {
        self.cli_path = path.into();
        self
    }

    /// Set invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the CLI and return stdout, or a human readable cause
    async fn run(&self, args: &[&str]) -> Result<String, String> {
        let output = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new(&self.cli_path)
                .args(args)
                .args(["--output", "text", "--region", self.region.as_str(), "--no-cli-pager"])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| format!("command timed out after {}s", self.timeout.as_secs()))?
        .map_err(|e| format!("failed to execute '{}': {}", self.cli_path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} ({})", stderr.trim(), output.status));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| format!("output is not valid UTF-8: {}", e))?;
        Ok(strip_trailing_newline(stdout))
    }
}

/// Drop the single newline `--output text` appends
fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[async_trait]
impl ParameterStore for AwsCli {
    #[instrument(skip(self))]
    async fn get_parameter(&self, name: &str) -> Result<String, BootstrapError> {
        debug!("Fetching SSM parameter");
        self.run(&[
            "ssm",
            "get-parameter",
            "--name",
            name,
            "--with-decryption",
            "--query",
            "Parameter.Value",
        ])
        .await
        .map_err(|reason| BootstrapError::Fetch {
            parameter: name.to_string(),
            reason,
        })
    }
}

#[async_trait]
impl SecretStore for AwsCli {
    #[instrument(skip(self))]
    async fn get_secret(&self, group: &str, reference: &str) -> Result<String, BootstrapError> {
        debug!("Fetching secret");
        self.run(&[
            "secretsmanager",
            "get-secret-value",
            "--secret-id",
            reference,
            "--query",
            "SecretString",
        ])
        .await
        .map_err(|reason| BootstrapError::SecretFetch {
            group: group.to_string(),
            reason,
        })
    }
}
