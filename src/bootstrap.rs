//! Bootstrap orchestration: fetch → resolve → persist
//!
//! The retry loop covers fetching and resolving. Writing the result happens
//! once, after the loop, and its errors are returned as-is.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::backoff::Backoff;
use crate::error::BootstrapError;
use crate::resolver::{self, Resolution};
use crate::secret_source::SecretSource;
use crate::store::ParameterStore;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Attempt number that succeeded (1-based)
    pub attempts: usize,
    pub destination: PathBuf,
    pub resolution: Resolution,
}

/// Drives a single bootstrap run
pub struct Bootstrapper {
    parameter_name: String,
    destination: PathBuf,
    parameters: Arc<dyn ParameterStore>,
    secrets: SecretSource,
    backoff: Backoff,
}

impl Bootstrapper {
    pub fn new(
        parameter_name: impl Into<String>,
        destination: impl Into<PathBuf>,
        parameters: Arc<dyn ParameterStore>,
        secrets: SecretSource,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            destination: destination.into(),
            parameters,
            secrets,
            backoff: Backoff::default(),
        }
    }

    /// Replace the default `[0, 2, 4, 8, 16]` schedule
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetch, resolve and write the config
    ///
    /// Nothing is written unless an attempt succeeds.
    pub async fn run(mut self) -> Result<BootstrapReport, BootstrapError> {
        let (attempts, resolution) = self.fetch_and_resolve().await?;

        persist(&self.destination, &resolution.text)?;
        info!(destination = %self.destination.display(), "Final config written");

        for warning in &resolution.warnings {
            warn!("{warning}");
        }

        let unresolved: Vec<&str> = resolution
            .skipped
            .iter()
            .map(|s| s.key_path.as_str())
            .collect();
        info!(resolved = ?resolution.resolved, ?unresolved, "{}", resolution.summary());

        Ok(BootstrapReport {
            attempts,
            destination: self.destination,
            resolution,
        })
    }

    /// Retry loop over fetch + resolve
    async fn fetch_and_resolve(&mut self) -> Result<(usize, Resolution), BootstrapError> {
        let backoff = self.backoff.clone();
        let total = backoff.attempts();
        let mut last_error = String::new();

        for (attempt, delay) in backoff.schedule() {
            info!(attempt, parameter = %self.parameter_name, "Fetching config from SSM");

            let outcome = match self.parameters.get_parameter(&self.parameter_name).await {
                Ok(template) => resolver::resolve(&template, &mut self.secrets).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(resolution) => return Ok((attempt, resolution)),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt == total {
                        warn!(attempt, error = %e, "Attempt failed");
                        break;
                    }
                    warn!(
                        attempt,
                        error = %e,
                        "Attempt failed, retrying after {} seconds",
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(BootstrapError::RetriesExhausted {
            attempts: total,
            last: last_error,
        })
    }
}

/// Mode for a config file written where none existed before
#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o644;

/// Overwrite `destination` via a temp file in the same directory
///
/// The replacement keeps the permissions of the file it replaces, or gets
/// `0644` when there was none.
pub fn persist(destination: &Path, contents: &str) -> Result<(), BootstrapError> {
    let write_err = |source: std::io::Error| BootstrapError::Write {
        path: destination.to_path_buf(),
        source,
    };

    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    let permissions = match std::fs::metadata(destination) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    };
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(destination).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(DEFAULT_MODE))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<std::fs::Permissions> {
    None
}
