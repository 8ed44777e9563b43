//! Error types with fix suggestions

use std::path::PathBuf;

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CFG-001: Invalid configuration: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // Fetch errors (CFG-010 to CFG-012), retried per attempt
    // ─────────────────────────────────────────────────────────────

    #[error("CFG-010: Failed to fetch parameter '{parameter}': {reason}")]
    Fetch { parameter: String, reason: String },

    #[error("CFG-011: Failed to fetch secret for group '{group}': {reason}")]
    SecretFetch { group: String, reason: String },

    #[error("CFG-012: Gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: usize, last: String },

    // ─────────────────────────────────────────────────────────────
    // Output errors (CFG-020), never retried
    // ─────────────────────────────────────────────────────────────

    #[error("CFG-020: Failed to write config to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // Template checks (CFG-030)
    // ─────────────────────────────────────────────────────────────

    #[error("CFG-030: {count} malformed placeholder(s) in {file}")]
    MalformedPlaceholders { count: usize, file: String },
}

impl FixSuggestion for BootstrapError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BootstrapError::Io(_) => Some("Check file path and permissions"),
            BootstrapError::Json(_) => None,
            BootstrapError::Config(_) => Some("Run with --help to see the expected flags and env vars"),
            BootstrapError::Fetch { .. } => {
                Some("Check GATUS_CONFIG_SSM_PARAM, AWS_REGION and the task role's ssm:GetParameter permission")
            }
            BootstrapError::SecretFetch { .. } => {
                Some("Check the <GROUP>_SECRET_ARN value and the task role's secretsmanager:GetSecretValue permission")
            }
            BootstrapError::RetriesExhausted { .. } => {
                Some("Inspect the per-attempt warnings above for the underlying cause")
            }
            BootstrapError::Write { .. } => {
                Some("Ensure the destination directory exists and is writable")
            }
            BootstrapError::MalformedPlaceholders { .. } => {
                Some("Use __FETCH_FROM_SECRET__.<group>.<key>, the group alone is not enough")
            }
        }
    }
}

/// Why a placeholder was left untouched
///
/// These are logical outcomes, not failures: the run continues and the
/// original token stays in the output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no secret source configured for group '{group}'")]
    UnconfiguredGroup { group: String },

    #[error("placeholder has no nested key after the group name")]
    Malformed,

    #[error("key not found in secret group '{group}'")]
    KeyNotFound { group: String },
}
