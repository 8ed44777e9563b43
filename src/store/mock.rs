//! Mock store for testing
//!
//! Serves scripted parameter responses and canned secrets without touching
//! AWS, and records every call for assertions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ParameterStore, SecretStore};
use crate::error::BootstrapError;

/// Mock implementing both [`ParameterStore`] and [`SecretStore`]
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    /// Queue of parameter outcomes (FIFO); `Err` holds the failure reason
    parameter_responses: Arc<Mutex<Vec<Result<String, String>>>>,
    /// Secret strings by reference
    secrets: Arc<Mutex<HashMap<String, String>>>,
    /// Parameter names requested, in order
    parameter_calls: Arc<Mutex<Vec<String>>>,
    /// Secret references requested, in order
    secret_calls: Arc<Mutex<Vec<String>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful parameter fetch
    pub fn with_parameter(self, text: impl Into<String>) -> Self {
        self.parameter_responses.lock().unwrap().push(Ok(text.into()));
        self
    }

    /// Queue `count` failing parameter fetches
    pub fn with_failures(self, count: usize) -> Self {
        {
            let mut queue = self.parameter_responses.lock().unwrap();
            for i in 0..count {
                queue.push(Err(format!("simulated failure #{}", i + 1)));
            }
        }
        self
    }

    /// Register a secret string under a reference
    pub fn with_secret(self, reference: impl Into<String>, text: impl Into<String>) -> Self {
        self.secrets
            .lock()
            .unwrap()
            .insert(reference.into(), text.into());
        self
    }

    /// Number of parameter fetches made
    pub fn parameter_call_count(&self) -> usize {
        self.parameter_calls.lock().unwrap().len()
    }

    /// Number of times `reference` was fetched
    pub fn secret_call_count(&self, reference: &str) -> usize {
        self.secret_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == reference)
            .count()
    }

    /// All secret references fetched, in order
    pub fn secret_calls(&self) -> Vec<String> {
        self.secret_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParameterStore for MockStore {
    async fn get_parameter(&self, name: &str) -> Result<String, BootstrapError> {
        self.parameter_calls.lock().unwrap().push(name.to_string());

        let next = {
            let mut queue = self.parameter_responses.lock().unwrap();
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        };

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(BootstrapError::Fetch {
                parameter: name.to_string(),
                reason,
            }),
            None => Err(BootstrapError::Fetch {
                parameter: name.to_string(),
                reason: "ParameterNotFound".to_string(),
            }),
        }
    }
}

#[async_trait]
impl SecretStore for MockStore {
    async fn get_secret(&self, group: &str, reference: &str) -> Result<String, BootstrapError> {
        self.secret_calls.lock().unwrap().push(reference.to_string());

        self.secrets
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| BootstrapError::SecretFetch {
                group: group.to_string(),
                reason: "ResourceNotFoundException".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parameter_queue_is_fifo() {
        let store = MockStore::new().with_failures(1).with_parameter("ok");
        assert!(store.get_parameter("p").await.is_err());
        assert_eq!(store.get_parameter("p").await.unwrap(), "ok");
        assert!(store.get_parameter("p").await.is_err());
        assert_eq!(store.parameter_call_count(), 3);
    }

    #[tokio::test]
    async fn secret_calls_are_recorded() {
        let store = MockStore::new().with_secret("arn:1", "{}");
        store.get_secret("storage", "arn:1").await.unwrap();
        assert!(store.get_secret("oidc", "arn:2").await.is_err());
        assert_eq!(store.secret_call_count("arn:1"), 1);
        assert_eq!(store.secret_calls(), vec!["arn:1", "arn:2"]);
    }
}
