//! Request DTOs for the coordinator API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;
use crate::coordinator::ComputationRequest;

/// Request body for `POST /resolve` and `POST /refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    /// Cache key, also the job id
    pub key: String,
    /// Registered computation type
    pub computation_type: String,
    /// Handler parameters
    #[serde(default)]
    pub params: Value,
    /// Optional cache TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
    /// Optional wait bound in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ResolveRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.computation_type.trim().is_empty() {
            return Some("Computation type cannot be empty".to_string());
        }
        None
    }

    /// Converts into a coordinator request, filling omitted fields from defaults.
    pub fn into_computation(self, default_ttl: u64, default_timeout: Duration) -> ComputationRequest {
        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(default_timeout);

        ComputationRequest::new(self.key, self.computation_type, self.params)
            .with_ttl(self.ttl.unwrap_or(default_ttl))
            .with_timeout(timeout)
    }
}
