//! Health API.

use crate::client::TodoClient;
use crate::error::Result;
use crate::request::RequestOptions;

/// Health API client.
///
/// Health checks never carry credentials.
pub struct HealthApi {
    client: TodoClient,
}

impl HealthApi {
    pub(crate) fn new(client: TodoClient) -> Self {
        Self { client }
    }

    /// Check basic health. Returns whatever status document the server sends.
    pub async fn check(&self) -> Result<serde_json::Value> {
        self.client
            .get("health", RequestOptions::anonymous())
            .await
    }

    /// Simple connectivity check - returns true if server is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.is_ok()
    }
}
