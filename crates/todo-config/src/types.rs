//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [client]
//! server = "http://localhost:3000"
//! api_prefix = "api"
//! timeout_secs = 10
//! refresh_endpoint = "auth/manager/reset/token"
//! login_endpoint = "auth/manager/login"
//! session_file = "/home/me/.local/share/todo/session.json"
//!
//! [logging]
//! level = "info"
//! file = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Every field is optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoConfig {
    /// API connection settings.
    pub client: ClientSection,
    /// CLI logging settings.
    pub logging: LoggingSection,
}

impl TodoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: TodoConfig) {
        self.client.merge(other.client);
        self.logging.merge(other.logging);
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Server origin, e.g. `http://localhost:3000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Path prefix every endpoint lives under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_endpoint: Option<String>,
    /// Where the session tokens are persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}

impl ClientSection {
    fn merge(&mut self, other: ClientSection) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.api_prefix.is_some() {
            self.api_prefix = other.api_prefix;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.refresh_endpoint.is_some() {
            self.refresh_endpoint = other.refresh_endpoint;
        }
        if other.login_endpoint.is_some() {
            self.login_endpoint = other.login_endpoint;
        }
        if other.session_file.is_some() {
            self.session_file = other.session_file;
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default console filter directive (`RUST_LOG` still wins).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Whether to write the JSON log file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<bool>,
}

impl LoggingSection {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file_enabled(&self) -> bool {
        self.file.unwrap_or(true)
    }

    fn merge(&mut self, other: LoggingSection) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }
}
