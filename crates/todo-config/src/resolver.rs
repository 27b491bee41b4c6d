//! Client config resolution: fills defaults into the `[client]` section.

use std::path::PathBuf;
use std::time::Duration;

use crate::discovery::default_session_path;
use crate::{ClientSection, ConfigError, Result};

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:3000";
pub const DEFAULT_API_PREFIX: &str = "api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_ENDPOINT: &str = "auth/manager/reset/token";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "auth/manager/login";

/// A `[client]` section with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClient {
    pub server: String,
    /// Where `server` came from.
    pub server_source: ServerSource,
    pub api_prefix: String,
    pub timeout: Duration,
    pub refresh_endpoint: String,
    pub login_endpoint: String,
    /// `None` when no data directory could be determined; the session is
    /// then kept in memory only.
    pub session_file: Option<PathBuf>,
}

/// Tracks how the server URL was resolved for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSource {
    /// `--server` flag or `TODO_SERVER_URL`.
    Override,
    /// `[client] server` in a config file.
    ConfigFile,
    Default,
}

impl std::fmt::Display for ServerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerSource::Override => write!(f, "command line"),
            ServerSource::ConfigFile => write!(f, "config file"),
            ServerSource::Default => write!(f, "default"),
        }
    }
}

impl ResolvedClient {
    /// Resolve the client section. `server_override` wins over the file.
    pub fn resolve(section: &ClientSection, server_override: Option<&str>) -> Result<Self> {
        let (server, server_source) = match (server_override, &section.server) {
            (Some(server), _) => (server.to_string(), ServerSource::Override),
            (None, Some(server)) => (server.clone(), ServerSource::ConfigFile),
            (None, None) => (DEFAULT_SERVER.to_string(), ServerSource::Default),
        };
        validate_server(&server)?;

        let timeout_secs = section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            server,
            server_source,
            api_prefix: section
                .api_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            refresh_endpoint: section
                .refresh_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_REFRESH_ENDPOINT.to_string()),
            login_endpoint: section
                .login_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_LOGIN_ENDPOINT.to_string()),
            session_file: section.session_file.clone().or_else(default_session_path),
        })
    }
}

fn validate_server(server: &str) -> Result<()> {
    let trimmed = server.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "client.server".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            field: "client.server".to_string(),
            message: format!("'{}' must start with http:// or https://", server),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let resolved = ResolvedClient::resolve(&ClientSection::default(), None).unwrap();

        assert_eq!(resolved.server, DEFAULT_SERVER);
        assert_eq!(resolved.server_source, ServerSource::Default);
        assert_eq!(resolved.api_prefix, "api");
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.refresh_endpoint, DEFAULT_REFRESH_ENDPOINT);
        assert_eq!(resolved.login_endpoint, DEFAULT_LOGIN_ENDPOINT);
    }

    #[test]
    fn test_config_values_win_over_defaults() {
        let section = ClientSection {
            server: Some("https://todo.example.com".to_string()),
            api_prefix: Some(String::new()),
            timeout_secs: Some(3),
            session_file: Some(PathBuf::from("/tmp/s.json")),
            ..Default::default()
        };

        let resolved = ResolvedClient::resolve(&section, None).unwrap();

        assert_eq!(resolved.server, "https://todo.example.com");
        assert_eq!(resolved.server_source, ServerSource::ConfigFile);
        assert_eq!(resolved.api_prefix, "");
        assert_eq!(resolved.timeout, Duration::from_secs(3));
        assert_eq!(resolved.session_file, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn test_override_wins() {
        let section = ClientSection {
            server: Some("https://todo.example.com".to_string()),
            ..Default::default()
        };

        let resolved = ResolvedClient::resolve(&section, Some("http://127.0.0.1:9999")).unwrap();

        assert_eq!(resolved.server, "http://127.0.0.1:9999");
        assert_eq!(resolved.server_source, ServerSource::Override);
    }

    #[test]
    fn test_invalid_server_rejected() {
        let err = ResolvedClient::resolve(&ClientSection::default(), Some("localhost:3000"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "client.server"));

        let err = ResolvedClient::resolve(&ClientSection::default(), Some("  ")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let section = ClientSection {
            timeout_secs: Some(0),
            ..Default::default()
        };
        let err = ResolvedClient::resolve(&section, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "client.timeout_secs"));
    }
}
