//! Wiring between the CLI and the API client.
//!
//! The client reports user-facing failures and ended sessions through two
//! seams; here they print to the terminal.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use console::Style;
use todo_client::{
    FileTokenStore, InMemoryTokenStore, Navigator, NotificationSink, Severity, SharedTokenStore,
    TodoClient,
};
use todo_config::ResolvedClient;

/// Build a client from resolved settings.
pub fn build(resolved: &ResolvedClient) -> Result<TodoClient> {
    let store: SharedTokenStore = match &resolved.session_file {
        Some(path) => Arc::new(FileTokenStore::new(path)),
        None => {
            tracing::warn!("No data directory; the session will not be saved");
            Arc::new(InMemoryTokenStore::new())
        }
    };

    TodoClient::builder()
        .base_url(&resolved.server)
        .api_prefix(&resolved.api_prefix)
        .timeout(resolved.timeout)
        .refresh_endpoint(&resolved.refresh_endpoint)
        .login_endpoint(&resolved.login_endpoint)
        .token_store(store)
        .notifier(Arc::new(ConsoleNotifier))
        .navigator(Arc::new(ConsoleNavigator))
        .build()
        .with_context(|| format!("Failed to create client for {}", resolved.server))
}

/// Prints notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let (marker, style) = match severity {
            Severity::Error => ("✗", Style::new().red()),
            Severity::Warning => ("!", Style::new().yellow()),
            Severity::Success => ("✓", Style::new().green()),
            Severity::Info => ("·", Style::new().dim()),
        };
        eprintln!("{} {}", style.apply_to(marker), message);
    }
}

/// There is no login screen to return to; tell the user how to get one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect_to_login(&self) {
        let dim = Style::new().dim();
        eprintln!(
            "{}",
            dim.apply_to("Session ended. Run `todo auth login` to sign in again.")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn resolved(server: &str) -> ResolvedClient {
        ResolvedClient {
            server: server.to_string(),
            server_source: todo_config::ServerSource::Override,
            api_prefix: "api".to_string(),
            timeout: Duration::from_secs(5),
            refresh_endpoint: "auth/manager/reset/token".to_string(),
            login_endpoint: "auth/manager/login".to_string(),
            session_file: Some(PathBuf::from("/tmp/todo-cli-test-session.json")),
        }
    }

    #[test]
    fn test_build_applies_prefix() {
        let client = build(&resolved("http://localhost:3000")).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3000/api/");
    }

    #[test]
    fn test_build_rejects_bad_url() {
        assert!(build(&resolved("http://[::1")).is_err());
    }
}
