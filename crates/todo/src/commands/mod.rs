//! CLI command handlers.

use std::path::PathBuf;

use anyhow::Result;
use todo_client::TodoClient;
use todo_config::{LoadedConfig, ResolvedClient};

pub mod auth;
pub mod config;
pub mod todos;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// `--server` / `TODO_SERVER_URL`, overriding the config file.
    pub server: Option<String>,
    /// `--config-dir` / `TODO_CONFIG_DIR`.
    pub config_dir: Option<PathBuf>,
    /// Merged config layers.
    pub loaded: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Client settings with flags and defaults applied.
    pub fn resolve(&self) -> Result<ResolvedClient> {
        Ok(ResolvedClient::resolve(
            &self.loaded.config.client,
            self.server.as_deref(),
        )?)
    }

    /// Build an API client for this invocation.
    pub fn client(&self) -> Result<TodoClient> {
        let resolved = self.resolve()?;
        crate::client::build(&resolved)
    }
}
