//! Configuration for the todo client and CLI.
//!
//! Provides TOML-based configuration with:
//! - A `[client]` section describing how to reach the API and where the
//!   session lives
//! - A `[logging]` section for the CLI's log output
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod resolver;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, default_session_path, load_config, load_config_file,
    load_config_with_options, save_config, xdg_config_dir, xdg_config_path, xdg_data_dir,
};
pub use error::{ConfigError, Result};
pub use resolver::{ResolvedClient, ServerSource};
pub use types::*;
