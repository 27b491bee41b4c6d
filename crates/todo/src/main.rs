//! Todo - command-line client for the Todo API
//!
//! Main entry point for the todo CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::Style;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;

use commands::{auth, config, todos};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Todo - manage your todos from the terminal
#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: http://localhost:3000)
    #[arg(long, global = true, env = "TODO_SERVER_URL")]
    pub server: Option<String>,

    /// Directory holding config.toml
    #[arg(long, global = true, env = "TODO_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List todos
    List(todos::ListArgs),

    /// Show a single todo
    Show(todos::ShowArgs),

    /// Create a todo
    Add(todos::AddArgs),

    /// Change fields of a todo
    Edit(todos::EditArgs),

    /// Mark a todo as done
    Done(todos::DoneArgs),

    /// Delete one or more todos
    Delete(todos::DeleteArgs),

    /// Authentication management
    Auth(auth::AuthArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = todo_config::load_config_with_options(None, cli.config_dir.as_deref())?;

    // Initialize tracing: console (human-readable, stderr) + rotating JSON file
    let level = if cli.verbose {
        "debug"
    } else {
        loaded.config.logging.level()
    };
    let filter = format!("todo={level},todo_client={level},todo_config={level},warn");
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter));

    let log_dir = cli
        .config_dir
        .clone()
        .or_else(todo_config::xdg_config_dir)
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let (file_writer, guard) = if loaded.config.logging.file_enabled() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "todo.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(
                    "todo=trace,todo_client=trace,todo_config=trace,info",
                ))
        }))
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    // Create context for commands
    let ctx = commands::Context {
        server: cli.server,
        config_dir: cli.config_dir,
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    let result = match cli.command {
        Commands::List(args) => todos::list(args, &ctx).await,
        Commands::Show(args) => todos::show(args, &ctx).await,
        Commands::Add(args) => todos::add(args, &ctx).await,
        Commands::Edit(args) => todos::edit(args, &ctx).await,
        Commands::Done(args) => todos::done(args, &ctx).await,
        Commands::Delete(args) => todos::delete(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        let red = Style::new().red();
        eprintln!("{} {:#}", red.apply_to("Error:"), e);
        // Flush the file log before exiting.
        drop(guard);
        std::process::exit(1);
    }

    drop(guard);
    Ok(())
}
