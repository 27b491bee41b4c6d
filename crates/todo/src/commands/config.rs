//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use todo_config::{ClientSection, LoggingSection, TodoConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration and where it came from
    Show,

    /// Write a config file with the effective client settings
    Init {
        /// Create project-local config (./todo.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the user config file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Init { local, force } => cmd_init(local, force, ctx),
        ConfigCommand::Path => cmd_path(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let resolved = ctx.resolve()?;

    if ctx.json_output {
        let sources: Vec<String> = loaded
            .loaded_from()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let doc = serde_json::json!({
            "sources": sources,
            "client": {
                "server": resolved.server,
                "serverSource": resolved.server_source.to_string(),
                "apiPrefix": resolved.api_prefix,
                "timeoutSecs": resolved.timeout.as_secs(),
                "refreshEndpoint": resolved.refresh_endpoint,
                "loginEndpoint": resolved.login_endpoint,
                "sessionFile": resolved.session_file.as_ref().map(|p| p.display().to_string()),
            },
            "logging": {
                "level": loaded.config.logging.level(),
                "file": loaded.config.logging.file_enabled(),
            },
            "warnings": loaded.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Todo Configuration").bold());
    println!("{}", dim.apply_to("─".repeat(50)));

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("Client:");
    println!(
        "  server:           {} {}",
        resolved.server,
        dim.apply_to(format!("({})", resolved.server_source))
    );
    println!("  api prefix:       {}", resolved.api_prefix);
    println!("  timeout:          {}s", resolved.timeout.as_secs());
    println!("  refresh endpoint: {}", resolved.refresh_endpoint);
    println!("  login endpoint:   {}", resolved.login_endpoint);
    match &resolved.session_file {
        Some(path) => println!("  session file:     {}", path.display()),
        None => println!("  session file:     {}", dim.apply_to("(memory only)")),
    }
    println!();

    println!("Logging:");
    println!("  level: {}", loaded.config.logging.level());
    println!("  file:  {}", loaded.config.logging.file_enabled());
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = loaded.config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

fn cmd_init(local: bool, force: bool, ctx: &Context) -> Result<()> {
    let path = if local {
        PathBuf::from("todo.toml")
    } else {
        user_config_path(ctx)?
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (pass --force to overwrite)",
            path.display()
        );
    }

    let resolved = ctx.resolve()?;
    let config = TodoConfig {
        client: ClientSection {
            server: Some(resolved.server),
            api_prefix: Some(resolved.api_prefix),
            timeout_secs: Some(resolved.timeout.as_secs()),
            refresh_endpoint: Some(resolved.refresh_endpoint),
            login_endpoint: Some(resolved.login_endpoint),
            session_file: None,
        },
        logging: LoggingSection {
            level: Some(ctx.loaded.config.logging.level().to_string()),
            file: Some(ctx.loaded.config.logging.file_enabled()),
        },
    };
    todo_config::save_config(&config, &path)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "path": path.display().to_string() }));
    } else {
        let green = Style::new().green();
        println!("{} Wrote {}", green.apply_to("✓"), path.display());
    }
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    println!("{}", user_config_path(ctx)?.display());
    Ok(())
}

fn user_config_path(ctx: &Context) -> Result<PathBuf> {
    ctx.config_dir
        .as_ref()
        .map(|d| d.join("config.toml"))
        .or_else(todo_config::xdg_config_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}
