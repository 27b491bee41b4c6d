//! Auth command - authentication management.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use console::{Style, style};

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in and save the session
    Login {
        /// Account email (defaults to the remembered one)
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Remember the email for the next login
        #[arg(short, long)]
        remember: bool,
    },

    /// Show authentication status
    Status,

    /// Clear the saved session
    Logout,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login {
            email,
            password,
            remember,
        } => cmd_login(email, password, remember, ctx).await,
        AuthCommand::Status => cmd_status(ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
    }
}

async fn cmd_login(
    email: Option<String>,
    password: Option<String>,
    remember: bool,
    ctx: &Context,
) -> Result<()> {
    let client = ctx.client()?;
    let auth = client.auth();

    let email = match email {
        Some(email) => email,
        None => auth
            .remembered_login()
            .await?
            .ok_or_else(|| anyhow!("No remembered email; pass --email"))?,
    };

    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Password for {}: ", email))?,
    };
    if password.is_empty() {
        return Err(anyhow!("Password must not be empty"));
    }

    auth.login(&email, &password, remember).await?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "email": email, "loggedIn": true }));
    } else {
        let green = Style::new().green();
        println!("{} Logged in as {}", green.apply_to("✓"), email);
    }
    Ok(())
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let resolved = ctx.resolve()?;
    let client = crate::client::build(&resolved)?;
    let auth = client.auth();

    let session = auth.session().await?;
    let remembered = auth.remembered_login().await?;
    let user = auth.user_info().await?;

    if ctx.json_output {
        let status = serde_json::json!({
            "server": client.base_url().as_str(),
            "loggedIn": session.is_some(),
            "rememberedEmail": remembered,
            "user": user,
            "sessionFile": resolved.session_file.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Authentication Status").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!("Server:   {}", client.base_url());

    match session {
        Some(_) => println!("Session:  {}", Style::new().green().apply_to("logged in")),
        None => {
            println!("Session:  {}", Style::new().yellow().apply_to("not logged in"));
            println!("  {}", dim.apply_to("Run 'todo auth login' to sign in"));
        }
    }
    if let Some(email) = remembered {
        println!("Email:    {}", email);
    }
    if ctx.verbose {
        if let Some(user) = user {
            println!("User:     {}", user);
        }
        if let Some(path) = &resolved.session_file {
            println!("{}", dim.apply_to(format!("Session file: {}", path.display())));
        }
    }

    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let had_session = client.auth().session().await?.is_some();

    if !had_session {
        if ctx.json_output {
            println!("{}", serde_json::json!({ "loggedOut": false }));
        } else {
            println!("Not logged in.");
        }
        return Ok(());
    }

    client.auth().logout().await;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "loggedOut": true }));
    } else {
        let green = Style::new().green();
        println!("{} Logged out", green.apply_to("✓"));
    }
    Ok(())
}
