//! CLI module for the Guidepost command-line interface.
//!
//! Without a subcommand the binary starts the server. Administrative
//! subcommands work directly against the configured database:
//! - `config check` - Validate and summarize the configuration
//! - `users set-role <email> <role>` - Change a user's role
//! - `users deactivate|activate <email>` - Toggle account access
//! - `sessions sweep` - Delete expired sessions

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::db::{self, DbPool, Role, SessionStore, User, UserStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "guidepost")]
#[command(author, version, about = "Community guides with Discord sign-in", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "GUIDEPOST_CONFIG", default_value = "guidepost.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// User administration commands
    #[command(subcommand)]
    Users(UsersCommands),

    /// Session maintenance commands
    #[command(subcommand)]
    Sessions(SessionsCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Users subcommands
#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// Change the role of the user owning an email
    SetRole {
        email: String,
        /// member, editor or admin
        role: String,
    },
    /// Block a user; their sessions stop resolving immediately
    Deactivate { email: String },
    /// Restore a deactivated user
    Activate { email: String },
}

/// Sessions subcommands
#[derive(Subcommand, Debug)]
pub enum SessionsCommands {
    /// Delete expired sessions
    Sweep,
}

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        Some(Commands::Users(command)) => {
            let db = open_database(cli).await?;
            cmd_users(&db, command).await
        }
        Some(Commands::Sessions(SessionsCommands::Sweep)) => {
            let db = open_database(cli).await?;
            let removed = sweep_sessions(&db).await?;
            println!("[OK] Removed {} expired session(s)", removed);
            Ok(())
        }
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

async fn open_database(cli: &Cli) -> Result<DbPool> {
    let config = Config::load(&cli.config)?;
    db::init(&config.database).await
}

async fn cmd_users(db: &DbPool, command: &UsersCommands) -> Result<()> {
    let user = match command {
        UsersCommands::SetRole { email, role } => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            set_role(db, email, role).await?
        }
        UsersCommands::Deactivate { email } => set_active(db, email, false).await?,
        UsersCommands::Activate { email } => set_active(db, email, true).await?,
    };

    println!("[OK] Updated user {}", user.id);
    println!("  Email:   {}", user.email.as_deref().unwrap_or("-"));
    println!("  Role:    {}", user.role);
    println!("  Active:  {}", if user.is_active { "yes" } else { "no" });
    Ok(())
}

async fn find_user(users: &UserStore, email: &str) -> Result<User> {
    users
        .get_by_email(email)
        .await
        .context("Failed to look up user")?
        .with_context(|| format!("No user with email {}", email))
}

async fn set_role(db: &DbPool, email: &str, role: Role) -> Result<User> {
    let users = UserStore::new(db.clone());
    let user = find_user(&users, email).await?;
    users.set_role(&user.id, role).await?;
    find_user(&users, email).await
}

async fn set_active(db: &DbPool, email: &str, active: bool) -> Result<User> {
    let users = UserStore::new(db.clone());
    let user = find_user(&users, email).await?;
    users.set_active(&user.id, active).await?;
    find_user(&users, email).await
}

async fn sweep_sessions(db: &DbPool) -> Result<u64> {
    SessionStore::new(db.clone())
        .purge_expired(Utc::now())
        .await
        .context("Failed to delete expired sessions")
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        return Ok(());
    }

    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            anyhow::bail!("Configuration validation failed");
        }
    };

    println!("[OK] Configuration file is valid!");
    println!();
    println!("=== Configuration Summary ===");
    println!();
    println!("Server:");
    println!("  Listen:       {}:{}", config.server.host, config.server.port);
    println!("  Environment:  {}", config.server.environment);
    println!();
    println!("Database:");
    println!("  URL:          {}", config.database.url);
    println!("  Connections:  {}", config.database.max_connections);
    println!();
    println!("Sessions:");
    println!("  Lifetime:     {} days", config.auth.session_ttl_days);
    println!("  Secure:       {}", enabled(config.auth.cookie_secure));
    println!("  SameSite:     {:?}", config.auth.cookie_same_site);
    println!(
        "  Domain:       {}",
        config.auth.cookie_domain.as_deref().unwrap_or("-")
    );
    println!();
    println!("Identity providers:");
    println!(
        "  Discord:      {}",
        enabled(config.oauth.discord.as_ref().is_some_and(|d| d.is_complete()))
    );
    println!();

    let warnings = config_warnings(&config);
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  [!] {}", warning);
        }
        println!();
    }

    Ok(())
}

fn config_warnings(config: &Config) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if !config.oauth.discord.as_ref().is_some_and(|d| d.is_complete()) {
        warnings.push("Discord is not fully configured - login endpoints will fail");
    }

    if config.server.is_production() && !config.auth.cookie_secure {
        warnings.push("cookie_secure is off in production - session cookies travel over plain HTTP");
    }

    warnings
}
