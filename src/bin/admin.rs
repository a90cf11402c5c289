//! CLI administration tool for shortcode.
//!
//! Manages users and API tokens, shows statistics and runs database checks
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a user, then a token for it
//! cargo run --bin admin -- user create alice --premium
//! cargo run --bin admin -- token create --user alice --name "Alice laptop"
//!
//! # List and revoke tokens
//! cargo run --bin admin -- token list
//! cargo run --bin admin -- token revoke "Alice laptop"
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Database diagnostics
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components (required)
//! - `TOKEN_SIGNING_SECRET` (required for `token create`; must match the server)
//! - `LINK_TTL_SECONDS` (optional, used by `stats` to count expired mappings)

use shortcode::application::services::hash_token;
use shortcode::config::{Config, mask_connection_string};
use shortcode::domain::repositories::{TokenRepository, UserRepository};
use shortcode::infrastructure::persistence::{PgTokenRepository, PgUserRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use std::sync::Arc;

const TOKEN_LEN: usize = 48;

/// CLI tool for managing shortcode.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        name: String,

        /// Premium users may pick 4-character custom codes
        #[arg(long)]
        premium: bool,
    },

    /// List all users
    List,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token for a user
    Create {
        /// Owner name or ID
        #[arg(short, long)]
        user: String,

        /// Token name (e.g., "CI", "Alice laptop")
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,

    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url()?;

    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(&database_url)
            )
        })?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Token { action } => handle_token_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let repo = PgUserRepository::new(Arc::new(pool.clone()));

    match action {
        UserAction::Create { name, premium } => {
            let user = repo
                .create_user(&name, premium)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

            println!(
                "{} {} (id {}, {})",
                "✅ Created user".green().bold(),
                user.name.cyan(),
                user.id,
                if user.premium { "premium" } else { "standard" }
            );
        }
        UserAction::List => {
            let users = repo
                .list_users()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

            if users.is_empty() {
                println!("{}", "  No users found".yellow());
                return Ok(());
            }

            println!(
                "  {:<5} {:<30} {:<10} {:<20}",
                "ID".bright_white().bold(),
                "Name".bright_white().bold(),
                "Tier".bright_white().bold(),
                "Created".bright_white().bold()
            );

            for user in &users {
                let tier = if user.premium {
                    "premium".bright_magenta()
                } else {
                    "standard".normal()
                };
                println!(
                    "  {:<5} {:<30} {:<10} {}",
                    user.id.to_string().bright_black(),
                    user.name.cyan(),
                    tier,
                    user.created_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .bright_black()
                );
            }
        }
    }

    Ok(())
}

async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    match action {
        TokenAction::Create {
            user,
            name,
            token,
            yes,
        } => {
            let user_id = resolve_user_id(pool, &user).await?;
            create_token(&repo, user_id, name, token, yes).await?;
        }
        TokenAction::List => list_tokens(&repo).await?,
        TokenAction::Revoke { name_or_id } => revoke_token(&repo, name_or_id).await?,
    }

    Ok(())
}

/// Looks a user up by numeric ID or exact name.
async fn resolve_user_id(pool: &PgPool, user: &str) -> Result<i64> {
    let id: Option<i64> = match user.parse::<i64>() {
        Ok(id) => sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
        Err(_) => sqlx::query_scalar("SELECT id FROM users WHERE name = $1")
            .bind(user)
            .fetch_optional(pool)
            .await?,
    };

    id.with_context(|| format!("User '{user}' not found"))
}

/// Creates a new API token with interactive prompts.
///
/// Only the HMAC of the token is stored. The raw value is printed once.
async fn create_token(
    repo: &PgTokenRepository,
    user_id: i64,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .context("TOKEN_SIGNING_SECRET must be set to issue tokens")?;
    if secret.is_empty() {
        anyhow::bail!("TOKEN_SIGNING_SECRET must not be empty");
    }

    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Default")
            .interact_text()?,
    };

    let token_value = token.unwrap_or_else(generate_token);

    println!("  Name:  {}", token_name.cyan());
    println!("  User:  {}", user_id.to_string().cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  Save this token now! It cannot be shown again.".red().bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token_hash = hash_token(&secret, &token_value);

    repo.create_token(user_id, &token_name, &token_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!("{}", "✅ Token created".green().bold());
    println!();
    println!(
        "  curl -H \"Authorization: Bearer {}\" -d '{{\"long\":\"example.com\"}}' \\",
        token_value.bright_yellow()
    );
    println!("       -H 'Content-Type: application/json' http://localhost:3000/v1/urls");
    println!();

    Ok(())
}

async fn list_tokens(repo: &PgTokenRepository) -> Result<()> {
    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<6} {:<28} {:<18} {:<18} {:<8}",
        "ID".bright_white().bold(),
        "User".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };
        let last_used = token
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<5} {:<6} {:<28} {:<18} {:<18} {}",
            token.id.to_string().bright_black(),
            token.user_id.to_string().bright_black(),
            token.name.cyan(),
            token.created_at.format("%Y-%m-%d %H:%M").to_string(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    println!("  Total: {}", tokens.len().to_string().bright_white().bold());

    Ok(())
}

async fn revoke_token(repo: &PgTokenRepository, name_or_id: String) -> Result<()> {
    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo.find_by_id(id).await,
        Err(_) => repo.find_by_name(&name_or_id).await,
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    .context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {} (id {})", token.name.cyan(), token.id);

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!("{}", "✅ Token revoked".green().bold());

    Ok(())
}

/// Prints mapping, analytics, user and token counts.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    let ttl_seconds: i64 = std::env::var("LINK_TTL_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(21_600);

    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let urls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls")
        .fetch_one(pool)
        .await?;

    let anonymous: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls WHERE owner_id = 0")
        .fetch_one(pool)
        .await?;

    let expired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM urls WHERE modified_at + make_interval(secs => $1) < NOW()",
    )
    .bind(ttl_seconds as f64)
    .fetch_one(pool)
    .await?;

    let analytics: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analytics")
        .fetch_one(pool)
        .await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let tokens: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(pool)
            .await?;

    println!("  URLs:          {}", urls.to_string().bright_green().bold());
    println!("    anonymous:   {}", anonymous.to_string().bright_black());
    println!("    expired:     {}", expired.to_string().bright_black());
    println!("  Analytics:     {}", analytics.to_string().bright_green().bold());
    println!("  Users:         {}", users.to_string().bright_green().bold());
    println!("  Active tokens: {}", tokens.to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let size: String =
                sqlx::query_scalar("SELECT pg_size_pretty(pg_database_size(current_database()))")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Size:       {}", size.bright_white());
        }
        DbAction::Migrate => {
            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .context("Failed to apply migrations")?;
            println!("{}", "✅ Migrations applied".green().bold());
        }
    }

    Ok(())
}

/// Generates a random 48-character alphanumeric token.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
