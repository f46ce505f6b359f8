use clap::{Parser, Subcommand};
use sqlx::PgPool;
use storefront_core::AppConfig;
use storefront_sheets::SheetSync;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Google Sheets mirror maintenance
    Sheets {
        #[command(subcommand)]
        command: SheetsCommands,
    },
    /// Refresh token maintenance
    Tokens {
        #[command(subcommand)]
        command: TokensCommands,
    },
}

#[derive(Debug, Subcommand)]
enum SheetsCommands {
    /// Rewrite the Products sheet from the database
    Sync,
}

#[derive(Debug, Subcommand)]
enum TokensCommands {
    /// Delete expired refresh tokens
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = storefront_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = connect(&config).await?;

    match cli.command {
        Commands::Migrate => run_migrate(&pool).await,
        Commands::Sheets {
            command: SheetsCommands::Sync,
        } => run_sheets_sync(&config, pool).await,
        Commands::Tokens {
            command: TokensCommands::Cleanup,
        } => run_tokens_cleanup(&pool).await,
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = storefront_db::PoolConfig::from_app_config(config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = storefront_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

async fn run_sheets_sync(config: &AppConfig, pool: PgPool) -> anyhow::Result<()> {
    let sheets = SheetSync::from_config(config.sheets.as_ref(), pool);
    if !sheets.is_enabled() {
        anyhow::bail!(
            "Google Sheets is not configured; set GOOGLE_SHEET_ID and service-account credentials"
        );
    }

    let count = sheets.try_full_sync().await?;
    println!("synced {count} product(s) to the Products sheet");
    Ok(())
}

async fn run_tokens_cleanup(pool: &PgPool) -> anyhow::Result<()> {
    let deleted = storefront_db::delete_expired_refresh_tokens(pool).await?;
    tracing::info!(deleted, "expired refresh tokens removed");
    println!("deleted {deleted} expired refresh token(s)");
    Ok(())
}

#[cfg(test)]
mod tests;
