use carsline_api::{config, db, migrator::Migrator};
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Applies or rolls back the schema of the configured database.
#[derive(Debug, Parser)]
#[command(name = "migration", version)]
struct Cli {
    /// Overrides `database_url` from the configuration files
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up,
    /// Roll back the last `steps` migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop everything and re-apply all migrations
    Fresh,
    /// Print applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    config::init_tracing(&cfg.log_level, cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let pool = db::establish_connection_from_app_config(&cfg).await?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => Migrator::up(&pool, None).await?,
        Command::Down { steps } => Migrator::down(&pool, Some(steps)).await?,
        Command::Fresh => Migrator::fresh(&pool).await?,
        Command::Status => Migrator::status(&pool).await?,
    }

    info!("migration command finished");
    db::close_pool(pool).await?;
    Ok(())
}
