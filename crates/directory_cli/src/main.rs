//! `directory` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from env, then apply flag overrides.
//! - Bootstrap logging (files when a log dir is set, stderr otherwise) and
//!   the database before serving.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use directory_core::db::open_db;
use directory_core::{
    core_version, demo_seed_data, init_logging, init_stderr_logging, seed_directory, SeedData,
};
use directory_http::config::parse_bind_addr;
use directory_http::ServerConfig;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "directory")]
#[command(about = "Organization directory service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Replace database contents with the demo data set or a JSON seed file
    Seed(SeedArgs),
    /// Print the core version
    Version,
}

#[derive(Args)]
struct DbArgs {
    /// SQLite database file (overrides DIRECTORY_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct SeedArgs {
    #[command(flatten)]
    db: DbArgs,

    /// JSON seed file with `activities`, `buildings` and `organizations`
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    db: DbArgs,

    /// Listen address (overrides DIRECTORY_BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Load the demo data set before serving
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Seed(args) => {
            let config = load_config(&args.db)?;
            let data = match &args.file {
                Some(path) => read_seed_file(path)?,
                None => demo_seed_data(),
            };
            seed(&config, &data)
        }
        Commands::Version => {
            println!("directory {}", core_version());
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config(&args.db)?;
    if let Some(bind) = args.bind.as_deref() {
        config.bind_addr = parse_bind_addr(bind)?;
    }

    // Applies pending migrations so request-scoped stores find a current schema.
    open_db(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    if args.seed_demo {
        seed(&config, &demo_seed_data())?;
    }

    directory_http::serve(config)
        .await
        .context("HTTP server failed")
}

fn read_seed_file(path: &Path) -> Result<SeedData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid seed file {}", path.display()))
}

fn seed(config: &ServerConfig, data: &SeedData) -> Result<()> {
    let mut conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    let report = seed_directory(&mut conn, data).context("seeding failed")?;
    info!(
        "event=cli_seed module=cli status=ok organizations={}",
        report.organizations
    );
    println!(
        "seeded {} activities, {} buildings, {} organizations, {} phones into {}",
        report.activities,
        report.buildings,
        report.organizations,
        report.phones,
        config.db_path.display()
    );
    Ok(())
}

fn load_config(db: &DbArgs) -> Result<ServerConfig> {
    let mut config = ServerConfig::from_env()?;
    if let Some(path) = &db.db {
        config.db_path = path.clone();
    }
    match &config.log_dir {
        Some(log_dir) => {
            let log_dir = log_dir
                .to_str()
                .context("DIRECTORY_LOG_DIR must be valid UTF-8")?;
            init_logging(&config.log_level, log_dir)?;
        }
        None => init_stderr_logging(&config.log_level)?,
    }
    Ok(config)
}
