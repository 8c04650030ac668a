mod config;
mod generate_cmd;
mod normalize_cmd;
mod serve_cmd;

use std::path::PathBuf;

use clap::builder::TypedValueParser as _;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use grub_core::assistant::Assistant;
use grub_core::plan::MAX_PLANS;
use grub_db::pool;

use config::GrubConfig;

#[derive(Parser)]
#[command(name = "grub", about = "AI meal-plan generation service")]
struct Cli {
    /// Database URL (overrides GRUB_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a grub config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/grub")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the grub database if needed and apply migrations
    DbInit,
    /// Run the HTTP API server
    Serve {
        /// Address to bind (default from config, then 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (default from PORT env, config, then 3000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Normalize a raw completion into meal plans and print them as JSON
    Normalize {
        /// File holding the raw completion text (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Generate meal plans for a user from their saved preferences
    Generate {
        /// User whose preferences drive the prompt
        #[arg(long)]
        user_id: Uuid,
        /// Number of alternative plans (1 or 2)
        #[arg(long, default_value_t = MAX_PLANS, value_parser = clap::value_parser!(u8).range(1..=2).map(usize::from))]
        variants: usize,
    },
}

/// Execute the `grub init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        completion: config::CompletionSection {
            model: Some(grub_core::completion::DEFAULT_MODEL.to_string()),
            ..Default::default()
        },
        server: config::ServerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  completion.model = {}",
        grub_core::completion::DEFAULT_MODEL
    );
    println!();
    println!(
        "Set {} (or add completion.api_key to the file), then run `grub db-init`.",
        config::ENV_API_KEY
    );

    Ok(())
}

/// Execute the `grub db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = GrubConfig::resolve(cli_db_url)?;

    println!("Initializing grub database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database.");
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("grub db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `normalize` and `generate` output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = GrubConfig::resolve(cli.database_url.as_deref())?;
            let client = resolved.completion_client()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                assistant: Assistant::new(client),
            };
            let bind = bind.unwrap_or(resolved.server.bind);
            let port = port.unwrap_or(resolved.server.port);
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Normalize { file } => {
            if let Err(e) = normalize_cmd::run_normalize(file.as_deref()) {
                eprintln!("{e:#}");
                std::process::exit(1);
            }
        }
        Commands::Generate { user_id, variants } => {
            let resolved = GrubConfig::resolve(cli.database_url.as_deref())?;
            let client = resolved.completion_client()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let assistant = Assistant::new(client);
            let result =
                generate_cmd::run_generate(&db_pool, &assistant, user_id, variants).await;
            db_pool.close().await;
            if let Err(e) = result {
                eprintln!("{e:#}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
