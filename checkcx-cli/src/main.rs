//! check-cx admin - Control plane and console for check-cx
//!
//! Serves the admin console UI together with the API that manages check
//! configs, groups and system notifications.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;

use checkcx_admin::config::{ServerSettings, JWT_SECRET_ENV};
use checkcx_admin::db;
use checkcx_admin::server;

#[derive(Parser, Debug)]
#[command(name = "checkcx-admin")]
#[command(version)]
#[command(about = "Admin console for check-cx", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Port for the console (defaults to 8080)
    #[arg(short, long, env = "CHECKCX_PORT", global = true)]
    port: Option<u16>,

    /// Directory holding the SQLite database
    #[arg(long, env = "CHECKCX_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, env = "CHECKCX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Don't open browser automatically
    #[arg(long, global = true)]
    no_browser: bool,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Console URL for CLI commands
    #[arg(long, default_value = "http://localhost:8080", env = "CHECKCX_URL", global = true)]
    url: String,

    /// Bearer token for CLI commands
    #[arg(long, env = "CHECKCX_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the console (API + web UI)
    Serve,

    /// Manage check configs
    Configs {
        #[command(subcommand)]
        command: cli::ConfigCommands,
    },

    /// Manage groups
    Groups {
        #[command(subcommand)]
        command: cli::GroupCommands,
    },

    /// Manage system notifications
    Notifications {
        #[command(subcommand)]
        command: cli::NotificationCommands,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli_client = cli::CliClient::new(&cli.url, cli.token.clone());

    match &cli.command {
        Some(Commands::Serve) | None => {
            serve(&cli).await?;
        }
        Some(Commands::Configs { command }) => {
            command.execute(&cli_client).await?;
        }
        Some(Commands::Groups { command }) => {
            command.execute(&cli_client).await?;
        }
        Some(Commands::Notifications { command }) => {
            command.execute(&cli_client).await?;
        }
        Some(Commands::Version) => {
            println!("checkcx-admin {}", env!("CARGO_PKG_VERSION"));
            println!("Admin console for check-cx");
        }
    }

    Ok(())
}

async fn serve(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting check-cx admin...");

    let settings = ServerSettings::resolve(
        cli.port,
        cli.config.as_deref(),
        std::env::var(JWT_SECRET_ENV).ok(),
    )?;

    let data_dir = get_data_dir(cli.data_dir.clone());
    info!("Data directory: {}", data_dir.display());

    let db_path = data_dir.join("checkcx.db");
    let db = db::Database::new(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))?;

    if db.is_fresh().await.unwrap_or(true) {
        info!("Fresh installation detected - create the first admin at /setup");
    }

    let server_handle = server::start_server(&settings, db.clone()).await?;

    let ui_url = format!("http://127.0.0.1:{}", settings.port);
    if !cli.no_browser {
        info!("Opening browser...");
        if let Err(e) = open::that(&ui_url) {
            tracing::warn!("Failed to open browser: {}", e);
            info!("Please open {} in your browser", ui_url);
        }
    }

    info!("");
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║                                                            ║");
    info!("║   check-cx admin is running!                               ║");
    info!("║                                                            ║");
    info!("╚════════════════════════════════════════════════════════════╝");
    info!("");
    info!("   Console → {}", ui_url);
    info!("   API     → {}/api/v1", ui_url);
    info!("");
    info!("   Press Ctrl+C to stop");
    info!("");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
        result = server_handle => {
            match result {
                Ok(Err(e)) => tracing::error!("Server error: {}", e),
                Err(e) => tracing::error!("Server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
    }

    db.close().await;
    info!("check-cx admin stopped.");
    Ok(())
}

/// Get the data directory
/// Uses: --data-dir / $CHECKCX_DATA_DIR > ~/.check-cx-admin > ./data
fn get_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        let _ = std::fs::create_dir_all(&dir);
        return dir;
    }

    if let Some(home) = dirs::home_dir() {
        let dir = home.join(".check-cx-admin");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }

    let local_dir = PathBuf::from("./data");
    let _ = std::fs::create_dir_all(&local_dir);
    local_dir
}
