use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::config::{AppConfig, Storage};
use taskboard::menu::Menu;
use taskboard::{api, kv, Board};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Tasks, epics and subtasks on a conflict-free schedule")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "8079")]
        port: u16,

        /// Persist to this CSV file
        #[arg(long, conflicts_with = "kv")]
        file: Option<PathBuf>,

        /// Persist to the key-value server at this URL
        #[arg(long)]
        kv: Option<String>,
    },
    /// Start the in-memory key-value server
    KvServe {
        /// Port for the key-value server
        #[arg(short, long, default_value = "8078")]
        port: u16,
    },
    /// Interactive menu on stdin/stdout
    Menu {
        /// Persist to this CSV file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Initialize tracing with output to stderr (for menu mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "taskboard=debug,taskboard_core=debug,tower_http=debug".into()
    }));

    if use_stderr {
        // Menu mode: keep stdout for the menu itself
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve_api(config: AppConfig, port: u16) -> anyhow::Result<()> {
    let backend = config.storage.connect().await?;
    let board = Board::open(config.manager, backend).await?;
    let app = api::create_router(board);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("taskboard API listening on http://127.0.0.1:{}/api/v1", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Menu { .. }));
    init_tracing(use_stderr);

    let mut config = AppConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { port, file, kv }) => {
            if let Some(url) = kv {
                config.storage = Storage::Kv(url);
            } else if let Some(path) = file {
                config.storage = Storage::File(path);
            }
            serve_api(config, port).await?;
        }
        Some(Commands::KvServe { port }) => {
            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("Key-value server listening on http://127.0.0.1:{}", port);

            axum::serve(listener, kv::server::router()).await?;
        }
        Some(Commands::Menu { file }) => {
            if let Some(path) = file {
                config.storage = Storage::File(path);
            }
            let backend = config.storage.connect().await?;
            let board = Board::open(config.manager, backend).await?;

            let stdin = std::io::stdin();
            let mut menu = Menu::new(board, stdin.lock(), std::io::stdout());
            menu.run().await?;
        }
        None => {
            serve_api(config, 8079).await?;
        }
    }

    Ok(())
}
