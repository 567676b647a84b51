//! SketchShelf: drawing-document file manager server
//!
//! Serves a browser drawing client and a REST API for managing `.excalidraw`
//! documents inside one selected workspace folder. Every path a client sends
//! is confined to the workspace, and to the data root when one is configured.
//!
//! Usage:
//!   sketchshelf                                   # Port 3001, whole filesystem browsable
//!   sketchshelf --data-root /srv/drawings         # Confine everything to /srv/drawings
//!   sketchshelf --data-root /data --default-workspace
//!   sketchshelf --workspace ~/sketches            # Pre-select a workspace
//!   sketchshelf --static-dir ./dist               # Serve the built client

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shelf_server::ShelfServer;
use shelf_services::{
    FileOps, ServerConfig, WorkspaceState, browse::BrowseService, file::FileService,
    workspace::WorkspaceService,
};
use shelf_transport::{TransportConfig, TransportServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sketchshelf", about = "SketchShelf: drawing document file manager")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    hostname: String,

    /// Confine browsing and workspaces to this directory (created if missing)
    #[arg(long, env = "DATA_ROOT")]
    data_root: Option<PathBuf>,

    /// Select the data root as the workspace at startup
    #[arg(long, env = "DEFAULT_WORKSPACE_ENABLED")]
    default_workspace: bool,

    /// Workspace folder to select at startup
    #[arg(long, env = "WORKSPACE")]
    workspace: Option<String>,

    /// Directory holding the built browser client
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Allow cross-origin requests (client served from a dev server)
    #[arg(long)]
    cors: bool,

    /// Maximum request body size in megabytes
    #[arg(long, default_value = "50")]
    max_body_mb: usize,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to a file (defaults to ~/.sketchshelf/logs/server.log if no path given)
    #[arg(long, default_missing_value = "DEFAULT", num_args = 0..=1)]
    log_file: Option<String>,
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(ref log_file_arg) = cli.log_file {
        let log_path = if log_file_arg == "DEFAULT" {
            dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".sketchshelf/logs/server.log")
        } else {
            PathBuf::from(log_file_arg)
        };

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();

        eprintln!("Logging to {}", log_path.display());
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Create the data root if needed and return its canonical form, so that
/// containment checks compare like with like.
fn prepare_data_root(path: &PathBuf) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create data root {}", path.display()))?;
    path.canonicalize()
        .with_context(|| format!("Failed to resolve data root {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let data_root = cli.data_root.as_ref().map(prepare_data_root).transpose()?;

    let state = Arc::new(WorkspaceState::new());
    let ops = Arc::new(FileOps::new(state.clone(), data_root.clone()));
    let config = ServerConfig::new(data_root.clone(), cli.default_workspace);

    let mut server = ShelfServer::new();
    server.register_service(WorkspaceService::new(ops.clone(), config));
    server.register_service(FileService::new(ops.clone()));
    server.register_service(BrowseService::new(data_root.clone()));

    if let Some(ref workspace) = cli.workspace {
        let (root, _) = ops
            .select_workspace(workspace)
            .await
            .with_context(|| format!("Failed to select workspace {workspace}"))?;
        info!("Workspace selected at startup: {}", root.display());
    }

    if let Err(e) = server.initialize().await {
        error!("Failed to initialize server: {e}");
        anyhow::bail!("initialization failed: {e}");
    }
    let server = Arc::new(server);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                         SketchShelf                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match &data_root {
        Some(root) => println!("  Data root:  {}", root.display()),
        None => println!("  Data root:  (none: whole filesystem browsable)"),
    }
    match state.workspace_path() {
        Some(ws) => println!("  Workspace:  {}", ws.display()),
        None => println!("  Workspace:  (none: clients must select one)"),
    }
    if let Some(ref dir) = cli.static_dir {
        println!("  Client:     {}", dir.display());
    }
    println!();

    let transport_config = TransportConfig {
        port: cli.port,
        hostname: cli.hostname.clone(),
        enable_cors: cli.cors,
        static_dir: cli.static_dir.clone(),
        max_body_bytes: cli.max_body_mb.saturating_mul(1024 * 1024),
    };

    let mut transport = TransportServer::start_shared(transport_config, server.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start transport: {e}"))?;

    println!("  Server running at http://{}:{}", cli.hostname, transport.port());
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;

    println!();
    println!("  Shutting down...");
    transport.stop().await;
    server.shutdown().await;
    println!("  Server stopped.");

    Ok(())
}
