//! Warden authorization server
//!
//! # Usage
//!
//! ```bash
//! # Empty repository, admin through basic auth
//! warden-server --admin-user admin --admin-password s3cret
//!
//! # Seed users, groups and policies from a snapshot
//! warden-server --data ./warden.json --port 9090
//!
//! # Debug logging
//! RUST_LOG=debug warden-server
//! ```
//!
//! Every flag can also be set through its `WARDEN_*` environment variable.

use anyhow::{Context, Result};
use axum::http::HeaderName;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use warden_api_server::{
    auth::{HeaderAuthenticator, DEFAULT_USER_HEADER},
    logging::init_tracing,
    server::ServerBuilder,
    state::AppState,
};
use warden_authz::InMemoryRepository;

/// Warden authorization server
#[derive(Parser, Debug)]
#[command(
    name = "warden-server",
    version,
    about = "Authorization server for URN-addressed resources",
    long_about = None
)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "WARDEN_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "8080", env = "WARDEN_PORT")]
    port: u16,

    /// JSON snapshot loaded into the repository at start
    #[arg(long, env = "WARDEN_DATA")]
    data: Option<PathBuf>,

    /// Admin user name for basic auth
    #[arg(long, default_value = "admin", env = "WARDEN_ADMIN_USER")]
    admin_user: String,

    /// Admin password for basic auth; admin access is disabled when unset
    #[arg(long, env = "WARDEN_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Trusted header carrying the externally verified subject
    #[arg(long, default_value = DEFAULT_USER_HEADER, env = "WARDEN_USER_HEADER")]
    user_header: String,

    /// Enable JSON logging format
    #[arg(long, env = "WARDEN_JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", env = "WARDEN_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(
        args.json_logs,
        &args.log_level,
        &["warden_server", "warden_api_server", "warden_authz"],
    )?;

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let repo = match &args.data {
        Some(path) => Arc::new(
            InMemoryRepository::load(path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?,
        ),
        None => {
            warn!("No --data snapshot given, starting with an empty repository");
            Arc::new(InMemoryRepository::new())
        }
    };

    let user_header = HeaderName::try_from(args.user_header.as_str())
        .with_context(|| format!("Invalid user header '{}'", args.user_header))?;
    let mut authenticator = HeaderAuthenticator::new(user_header);
    match &args.admin_password {
        Some(password) => authenticator = authenticator.with_admin(&args.admin_user, password),
        None => warn!("No admin password configured, admin access disabled"),
    }

    let state = Arc::new(AppState::new(repo, Arc::new(authenticator)));

    let server = ServerBuilder::new()
        .host(&args.host)
        .port(args.port)
        .state(state)
        .build()?;

    if let Err(e) = server.run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
