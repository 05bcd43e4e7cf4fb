//! Warden proxy gateway
//!
//! # Usage
//!
//! ```bash
//! # Authorize through a remote warden-server
//! warden-proxy --resources ./resources.json \
//!     --worker-url http://warden:8080 \
//!     --service-user gateway --service-password s3cret
//!
//! # Authorize in-process from a snapshot (resources taken from it too)
//! warden-proxy --data ./warden.json
//! ```

use anyhow::{bail, Context, Result};
use axum::http::HeaderName;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use warden_api_server::{
    auth::{HeaderAuthenticator, DEFAULT_USER_HEADER},
    logging::init_tracing,
    server::serve,
};
use warden_authz::{Authorizer, InMemoryRepository};
use warden_proxy::{
    create_router, AuthzClient, Forwarder, Gateway, LocalAuthzClient, RemoteAuthzClient,
    ResourceTable,
};

/// Warden proxy gateway
#[derive(Parser, Debug)]
#[command(
    name = "warden-proxy",
    version,
    about = "Authorizing reverse proxy in front of backend services",
    long_about = None
)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "WARDEN_PROXY_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "8000", env = "WARDEN_PROXY_PORT")]
    port: u16,

    /// JSON array of proxy resources
    #[arg(long, env = "WARDEN_PROXY_RESOURCES")]
    resources: Option<PathBuf>,

    /// Authorization server base URL
    #[arg(long, env = "WARDEN_WORKER_URL", conflicts_with = "data")]
    worker_url: Option<String>,

    /// Snapshot for in-process authorization instead of a remote server
    #[arg(long, env = "WARDEN_DATA")]
    data: Option<PathBuf>,

    /// Gateway user towards the authorization server
    #[arg(long, default_value = "admin", env = "WARDEN_SERVICE_USER")]
    service_user: String,

    /// Gateway password towards the authorization server
    #[arg(long, default_value = "", env = "WARDEN_SERVICE_PASSWORD", hide_env_values = true)]
    service_password: String,

    /// Admin user name for basic auth
    #[arg(long, default_value = "admin", env = "WARDEN_ADMIN_USER")]
    admin_user: String,

    /// Admin password for basic auth; admin access is disabled when unset
    #[arg(long, env = "WARDEN_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Trusted header carrying the externally verified subject
    #[arg(long, default_value = DEFAULT_USER_HEADER, env = "WARDEN_USER_HEADER")]
    user_header: String,

    /// Backend and authorization request timeout in seconds
    #[arg(long, default_value = "30", env = "WARDEN_REQUEST_TIMEOUT")]
    request_timeout: u64,

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
        &["warden_proxy", "warden_api_server", "warden_authz"],
    )?;

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(args.request_timeout);
    let (authz, snapshot_repo) = authz_client(&args, timeout).await?;

    let resources = match (&args.resources, &snapshot_repo) {
        (Some(path), _) => ResourceTable::load(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?,
        (None, Some(repo)) => ResourceTable::from_repository(repo.as_ref()).await?,
        (None, None) => bail!("--resources is required with --worker-url"),
    };
    if resources.is_empty() {
        bail!("No proxy resources registered");
    }

    let user_header = HeaderName::try_from(args.user_header.as_str())
        .with_context(|| format!("Invalid user header '{}'", args.user_header))?;
    let mut authenticator = HeaderAuthenticator::new(user_header);
    if let Some(password) = &args.admin_password {
        authenticator = authenticator.with_admin(&args.admin_user, password);
    }
    let authenticator = Arc::new(authenticator);

    let gateway = Arc::new(Gateway::new(
        resources,
        authenticator,
        authz,
        Forwarder::new(timeout)?,
    ));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;
    info!("Gateway listening on http://{}", listener.local_addr()?);

    if let Err(e) = serve(listener, create_router(gateway)).await {
        error!("Gateway error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn authz_client(
    args: &Args,
    timeout: Duration,
) -> Result<(Arc<dyn AuthzClient>, Option<Arc<InMemoryRepository>>)> {
    match (&args.worker_url, &args.data) {
        (Some(url), _) => {
            info!(worker_url = %url, "Authorizing through remote server");
            let client = RemoteAuthzClient::new(
                url,
                &args.service_user,
                &args.service_password,
                timeout,
            )?;
            Ok((Arc::new(client), None))
        }
        (None, Some(path)) => {
            info!(data = %path.display(), "Authorizing in-process");
            let repo = Arc::new(
                InMemoryRepository::load(path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
            );
            let client = LocalAuthzClient::new(Authorizer::new(repo.clone()));
            Ok((Arc::new(client), Some(repo)))
        }
        (None, None) => bail!("Either --worker-url or --data is required"),
    }
}
