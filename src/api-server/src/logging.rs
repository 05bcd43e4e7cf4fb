//! Tracing subscriber setup shared by the server and gateway binaries

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `targets` log at `log_level` and the
/// HTTP stack at info (debug when `log_level` is debug or trace).
pub fn init_tracing(json: bool, log_level: &str, targets: &[&str]) -> Result<()> {
    let level = log_level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', using 'info'", log_level);
        tracing::Level::INFO
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level, targets)));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}

fn default_directives(level: tracing::Level, targets: &[&str]) -> String {
    let http = if level <= tracing::Level::INFO { "info" } else { "debug" };

    let mut directives: Vec<String> = targets
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    directives.push(format!("tower_http={}", http));
    directives.push(format!("axum={}", http));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let directives = default_directives(tracing::Level::DEBUG, &["warden_authz", "warden_api_server"]);

        assert!(directives.contains("warden_authz=DEBUG"));
        assert!(directives.contains("warden_api_server=DEBUG"));
        assert!(directives.contains("tower_http=debug"));
    }

    #[test]
    fn test_default_directives_info() {
        let directives = default_directives(tracing::Level::INFO, &["warden_proxy"]);
        assert_eq!(directives, "warden_proxy=INFO,tower_http=info,axum=info");
    }
}
