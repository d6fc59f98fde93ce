// release-redirect entry point.
// Loads configuration, wires the cache, GitHub client, and resolver, and serves HTTP.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use release_redirect::cache::ReleaseCache;
use release_redirect::config::Config;
use release_redirect::github::GitHubClient;
use release_redirect::resolver::Resolver;
use release_redirect::server::{AppState, create_router};
use release_redirect::{RedirectError, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("release_redirect=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        // Without a token there is nothing to serve; exit quietly.
        Err(RedirectError::MissingToken) => {
            println!("GITHUB_TOKEN is required");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let github = GitHubClient::with_options(
        &config.github_token,
        &config.github_api_url,
        Some(config.upstream_timeout),
    )?;

    // Asset bodies can be large, so only bound the connect phase.
    let http_client = reqwest::Client::builder()
        .user_agent("release-redirect")
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let cache = Arc::new(ReleaseCache::new());
    let resolver = Resolver::new(cache, Arc::new(github), config.policy);

    let state = Arc::new(AppState {
        resolver,
        delivery: config.delivery,
        http_client,
    });
    let app = create_router(state);

    let listen_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    info!(
        %listen_addr,
        delivery = ?config.delivery,
        ttl_secs = config.policy.ttl.as_secs(),
        stale_fallback = config.policy.stale_fallback,
        case_insensitive = config.policy.case_insensitive,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
