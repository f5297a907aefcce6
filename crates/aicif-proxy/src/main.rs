mod config;
mod error;
mod proxy;
mod rate_limit;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::ProxyConfig;
use proxy::ProxyState;
use rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting aicif-proxy");

    let config = ProxyConfig::from_env()?;
    info!(
        listen = %config.listen,
        prefix = %config.prefix,
        target = %config.target,
        strip_prefix = config.strip_prefix,
        "proxy configured"
    );

    let limiter = RateLimiter::from_env()?;
    if let Some(limiter) = &limiter {
        info!(rps = limiter.rps(), "rate limiting enabled");
    }

    let listener = TcpListener::bind(config.listen).await?;
    let app = proxy::router(ProxyState::new(config, limiter)?);

    info!(addr = %listener.local_addr()?, "proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("proxy shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}
