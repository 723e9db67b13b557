use anyhow::{Context, Result};
use tracing::{error, info};
use translate_relay::config::Config;
use translate_relay::server::{self, AppState};
use translate_relay::session::SessionId;
use translate_relay::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when missing)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translate_relay=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let upstream = UpstreamClient::new(config.api_key.clone(), config.upstream_timeout)
        .context("Failed to build upstream HTTP client")?;

    // One id for the whole process lifetime
    let session_id = SessionId::generate();
    let state = AppState::new(upstream, session_id);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Translation relay listening on {}", addr);
    info!(
        "Forwarding to {} (session id {})",
        state.upstream.endpoint(),
        state.session_id.value()
    );

    axum::serve(listener, server::router(state))
        .await
        .context("Server error")?;

    Ok(())
}
