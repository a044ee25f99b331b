use std::sync::Arc;

use clap::{Arg, Command};
use tracing::{info, warn};

use homeserver_dav::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("homeserver_dav=info,tower_http=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let matches = Command::new("homeserver-dav")
        .about("Homeserver admin dashboard backend with an authenticated WebDAV proxy")
        .arg(
            Arg::new("address")
                .help("Address to listen on (overrides SERVER_ADDRESS)")
                .long("address")
                .short('a'),
        )
        .get_matches();

    let mut config = Config::from_env()?;
    if let Some(address) = matches.get_one::<String>("address") {
        config.server_address = address.clone();
    }

    let diagnostics = config.diagnostics();
    if config.upstream().is_none() {
        warn!(
            "WebDAV upstream is not fully configured (base URL: {}, token: {}); proxy requests will fail",
            diagnostics.has_base_url, diagnostics.has_token
        );
    }

    let address = config.server_address.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server starting on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
