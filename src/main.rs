use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wildmere_server::config::ServerConfig;
use wildmere_server::game::constants::net as net_constants;
use wildmere_server::game::fishing::FishCatalog;
use wildmere_server::metrics::ServerMetrics;
use wildmere_server::net::game_session::GameSession;
use wildmere_server::net::session::SessionManager;
use wildmere_server::net::transport::WebTransportServer;
use wildmere_server::store::memory::InMemoryStore;
use wildmere_server::store::{CatchLedger, ScoreStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Wildmere Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    config
        .validate()
        .map_err(|err| anyhow::anyhow!("invalid configuration: {}", err))?;
    info!(
        "Configuration loaded: port {}, world {}x{}, max_players {}",
        config.port, config.world.width, config.world.height, config.max_players
    );

    // A bad catalog file is a deployment mistake; fail fast instead of
    // silently fishing from the builtin list.
    let catalog = match config.fish_catalog_path.as_deref() {
        Some(path) => FishCatalog::from_json_file(path)
            .with_context(|| format!("loading fish catalog from {}", path))?,
        None => FishCatalog::builtin(),
    };
    info!("Fish catalog ready ({} species)", catalog.species().len());

    let metrics = Arc::new(ServerMetrics::new());
    let sessions = Arc::new(Mutex::new(SessionManager::new(
        Duration::from_secs(config.session_timeout_secs),
        net_constants::MAX_SESSIONS,
    )));
    let store = Arc::new(InMemoryStore::new());
    let score_store: Arc<dyn ScoreStore> = store.clone();
    let catch_ledger: Arc<dyn CatchLedger> = store;

    let session = GameSession::new(
        config.clone(),
        sessions.clone(),
        catalog,
        metrics.clone(),
        score_store.clone(),
        catch_ledger.clone(),
    );
    let commands = session.command_sender();
    tokio::spawn(session.run());

    let server = WebTransportServer::new(
        config.clone(),
        commands,
        sessions,
        metrics,
        score_store,
        catch_ledger,
    )?;

    info!("Server ready on https://0.0.0.0:{}", config.port);

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = server.run() => {
            if let Err(err) = result {
                error!("Server error: {}", err);
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    info!("Server stopped");
    Ok(())
}
