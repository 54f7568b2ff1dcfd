use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_board::api::{create_router, AppState};
use crm_board::config::{BoardBackend, Config};
use crm_board::infrastructure::{db, seed, RestBoardClient, SqliteBoardStore};
use crm_board::services::{BoardSession, BoardSource, CardColumnPersister, SessionSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,crm_board=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CRM Board v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env, using defaults: {}", e);
        Config::default()
    });

    let (events_tx, _rx) = broadcast::channel::<String>(100);

    let collaborators = connect_backend(&config).await;
    let board = match collaborators {
        Some((source, persister)) => {
            match BoardSession::load(source, persister, SessionSettings::from(&config), events_tx.clone()).await {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::error!("Failed to load board: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    if board.is_none() {
        tracing::warn!("Board routes disabled: board data unavailable");
    }

    let config = Arc::new(config);
    let state = AppState::new(board, events_tx, Arc::clone(&config));
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("CRM Board listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CRM Board shut down gracefully");
    Ok(())
}

async fn connect_backend(
    config: &Config,
) -> Option<(Arc<dyn BoardSource>, Arc<dyn CardColumnPersister>)> {
    match config.backend {
        BoardBackend::Sqlite => match db::init_db(&config.database_url).await {
            Ok(pool) => {
                tracing::info!("Database initialized successfully");

                if let Err(e) = seed::seed_default_stages(&pool).await {
                    tracing::warn!("Failed to seed default stages: {}", e);
                }

                let store = Arc::new(SqliteBoardStore::new(pool));
                let source: Arc<dyn BoardSource> = store.clone();
                let persister: Arc<dyn CardColumnPersister> = store;
                Some((source, persister))
            }
            Err(e) => {
                tracing::error!("Failed to initialize database: {}", e);
                None
            }
        },
        BoardBackend::Rest => {
            tracing::info!(api_url = config.crm_api_url.as_str(), "Using CRM REST backend");
            let client = Arc::new(RestBoardClient::new(
                reqwest::Client::new(),
                config.crm_api_url.clone(),
                config.crm_api_token.clone(),
                config.crm_account_id,
            ));
            let source: Arc<dyn BoardSource> = client.clone();
            let persister: Arc<dyn CardColumnPersister> = client;
            Some((source, persister))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
