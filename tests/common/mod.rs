#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::future::BoxFuture;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower::ServiceExt;

use crm_board::api::{create_router, AppState};
use crm_board::config::Config;
use crm_board::domain::{BoardError, Card, Column, ColumnId};
use crm_board::services::{BoardSession, BoardSource, CardColumnPersister, SessionSettings};

pub async fn setup_test_db() -> SqlitePool {
    // One connection so every query sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        ..Config::default()
    }
}

pub fn build_app(board: Option<BoardSession>, events_tx: broadcast::Sender<String>) -> Router {
    let config = Arc::new(test_config());
    let state = AppState::new(board, events_tx, Arc::clone(&config));
    create_router(state, &config)
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

/// In-memory stand-in for the CRM backend. Persisted moves are written back
/// so a refresh sees them.
#[derive(Default)]
pub struct MemoryBackend {
    pub columns: Mutex<Vec<Column>>,
    pub cards: Mutex<Vec<Card>>,
    pub calls: Mutex<Vec<(String, ColumnId)>>,
    pub fail_persist: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub persist_delay: Mutex<Option<Duration>>,
    pub fetch_delay: Mutex<Option<Duration>>,
}

impl MemoryBackend {
    pub fn new(columns: Vec<Column>, cards: Vec<Card>) -> Arc<Self> {
        Arc::new(Self {
            columns: Mutex::new(columns),
            cards: Mutex::new(cards),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<(String, ColumnId)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_persist_delay(&self, delay: Duration) {
        *self.persist_delay.lock().unwrap() = Some(delay);
    }

    /// Cards are read before the delay, so a slow fetch returns stale data.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    fn fetch_error(&self) -> Option<BoardError> {
        self.fail_fetch
            .load(Ordering::SeqCst)
            .then(|| BoardError::Internal("backend unavailable".into()))
    }
}

impl BoardSource for MemoryBackend {
    fn get_columns(&self) -> BoxFuture<'_, Result<Vec<Column>, BoardError>> {
        Box::pin(async move {
            match self.fetch_error() {
                Some(e) => Err(e),
                None => Ok(self.columns.lock().unwrap().clone()),
            }
        })
    }

    fn get_cards(&self) -> BoxFuture<'_, Result<Vec<Card>, BoardError>> {
        Box::pin(async move {
            if let Some(e) = self.fetch_error() {
                return Err(e);
            }
            let cards = self.cards.lock().unwrap().clone();

            let delay = *self.fetch_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(cards)
        })
    }
}

impl CardColumnPersister for MemoryBackend {
    fn persist_card_column<'a>(
        &'a self,
        card_id: &'a str,
        column_id: ColumnId,
    ) -> BoxFuture<'a, Result<(), BoardError>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((card_id.to_string(), column_id));

            let delay = *self.persist_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail_persist.load(Ordering::SeqCst) {
                return Err(BoardError::Persistence("Error 500: Internal Server Error".into()));
            }

            if let Some(card) = self
                .cards
                .lock()
                .unwrap()
                .iter_mut()
                .find(|c| c.id == card_id)
            {
                card.column_id = column_id;
            }
            Ok(())
        })
    }
}

pub fn sample_board() -> (Vec<Column>, Vec<Card>) {
    (
        vec![
            Column::new(2, "Contacted", 20),
            Column::new(1, "New", 10),
            Column::new(3, "Won", 30),
        ],
        vec![
            Card::new("a", 1, "Acme"),
            Card::new("b", 1, "Globex"),
            Card::new("c", 1, "Initech"),
            Card::new("x", 2, "Umbrella"),
        ],
    )
}

pub async fn memory_session(
    settings: SessionSettings,
) -> (BoardSession, Arc<MemoryBackend>, broadcast::Sender<String>) {
    let (columns, cards) = sample_board();
    let backend = MemoryBackend::new(columns, cards);
    let (events_tx, _) = broadcast::channel(100);

    let session = BoardSession::load(
        backend.clone(),
        backend.clone(),
        settings,
        events_tx.clone(),
    )
    .await
    .expect("Failed to load board");

    (session, backend, events_tx)
}
