use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::BoardError;
use crate::services::BoardSession;

#[derive(Clone, Debug)]
pub struct AppState {
    pub board: Option<BoardSession>,
    pub events_tx: broadcast::Sender<String>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        board: Option<BoardSession>,
        events_tx: broadcast::Sender<String>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            board,
            events_tx,
            config,
        }
    }

    pub fn require_board(&self) -> Result<&BoardSession, BoardError> {
        self.board
            .as_ref()
            .ok_or_else(|| BoardError::Internal("Board not available".into()))
    }
}
