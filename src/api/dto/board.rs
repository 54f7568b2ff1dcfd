use serde::{Deserialize, Serialize};

use crate::domain::DragItem;
use crate::engine::{BoardAction, BoardSnapshot, DragEffects, PersistRequest};

#[derive(Debug, Deserialize)]
pub struct BeginDragRequest {
    pub item: DragItem,
}

#[derive(Debug, Deserialize)]
pub struct DragOverRequest {
    pub active: DragItem,
    pub over: DragItem,
}

#[derive(Debug, Deserialize)]
pub struct EndDragRequest {
    pub active: DragItem,
    /// Absent when the pointer was released outside every drop target.
    #[serde(default)]
    pub over: Option<DragItem>,
}

#[derive(Debug, Serialize)]
pub struct BeginDragResponse {
    pub picked_up: bool,
    pub board: BoardSnapshot,
}

#[derive(Debug, Serialize)]
pub struct DragResponse {
    pub changed: bool,
    pub actions: Vec<BoardAction>,
    pub dispatched: Vec<PersistRequest>,
    pub board: BoardSnapshot,
}

impl DragResponse {
    pub fn from_effects(effects: DragEffects, board: BoardSnapshot) -> Self {
        Self {
            changed: !effects.is_noop(),
            actions: effects.actions,
            dispatched: effects.persist,
            board,
        }
    }
}
