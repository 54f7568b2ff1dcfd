use serde::{Deserialize, Serialize};

use crate::domain::{CardId, ColumnId};

/// A draggable item or drop target on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DragItem {
    Column(ColumnId),
    Card(CardId),
}

impl DragItem {
    pub fn card(id: impl Into<CardId>) -> Self {
        DragItem::Card(id.into())
    }
}
