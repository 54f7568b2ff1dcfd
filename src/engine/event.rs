use serde::{Deserialize, Serialize};

use crate::domain::{CardId, ColumnId};
use crate::engine::{Notification, OpId, OpStatus};

/// Board change pushed to subscribers as one JSON message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardEvent {
    ColumnsReordered { column_ids: Vec<ColumnId> },
    CardMoved { card_id: CardId, from: usize, to: usize },
    CardReassigned { card_id: CardId, column_id: ColumnId },
    PersistResolved { card_id: CardId, op_id: OpId, status: Option<OpStatus>, error: Option<String> },
    BoardRefreshed { columns: usize, cards: usize },
    NotificationCreated { notification: Notification },
}
