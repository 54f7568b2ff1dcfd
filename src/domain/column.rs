use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type ColumnId = i64;

/// A board column. Upstream calls these stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    pub sequence: i64,
    #[serde(alias = "isWinning", default)]
    pub is_winning: bool,
}

impl Column {
    pub fn new(id: ColumnId, name: impl Into<String>, sequence: i64) -> Self {
        Self {
            id,
            name: name.into(),
            sequence,
            is_winning: false,
        }
    }

    /// Stable sort by `sequence`; equal sequences keep their load order.
    pub fn sort_by_sequence(columns: &mut [Column]) {
        columns.sort_by_key(|c| c.sequence);
    }
}
