use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::ColumnId;

pub type CardId = String;

/// A card on the board. Upstream calls these leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: CardId,
    #[serde(rename = "stage_id")]
    #[sqlx(rename = "stage_id")]
    pub column_id: ColumnId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub lead_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Card {
    pub fn new(id: impl Into<CardId>, column_id: ColumnId, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            column_id,
            name: name.into(),
            description: String::new(),
            lead_type: String::new(),
            user_id: None,
            account_id: None,
            active: true,
        }
    }
}
