use futures::future::BoxFuture;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::{BoardError, Card, Column, ColumnId};
use crate::services::{BoardSource, CardColumnPersister};

/// Stages and leads stored in the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBoardStore {
    pool: SqlitePool,
}

impl SqliteBoardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn list_columns(&self) -> Result<Vec<Column>, BoardError> {
        let columns: Vec<Column> = sqlx::query_as(
            "SELECT id, name, sequence, is_winning FROM stages ORDER BY sequence ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(columns)
    }

    pub async fn list_cards(&self) -> Result<Vec<Card>, BoardError> {
        let cards: Vec<Card> = sqlx::query_as(
            "SELECT id, stage_id, name, description, lead_type, user_id, account_id, active FROM leads ORDER BY position ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    pub async fn create_column(
        &self,
        name: &str,
        sequence: i64,
        is_winning: bool,
    ) -> Result<Column, BoardError> {
        let now = chrono::Utc::now().to_rfc3339();

        let column: Column = sqlx::query_as(
            "INSERT INTO stages (name, sequence, is_winning, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id, name, sequence, is_winning",
        )
        .bind(name)
        .bind(sequence)
        .bind(is_winning)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(column)
    }

    /// New leads go to the end of the board: max position + 1000.
    pub async fn create_card(&self, column_id: ColumnId, name: &str) -> Result<Card, BoardError> {
        self.require_column(column_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let max_pos: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) FROM leads")
            .fetch_one(&self.pool)
            .await?;

        let card: Card = sqlx::query_as(
            "INSERT INTO leads (id, stage_id, name, position, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING id, stage_id, name, description, lead_type, user_id, account_id, active",
        )
        .bind(&id)
        .bind(column_id)
        .bind(name)
        .bind(max_pos + 1000)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(card)
    }

    pub async fn update_card_column(&self, card_id: &str, column_id: ColumnId) -> Result<(), BoardError> {
        self.require_column(column_id).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE leads SET stage_id = ?, updated_at = ? WHERE id = ?")
            .bind(column_id)
            .bind(&now)
            .bind(card_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BoardError::NotFound(format!("Lead not found: {}", card_id)));
        }

        tracing::info!(card_id, column_id, "Lead moved to new stage");
        Ok(())
    }

    async fn require_column(&self, column_id: ColumnId) -> Result<(), BoardError> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM stages WHERE id = ?")
            .bind(column_id)
            .fetch_optional(&self.pool)
            .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| BoardError::NotFound(format!("Stage not found: {}", column_id)))
    }
}

impl BoardSource for SqliteBoardStore {
    fn get_columns(&self) -> BoxFuture<'_, Result<Vec<Column>, BoardError>> {
        Box::pin(self.list_columns())
    }

    fn get_cards(&self) -> BoxFuture<'_, Result<Vec<Card>, BoardError>> {
        Box::pin(self.list_cards())
    }
}

impl CardColumnPersister for SqliteBoardStore {
    fn persist_card_column<'a>(
        &'a self,
        card_id: &'a str,
        column_id: ColumnId,
    ) -> BoxFuture<'a, Result<(), BoardError>> {
        Box::pin(self.update_card_column(card_id, column_id))
    }
}
