use futures::future::BoxFuture;

use crate::domain::{BoardError, Card, Column, ColumnId};

/// Where the board's columns and cards are loaded from.
pub trait BoardSource: Send + Sync {
    fn get_columns(&self) -> BoxFuture<'_, Result<Vec<Column>, BoardError>>;

    fn get_cards(&self) -> BoxFuture<'_, Result<Vec<Card>, BoardError>>;
}

/// Persists a card's new column. Called fire-and-forget from a gesture.
pub trait CardColumnPersister: Send + Sync {
    fn persist_card_column<'a>(
        &'a self,
        card_id: &'a str,
        column_id: ColumnId,
    ) -> BoxFuture<'a, Result<(), BoardError>>;
}
