use sqlx::SqlitePool;

use crate::domain::BoardError;

const DEFAULT_STAGES: &[(&str, i64, bool)] = &[
    ("New", 1000, false),
    ("Contacted", 2000, false),
    ("Qualified", 3000, false),
    ("Won", 4000, true),
];

/// Inserts the default pipeline when the stages table is empty.
pub async fn seed_default_stages(pool: &SqlitePool) -> Result<(), BoardError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        tracing::debug!(existing, "Stages already present, skipping seed");
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    for (name, sequence, is_winning) in DEFAULT_STAGES {
        sqlx::query(
            "INSERT INTO stages (name, sequence, is_winning, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(*name)
        .bind(*sequence)
        .bind(*is_winning)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(count = DEFAULT_STAGES.len(), "Default stages created");
    Ok(())
}
