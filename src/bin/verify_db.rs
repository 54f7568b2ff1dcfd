use sqlx::sqlite::SqlitePool;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:crm_board.db".into());
    let pool = SqlitePool::connect(&url).await?;

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(&pool)
            .await?;

    println!("Tables: {}", tables.join(", "));

    let stage_count: i64 = sqlx::query_scalar("SELECT count(*) FROM stages")
        .fetch_one(&pool)
        .await?;
    let lead_count: i64 = sqlx::query_scalar("SELECT count(*) FROM leads")
        .fetch_one(&pool)
        .await?;

    println!("Stages: {}, leads: {}", stage_count, lead_count);

    let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await?;

    println!("Journal mode: {}", journal_mode);

    Ok(())
}
