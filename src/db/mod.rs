//! Postgres setup shared by the ticket and stats stores.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::AppResult;

/// Tables the Postgres stores read and write
const ENGINE_TABLES: [&str; 2] = ["ticket_eta", "eta_stats"];

/// Opens the pool and applies pending migrations.
///
/// Every session runs in UTC so `updated_at` arithmetic and hour windows
/// agree with the engine.
pub async fn connect(config: &DatabaseConfig) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    migrate(&pool).await?;
    log::info!(
        "Ticket database ready (pool max: {}, min: {})",
        config.max_connections,
        config.min_connections
    );

    Ok(pool)
}

/// Creates or upgrades the ticket_eta / eta_stats schema
pub async fn migrate(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// True when both engine tables are visible to this connection
pub async fn schema_ready(pool: &PgPool) -> bool {
    let present: Result<i64, sqlx::Error> = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name::text = ANY($1)",
    )
    .bind(&ENGINE_TABLES[..])
    .fetch_one(pool)
    .await;

    matches!(present, Ok(count) if count == ENGINE_TABLES.len() as i64)
}

/// Tickets still counting down
pub async fn active_ticket_count(pool: &PgPool) -> AppResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM ticket_eta WHERE remaining_minutes > 0")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
