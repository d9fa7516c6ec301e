use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{StatsStore, TicketStore};
use crate::error::{AppError, AppResult};
use crate::models::{EtaStats, NotificationChannel, TicketEta, TicketStatus};

// =============================================================================
// Tickets
// =============================================================================

/// Row shape of the `ticket_eta` table
#[derive(Debug, FromRow)]
struct TicketRow {
    ticket_id: String,
    queue_id: String,
    contact_address: Option<String>,
    channel: NotificationChannel,
    remaining_minutes: i32,
    original_eta_minutes: i32,
    calculated_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    notification_sent: bool,
    status: TicketStatus,
}

impl TryFrom<TicketRow> for TicketEta {
    type Error = AppError;

    fn try_from(row: TicketRow) -> AppResult<Self> {
        let minutes = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| {
                AppError::Store(format!(
                    "ticket {} has negative {}: {}",
                    row.ticket_id, column, value
                ))
            })
        };

        Ok(TicketEta {
            remaining_minutes: minutes(row.remaining_minutes, "remaining_minutes")?,
            original_eta_minutes: minutes(row.original_eta_minutes, "original_eta_minutes")?,
            ticket_id: row.ticket_id,
            queue_id: row.queue_id,
            contact_address: row.contact_address,
            channel: row.channel,
            calculated_at: row.calculated_at,
            updated_at: row.updated_at,
            notification_sent: row.notification_sent,
            status: row.status,
        })
    }
}

fn to_db_minutes(value: u32) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("minutes out of range: {}", value)))
}

/// Ticket store backed by the `ticket_eta` table
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn get(&self, ticket_id: &str) -> AppResult<Option<TicketEta>> {
        let row: Option<TicketRow> = sqlx::query_as("SELECT * FROM ticket_eta WHERE ticket_id = $1")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TicketEta::try_from).transpose()
    }

    async fn list_active(&self) -> AppResult<Vec<TicketEta>> {
        let rows: Vec<TicketRow> =
            sqlx::query_as("SELECT * FROM ticket_eta WHERE remaining_minutes > 0")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TicketEta::try_from).collect()
    }

    async fn put(&self, ticket: &TicketEta) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ticket_eta (
                ticket_id, queue_id, contact_address, channel,
                remaining_minutes, original_eta_minutes,
                calculated_at, updated_at, notification_sent, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (ticket_id) DO UPDATE
            SET queue_id = EXCLUDED.queue_id,
                contact_address = EXCLUDED.contact_address,
                channel = EXCLUDED.channel,
                remaining_minutes = EXCLUDED.remaining_minutes,
                original_eta_minutes = EXCLUDED.original_eta_minutes,
                calculated_at = EXCLUDED.calculated_at,
                updated_at = EXCLUDED.updated_at,
                notification_sent = EXCLUDED.notification_sent,
                status = EXCLUDED.status
            "#,
        )
        .bind(&ticket.ticket_id)
        .bind(&ticket.queue_id)
        .bind(&ticket.contact_address)
        .bind(ticket.channel)
        .bind(to_db_minutes(ticket.remaining_minutes)?)
        .bind(to_db_minutes(ticket.original_eta_minutes)?)
        .bind(ticket.calculated_at)
        .bind(ticket.updated_at)
        .bind(ticket.notification_sent)
        .bind(ticket.status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, ticket_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ticket_eta WHERE ticket_id = $1")
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;

        log::debug!(
            "Deleted ticket {} ({} row(s))",
            ticket_id,
            result.rows_affected()
        );
        Ok(())
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Stats store backed by the `eta_stats` table
#[derive(Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn get(&self, queue_id: &str, time_window: &str) -> AppResult<Option<EtaStats>> {
        let stats: Option<EtaStats> = sqlx::query_as(
            "SELECT * FROM eta_stats WHERE queue_id = $1 AND time_window = $2",
        )
        .bind(queue_id)
        .bind(time_window)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn put(&self, stats: &EtaStats) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO eta_stats (
                queue_id, time_window, served_count, ema_service_rate,
                p90_wait_time_minutes, p50_wait_time_minutes,
                window_start, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (queue_id, time_window) DO UPDATE
            SET served_count = EXCLUDED.served_count,
                ema_service_rate = EXCLUDED.ema_service_rate,
                p90_wait_time_minutes = EXCLUDED.p90_wait_time_minutes,
                p50_wait_time_minutes = EXCLUDED.p50_wait_time_minutes,
                window_start = EXCLUDED.window_start,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&stats.queue_id)
        .bind(&stats.time_window)
        .bind(stats.served_count)
        .bind(stats.ema_service_rate)
        .bind(stats.p90_wait_time_minutes)
        .bind(stats.p50_wait_time_minutes)
        .bind(stats.window_start)
        .bind(stats.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, queue_id: &str, time_window: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM eta_stats WHERE queue_id = $1 AND time_window = $2")
            .bind(queue_id)
            .bind(time_window)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
