//! Postgres-backed stores for integration tests
//!
//! Each `TestDb` owns a throwaway PostgreSQL container with the engine schema
//! applied through `db::connect`.

use std::time::Duration;

use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;

use queue_eta::config::DatabaseConfig;
use queue_eta::db;
use queue_eta::store::{PgStatsStore, PgTicketStore};

pub struct TestDb {
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
    pub pool: PgPool,
}

impl TestDb {
    pub async fn new() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        let config = DatabaseConfig {
            url: format!("postgres://postgres:postgres@{}:{}/postgres", host, port),
            max_connections: 4,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
            max_lifetime: Duration::from_secs(300),
        };

        let pool = db::connect(&config)
            .await
            .expect("Failed to connect and migrate test database");

        TestDb { container, pool }
    }

    pub fn ticket_store(&self) -> PgTicketStore {
        PgTicketStore::new(self.pool.clone())
    }

    pub fn stats_store(&self) -> PgStatsStore {
        PgStatsStore::new(self.pool.clone())
    }
}
