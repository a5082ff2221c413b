use std::str::FromStr;

use sea_orm::{DatabaseConnection, SqlxPostgresConnector};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::DatabaseConfig;

pub type DbPool = PgPool;
pub type OrmConn = DatabaseConnection;

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.url {
            Some(url) => PgConnectOptions::from_str(url),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.name)),
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.timeout)
    }
}

/// Create a bounded pool and connect eagerly.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    config
        .pool_options()
        .connect_with(config.connect_options()?)
        .await
}

/// Create a bounded pool that opens connections on first use.
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    Ok(config
        .pool_options()
        .connect_lazy_with(config.connect_options()?))
}

/// Wrap the shared pool for SeaORM; both layers draw from the same connections.
pub fn create_orm_conn(pool: &DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone())
}

/// Apply schema migrations and the session table. Idempotent; run once at
/// bootstrap, never from a request handler.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    PostgresStore::new(pool.clone()).migrate().await?;
    tracing::info!("database migrations applied");
    Ok(())
}
