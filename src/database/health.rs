//! Database reachability probe.

use async_trait::async_trait;
use sqlx::PgPool;

/// One `SELECT 1` round trip.
pub async fn check_health(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// A handle that can report whether its database still answers.
#[async_trait]
pub trait Ping: Clone + Send + Sync + 'static {
    async fn ping(&self) -> Result<(), axum::BoxError>;
}

#[async_trait]
impl Ping for PgPool {
    async fn ping(&self) -> Result<(), axum::BoxError> {
        check_health(self).await?;
        Ok(())
    }
}
