//! Driver seam for opening the shared connection.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::database::descriptor::ConnectionDescriptor;
use crate::database::health::check_health;
use crate::database::provider::ConnectError;

/// Opens a live connection handle from a descriptor.
///
/// Implementations must only return handles that have completed a round trip.
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Self::Handle, ConnectError>;
}

/// PostgreSQL via an sqlx pool.
#[derive(Debug, Clone, Default)]
pub struct PostgresConnector {
    acquire_timeout: Option<Duration>,
}

impl PostgresConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound how long opening the first connection may take.
    /// Without it the driver default applies.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    type Handle = PgPool;

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<PgPool, ConnectError> {
        let mut options = PgPoolOptions::new();
        if let Some(timeout) = self.acquire_timeout {
            options = options.acquire_timeout(timeout);
        }

        let pool = options
            .connect_with(descriptor.connect_options())
            .await
            .map_err(|e| ConnectError::connection(descriptor, e))?;

        check_health(&pool)
            .await
            .map_err(|e| ConnectError::connection(descriptor, e))?;

        tracing::debug!(descriptor = %descriptor, "Database round trip succeeded");
        Ok(pool)
    }
}
