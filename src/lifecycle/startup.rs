//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the configuration, then open the connection, in that order
//! - Publish the current phase and any failure for readers
//! - Hand both resources to the caller only when both exist
//!
//! # Design Decisions
//! - Fail fast: a failed stage ends startup, later stages never run
//! - `run` consumes the bootstrap, so the sequence runs once
//! - Providers are shared so later code can reach the same resources

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::{AppConfig, ConfigError, ConfigProvider};
use crate::database::{ConnectError, ConnectionProvider, Connector};
use crate::observability::metrics;

/// Where the bootstrap currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPhase {
    Idle,
    ConfigLoading,
    ConnectionOpening,
    Ready,
    Failed,
}

impl StartupPhase {
    /// Gauge value for the `startup_phase` metric.
    pub fn code(self) -> u8 {
        match self {
            StartupPhase::Idle => 0,
            StartupPhase::ConfigLoading => 1,
            StartupPhase::ConnectionOpening => 2,
            StartupPhase::Ready => 3,
            StartupPhase::Failed => 4,
        }
    }
}

/// A startup stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Config,
    Connection,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Connection => "connection",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of startup, as served by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub phase: StartupPhase,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
}

impl StatusSnapshot {
    fn idle() -> Self {
        Self {
            phase: StartupPhase::Idle,
            failed_stage: None,
            error: None,
        }
    }
}

/// Shared, lock-free startup status.
#[derive(Debug, Clone)]
pub struct StartupStatus {
    current: Arc<ArcSwap<StatusSnapshot>>,
}

impl StartupStatus {
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(StatusSnapshot::idle())),
        }
    }

    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        self.current.load_full()
    }

    pub fn phase(&self) -> StartupPhase {
        self.current.load().phase
    }

    fn enter(&self, phase: StartupPhase) {
        self.publish(StatusSnapshot {
            phase,
            failed_stage: None,
            error: None,
        });
    }

    fn fail(&self, stage: Stage, error: &StageError) {
        self.publish(StatusSnapshot {
            phase: StartupPhase::Failed,
            failed_stage: Some(stage),
            error: Some(error.to_string()),
        });
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        tracing::debug!(phase = ?snapshot.phase, "Startup phase changed");
        metrics::record_startup_phase(snapshot.phase.code());
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for StartupStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// The error behind a failed stage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectError),
}

/// Startup ended in `Failed`.
#[derive(Debug, thiserror::Error)]
#[error("startup failed during {stage} stage: {error}")]
pub struct StartupFailure {
    pub stage: Stage,
    #[source]
    pub error: StageError,
    /// The loaded configuration, present when only the connection failed.
    pub config: Option<Arc<AppConfig>>,
}

/// Both resources, constructed.
#[derive(Debug, Clone)]
pub struct Ready<H> {
    pub config: Arc<AppConfig>,
    pub database: H,
}

/// Runs configuration loading and connection opening in order.
pub struct Bootstrap<C: Connector> {
    config: Arc<ConfigProvider>,
    connection: Arc<ConnectionProvider<C>>,
    status: StartupStatus,
}

impl<C: Connector> Bootstrap<C> {
    pub fn new(config: ConfigProvider, connection: ConnectionProvider<C>) -> Self {
        Self {
            config: Arc::new(config),
            connection: Arc::new(connection),
            status: StartupStatus::new(),
        }
    }

    pub fn status(&self) -> StartupStatus {
        self.status.clone()
    }

    pub fn config_provider(&self) -> Arc<ConfigProvider> {
        self.config.clone()
    }

    pub fn connection_provider(&self) -> Arc<ConnectionProvider<C>> {
        self.connection.clone()
    }

    /// Load the configuration, then open the connection.
    pub async fn run(self) -> Result<Ready<C::Handle>, StartupFailure> {
        tracing::info!(source = %self.config.source_description(), "Startup beginning");

        self.status.enter(StartupPhase::ConfigLoading);
        let started = Instant::now();
        let config = match self.config.load().await {
            Ok(config) => config,
            Err(e) => return Err(self.fail(Stage::Config, started, e.into(), None)),
        };
        metrics::record_startup_stage(Stage::Config.as_str(), true, started.elapsed());

        self.status.enter(StartupPhase::ConnectionOpening);
        let started = Instant::now();
        let database = match self.connection.connect(&config).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(Stage::Connection, started, e.into(), Some(config))),
        };
        metrics::record_startup_stage(Stage::Connection.as_str(), true, started.elapsed());

        self.status.enter(StartupPhase::Ready);
        tracing::info!("Startup complete");
        Ok(Ready { config, database })
    }

    fn fail(
        &self,
        stage: Stage,
        started: Instant,
        error: StageError,
        config: Option<Arc<AppConfig>>,
    ) -> StartupFailure {
        metrics::record_startup_stage(stage.as_str(), false, started.elapsed());
        self.status.fail(stage, &error);
        tracing::error!(stage = %stage, error = %error, "Startup stage failed");
        StartupFailure {
            stage,
            error,
            config,
        }
    }
}

impl<C: Connector> fmt::Debug for Bootstrap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("config", &self.config)
            .field("connection", &self.connection)
            .field("phase", &self.status.phase())
            .finish()
    }
}
