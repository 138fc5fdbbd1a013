//! Process-wide connection provider.
//!
//! # Responsibilities
//! - Open the shared connection at most once
//! - Report failures with the target host, port and database (never the password)

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::connector::Connector;
use crate::database::descriptor::ConnectionDescriptor;
use crate::singleton::{ConstructionPanic, LazySingleton, SlotState};

/// Error type for opening the shared connection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectError {
    /// The driver could not open or verify the connection.
    #[error("failed to connect to database `{database}` at {host}:{port}: {cause}")]
    Connection {
        host: String,
        port: u16,
        database: String,
        #[source]
        cause: Arc<dyn StdError + Send + Sync>,
    },

    #[error(transparent)]
    Construction(#[from] ConstructionPanic),
}

impl ConnectError {
    pub fn connection<E>(descriptor: &ConnectionDescriptor, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ConnectError::Connection {
            host: descriptor.host.clone(),
            port: descriptor.port,
            database: descriptor.database.clone(),
            cause: Arc::new(cause),
        }
    }
}

/// Opens the connection once and shares the handle thereafter.
pub struct ConnectionProvider<C: Connector> {
    connector: C,
    slot: LazySingleton<C::Handle, ConnectError>,
}

impl<C: Connector> ConnectionProvider<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            slot: LazySingleton::new("database"),
        }
    }

    /// The shared handle, opened from `config` on first call.
    ///
    /// Only the first call's configuration is used; later calls return the
    /// stored handle or error regardless of their argument.
    pub async fn connect(&self, config: &AppConfig) -> Result<C::Handle, ConnectError> {
        let connector = &self.connector;
        let settings = &config.database;
        self.slot
            .get_or_try_init(|| async move {
                let descriptor = ConnectionDescriptor::from_settings(settings);
                tracing::info!(descriptor = %descriptor, "Opening database connection");
                connector.open(&descriptor).await
            })
            .await
    }

    pub fn get(&self) -> Option<C::Handle> {
        self.slot.get()
    }

    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    /// Number of times the connector was invoked. Never exceeds one.
    pub fn initializations(&self) -> usize {
        self.slot.initializations()
    }
}

impl<C: Connector> fmt::Debug for ConnectionProvider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("resource", &self.slot.name())
            .field("state", &self.slot.state())
            .field("initializations", &self.slot.initializations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseSettings, ServerSettings, SslMode};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    /// Hands out numbered handles after a short delay.
    struct FakeConnector {
        opens: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Connector for FakeConnector {
        type Handle = Arc<usize>;

        async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Arc<usize>, ConnectError> {
            let n = self.opens.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(ConnectError::connection(descriptor, Refused));
            }
            Ok(Arc::new(n))
        }
    }

    fn config(host: &str) -> AppConfig {
        AppConfig {
            database: DatabaseSettings {
                host: host.into(),
                port: 5432,
                name: "app".into(),
                username: "app".into(),
                password: SecretString::from("hunter2".to_string()),
                ssl_mode: SslMode::Disable,
            },
            server: ServerSettings { port: 8080 },
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fifty_concurrent_connects_open_once() {
        let opens = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(ConnectionProvider::new(FakeConnector {
            opens: opens.clone(),
            fail: false,
        }));
        let config = Arc::new(config("localhost"));

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let provider = provider.clone();
            let config = config.clone();
            tasks.push(tokio::spawn(async move { provider.connect(&config).await }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
        assert_eq!(provider.initializations(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_permanent() {
        let opens = Arc::new(AtomicUsize::new(0));
        let provider = ConnectionProvider::new(FakeConnector {
            opens: opens.clone(),
            fail: true,
        });

        let err = provider.connect(&config("db.internal")).await.unwrap_err();
        assert!(err.to_string().contains("db.internal:5432"));
        assert!(!err.to_string().contains("hunter2"));
        assert!(err.source().is_some());

        let again = provider.connect(&config("db.internal")).await.unwrap_err();
        assert!(matches!(again, ConnectError::Connection { .. }));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(provider.state(), SlotState::Failed);
        assert!(provider.get().is_none());
    }

    #[tokio::test]
    async fn test_only_first_configuration_is_used() {
        let opens = Arc::new(AtomicUsize::new(0));
        let provider = ConnectionProvider::new(FakeConnector {
            opens: opens.clone(),
            fail: false,
        });

        let first = provider.connect(&config("first")).await.unwrap();
        let second = provider.connect(&config("second")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_debug_names_resource_and_state() {
        let provider = ConnectionProvider::new(FakeConnector {
            opens: Arc::new(AtomicUsize::new(0)),
            fail: false,
        });
        provider.connect(&config("localhost")).await.unwrap();

        let rendered = format!("{:?}", provider);
        assert!(rendered.contains("\"database\""));
        assert!(rendered.contains("Ready"));
        assert!(!rendered.contains("hunter2"));
    }
}
