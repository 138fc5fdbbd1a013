//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use app_bootstrap::database::{ConnectError, ConnectionDescriptor, Connector, Ping};
use async_trait::async_trait;
use tempfile::TempDir;

/// A complete, valid environment file.
pub const VALID_ENV: &str = "\
DB_HOST=localhost
DB_PORT=5432
DB_DATABASE=app
DB_USERNAME=app
DB_PASSWORD=s3cret-pw
SERVER_PORT=8080
SSL_MODE=disable
";

/// Write `contents` to `.env` inside a fresh temporary directory.
///
/// The directory is removed when the returned guard is dropped.
pub fn write_env_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

/// `VALID_ENV` without the line for `key`.
pub fn env_without(key: &str) -> String {
    VALID_ENV
        .lines()
        .filter(|line| !line.starts_with(&format!("{}=", key)))
        .map(|line| format!("{}\n", line))
        .collect()
}

/// Stand-in for a database handle.
#[derive(Debug, Clone)]
pub struct FakeDb {
    pub id: usize,
    pub host: String,
}

#[async_trait]
impl Ping for FakeDb {
    async fn ping(&self) -> Result<(), axum::BoxError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct Refused;

/// Connector that counts open calls and succeeds or fails on demand.
#[derive(Clone)]
pub struct CountingConnector {
    opens: Arc<AtomicUsize>,
    reachable: bool,
    delay: Duration,
}

impl CountingConnector {
    pub fn reachable() -> Self {
        Self {
            opens: Arc::new(AtomicUsize::new(0)),
            reachable: true,
            delay: Duration::from_millis(25),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::reachable()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for CountingConnector {
    type Handle = FakeDb;

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<FakeDb, ConnectError> {
        let id = self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if !self.reachable {
            return Err(ConnectError::connection(descriptor, Refused));
        }
        Ok(FakeDb {
            id,
            host: descriptor.host.clone(),
        })
    }
}
