//! End-to-end startup scenarios.

mod common;

use std::sync::Arc;
use std::time::Duration;

use app_bootstrap::config::{ConfigError, ConfigProvider, DotenvFile, ProcessEnv, SslMode};
use app_bootstrap::database::{ConnectError, ConnectionProvider, PostgresConnector};
use app_bootstrap::http::{HttpServer, X_REQUEST_ID};
use app_bootstrap::lifecycle::{Bootstrap, Shutdown, Stage, StageError, StartupPhase};
use app_bootstrap::singleton::SlotState;
use common::{env_without, write_env_file, CountingConnector, VALID_ENV};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_valid_file_reaches_ready() {
    let (_dir, path) = write_env_file(VALID_ENV);
    let connector = CountingConnector::reachable();
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(DotenvFile::new(&path)),
        ConnectionProvider::new(connector.clone()),
    );
    let status = bootstrap.status();

    let ready = bootstrap.run().await.unwrap();

    let db = &ready.config.database;
    assert_eq!(db.host, "localhost");
    assert_eq!(db.port, 5432);
    assert_eq!(db.name, "app");
    assert_eq!(db.username, "app");
    assert_eq!(db.password.expose_secret(), "s3cret-pw");
    assert_eq!(db.ssl_mode, SslMode::Disable);
    assert_eq!(ready.config.server.port, 8080);
    assert_eq!(ready.database.host, "localhost");
    assert_eq!(connector.opens(), 1);
    assert_eq!(status.phase(), StartupPhase::Ready);
}

#[tokio::test]
async fn test_missing_host_fails_fast() {
    let (_dir, path) = write_env_file(&env_without("DB_HOST"));
    let connector = CountingConnector::reachable();
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(DotenvFile::new(&path)),
        ConnectionProvider::new(connector.clone()),
    );
    let status = bootstrap.status();

    let failure = bootstrap.run().await.unwrap_err();

    assert_eq!(failure.stage, Stage::Config);
    match &failure.error {
        StageError::Config(e) => assert_eq!(e.missing_fields(), &["DB_HOST"]),
        other => panic!("expected config error, got {:?}", other),
    }
    assert_eq!(connector.opens(), 0);
    assert_eq!(status.snapshot().failed_stage, Some(Stage::Config));
}

#[tokio::test]
async fn test_missing_env_file_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(DotenvFile::new(dir.path().join(".env"))),
        ConnectionProvider::new(CountingConnector::reachable()),
    );

    let failure = bootstrap.run().await.unwrap_err();
    assert!(matches!(
        failure.error,
        StageError::Config(ConfigError::SourceUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_database_keeps_config() {
    let (_dir, path) = write_env_file(VALID_ENV);
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(DotenvFile::new(&path)),
        ConnectionProvider::new(CountingConnector::unreachable()),
    );
    let connection = bootstrap.connection_provider();
    let status = bootstrap.status();

    let failure = bootstrap.run().await.unwrap_err();

    assert_eq!(failure.stage, Stage::Connection);
    assert!(matches!(
        failure.error,
        StageError::Connection(ConnectError::Connection { .. })
    ));
    assert!(failure.config.is_some());
    assert!(connection.get().is_none());
    assert_eq!(connection.state(), SlotState::Failed);
    assert_eq!(status.phase(), StartupPhase::Failed);
    assert!(!failure.to_string().contains("s3cret-pw"));
}

#[tokio::test]
async fn test_unreachable_postgres_is_connection_failure() {
    let (_dir, path) = write_env_file(&VALID_ENV.replace("DB_PORT=5432", "DB_PORT=1"));
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(DotenvFile::new(&path)),
        ConnectionProvider::new(
            PostgresConnector::new().with_acquire_timeout(Duration::from_secs(1)),
        ),
    );

    let failure = bootstrap.run().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Connection);
    assert_eq!(failure.config.unwrap().database.port, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connects_share_one_handle() {
    let (_dir, path) = write_env_file(VALID_ENV);
    let connector = CountingConnector::reachable();
    let config = Arc::new(ConfigProvider::new(DotenvFile::new(&path)));
    let connection = Arc::new(ConnectionProvider::new(connector.clone()));
    let loaded = config.load().await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let connection = connection.clone();
        let loaded = loaded.clone();
        tasks.push(tokio::spawn(async move { connection.connect(&loaded).await }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }

    assert_eq!(connector.opens(), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[tokio::test]
async fn test_health_check_over_real_listener() {
    let (_dir, path) = write_env_file(VALID_ENV);
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(DotenvFile::new(&path)),
        ConnectionProvider::new(CountingConnector::reachable()),
    );
    let status = bootstrap.status();
    let ready = bootstrap.run().await.unwrap();

    let server = HttpServer::new(ready, status);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/healthCheck", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key(X_REQUEST_ID.as_str()));
    let body: String = response.json().await.unwrap();
    assert_eq!(body, "server is up");

    let status: serde_json::Value = client
        .get(format!("http://{}/status", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["phase"], "ready");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL configured through DB_* variables"]
async fn test_live_postgres_bootstrap() {
    let bootstrap = Bootstrap::new(
        ConfigProvider::new(ProcessEnv),
        ConnectionProvider::new(PostgresConnector::new()),
    );
    let ready = bootstrap.run().await.unwrap();
    app_bootstrap::database::check_health(&ready.database)
        .await
        .unwrap();
}
