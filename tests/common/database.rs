//! Test database setup
#![allow(dead_code)]

use agora::notifications::{NotificationHub, PushChannel};
use agora::{CommentBoard, FlagWorkflow, FollowGraph, InteractionLedger, WarningLog};
use sea_orm::{DatabaseConnection, DbErr};
use std::env;
use std::sync::Arc;
use tempfile::TempDir;

/// Open a fresh database with the schema applied.
///
/// Defaults to a private in-memory SQLite database, so every test starts
/// empty and tests need not run serially. Set TEST_DATABASE_URL to run
/// against another database.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let database_url =
        env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    let db = agora::db::connect(&database_url, 1).await?;
    agora::db::init_schema(&db).await?;
    Ok(db)
}

/// Open a file-backed SQLite database behind a pool of several connections,
/// for tests whose operations must really overlap. The database lives as
/// long as the returned directory.
pub async fn setup_shared_test_database() -> Result<(DatabaseConnection, TempDir), DbErr> {
    let dir = tempfile::tempdir().map_err(|e| DbErr::Custom(e.to_string()))?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("agora.db").display());

    let db = agora::db::connect(&url, 4).await?;
    agora::db::init_schema(&db).await?;
    Ok((db, dir))
}

/// Every component wired to one database and push channel.
#[derive(Clone)]
pub struct TestCore {
    pub db: DatabaseConnection,
    pub hub: NotificationHub,
    pub ledger: InteractionLedger,
    pub flags: FlagWorkflow,
    pub follows: FollowGraph,
    pub warnings: WarningLog,
    pub comments: CommentBoard,
}

impl TestCore {
    pub fn new(db: DatabaseConnection, push: Arc<dyn PushChannel>) -> Self {
        let hub = NotificationHub::new(db.clone(), push);
        Self {
            ledger: InteractionLedger::new(db.clone(), hub.clone()),
            flags: FlagWorkflow::new(db.clone(), hub.clone()),
            follows: FollowGraph::new(db.clone()),
            warnings: WarningLog::new(db.clone(), hub.clone()),
            comments: CommentBoard::new(db.clone(), hub.clone()),
            hub,
            db,
        }
    }
}

/// Database plus components without real-time push.
pub async fn setup_test_core() -> TestCore {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");
    TestCore::new(db, Arc::new(agora::notifications::Discard))
}

/// Components over a multi-connection database, without real-time push.
pub async fn setup_shared_test_core() -> (TestCore, TempDir) {
    let (db, dir) = setup_shared_test_database()
        .await
        .expect("Failed to set up shared test database");
    (TestCore::new(db, Arc::new(agora::notifications::Discard)), dir)
}
