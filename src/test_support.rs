use tempfile::TempDir;

use crate::config::DbConfig;
use crate::rdbms::{Engine, Rdbms};

pub(crate) const MIGRATIONS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

/// Migrated SQLite database living in a temp dir for the duration of a test.
pub(crate) struct TestDb {
    pub db: Rdbms,
    cfg: DbConfig,
    _dir: TempDir,
}

impl TestDb {
    /// A second, independent pool over the same database file.
    pub(crate) async fn reopen(&self) -> Rdbms {
        Rdbms::connect(&self.cfg).await.expect("reopen sqlite")
    }
}

pub(crate) async fn sqlite_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let cfg = DbConfig {
        engine: Engine::Sqlite,
        host: String::new(),
        port: 0,
        username: String::new(),
        password: String::new(),
        database: dir.path().join("accounts.db").display().to_string(),
        max_connections: 2,
    };
    let db = Rdbms::connect(&cfg).await.expect("connect sqlite");
    db.migrate_up(MIGRATIONS).await.expect("migrate up");
    TestDb { db, cfg, _dir: dir }
}
