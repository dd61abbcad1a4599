//! Statement executor.
//!
//! The only place in the service that speaks SQL. Every verb runs the same
//! three phases on a pooled connection: prepare, execute, translate the
//! driver error into an [`RdbmsError`]. Failures are logged here, once, and
//! handed back classified.

use std::sync::{Arc, RwLock};

use anyhow::Context;
use sqlx::{
    any::{AnyArguments, AnyPoolOptions, AnyRow, AnyStatement},
    migrate::{Migrate, MigrateError, Migrator},
    pool::PoolConnection,
    query::{Query, QueryAs},
    Any, AnyConnection, AnyPool, Executor, FromRow, Statement,
};
use tracing::{debug, error, info, warn};

use crate::config::DbConfig;

mod engine;
mod errors;

pub use engine::Engine;
pub use errors::RdbmsError;

use errors::classify_create;

/// A bound statement argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i64),
    Text(String),
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_owned())
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

/// Builds a `Vec<Param>` in placeholder order.
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::rdbms::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::rdbms::Param::from($value)),+]
    };
}

/// Shared handle over one connection pool. Cheap to clone.
///
/// Clones share the pool slot, so a pool swapped in after a migration is
/// seen by all of them.
#[derive(Clone)]
pub struct Rdbms {
    pool: Arc<RwLock<AnyPool>>,
    engine: Engine,
}

impl Rdbms {
    /// Opens the pool and checks that the server answers.
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        sqlx::any::install_default_drivers();

        let url = cfg.engine.connection_url(cfg);
        let pool = AnyPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&url)
            .await
            .with_context(|| format!("connect to {} database", cfg.engine))?;

        info!(engine = %cfg.engine, "database connection established");
        Ok(Self {
            pool: Arc::new(RwLock::new(pool)),
            engine: cfg.engine,
        })
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Runs an `INSERT .. RETURNING <id>` and returns the generated id.
    pub async fn create(&self, sql: &str, params: Vec<Param>) -> Result<i64, RdbmsError> {
        let mut conn = self.acquire().await?;
        let stmt = prepare(&mut conn, sql).await?;

        // Drain the statement so SQLite resets it and commits the row.
        let rows = bind_as(stmt.query_as::<(i64,)>(), params)
            .fetch_all(&mut *conn)
            .await;

        match rows.map(|rows| rows.into_iter().next()) {
            Ok(Some((id,))) => Ok(id),
            Ok(None) => {
                error!(sql, "create returned no id");
                Err(RdbmsError::Create(sqlx::Error::RowNotFound))
            }
            Err(e) => {
                let err = classify_create(e);
                if err.is_duplicate() {
                    warn!(error = ?err, "create rejected: entry exists");
                } else {
                    error!(error = ?err, sql, "create failed");
                }
                Err(err)
            }
        }
    }

    /// Reads a single row into `T`. Zero rows is [`RdbmsError::ReadNotFound`].
    pub async fn read<T>(&self, sql: &str, params: Vec<Param>) -> Result<T, RdbmsError>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let mut conn = self.acquire().await?;
        let stmt = prepare(&mut conn, sql).await?;

        match bind_as(stmt.query_as::<T>(), params)
            .fetch_optional(&mut *conn)
            .await
        {
            Ok(Some(row)) => Ok(row),
            Ok(None) => {
                debug!(sql, "read matched no rows");
                Err(RdbmsError::ReadNotFound)
            }
            Err(e) => {
                error!(error = %e, sql, "read failed");
                Err(RdbmsError::Read(e))
            }
        }
    }

    /// Executes an update. Zero affected rows counts as success.
    pub async fn update(&self, sql: &str, params: Vec<Param>) -> Result<(), RdbmsError> {
        let mut conn = self.acquire().await?;
        let stmt = prepare(&mut conn, sql).await?;

        bind(stmt.query(), params)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!(error = %e, sql, "update failed");
                RdbmsError::Update(e)
            })?;
        Ok(())
    }

    pub async fn delete(&self, sql: &str, params: Vec<Param>) -> Result<(), RdbmsError> {
        let mut conn = self.acquire().await?;
        let stmt = prepare(&mut conn, sql).await?;

        bind(stmt.query(), params)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!(error = %e, sql, "delete failed");
                RdbmsError::Delete(e)
            })?;
        Ok(())
    }

    /// Applies every pending migration found under `source`, not just the
    /// next one, so a fresh database reaches head in a single call.
    ///
    /// Already being at the head is not an error.
    pub async fn migrate_up(&self, source: &str) -> Result<(), RdbmsError> {
        let migrator = self.migrator(source).await?;
        let mut conn = self.migration_connection().await?;
        migrator.run(&mut *conn).await.map_err(migration_failed)?;
        self.renew_pool(conn).await;
        info!(engine = %self.engine, "database schema is up to date");
        Ok(())
    }

    /// Reverts the most recently applied migration.
    ///
    /// With nothing applied this is a no-op.
    pub async fn migrate_down(&self, source: &str) -> Result<(), RdbmsError> {
        let migrator = self.migrator(source).await?;
        let mut conn = self.migration_connection().await?;

        conn.ensure_migrations_table()
            .await
            .map_err(migration_failed)?;
        let mut applied: Vec<i64> = conn
            .list_applied_migrations()
            .await
            .map_err(migration_failed)?
            .into_iter()
            .map(|m| m.version)
            .collect();
        applied.sort_unstable();

        let (target, reverted) = match applied.as_slice() {
            [] => {
                info!(engine = %self.engine, "no applied migration to revert");
                return Ok(());
            }
            [.., previous, last] => (*previous, *last),
            [only] => (0, *only),
        };

        migrator
            .undo(&mut *conn, target)
            .await
            .map_err(migration_failed)?;
        self.renew_pool(conn).await;
        info!(engine = %self.engine, version = reverted, "migration reverted");
        Ok(())
    }

    async fn migration_connection(&self) -> Result<PoolConnection<Any>, RdbmsError> {
        self.pool()
            .acquire()
            .await
            .map_err(|e| migration_failed(MigrateError::Execute(e)))
    }

    /// Replaces the pool with a fresh one built from the same options and
    /// closes the old one, so no connection keeps statements prepared
    /// against the previous schema.
    async fn renew_pool(&self, migrated: PoolConnection<Any>) {
        drop(migrated);

        let old = self.pool();
        let fresh = old
            .options()
            .clone()
            .connect_lazy_with((*old.connect_options()).clone());
        {
            let mut slot = self.pool.write().unwrap_or_else(|e| e.into_inner());
            *slot = fresh;
        }
        old.close().await;
        debug!(engine = %self.engine, "connection pool renewed after schema change");
    }

    fn pool(&self) -> AnyPool {
        self.pool.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn migrator(&self, source: &str) -> Result<Migrator, RdbmsError> {
        let dir = self.engine.migrations_dir(source);
        debug!(dir = %dir.display(), "loading migrations");
        Migrator::new(dir).await.map_err(migration_failed)
    }

    async fn acquire(&self) -> Result<PoolConnection<Any>, RdbmsError> {
        self.pool().acquire().await.map_err(|e| {
            error!(error = %e, "could not acquire connection to prepare statement");
            RdbmsError::PrepareStatement(e)
        })
    }
}

async fn prepare<'q>(
    conn: &mut AnyConnection,
    sql: &'q str,
) -> Result<AnyStatement<'q>, RdbmsError> {
    (&mut *conn).prepare(sql).await.map_err(|e| {
        error!(error = %e, sql, "prepare statement failed");
        RdbmsError::PrepareStatement(e)
    })
}

fn bind<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    params: Vec<Param>,
) -> Query<'q, Any, AnyArguments<'q>> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(v),
            Param::Text(v) => query.bind(v),
        };
    }
    query
}

fn bind_as<'q, O>(
    mut query: QueryAs<'q, Any, O, AnyArguments<'q>>,
    params: Vec<Param>,
) -> QueryAs<'q, Any, O, AnyArguments<'q>> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(v),
            Param::Text(v) => query.bind(v),
        };
    }
    query
}

fn migration_failed(e: MigrateError) -> RdbmsError {
    error!(error = %e, "migration failed");
    RdbmsError::Migration(e)
}
