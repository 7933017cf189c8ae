//! Petstore database abstraction crate.
//!
//! This crate owns the request-scoped unit-of-work discipline for the
//! petstore service:
//!
//! - [`DbHandle`] — a pooled connection handle (`SQLite`, `PostgreSQL`)
//!   built on `SQLx` pools with a `SeaORM` facade.
//! - [`Session`] — one logical unit of work: a lazily-begun transaction on
//!   top of the pool, owned by exactly one in-flight request.
//! - [`context`] — task-local storage for "the current session", so
//!   repositories don't have to thread the session through every call.
//! - [`transactional`] — reentrant commit/rollback boundary for service
//!   operations that span multiple repository calls.
//! - [`Repo`] — generic CRUD primitive over one entity, classifying
//!   constraint violations into the [`StoreError`] taxonomy.
//!
//! # Features
//! - `sqlite` (default), `pg`: enable the corresponding `SQLx` backend.

#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

pub mod context;
pub mod error;
pub mod repo;
pub mod session;
pub mod tx;

pub use context::{current_session, with_session};
pub use error::StoreError;
pub use repo::{EntityMeta, Repo, ensure_foreign_key_exists};
pub use session::{Session, SessionProvider};
pub use tx::transactional;

use std::time::Duration;

use sea_orm::DatabaseConnection;
#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;

#[cfg(feature = "pg")]
use sea_orm::sqlx::postgres::PgPoolOptions;
#[cfg(feature = "sqlite")]
use sea_orm::sqlx::sqlite::SqlitePoolOptions;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[cfg(any(feature = "pg", feature = "sqlite"))]
    #[error(transparent)]
    Sqlx(#[from] sea_orm::sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Connection pool options; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection (periodic recycling).
    pub max_lifetime: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: Some(Duration::from_secs(3600)),
            test_before_acquire: true,
        }
    }
}

#[cfg(feature = "sqlite")]
const SQLITE_BUSY_TIMEOUT_MS: i32 = 5000;

/// Main handle: one pool per process, shared by all sessions.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN scheme prefix.
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_owned()))
        }
    }

    /// Connect and build the handle.
    ///
    /// For `SQLite` every pooled connection gets `PRAGMA foreign_keys = ON`
    /// (the engine does not enforce FK constraints otherwise) and a busy
    /// timeout, applied in an `after_connect` hook.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the DSN is invalid.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let mut o = PgPoolOptions::new().test_before_acquire(opts.test_before_acquire);
                if let Some(n) = opts.max_conns {
                    o = o.max_connections(n);
                }
                if let Some(n) = opts.min_conns {
                    o = o.min_connections(n);
                }
                if let Some(d) = opts.acquire_timeout {
                    o = o.acquire_timeout(d);
                }
                o = o.idle_timeout(opts.idle_timeout);
                o = o.max_lifetime(opts.max_lifetime);

                let pool = o.connect(dsn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool);
                Ok(Self { engine, sea })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let mut o = SqlitePoolOptions::new().test_before_acquire(opts.test_before_acquire);
                if let Some(n) = opts.max_conns {
                    o = o.max_connections(n);
                }
                if let Some(n) = opts.min_conns {
                    o = o.min_connections(n);
                }
                if let Some(d) = opts.acquire_timeout {
                    o = o.acquire_timeout(d);
                }
                o = o.idle_timeout(opts.idle_timeout);
                o = o.max_lifetime(opts.max_lifetime);

                o = o.after_connect(|conn, _meta| {
                    Box::pin(async move {
                        sea_orm::sqlx::query("PRAGMA foreign_keys = ON")
                            .execute(&mut *conn)
                            .await?;
                        // PRAGMA does not accept bound parameters.
                        sea_orm::sqlx::query(&format!(
                            "PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS}"
                        ))
                        .execute(&mut *conn)
                        .await?;
                        Ok(())
                    })
                });

                let pool = o.connect(dsn).await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
                Ok(Self { engine, sea })
            }
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Get the backend.
    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// `SeaORM` facade over the pool. Prefer going through a [`Session`]
    /// from application code; this accessor exists for migrations and wiring.
    #[must_use]
    pub fn sea(&self) -> &DatabaseConnection {
        &self.sea
    }

    /// Graceful pool close. (Dropping the pool also closes it; this just
    /// makes it explicit at shutdown.)
    ///
    /// # Errors
    /// Returns an error if closing the underlying pool fails.
    pub async fn close(self) -> Result<()> {
        self.sea.close().await?;
        Ok(())
    }
}

// ===================== tests =====================
