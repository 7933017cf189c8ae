//! Request-scoped database session.
//!
//! A [`Session`] is one logical unit of work: a handle to the shared pool
//! plus an optional open transaction. It is owned by exactly one in-flight
//! request and must never be shared across concurrent requests. Queries
//! issued through the session observe the open transaction when there is one
//! (read-your-own-writes within a scope) and fall back to the bare pooled
//! connection otherwise.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, ExecResult,
    QueryResult, Statement, TransactionTrait,
};
use tokio::sync::Mutex;

use crate::DbHandle;

/// Produces a new [`Session`] per unit of work.
///
/// Cheap to clone; every clone shares the underlying pool.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    conn: DatabaseConnection,
}

impl SessionProvider {
    #[must_use]
    pub fn new(db: &DbHandle) -> Self {
        Self {
            conn: db.sea().clone(),
        }
    }

    /// Open a fresh session. No connection is acquired until the first
    /// statement or `begin` runs.
    #[must_use]
    pub fn open_session(&self) -> Session {
        Session::new(self.conn.clone())
    }
}

/// One database session: pooled connection plus at most one open transaction.
#[derive(Debug)]
pub struct Session {
    conn: DatabaseConnection,
    tx: Mutex<Option<DatabaseTransaction>>,
}

impl Session {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            tx: Mutex::new(None),
        }
    }

    /// Whether a transaction is currently open on this session.
    pub async fn in_transaction(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    /// Begin a transaction.
    ///
    /// # Errors
    /// Fails if a transaction is already open (callers are expected to check
    /// [`Session::in_transaction`] first, see [`crate::transactional`]) or if
    /// the backend cannot start one.
    pub async fn begin(&self) -> Result<(), DbErr> {
        let mut guard = self.tx.lock().await;
        if guard.is_some() {
            return Err(DbErr::Custom(
                "transaction already open on this session".to_owned(),
            ));
        }
        *guard = Some(self.conn.begin().await?);
        Ok(())
    }

    /// Commit the open transaction. No-op when none is open.
    ///
    /// # Errors
    /// Returns an error if the commit itself fails.
    pub async fn commit(&self) -> Result<(), DbErr> {
        let tx = self.tx.lock().await.take();
        match tx {
            Some(tx) => tx.commit().await,
            None => Ok(()),
        }
    }

    /// Roll back the open transaction. No-op when none is open.
    ///
    /// # Errors
    /// Returns an error if the rollback itself fails.
    pub async fn rollback(&self) -> Result<(), DbErr> {
        let tx = self.tx.lock().await.take();
        match tx {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }

    /// Close the session: anything still open is rolled back. The pooled
    /// connection returns to the pool once the last statement finishes.
    pub async fn close(&self) {
        if let Some(tx) = self.tx.lock().await.take() {
            if let Err(err) = tx.rollback().await {
                tracing::warn!(error = %err, "rollback on session close failed");
            }
        }
    }
}

/// Statements route through the open transaction when present, so every
/// repository call within one scope sees the same transactional state.
#[async_trait::async_trait]
impl ConnectionTrait for Session {
    fn get_database_backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.execute(stmt).await,
            None => self.conn.execute(stmt).await,
        }
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.execute_unprepared(sql).await,
            None => self.conn.execute_unprepared(sql).await,
        }
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.query_one(stmt).await,
            None => self.conn.query_one(stmt).await,
        }
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.query_all(stmt).await,
            None => self.conn.query_all(stmt).await,
        }
    }
}
