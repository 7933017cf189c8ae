//! Reentrant transaction scope.

use std::future::Future;

use crate::error::StoreError;
use crate::session::Session;

/// Run `body` inside a commit/rollback boundary on `session`.
///
/// If the session is already inside an open transaction, `body` runs
/// directly and the existing (outer) boundary governs final disposition —
/// no second begin/commit pair. Service methods can therefore each wrap
/// themselves in `transactional` and still compose into one atomic unit.
///
/// On failure the transaction is rolled back and the original error is
/// returned unchanged; a rollback failure is logged, never substituted.
///
/// # Errors
/// Propagates `body`'s error, or a [`StoreError`] (converted into `E`) if
/// beginning or committing the transaction fails.
pub async fn transactional<T, E, F, Fut>(session: &Session, body: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<StoreError>,
{
    if session.in_transaction().await {
        return body().await;
    }

    session.begin().await.map_err(StoreError::from)?;
    match body().await {
        Ok(value) => {
            session.commit().await.map_err(StoreError::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = session.rollback().await {
                tracing::warn!(error = %rb, "rollback failed after aborted transaction scope");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectOpts, DbHandle, Session};
    use sea_orm::ConnectionTrait;

    // Shared-cache memory DSN so reads through a second pooled connection
    // still see committed writes.
    async fn handle(name: &str) -> DbHandle {
        let dsn = format!("sqlite:file:{name}?mode=memory&cache=shared");
        let db = DbHandle::connect(&dsn, ConnectOpts::default())
            .await
            .expect("in-memory sqlite");
        db.sea()
            .execute_unprepared("CREATE TABLE IF NOT EXISTS notes (id TEXT PRIMARY KEY, body TEXT NOT NULL)")
            .await
            .expect("create table");
        db
    }

    async fn insert_note(session: &Session, id: &str) -> Result<(), StoreError> {
        session
            .execute_unprepared(&format!("INSERT INTO notes (id, body) VALUES ('{id}', 'x')"))
            .await?;
        Ok(())
    }

    async fn count_notes(db: &DbHandle) -> i32 {
        let row = db
            .sea()
            .query_one(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "SELECT COUNT(*) FROM notes",
            ))
            .await
            .expect("count query")
            .expect("count row");
        row.try_get_by(0).expect("count value")
    }

    #[tokio::test]
    async fn commits_on_success() {
        let db = handle("tx_commit").await;
        let session = Session::new(db.sea().clone());

        let result: Result<(), StoreError> =
            transactional(&session, || async { insert_note(&session, "a").await }).await;
        result.expect("scope should commit");

        assert!(!session.in_transaction().await);
        assert_eq!(count_notes(&db).await, 1);
    }

    #[tokio::test]
    async fn nested_scopes_commit_exactly_once() {
        let db = handle("tx_nested").await;
        let session = Session::new(db.sea().clone());

        let result: Result<(), StoreError> = transactional(&session, || async {
            transactional(&session, || async { insert_note(&session, "a").await }).await
        })
        .await;
        result.expect("nested scope should pass through");

        assert_eq!(count_notes(&db).await, 1);
    }

    #[tokio::test]
    async fn inner_failure_rolls_back_outer_write() {
        let db = handle("tx_inner_fail").await;
        let session = Session::new(db.sea().clone());

        let result: Result<(), StoreError> = transactional(&session, || async {
            insert_note(&session, "a").await?;
            // Inner scope is a passthrough: its failure aborts the whole
            // outer boundary, including the write above.
            transactional(&session, || async {
                Err::<(), _>(StoreError::BadRequest {
                    detail: "boom".to_owned(),
                })
            })
            .await
        })
        .await;

        assert!(matches!(result, Err(StoreError::BadRequest { .. })));
        assert!(!session.in_transaction().await);
        assert_eq!(count_notes(&db).await, 0);
    }

    #[tokio::test]
    async fn error_propagates_unchanged() {
        let db = handle("tx_propagate").await;
        let session = Session::new(db.sea().clone());

        let result: Result<(), StoreError> = transactional(&session, || async {
            Err(StoreError::Conflict {
                detail: "original".to_owned(),
            })
        })
        .await;

        match result {
            Err(StoreError::Conflict { detail }) => assert_eq!(detail, "original"),
            other => panic!("expected original error back, got {other:?}"),
        }
    }
}
