//! Task-local slot for "the current session".
//!
//! The binding is scoped per request-handling task, never process-wide: two
//! concurrent requests can never observe each other's session. The slot is
//! installed with [`with_session`] and dropped automatically when the scoped
//! future completes or is cancelled, so no session handle can leak into an
//! unrelated unit of work reusing the same worker.

use std::future::Future;
use std::sync::Arc;

use crate::error::StoreError;
use crate::session::Session;

tokio::task_local! {
    static CURRENT_SESSION: Arc<Session>;
}

/// Run `fut` with `session` installed as the current session for the task.
///
/// The binding is cleared unconditionally when the future finishes, including
/// on cancellation.
pub async fn with_session<F>(session: Arc<Session>, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_SESSION.scope(session, fut).await
}

/// The current session for this task.
///
/// # Errors
/// Fails with [`StoreError::NoSessionInContext`] when called outside a
/// [`with_session`] scope. There is deliberately no default session: callers
/// must not silently proceed without a transaction boundary.
pub fn current_session() -> Result<Arc<Session>, StoreError> {
    CURRENT_SESSION
        .try_with(Arc::clone)
        .map_err(|_| StoreError::NoSessionInContext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectOpts, DbHandle};

    async fn mem_handle() -> DbHandle {
        DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .expect("in-memory sqlite")
    }

    #[tokio::test]
    async fn no_session_outside_scope() {
        let err = current_session().expect_err("must fail outside scope");
        assert!(matches!(err, StoreError::NoSessionInContext));
    }

    #[tokio::test]
    async fn session_visible_inside_scope_and_cleared_after() {
        let db = mem_handle().await;
        let session = Arc::new(Session::new(db.sea().clone()));

        with_session(Arc::clone(&session), async {
            let current = current_session().expect("session in scope");
            assert!(Arc::ptr_eq(&current, &session));
        })
        .await;

        // Scope ended: the slot must be empty again.
        assert!(matches!(
            current_session(),
            Err(StoreError::NoSessionInContext)
        ));
    }

    #[tokio::test]
    async fn concurrent_tasks_see_their_own_session() {
        let db = mem_handle().await;
        let a = Arc::new(Session::new(db.sea().clone()));
        let b = Arc::new(Session::new(db.sea().clone()));

        let task_a = tokio::spawn(with_session(Arc::clone(&a), async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            current_session().expect("session in task a")
        }));
        let task_b = tokio::spawn(with_session(Arc::clone(&b), async move {
            current_session().expect("session in task b")
        }));

        let got_a = task_a.await.expect("task a");
        let got_b = task_b.await.expect("task b");
        assert!(Arc::ptr_eq(&got_a, &a));
        assert!(Arc::ptr_eq(&got_b, &b));
    }
}
