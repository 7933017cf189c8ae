//! Flat storage error taxonomy.
//!
//! Repositories classify backend constraint failures into one of these kinds
//! so the HTTP layer can map each to a status code deterministically. The
//! classification never retries and never swallows the original failure:
//! anything that doesn't match a known constraint shape bubbles up as
//! [`StoreError::Db`].

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::DbErr;
use thiserror::Error;

/// Storage-level error taxonomy, flat by condition.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested row absent; surfaced as 404.
    #[error("{entity_type} with id '{id}' not found")]
    EntityNotFound { entity_type: &'static str, id: String },

    /// Uniqueness violation; surfaced as 409.
    #[error("{entity_type} with {field} '{value}' already exists")]
    DuplicateEntity {
        entity_type: &'static str,
        field: String,
        value: String,
    },

    /// Dangling reference; surfaced as 400.
    #[error("referenced {referenced_entity} '{value}' does not exist (field '{field}')")]
    ForeignKeyViolation {
        field: String,
        value: String,
        referenced_entity: &'static str,
    },

    /// Optimistic-concurrency conflict; surfaced as 409.
    #[error("{entity_type} '{id}' was modified concurrently")]
    ConcurrentModification { entity_type: &'static str, id: String },

    /// Catch-all constraint/validation fallback; surfaced as 400.
    #[error("{detail}")]
    BadRequest { detail: String },

    /// Generic conflict fallback; surfaced as 409.
    #[error("{detail}")]
    Conflict { detail: String },

    /// Programmer error: a repository was invoked outside any
    /// middleware-managed session. Non-retryable, indicates a wiring bug.
    #[error("no database session in context; is the session middleware installed?")]
    NoSessionInContext,

    /// Unclassified backend failure, propagated unchanged.
    #[error(transparent)]
    Db(#[from] DbErr),
}

// SQLite: "UNIQUE constraint failed: users.email"
static SQLITE_UNIQUE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"UNIQUE constraint failed: \w+\.(\w+)").expect("valid regex")
});

// PostgreSQL reports the index name, e.g.
// `duplicate key value violates unique constraint "idx_users_email"`.
// Migrations name unique indexes `idx_<table>_<column>`.
static PG_UNIQUE_INDEX_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"unique constraint "idx_[0-9a-z_]+_([0-9a-z]+)""#).expect("valid regex")
});

/// Recover the violated column name from a unique-constraint error message.
///
/// The storage layer only gives us a generic integrity error with the
/// constraint spelled out in the message text; this is the one place where
/// that text is parsed.
pub(crate) fn unique_violation_column(message: &str) -> Option<&str> {
    let caps = SQLITE_UNIQUE_COLUMN
        .captures(message)
        .or_else(|| PG_UNIQUE_INDEX_COLUMN.captures(message))?;
    Some(caps.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_column_from_sqlite_message() {
        let msg = "error returned from database: (code: 2067) UNIQUE constraint failed: tags.name";
        assert_eq!(unique_violation_column(msg), Some("name"));
    }

    #[test]
    fn extracts_column_from_postgres_message() {
        let msg = r#"duplicate key value violates unique constraint "idx_users_email""#;
        assert_eq!(unique_violation_column(msg), Some("email"));
    }

    #[test]
    fn unknown_message_yields_none() {
        assert_eq!(unique_violation_column("CHECK constraint failed"), None);
    }
}
