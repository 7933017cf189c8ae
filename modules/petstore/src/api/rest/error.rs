//! Map domain errors to RFC 9457 problem responses.
//!
//! Every classified storage condition maps to a fixed status code;
//! unclassified failures are logged and rendered as an opaque 500 so no
//! backend detail leaks to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use petstore_db::StoreError;
use petstore_problem::Problem;

use crate::domain::error::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Wrapper so handlers can use `?` on domain results.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(DomainError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        domain_error_to_problem(&self.0).into_response()
    }
}

pub fn domain_error_to_problem(err: &DomainError) -> Problem {
    match err {
        DomainError::Validation { field, message } => Problem::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Validation error on '{field}': {message}"),
        )
        .with_type("//localhost/error/validation")
        .with_title("Validation Error")
        .with_extension("field", *field),
        DomainError::Store(store) => store_error_to_problem(store),
    }
}

fn store_error_to_problem(err: &StoreError) -> Problem {
    match err {
        StoreError::EntityNotFound { entity_type, id } => {
            Problem::new(StatusCode::NOT_FOUND, err.to_string())
                .with_type("//localhost/error/entity-not-found")
                .with_title("Entity Not Found")
                .with_extension("entity_type", *entity_type)
                .with_extension("id", id.clone())
        }
        StoreError::DuplicateEntity {
            entity_type,
            field,
            value,
        } => Problem::new(StatusCode::CONFLICT, err.to_string())
            .with_type("//localhost/error/duplicate-entity")
            .with_title("Duplicate Entity")
            .with_extension("entity_type", *entity_type)
            .with_extension("field", field.clone())
            .with_extension("value", value.clone()),
        StoreError::ForeignKeyViolation {
            field,
            value,
            referenced_entity,
        } => Problem::new(StatusCode::BAD_REQUEST, err.to_string())
            .with_type("//localhost/error/foreign-key-violation")
            .with_title("Foreign Key Violation")
            .with_extension("field", field.clone())
            .with_extension("value", value.clone())
            .with_extension("referenced_entity", *referenced_entity),
        StoreError::ConcurrentModification { entity_type, id } => {
            Problem::new(StatusCode::CONFLICT, err.to_string())
                .with_type("//localhost/error/concurrent-modification")
                .with_title("Concurrent Modification")
                .with_extension("entity_type", *entity_type)
                .with_extension("id", id.clone())
        }
        StoreError::BadRequest { .. } => Problem::new(StatusCode::BAD_REQUEST, err.to_string())
            .with_type("//localhost/error/bad-request")
            .with_title("Bad Request"),
        StoreError::Conflict { .. } => Problem::new(StatusCode::CONFLICT, err.to_string())
            .with_type("//localhost/error/conflict")
            .with_title("Conflict"),
        StoreError::NoSessionInContext | StoreError::Db(_) => {
            tracing::error!(error = %err, "unhandled storage failure");
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_entity_renders_conflict_with_extensions() {
        let err = DomainError::Store(StoreError::DuplicateEntity {
            entity_type: "Tag",
            field: "name".to_owned(),
            value: "cute".to_owned(),
        });
        let problem = domain_error_to_problem(&err);
        let json = serde_json::to_value(&problem).expect("serialize");
        assert_eq!(json["status"], 409);
        assert_eq!(json["entity_type"], "Tag");
        assert_eq!(json["field"], "name");
        assert_eq!(json["value"], "cute");
    }

    #[test]
    fn backend_failures_are_opaque() {
        let err = DomainError::Store(StoreError::Db(sea_orm::DbErr::Custom(
            "connection refused to db.internal:5432".to_owned(),
        )));
        let problem = domain_error_to_problem(&err);
        let json = serde_json::to_value(&problem).expect("serialize");
        assert_eq!(json["status"], 500);
        assert!(!json["detail"].as_str().unwrap().contains("db.internal"));
    }
}
