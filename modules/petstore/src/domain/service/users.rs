use petstore_db::repo::Repo;
use petstore_db::{StoreError, current_session, transactional};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::model::{User, UserCreate};
use crate::infra::storage::entity::user;
use crate::infra::storage::repos;

use super::{page_offset, require_non_empty};

#[derive(Debug, Clone, Copy)]
pub struct UserService {
    repo: Repo<user::Entity>,
}

impl Default for UserService {
    fn default() -> Self {
        Self::new()
    }
}

impl UserService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repo: repos::users(),
        }
    }

    /// # Errors
    /// `DuplicateEntity` when the username or email is taken, `Validation`
    /// for an empty username or a malformed email.
    #[instrument(skip_all, fields(username = %payload.username))]
    pub async fn create(&self, payload: UserCreate) -> Result<User, DomainError> {
        require_non_empty("username", &payload.username)?;
        require_non_empty("password", &payload.password)?;
        if !payload.email.contains('@') {
            return Err(DomainError::Validation {
                field: "email",
                message: "not a valid email address".to_owned(),
            });
        }
        let session = current_session()?;
        transactional(&session, || async {
            let created = self
                .repo
                .create(user::ActiveModel {
                    id: Set(repos::new_id()),
                    username: Set(payload.username.clone()),
                    first_name: Set(payload.first_name.clone()),
                    last_name: Set(payload.last_name.clone()),
                    email: Set(payload.email.clone()),
                    password: Set(payload.password.clone()),
                    phone: Set(payload.phone.clone()),
                })
                .await?;
            Ok(User::from(created))
        })
        .await
    }

    /// # Errors
    /// `EntityNotFound` when absent.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<User, DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            Ok(User::from(self.repo.get_required(id).await?))
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, size: u64) -> Result<(Vec<User>, u64), DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            let total = user::Entity::find()
                .count(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let rows = user::Entity::find()
                .order_by_asc(user::Column::Username)
                .offset(page_offset(page, size))
                .limit(size)
                .all(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            Ok((rows.into_iter().map(User::from).collect(), total))
        })
        .await
    }

    /// # Errors
    /// `EntityNotFound` when absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let session = current_session()?;
        transactional(&session, || async { Ok(self.repo.delete(id).await?) }).await
    }
}
