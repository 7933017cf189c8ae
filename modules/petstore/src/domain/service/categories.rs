use petstore_db::repo::Repo;
use petstore_db::{StoreError, current_session, transactional};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::model::{Category, CategoryCreate};
use crate::infra::storage::entity::category;
use crate::infra::storage::repos;

use super::{page_offset, require_non_empty};

#[derive(Debug, Clone, Copy)]
pub struct CategoryService {
    repo: Repo<category::Entity>,
}

impl Default for CategoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repo: repos::categories(),
        }
    }

    /// # Errors
    /// `DuplicateEntity` when a category with the same name exists.
    #[instrument(skip_all, fields(name = %payload.name))]
    pub async fn create(&self, payload: CategoryCreate) -> Result<Category, DomainError> {
        require_non_empty("name", &payload.name)?;
        let session = current_session()?;
        transactional(&session, || async {
            let created = self
                .repo
                .create(category::ActiveModel {
                    id: Set(repos::new_id()),
                    name: Set(payload.name.clone()),
                })
                .await?;
            Ok(Category::from(created))
        })
        .await
    }

    /// # Errors
    /// `EntityNotFound` when absent.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Category, DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            Ok(Category::from(self.repo.get_required(id).await?))
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, size: u64) -> Result<(Vec<Category>, u64), DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            let total = category::Entity::find()
                .count(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let rows = category::Entity::find()
                .order_by_asc(category::Column::Name)
                .offset(page_offset(page, size))
                .limit(size)
                .all(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            Ok((rows.into_iter().map(Category::from).collect(), total))
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
