use petstore_db::repo::Repo;
use petstore_db::{StoreError, current_session, transactional};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::model::{Tag, TagCreate};
use crate::infra::storage::entity::tag;
use crate::infra::storage::repos;

use super::{page_offset, require_non_empty};

#[derive(Debug, Clone, Copy)]
pub struct TagService {
    repo: Repo<tag::Entity>,
}

impl Default for TagService {
    fn default() -> Self {
        Self::new()
    }
}

impl TagService {
    #[must_use]
    pub fn new() -> Self {
        Self { repo: repos::tags() }
    }

    /// # Errors
    /// `DuplicateEntity` when a tag with the same name exists.
    #[instrument(skip_all, fields(name = %payload.name))]
    pub async fn create(&self, payload: TagCreate) -> Result<Tag, DomainError> {
        require_non_empty("name", &payload.name)?;
        let session = current_session()?;
        transactional(&session, || async {
            let created = self
                .repo
                .create(tag::ActiveModel {
                    id: Set(repos::new_id()),
                    name: Set(payload.name.clone()),
                })
                .await?;
            Ok(Tag::from(created))
        })
        .await
    }

    /// # Errors
    /// `EntityNotFound` when absent.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Tag, DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            Ok(Tag::from(self.repo.get_required(id).await?))
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, size: u64) -> Result<(Vec<Tag>, u64), DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            let total = tag::Entity::find()
                .count(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let rows = tag::Entity::find()
                .order_by_asc(tag::Column::Name)
                .offset(page_offset(page, size))
                .limit(size)
                .all(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            Ok((rows.into_iter().map(Tag::from).collect(), total))
        })
        .await
    }

    /// Deleting a tag also unlinks it from every pet via cascade.
    ///
    /// # Errors
    /// `EntityNotFound` when absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let session = current_session()?;
        transactional(&session, || async { Ok(self.repo.delete(id).await?) }).await
    }
}
