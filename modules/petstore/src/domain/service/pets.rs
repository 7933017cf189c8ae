//! Pet operations, including the tag upsert-and-link flow.

use std::collections::HashSet;

use petstore_db::repo::Repo;
use petstore_db::{StoreError, current_session, ensure_foreign_key_exists, transactional};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::model::{Pet, PetCreate, PetUpdate};
use crate::infra::storage::entity::{category, pet, pet_tag, tag, user};
use crate::infra::storage::{mapper, repos};

use super::{page_offset, require_non_empty};

#[derive(Debug, Clone, Copy)]
pub struct PetService {
    pets: Repo<pet::Entity>,
    tags: Repo<tag::Entity>,
}

impl Default for PetService {
    fn default() -> Self {
        Self::new()
    }
}

impl PetService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pets: repos::pets(),
            tags: repos::tags(),
        }
    }

    /// Create a pet, upserting its tags by name and linking them, all in one
    /// transaction.
    ///
    /// # Errors
    /// `Validation` for an empty name or tag, `ForeignKeyViolation` when the
    /// category or owner reference dangles.
    #[instrument(skip_all, fields(name = %payload.name))]
    pub async fn create(&self, payload: PetCreate) -> Result<Pet, DomainError> {
        require_non_empty("name", &payload.name)?;
        let session = current_session()?;
        transactional(&session, || async {
            let tag_ids = self.ensure_tags(&payload.tags).await?;
            if let Some(category_id) = payload.category_id.as_deref() {
                ensure_foreign_key_exists::<category::Entity>(
                    "category_id",
                    category_id,
                    "Category",
                )
                .await?;
            }
            if let Some(owner_id) = payload.owner_id.as_deref() {
                ensure_foreign_key_exists::<user::Entity>("owner_id", owner_id, "User").await?;
            }

            let created = self
                .pets
                .create(pet::ActiveModel {
                    id: Set(repos::new_id()),
                    name: Set(payload.name.clone()),
                    category_id: Set(payload.category_id.clone()),
                    status: Set(payload.status.as_str().to_owned()),
                    photo_urls: Set(mapper::encode_photo_urls(&payload.photo_urls)),
                    owner_id: Set(payload.owner_id.clone()),
                })
                .await?;
            self.replace_tag_links(&created.id, &tag_ids, false).await?;
            self.load(&created.id).await
        })
        .await
    }

    /// # Errors
    /// `EntityNotFound` when the pet does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Pet, DomainError> {
        let session = current_session()?;
        transactional(&session, || self.load(id)).await
    }

    /// List one page of pets ordered by id; returns the page and the total
    /// row count.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, size: u64) -> Result<(Vec<Pet>, u64), DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            let total = pet::Entity::find()
                .count(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let rows = pet::Entity::find()
                .order_by_asc(pet::Column::Id)
                .offset(page_offset(page, size))
                .limit(size)
                .all(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                items.push(self.load(&row.id).await?);
            }
            Ok((items, total))
        })
        .await
    }

    /// Apply a partial update. `tags`, when present, replaces the whole tag
    /// set; nullable references are cleared when the payload carries an
    /// explicit `null`.
    ///
    /// # Errors
    /// Same taxonomy as [`PetService::create`], plus `EntityNotFound` for an
    /// unknown id.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: PetUpdate) -> Result<Pet, DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            let existing = self.pets.get_required(id).await?;
            let mut active = existing.into_active_model();

            if let Some(name) = &update.name {
                require_non_empty("name", name)?;
                active.name = Set(name.clone());
            }
            if let Some(category_id) = &update.category_id {
                if let Some(cid) = category_id.as_deref() {
                    ensure_foreign_key_exists::<category::Entity>("category_id", cid, "Category")
                        .await?;
                }
                active.category_id = Set(category_id.clone());
            }
            if let Some(status) = update.status {
                active.status = Set(status.as_str().to_owned());
            }
            if let Some(photo_urls) = &update.photo_urls {
                active.photo_urls = Set(mapper::encode_photo_urls(photo_urls));
            }
            if let Some(owner_id) = &update.owner_id {
                if let Some(oid) = owner_id.as_deref() {
                    ensure_foreign_key_exists::<user::Entity>("owner_id", oid, "User").await?;
                }
                active.owner_id = Set(owner_id.clone());
            }

            if active.is_changed() {
                active
                    .update(session.as_ref())
                    .await
                    .map_err(StoreError::from)?;
            }

            if let Some(tag_names) = &update.tags {
                let tag_ids = self.ensure_tags(tag_names).await?;
                self.replace_tag_links(id, &tag_ids, true).await?;
            }

            self.load(id).await
        })
        .await
    }

    /// Delete a pet; association rows go with it via cascade.
    ///
    /// # Errors
    /// `EntityNotFound` when the pet does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let session = current_session()?;
        transactional(&session, || async { Ok(self.pets.delete(id).await?) }).await
    }

    /// Resolve tag names to ids, creating missing tags. Duplicate names in
    /// the input collapse to one link.
    async fn ensure_tags(&self, names: &[String]) -> Result<Vec<String>, DomainError> {
        let session = current_session()?;
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            require_non_empty("tags", name)?;
            if !seen.insert(name.to_owned()) {
                continue;
            }
            let existing = tag::Entity::find()
                .filter(tag::Column::Name.eq(name))
                .one(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let id = match existing {
                Some(row) => row.id,
                None => {
                    self.tags
                        .create(tag::ActiveModel {
                            id: Set(repos::new_id()),
                            name: Set(name.to_owned()),
                        })
                        .await?
                        .id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    async fn replace_tag_links(
        &self,
        pet_id: &str,
        tag_ids: &[String],
        clear_existing: bool,
    ) -> Result<(), DomainError> {
        let session = current_session()?;
        if clear_existing {
            pet_tag::Entity::delete_many()
                .filter(pet_tag::Column::PetId.eq(pet_id))
                .exec(session.as_ref())
                .await
                .map_err(StoreError::from)?;
        }
        for tag_id in tag_ids {
            pet_tag::Entity::insert(pet_tag::ActiveModel {
                pet_id: Set(pet_id.to_owned()),
                tag_id: Set(tag_id.clone()),
            })
            .exec_without_returning(session.as_ref())
            .await
            .map_err(StoreError::from)?;
        }
        Ok(())
    }

    /// Assemble the full pet view: row, category, owner and tags (sorted by
    /// name for stable output).
    async fn load(&self, id: &str) -> Result<Pet, DomainError> {
        let session = current_session()?;
        let model = self.pets.get_required(id).await?;
        let category = match model.category_id.as_deref() {
            Some(cid) => category::Entity::find_by_id(cid.to_owned())
                .one(session.as_ref())
                .await
                .map_err(StoreError::from)?,
            None => None,
        };
        let owner = match model.owner_id.as_deref() {
            Some(oid) => user::Entity::find_by_id(oid.to_owned())
                .one(session.as_ref())
                .await
                .map_err(StoreError::from)?,
            None => None,
        };
        let tags = model
            .find_related(tag::Entity)
            .order_by_asc(tag::Column::Name)
            .all(session.as_ref())
            .await
            .map_err(StoreError::from)?;
        Ok(mapper::pet_view(model, category, owner, tags)?)
    }
}
