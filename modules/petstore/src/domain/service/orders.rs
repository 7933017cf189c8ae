use petstore_db::repo::Repo;
use petstore_db::{StoreError, current_session, ensure_foreign_key_exists, transactional};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::model::{Order, OrderCreate};
use crate::infra::storage::entity::{order, pet, user};
use crate::infra::storage::{mapper, repos};

use super::page_offset;

#[derive(Debug, Clone, Copy)]
pub struct OrderService {
    repo: Repo<order::Entity>,
}

impl Default for OrderService {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repo: repos::orders(),
        }
    }

    /// # Errors
    /// `Validation` for a non-positive quantity, `ForeignKeyViolation` when
    /// the pet or user reference dangles.
    #[instrument(skip_all, fields(pet_id = %payload.pet_id))]
    pub async fn create(&self, payload: OrderCreate) -> Result<Order, DomainError> {
        if payload.quantity < 1 {
            return Err(DomainError::Validation {
                field: "quantity",
                message: "must be at least 1".to_owned(),
            });
        }
        let session = current_session()?;
        transactional(&session, || async {
            ensure_foreign_key_exists::<pet::Entity>("pet_id", &payload.pet_id, "Pet").await?;
            ensure_foreign_key_exists::<user::Entity>("user_id", &payload.user_id, "User").await?;
            let created = self
                .repo
                .create(order::ActiveModel {
                    id: Set(repos::new_id()),
                    pet_id: Set(payload.pet_id.clone()),
                    user_id: Set(payload.user_id.clone()),
                    quantity: Set(payload.quantity),
                    ship_date: Set(payload.ship_date),
                    status: Set(payload.status.as_str().to_owned()),
                    complete: Set(payload.complete),
                })
                .await?;
            Ok(mapper::order_view(created)?)
        })
        .await
    }

    /// # Errors
    /// `EntityNotFound` when absent.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Order, DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            Ok(mapper::order_view(self.repo.get_required(id).await?)?)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, size: u64) -> Result<(Vec<Order>, u64), DomainError> {
        let session = current_session()?;
        transactional(&session, || async {
            let total = order::Entity::find()
                .count(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let rows = order::Entity::find()
                .order_by_asc(order::Column::Id)
                .offset(page_offset(page, size))
                .limit(size)
                .all(session.as_ref())
                .await
                .map_err(StoreError::from)?;
            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                items.push(mapper::order_view(row)?);
            }
            Ok((items, total))
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
