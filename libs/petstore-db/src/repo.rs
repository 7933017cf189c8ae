//! Generic CRUD primitive over one entity type.
//!
//! [`Repo`] is a parametrized engine rather than a base class: per-entity
//! adapters supply an [`EntityMeta`] (table identity plus the
//! constraint-to-field mapping used when classifying integrity errors) and
//! the engine does the rest. Every operation resolves the session through
//! the task-local context, so the same repository value can serve any number
//! of sequential requests.

use std::marker::PhantomData;
use std::str::FromStr;

use sea_orm::{
    ActiveModelTrait, ActiveValue, DbErr, EntityTrait, IntoActiveModel, Iterable,
    PrimaryKeyToColumn, PrimaryKeyTrait, SqlErr, Value,
};
use tracing::instrument;

use crate::context::current_session;
use crate::error::{self, StoreError};

/// Table identity and constraint mapping for one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityMeta {
    /// Entity type name used in error payloads, e.g. `"Tag"`.
    pub entity_type: &'static str,
    /// Uniqueness-constrained columns: DB column name (as it appears in
    /// constraint messages) paired with the API field name.
    pub unique_fields: &'static [(&'static str, &'static str)],
}

impl EntityMeta {
    fn api_field(&self, db_column: &str) -> Option<&'static str> {
        self.unique_fields
            .iter()
            .find(|(column, _)| *column == db_column)
            .map(|(_, field)| *field)
    }
}

/// Generic CRUD repository for entity `E`, using the session currently in
/// context.
#[derive(Debug, Clone, Copy)]
pub struct Repo<E: EntityTrait> {
    meta: EntityMeta,
    _entity: PhantomData<E>,
}

impl<E> Repo<E>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
{
    #[must_use]
    pub fn new(meta: EntityMeta) -> Self {
        Self {
            meta,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn entity_type(&self) -> &'static str {
        self.meta.entity_type
    }

    /// Insert `model` and return the persisted row.
    ///
    /// The caller assigns the identity up front (ids are minted by the
    /// service layer, never by the database), so the insert avoids any
    /// RETURNING/last-insert-id machinery and re-reads the row instead.
    ///
    /// # Errors
    /// Uniqueness violations map to [`StoreError::DuplicateEntity`], foreign
    /// key violations to [`StoreError::ForeignKeyViolation`], any other
    /// constraint failure to [`StoreError::BadRequest`].
    #[instrument(skip(self, model), fields(entity = self.meta.entity_type))]
    pub async fn create<A>(&self, model: A) -> Result<E::Model, StoreError>
    where
        A: ActiveModelTrait<Entity = E> + Clone + Send,
        E::Model: IntoActiveModel<A>,
        E::Column: FromStr,
    {
        let session = current_session()?;
        let id = self
            .primary_key_string(&model)
            .ok_or_else(|| StoreError::BadRequest {
                detail: format!("{} create payload has no id set", self.meta.entity_type),
            })?;

        match E::insert(model.clone())
            .exec_without_returning(session.as_ref())
            .await
        {
            Ok(_) => self.get_required(&id).await,
            Err(err) => Err(self.classify_insert_error(&model, err)),
        }
    }

    /// Fetch by id; `None` when absent. Never errors for "not found".
    ///
    /// # Errors
    /// Only infrastructure failures ([`StoreError::NoSessionInContext`],
    /// [`StoreError::Db`]).
    #[instrument(skip(self), fields(entity = self.meta.entity_type))]
    pub async fn get_optional(&self, id: &str) -> Result<Option<E::Model>, StoreError> {
        let session = current_session()?;
        let found = E::find_by_id(id.to_owned()).one(session.as_ref()).await?;
        Ok(found)
    }

    /// Fetch by id.
    ///
    /// # Errors
    /// Fails with [`StoreError::EntityNotFound`] when the row is absent.
    #[instrument(skip(self), fields(entity = self.meta.entity_type))]
    pub async fn get_required(&self, id: &str) -> Result<E::Model, StoreError> {
        self.get_optional(id)
            .await?
            .ok_or_else(|| StoreError::EntityNotFound {
                entity_type: self.meta.entity_type,
                id: id.to_owned(),
            })
    }

    /// Delete by id.
    ///
    /// # Errors
    /// Fails with [`StoreError::EntityNotFound`] when zero rows are affected
    /// and with [`StoreError::Conflict`] when other rows still reference this
    /// one.
    #[instrument(skip(self), fields(entity = self.meta.entity_type))]
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let session = current_session()?;
        let result = match E::delete_by_id(id.to_owned()).exec(session.as_ref()).await {
            Ok(result) => result,
            Err(err) => {
                return Err(match err.sql_err() {
                    Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::Conflict {
                        detail: format!(
                            "{} '{}' is still referenced by other entities",
                            self.meta.entity_type, id
                        ),
                    },
                    _ => StoreError::Db(err),
                });
            }
        };
        if result.rows_affected == 0 {
            return Err(StoreError::EntityNotFound {
                entity_type: self.meta.entity_type,
                id: id.to_owned(),
            });
        }
        Ok(())
    }

    fn primary_key_string<A>(&self, model: &A) -> Option<String>
    where
        A: ActiveModelTrait<Entity = E>,
    {
        let column = <E::PrimaryKey as Iterable>::iter().next()?.into_column();
        match model.get(column) {
            ActiveValue::Set(value) | ActiveValue::Unchanged(value) => value_string(&value),
            ActiveValue::NotSet => None,
        }
    }

    /// Translate a storage-level integrity error into the domain taxonomy.
    ///
    /// The backend reports only a generic integrity failure with the
    /// constraint named in the message text; the violated column is parsed
    /// out and the attempted value recovered from the rejected model so the
    /// HTTP layer can render a precise problem body.
    fn classify_insert_error<A>(&self, attempted: &A, err: DbErr) -> StoreError
    where
        A: ActiveModelTrait<Entity = E>,
        E::Column: FromStr,
    {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                let column = error::unique_violation_column(&message).map(str::to_owned);
                let field = column.as_deref().map_or_else(
                    || "field".to_owned(),
                    |c| self.meta.api_field(c).unwrap_or(c).to_owned(),
                );
                let value = column
                    .as_deref()
                    .and_then(|c| E::Column::from_str(c).ok())
                    .and_then(|c| match attempted.get(c) {
                        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => value_string(&v),
                        ActiveValue::NotSet => None,
                    })
                    .unwrap_or_else(|| "unknown".to_owned());
                StoreError::DuplicateEntity {
                    entity_type: self.meta.entity_type,
                    field,
                    value,
                }
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::ForeignKeyViolation {
                field: "foreign_key".to_owned(),
                value: "unknown".to_owned(),
                referenced_entity: "unknown",
            },
            Some(_) => StoreError::BadRequest {
                detail: format!("database constraint violation: {err}"),
            },
            None => StoreError::Db(err),
        }
    }
}

/// Pre-validate a foreign key before a dependent write, producing a precise
/// [`StoreError::ForeignKeyViolation`] instead of the opaque constraint
/// failure the backend would raise later.
///
/// # Errors
/// Fails with `ForeignKeyViolation` when the referenced row does not exist.
pub async fn ensure_foreign_key_exists<R>(
    field: &'static str,
    value: &str,
    referenced_entity: &'static str,
) -> Result<(), StoreError>
where
    R: EntityTrait,
    <R::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
{
    let session = current_session()?;
    let found = R::find_by_id(value.to_owned()).one(session.as_ref()).await?;
    if found.is_none() {
        return Err(StoreError::ForeignKeyViolation {
            field: field.to_owned(),
            value: value.to_owned(),
            referenced_entity,
        });
    }
    Ok(())
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(Some(s)) => Some((**s).clone()),
        _ => None,
    }
}

// ===================== tests =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectOpts, DbHandle, Session, with_session};
    use sea_orm::{ConnectionTrait, Set};
    use std::sync::Arc;

    mod widget {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "widgets")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub name: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    const WIDGET_META: EntityMeta = EntityMeta {
        entity_type: "Widget",
        unique_fields: &[("name", "name")],
    };

    async fn handle(name: &str) -> DbHandle {
        let dsn = format!("sqlite:file:{name}?mode=memory&cache=shared");
        let db = DbHandle::connect(&dsn, ConnectOpts::default())
            .await
            .expect("in-memory sqlite");
        db.sea()
            .execute_unprepared(
                "CREATE TABLE IF NOT EXISTS widgets (\
                 id TEXT PRIMARY KEY NOT NULL,\
                 name TEXT NOT NULL);\
                 CREATE UNIQUE INDEX IF NOT EXISTS idx_widgets_name ON widgets(name);",
            )
            .await
            .expect("create table");
        db
    }

    fn widget(id: &str, name: &str) -> widget::ActiveModel {
        widget::ActiveModel {
            id: Set(id.to_owned()),
            name: Set(name.to_owned()),
        }
    }

    #[tokio::test]
    async fn create_then_get_required_roundtrip() {
        let db = handle("repo_roundtrip").await;
        let session = Arc::new(Session::new(db.sea().clone()));
        let repo = Repo::<widget::Entity>::new(WIDGET_META);

        with_session(session, async {
            let created = repo.create(widget("w1", "sprocket")).await.expect("create");
            assert_eq!(created.id, "w1");

            let fetched = repo.get_required("w1").await.expect("get");
            assert_eq!(fetched, created);
        })
        .await;
    }

    #[tokio::test]
    async fn absent_id_behaviour() {
        let db = handle("repo_absent").await;
        let session = Arc::new(Session::new(db.sea().clone()));
        let repo = Repo::<widget::Entity>::new(WIDGET_META);

        with_session(session, async {
            assert!(repo.get_optional("nope").await.expect("optional").is_none());

            match repo.get_required("nope").await {
                Err(StoreError::EntityNotFound { entity_type, id }) => {
                    assert_eq!(entity_type, "Widget");
                    assert_eq!(id, "nope");
                }
                other => panic!("expected EntityNotFound, got {other:?}"),
            }
        })
        .await;
    }

    #[tokio::test]
    async fn duplicate_create_classified_and_first_row_survives() {
        let db = handle("repo_duplicate").await;
        let session = Arc::new(Session::new(db.sea().clone()));
        let repo = Repo::<widget::Entity>::new(WIDGET_META);

        with_session(session, async {
            repo.create(widget("w1", "gear")).await.expect("first create");

            match repo.create(widget("w2", "gear")).await {
                Err(StoreError::DuplicateEntity {
                    entity_type,
                    field,
                    value,
                }) => {
                    assert_eq!(entity_type, "Widget");
                    assert_eq!(field, "name");
                    assert_eq!(value, "gear");
                }
                other => panic!("expected DuplicateEntity, got {other:?}"),
            }

            // The first row is untouched by the failed insert.
            let survivor = repo.get_required("w1").await.expect("survivor");
            assert_eq!(survivor.name, "gear");
        })
        .await;
    }

    #[tokio::test]
    async fn delete_missing_id_fails_without_side_effects() {
        let db = handle("repo_delete_missing").await;
        let session = Arc::new(Session::new(db.sea().clone()));
        let repo = Repo::<widget::Entity>::new(WIDGET_META);

        with_session(session, async {
            repo.create(widget("w1", "cog")).await.expect("create");

            assert!(matches!(
                repo.delete("ghost").await,
                Err(StoreError::EntityNotFound { .. })
            ));
            assert!(repo.get_optional("w1").await.expect("still there").is_some());

            repo.delete("w1").await.expect("delete existing");
            assert!(repo.get_optional("w1").await.expect("gone").is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn repo_outside_session_scope_is_a_wiring_bug() {
        let repo = Repo::<widget::Entity>::new(WIDGET_META);
        assert!(matches!(
            repo.get_optional("w1").await,
            Err(StoreError::NoSessionInContext)
        ));
    }

    #[tokio::test]
    async fn foreign_key_precheck() {
        let db = handle("repo_fk").await;
        let session = Arc::new(Session::new(db.sea().clone()));
        let repo = Repo::<widget::Entity>::new(WIDGET_META);

        with_session(session, async {
            repo.create(widget("w1", "axle")).await.expect("create");

            ensure_foreign_key_exists::<widget::Entity>("widget_id", "w1", "Widget")
                .await
                .expect("existing fk passes");

            match ensure_foreign_key_exists::<widget::Entity>("widget_id", "w9", "Widget").await {
                Err(StoreError::ForeignKeyViolation {
                    field,
                    value,
                    referenced_entity,
                }) => {
                    assert_eq!(field, "widget_id");
                    assert_eq!(value, "w9");
                    assert_eq!(referenced_entity, "Widget");
                }
                other => panic!("expected ForeignKeyViolation, got {other:?}"),
            }
        })
        .await;
    }
}
