//! Repository wiring: per-entity metadata and constructors.
//!
//! The metadata maps unique database columns back to the API field
//! names reported in conflict responses.

use petstore_db::repo::{EntityMeta, Repo};
use uuid::Uuid;

use super::entity::{category, order, pet, tag, user};

pub const CATEGORY_META: EntityMeta = EntityMeta {
    entity_type: "Category",
    unique_fields: &[("name", "name")],
};

pub const TAG_META: EntityMeta = EntityMeta {
    entity_type: "Tag",
    unique_fields: &[("name", "name")],
};

pub const USER_META: EntityMeta = EntityMeta {
    entity_type: "User",
    unique_fields: &[("username", "username"), ("email", "email")],
};

pub const PET_META: EntityMeta = EntityMeta {
    entity_type: "Pet",
    unique_fields: &[],
};

pub const ORDER_META: EntityMeta = EntityMeta {
    entity_type: "Order",
    unique_fields: &[],
};

pub fn categories() -> Repo<category::Entity> {
    Repo::new(CATEGORY_META)
}

pub fn tags() -> Repo<tag::Entity> {
    Repo::new(TAG_META)
}

pub fn users() -> Repo<user::Entity> {
    Repo::new(USER_META)
}

pub fn pets() -> Repo<pet::Entity> {
    Repo::new(PET_META)
}

pub fn orders() -> Repo<order::Entity> {
    Repo::new(ORDER_META)
}

/// Primary keys are freshly generated UUIDv4 strings.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
