//! Row-to-domain conversions.
//!
//! Status columns are stored as plain strings and photo URLs as a JSON
//! array in a text column; decoding failures mean the row was written
//! outside the application and surface as storage errors.

use petstore_db::StoreError;
use sea_orm::DbErr;

use crate::domain::model::{Category, Order, Pet, Tag, User};

use super::entity::{category, order, pet, tag, user};

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<tag::Model> for Tag {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

// The password column stays behind this boundary.
impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
        }
    }
}

pub fn pet_view(
    model: pet::Model,
    category: Option<category::Model>,
    owner: Option<user::Model>,
    tags: Vec<tag::Model>,
) -> Result<Pet, StoreError> {
    let status = model
        .status
        .parse()
        .map_err(|message| corrupt_row(&model.id, message))?;
    let photo_urls = serde_json::from_str(&model.photo_urls)
        .map_err(|err| corrupt_row(&model.id, format!("bad photo_urls payload: {err}")))?;
    Ok(Pet {
        id: model.id,
        name: model.name,
        category: category.map(Category::from),
        status,
        photo_urls,
        tags: tags.into_iter().map(Tag::from).collect(),
        owner: owner.map(User::from),
    })
}

pub fn order_view(model: order::Model) -> Result<Order, StoreError> {
    let status = model
        .status
        .parse()
        .map_err(|message| corrupt_row(&model.id, message))?;
    Ok(Order {
        id: model.id,
        pet_id: model.pet_id,
        user_id: model.user_id,
        quantity: model.quantity,
        ship_date: model.ship_date,
        status,
        complete: model.complete,
    })
}

pub fn encode_photo_urls(urls: &[String]) -> String {
    serde_json::to_string(urls).unwrap_or_else(|_| "[]".to_owned())
}

fn corrupt_row(id: &str, message: String) -> StoreError {
    StoreError::Db(DbErr::Custom(format!("corrupt row '{id}': {message}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PetStatus;

    fn pet_row(status: &str, photo_urls: &str) -> pet::Model {
        pet::Model {
            id: "p1".to_owned(),
            name: "Maja".to_owned(),
            category_id: None,
            status: status.to_owned(),
            photo_urls: photo_urls.to_owned(),
            owner_id: None,
        }
    }

    #[test]
    fn user_view_never_carries_the_password() {
        let row = user::Model {
            id: "u1".to_owned(),
            username: "ada".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            password: "s3cret".to_owned(),
            phone: None,
        };
        let view = User::from(row);
        let json = serde_json::to_string(&view).expect("serialize");
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn pet_view_decodes_status_and_urls() {
        let pet = pet_view(
            pet_row("pending", r#"["http://img/1"]"#),
            None,
            None,
            vec![],
        )
        .expect("view");
        assert_eq!(pet.status, PetStatus::Pending);
        assert_eq!(pet.photo_urls, vec!["http://img/1".to_owned()]);
    }

    #[test]
    fn pet_view_rejects_rows_written_outside_the_app() {
        assert!(pet_view(pet_row("hibernating", "[]"), None, None, vec![]).is_err());
        assert!(pet_view(pet_row("sold", "not-json"), None, None, vec![]).is_err());
    }
}
