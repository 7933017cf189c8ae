//! Domain model: API-facing views and write payloads.
//!
//! These types are what handlers serialize; storage rows never leave the
//! infra layer. `User` deliberately has no password field so credentials
//! cannot leak through a response body.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    #[default]
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "pending" => Ok(Self::Pending),
            "sold" => Ok(Self::Sold),
            other => Err(format!("unknown pet status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Placed,
    Approved,
    Delivered,
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Approved => "approved",
            Self::Delivered => "delivered",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "approved" => Ok(Self::Approved),
            "delivered" => Ok(Self::Delivered),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub category: Option<Category>,
    pub status: PetStatus,
    pub photo_urls: Vec<String>,
    pub tags: Vec<Tag>,
    pub owner: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    pub pet_id: String,
    pub user_id: String,
    pub quantity: i32,
    pub ship_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub complete: bool,
}

// ----- write payloads -----

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreate {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetCreate {
    pub name: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub status: PetStatus,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    /// Tag names; unknown names are created on the fly.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Partial update for a pet.
///
/// Nullable references distinguish "leave unchanged" (field absent) from
/// "clear the reference" (field present as `null`) via the double-`Option`
/// shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<PetStatus>,
    #[serde(default)]
    pub photo_urls: Option<Vec<String>>,
    /// Full replacement of the tag set when present.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreate {
    pub pet_id: String,
    pub user_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub ship_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub complete: bool,
}

fn default_quantity() -> i32 {
    1
}

// A bare `Option<Option<T>>` cannot tell `null` apart from an absent field;
// wrapping the inner deserialization restores the distinction.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_update_distinguishes_absent_from_null() {
        let update: PetUpdate = serde_json::from_str(r#"{"name":"Rex"}"#).expect("parse");
        assert_eq!(update.name.as_deref(), Some("Rex"));
        assert_eq!(update.category_id, None);

        let update: PetUpdate =
            serde_json::from_str(r#"{"category_id":null}"#).expect("parse");
        assert_eq!(update.category_id, Some(None));

        let update: PetUpdate =
            serde_json::from_str(r#"{"category_id":"c1"}"#).expect("parse");
        assert_eq!(update.category_id, Some(Some("c1".to_owned())));
    }

    #[test]
    fn pet_status_round_trips_through_strings() {
        assert_eq!("sold".parse::<PetStatus>().unwrap(), PetStatus::Sold);
        assert_eq!(PetStatus::Pending.as_str(), "pending");
        assert!("missing".parse::<PetStatus>().is_err());
    }

    #[test]
    fn pet_create_defaults() {
        let create: PetCreate = serde_json::from_str(r#"{"name":"Maja"}"#).expect("parse");
        assert_eq!(create.status, PetStatus::Available);
        assert!(create.photo_urls.is_empty());
        assert!(create.tags.is_empty());
    }
}
