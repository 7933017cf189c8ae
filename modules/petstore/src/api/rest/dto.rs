//! Shared wire types for list and delete endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

use super::error::ApiError;

pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl ListQuery {
    /// # Errors
    /// Rejects `page < 1` and `size` outside `1..=100`.
    pub fn validate(self) -> Result<Self, ApiError> {
        if self.page < 1 {
            return Err(DomainError::Validation {
                field: "page",
                message: "must be at least 1".to_owned(),
            }
            .into());
        }
        if self.size < 1 || self.size > MAX_PAGE_SIZE {
            return Err(DomainError::Validation {
                field: "size",
                message: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            }
            .into());
        }
        Ok(self)
    }
}

fn default_page() -> u64 {
    1
}

fn default_size() -> u64 {
    10
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: ListQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            size: query.size,
        }
    }
}

/// `{}` body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_bounds() {
        assert!(ListQuery { page: 0, size: 10 }.validate().is_err());
        assert!(ListQuery { page: 1, size: 0 }.validate().is_err());
        assert!(ListQuery { page: 1, size: 101 }.validate().is_err());
        assert!(ListQuery { page: 7, size: 100 }.validate().is_ok());
    }

    #[test]
    fn list_query_defaults() {
        let q: ListQuery = serde_json::from_str("{}").expect("parse");
        assert_eq!(q.page, 1);
        assert_eq!(q.size, 10);
    }
}
