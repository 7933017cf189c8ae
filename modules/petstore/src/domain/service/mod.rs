//! Domain services.
//!
//! Every operation resolves the current session from task-local context and
//! runs inside a `transactional` scope, so multi-step writes commit or roll
//! back as a unit regardless of which handler invoked them.

mod categories;
mod orders;
mod pets;
mod tags;
mod users;

pub use categories::CategoryService;
pub use orders::OrderService;
pub use pets::PetService;
pub use tags::TagService;
pub use users::UserService;

use super::error::DomainError;

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation {
            field,
            message: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

/// Offset for a 1-based page window. Saturates so an absurdly large page
/// lands past the end of the table and yields an empty window. Capped at
/// `i64::MAX` because the offset is bound as a signed 64-bit parameter.
pub(crate) fn page_offset(page: u64, size: u64) -> u64 {
    page.saturating_sub(1)
        .saturating_mul(size)
        .min(i64::MAX as u64)
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn page_offset_windows() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
    }

    #[test]
    fn page_offset_saturates_instead_of_overflowing() {
        assert_eq!(page_offset(u64::MAX, 100), i64::MAX as u64);
        assert_eq!(page_offset(u64::MAX, u64::MAX), i64::MAX as u64);
    }
}
