pub mod categories;
pub mod meta;
pub mod orders;
pub mod pets;
pub mod tags;
pub mod users;
