pub mod dto;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod routes;
