pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod repos;
