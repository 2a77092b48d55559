pub mod auth;
pub mod cart;
pub mod catalog;
pub mod directory;
pub mod orders;
pub mod products;
pub mod reviews;
