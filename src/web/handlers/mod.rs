pub mod admin_catalog;
pub mod admin_orders;
pub mod auth;
pub mod catalog;
pub mod orders;
pub mod pages;
pub mod system;
