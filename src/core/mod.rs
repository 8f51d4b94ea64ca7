//! Domain types for the storefront
//!
//! Everything here is storage- and transport-agnostic: catalog and order
//! types, their validation rules, order filtering, WhatsApp message
//! templates, CSV export and the page translation table.

pub mod catalog;
pub mod error;
pub mod export;
pub mod filter;
pub mod i18n;
pub mod order;
pub mod whatsapp;
