//! Lepestok Core - Shared types library.
//!
//! This crate provides common types used across all Lepestok components:
//! - `storefront` - Telegram Mini App backend (catalog, cart, checkout)
//! - `admin` - Administration panel (products, users, admin allow-list)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, order statuses, Telegram identity, and
//!   the catalog/order/user data model records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
