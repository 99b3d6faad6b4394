//! Request middleware and extractors.

pub mod auth;

pub use auth::{INIT_DATA_HEADER, TelegramAuth};
