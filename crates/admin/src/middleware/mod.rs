//! Request middleware and extractors.

pub mod auth;

pub use auth::{AdminAuth, INIT_DATA_HEADER};
