//! External service clients.

pub mod salebot;

pub use salebot::{NotifyError, NotifyResponse, OrderNotifier, SalebotClient};
