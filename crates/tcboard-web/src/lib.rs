pub mod api;
pub mod config;
pub mod error;

pub use api::proxy::{dispatch, Relay};
pub use config::RelayConfig;
pub use error::RelayError;
