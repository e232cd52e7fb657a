//! Hitest Infrastructure - adapters and configuration
//!
//! Concrete implementations of the ports defined in the application layer,
//! plus client configuration and logging setup.

pub mod adapters;
pub mod config;
pub mod logging;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use config::{ClientConfig, ConfigError};
