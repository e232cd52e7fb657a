//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the assertion core and the outside
//! world. Each port is a trait implemented by an adapter in the
//! infrastructure layer.

mod clock;
mod http_client;

pub use clock::{Clock, FixedClock};
pub use http_client::{HttpClient, HttpClientError};
