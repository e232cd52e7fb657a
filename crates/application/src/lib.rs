//! Hitest Application - fluent assertions and transport ports
//!
//! [`JsonAssert`] and [`ResponseAssert`] hold the assertion surface.
//! [`TestClient`] issues requests through the [`ports::HttpClient`] port and
//! hands each response to a [`ResponseAssert`].

pub mod assertions;
pub mod client;
pub mod error;
pub mod ports;

pub use assertions::{JsonAssert, ResponseAssert};
pub use client::TestClient;
pub use error::{ApplicationError, ApplicationResult};
