//! Hitest Domain - response assertion types and the JSON comparison engine
//!
//! Everything here is pure: values go in, verdicts come out. Transport and
//! time are supplied by the outer layers.

pub mod cookie;
pub mod error;
pub mod json;
pub mod request;
pub mod response;

pub use cookie::{Cookie, CookieJar, SameSite};
pub use error::{AssertResult, AssertionError, DomainError, DomainResult};
pub use json::{JsonPath, StructureNode, StructureSpec};
pub use request::{Header, Headers, HttpMethod, RequestSpec};
pub use response::{ContentDisposition, ResponseMetadata, StatusCode};
