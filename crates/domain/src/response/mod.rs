//! Received response types.

mod disposition;
mod metadata;
mod status;

pub use disposition::ContentDisposition;
pub use metadata::{
    PRECOGNITION_SUCCESS_HEADER, REDIRECT_HISTORY_HEADER, REDIRECT_STATUS_HISTORY_HEADER,
    ResponseMetadata,
};
pub use status::{REDIRECT_CODES, StatusCode};
