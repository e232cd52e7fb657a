//! Fluent assertion facades.

mod json;
mod response;

pub use json::JsonAssert;
pub use response::ResponseAssert;

use hitest_domain::{AssertResult, AssertionError};
use tracing::debug;

/// Fails with the error built by `failure` unless `condition` holds.
pub(crate) fn ensure(
    condition: bool,
    failure: impl FnOnce() -> AssertionError,
) -> AssertResult<()> {
    if condition {
        Ok(())
    } else {
        logged(Err(failure()))
    }
}

/// Passes a result through, recording failures at debug level.
pub(crate) fn logged<T>(result: AssertResult<T>) -> AssertResult<T> {
    result.inspect_err(|error| debug!(%error, "assertion failed"))
}
