//! Bounded collaborator calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Run `call` for at most `limit`. The inner result is handed back untouched;
/// running out of time becomes the error built by `elapsed`.
pub(crate) async fn within<F>(
    limit: Duration,
    call: F,
    elapsed: impl FnOnce() -> Error,
) -> Result<F::Output>
where
    F: Future,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| elapsed())
}
