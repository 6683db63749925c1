use crate::{Error, Result};
use std::time::Duration;
use tokio::time::timeout;

/// Wraps a future with a timeout, mapping elapsed-time into the crate's error
/// taxonomy. Used by the dispatcher (command execution timeout) and the TCP
/// server (read timeout).
pub async fn with_timeout<F>(duration: Duration, future: F) -> Result<F::Output>
where
    F: std::future::Future,
{
    timeout(duration, future)
        .await
        .map_err(|_| Error::Timeout)
}
