//! Bounded immediate retry.

use std::fmt::Display;
use std::future::Future;

use tracing::{info, warn};

/// Run `op` up to `attempts` times, retrying immediately while `is_retryable`
/// accepts the error.
///
/// `op` receives the 1-based attempt number. The last error is returned once
/// attempts are exhausted or a non-retryable error occurs. An `attempts` of
/// zero is treated as one.
pub async fn retry<T, E, Op, Fut, P>(attempts: u32, is_retryable: P, mut op: Op) -> Result<T, E>
where
  Op: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, E>>,
  P: Fn(&E) -> bool,
  E: Display,
{
  let attempts = attempts.max(1);
  let mut attempt = 1;

  loop {
    match op(attempt).await {
      Ok(value) => {
        if attempt > 1 {
          info!(attempt, attempts, "succeeded after retry");
        }
        return Ok(value);
      }
      Err(error) if attempt < attempts && is_retryable(&error) => {
        warn!(attempt, attempts, error = %error, "attempt failed, retrying");
        attempt += 1;
      }
      Err(error) => return Err(error),
    }
  }
}
