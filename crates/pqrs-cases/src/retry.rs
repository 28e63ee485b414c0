// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outer retry for writes that lose their session mid-flight.
//!
//! The gateway already renews a rejected session once per call. When that is
//! not enough, [`retry_on_auth_expiry`] repeats the whole write with
//! exponential backoff, dropping the session before every new attempt.

use std::future::Future;
use std::time::Duration;

use pqrs_config::model::RetryConfig;
use pqrs_core::{PqrsError, RecordGateway};
use tracing::{error, warn};

/// Exponential backoff: `min(base * 2^(n-1), cap)` before retry `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: Duration::from_millis(config.base_delay_ms),
            cap: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry` (1-based). Saturates instead of overflowing.
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent).min(self.cap)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Runs `attempt` until it succeeds, fails with a non-auth error, or the
/// attempts run out. Exhaustion is reported as [`PqrsError::SessionExpired`].
pub async fn retry_on_auth_expiry<T, F, Fut>(
    backoff: Backoff,
    gateway: &dyn RecordGateway,
    mut attempt: F,
) -> Result<T, PqrsError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PqrsError>>,
{
    let attempts = backoff.max_attempts();
    let mut number = 1;

    loop {
        match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_auth_expiry() && number < attempts => {
                let delay = backoff.delay(number);
                warn!(
                    attempt = number,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "authorization lost during write, retrying"
                );
                gateway.invalidate_session();
                tokio::time::sleep(delay).await;
                number += 1;
            }
            Err(err) if err.is_auth_expiry() => {
                error!(attempts, "authorization lost on every write attempt");
                return Err(PqrsError::SessionExpired);
            }
            Err(err) => return Err(err),
        }
    }
}
