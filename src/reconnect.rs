//! Opt-in reconnection policy.
//!
//! Sessions never reconnect on their own. Callers that want it pass a
//! [`ReconnectPolicy`] to [`Session::reconnect`](crate::Session::reconnect);
//! the script engine does so before a command when the link has dropped.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum ReconnectPolicy {
    #[default]
    Disabled,
    Backoff {
        #[serde(default = "default_initial_ms")]
        initial_ms: u64,
        #[serde(default = "default_max_ms")]
        max_ms: u64,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

fn default_initial_ms() -> u64 {
    1000
}

fn default_max_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    5
}

impl ReconnectPolicy {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ReconnectPolicy::Disabled)
    }

    /// Upper bound on the delay before attempt `attempt` (zero-based), or
    /// `None` once attempts are exhausted.
    pub fn ceiling(&self, attempt: u32) -> Option<Duration> {
        match *self {
            ReconnectPolicy::Disabled => None,
            ReconnectPolicy::Backoff {
                initial_ms,
                max_ms,
                max_attempts,
            } => {
                if attempt >= max_attempts {
                    return None;
                }
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                Some(Duration::from_millis(
                    initial_ms.saturating_mul(factor).min(max_ms),
                ))
            }
        }
    }

    /// Delay before attempt `attempt`: the ceiling with up to a quarter of
    /// random jitter taken off.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        let ceiling = self.ceiling(attempt)?;
        let ms = ceiling.as_millis() as u64;
        let jitter = {
            let mut rng = rand::thread_rng();
            rng.gen_range(0..=ms / 4)
        };
        Some(Duration::from_millis(ms - jitter))
    }
}
