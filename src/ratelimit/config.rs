use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default burst window: 20 calls per second (development key).
const DEFAULT_BURST: WindowSpec = WindowSpec::new(20, Duration::from_secs(1));

/// Default sustained window: 100 calls per two minutes (development key).
const DEFAULT_SUSTAINED: WindowSpec = WindowSpec::new(100, Duration::from_secs(120));

/// One quota window: at most `capacity` calls per `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowSpec {
    /// Calls admitted per epoch
    pub capacity: u32,

    /// Length of one epoch
    #[serde(with = "humantime_serde")]
    pub epoch: Duration,
}

impl WindowSpec {
    /// Create a window spec admitting `capacity` calls per `epoch`.
    #[must_use]
    pub const fn new(capacity: u32, epoch: Duration) -> Self {
        Self { capacity, epoch }
    }
}

/// Quota windows enforced simultaneously on every outbound call.
///
/// The defaults match the limits attached to a fresh development key: a
/// short burst window and a long sustained window. Production keys come
/// with their own numbers; load them from configuration instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Windows checked in order on every admission
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowSpec>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
        }
    }
}

/// Development-key windows
fn default_windows() -> Vec<WindowSpec> {
    vec![DEFAULT_BURST, DEFAULT_SUSTAINED]
}

impl RateLimitConfig {
    /// Create a config with a single window.
    #[must_use]
    pub fn single(capacity: u32, epoch: Duration) -> Self {
        Self {
            windows: vec![WindowSpec::new(capacity, epoch)],
        }
    }
}
