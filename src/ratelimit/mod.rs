//! Windowed admission control for outbound API calls.
//!
//! The provider enforces quotas as rolling windows ("20 calls per
//! second" and "100 calls per two minutes" on a development key). This
//! module mirrors them client-side so a request is only sent when it
//! would be counted, not rejected:
//!
//! - [`WindowLimiter`]: one quota window with lazy epoch resets
//! - [`CompositeLimiter`]: unanimous admission across several windows
//! - [`Admission`]: RAII token whose drop runs the post-call accounting
//! - [`RateLimitConfig`] / [`WindowSpec`]: serde-loadable window setup

mod composite;
mod config;
mod window;

pub use composite::{Admission, CompositeLimiter};
pub use config::{RateLimitConfig, WindowSpec};
pub use window::WindowLimiter;
