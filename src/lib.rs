//! `riftgate` is the request-governance core for a Riot API client:
//! windowed rate limiting, an entity store with completeness tracking,
//! and chunk-aware batch dispatch. It admits outbound calls without
//! tripping provider quotas, avoids redundant network calls, and splits
//! oversized batch requests into provider-accepted chunks.
//!
//! ```no_run
//! use riftgate::{ApiClientBuilder, Region, Result};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ApiClientBuilder::builder()
//!         .api_key(SecretString::from("RGAPI-..."))
//!         .region(Region::Euw)
//!         .build()
//!         .client()?;
//!     let summoner = client.execute("/lol/summoner/v4/summoners/by-name/Faker").await?;
//!     println!("{summoner}");
//!     Ok(())
//! }
//! ```
//!
//! The limiter, store, and chunking pieces also stand alone; see
//! [`ratelimit`], [`store`], and [`chunk`].
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chunk;
mod client;
pub mod policy;
pub mod ratelimit;
pub mod store;
mod types;

pub use chunk::{Chunked, call_chunked};
pub use client::{ApiClient, ApiClientBuilder, DEFAULT_MAX_QUOTA_RETRIES};
pub use policy::{LoadPolicy, PolicyCell};
pub use ratelimit::{Admission, CompositeLimiter, RateLimitConfig, WindowLimiter, WindowSpec};
pub use store::{Entity, EntityKey, EntityKind, EntityStore, MemoryStore, StoreStats};
pub use types::{ErrorKind, Region, Result};
