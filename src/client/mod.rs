//! Handler of governed API access.
//!
//! This module defines two structs, [`ApiClient`] and
//! [`ApiClientBuilder`]. `ApiClient` carries everything the original
//! call sites need (credentials, routing, the composite limiter, the
//! entity store, the load policy) as one explicit object, so several
//! independently configured clients can coexist in one process.
//! `ApiClientBuilder` exposes a finer level of granularity for building
//! an `ApiClient`.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use http::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use typed_builder::TypedBuilder;
use url::Url;

use crate::policy::{LoadPolicy, PolicyCell};
use crate::ratelimit::{CompositeLimiter, RateLimitConfig};
use crate::store::{Entity, EntityKey, EntityKind, EntityStore, MemoryStore};
use crate::types::{ErrorKind, Region, Result};

/// Default number of transparent retries after a quota rejection, 3.
pub const DEFAULT_MAX_QUOTA_RETRIES: u32 = 3;
/// Default timeout per request, 20s.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
/// Grace added on top of the server-supplied retry delay, 1s.
const RETRY_AFTER_GRACE: Duration = Duration::from_secs(1);
/// Header carrying the API key on every request.
const API_KEY_HEADER: &str = "X-Riot-Token";
/// Default user agent, `riftgate-<PKG_VERSION>`.
const DEFAULT_USER_AGENT: &str = concat!("riftgate/", env!("CARGO_PKG_VERSION"));

/// Builder for [`ApiClient`].
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
pub struct ApiClientBuilder {
    /// API key authorizing every request.
    ///
    /// Calls fail fast with a configuration error while this is unset;
    /// no request is attempted.
    api_key: Option<SecretString>,

    /// Platform region requests are routed to.
    ///
    /// Calls fail fast with a configuration error while this is unset.
    region: Option<Region>,

    /// Quota windows enforced on every outbound call.
    ///
    /// Defaults to the development-key windows; production keys should
    /// load their own numbers.
    rate_limits: RateLimitConfig,

    /// Initial eager/lazy reference resolution policy.
    load_policy: LoadPolicy,

    /// Maximum number of transparent retries after the server rejects a
    /// call for quota reasons.
    #[builder(default = DEFAULT_MAX_QUOTA_RETRIES)]
    max_quota_retries: u32,

    /// Response timeout per request.
    timeout: Option<Duration>,

    /// Routing override sending every request to this base URL instead
    /// of the region's platform host. Useful for proxies and tests.
    base_url: Option<Url>,
}

impl Default for ApiClientBuilder {
    #[must_use]
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ApiClientBuilder {
    /// Instantiates an [`ApiClient`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the underlying HTTP transport cannot be
    /// configured.
    pub fn client(self) -> Result<ApiClient> {
        let remote = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(ApiClient {
            api_key: self.api_key,
            region: self.region,
            base_url: self.base_url,
            limiter: CompositeLimiter::from_config(&self.rate_limits),
            store: Arc::new(MemoryStore::new()),
            policy: Arc::new(PolicyCell::new(self.load_policy)),
            max_quota_retries: self.max_quota_retries,
            remote,
        })
    }
}

/// Governed access to the remote API.
///
/// Every call is admitted through the composite limiter before it is
/// sent, quota rejections are retried transparently within a bounded
/// budget, and fetched entities are stored for later lookups.
#[derive(Debug, Clone)]
pub struct ApiClient {
    api_key: Option<SecretString>,
    region: Option<Region>,
    base_url: Option<Url>,
    limiter: CompositeLimiter,
    store: Arc<dyn EntityStore>,
    policy: Arc<PolicyCell>,
    max_quota_retries: u32,
    remote: reqwest::Client,
}

impl ApiClient {
    /// Swap the entity backend.
    ///
    /// Any store satisfying [`EntityStore`] is treated interchangeably
    /// with the in-memory default.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = store;
        self
    }

    /// GET `path` on the configured platform, returning the decoded
    /// JSON body.
    ///
    /// # Errors
    ///
    /// Configuration errors when key or region are unset, network and
    /// decode errors, [`ErrorKind::NotFound`] on 404,
    /// [`ErrorKind::QuotaExhausted`] when the retry budget is spent,
    /// and [`ErrorKind::RejectedStatusCode`] for any other non-2xx
    /// answer.
    pub async fn execute(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path)?;
        match self.governed_get(&url).await? {
            Some(value) => Ok(value),
            None => Err(ErrorKind::NotFound { url }),
        }
    }

    /// GET `path`, mapping 404 to `None`.
    ///
    /// For lookups where absence is an answer, not a failure, such as
    /// the current game of a summoner who is not in one.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](ApiClient::execute), minus `NotFound`.
    pub async fn execute_optional(&self, path: &str) -> Result<Option<Value>> {
        let url = self.endpoint(path)?;
        self.governed_get(&url).await
    }

    /// Cache-first single-entity fetch.
    ///
    /// A store hit short-circuits; a miss goes through the governed
    /// network path and stores the result under `key` before returning
    /// it. `None` means the remote side answered 404.
    ///
    /// # Errors
    ///
    /// Same as [`execute_optional`](ApiClient::execute_optional), plus
    /// store errors.
    pub async fn fetch_entity(
        &self,
        kind: EntityKind,
        key: EntityKey,
        path: &str,
    ) -> Result<Option<Entity>> {
        if let Some(hit) = self.store.get(kind, &key).await {
            log::debug!("{kind} {key} served from store");
            return Ok(Some(hit));
        }

        match self.execute_optional(path).await? {
            Some(value) => {
                let entity: Entity = Arc::new(value);
                self.store
                    .store(kind, key, Arc::clone(&entity))
                    .await?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Fetch the full extent of `kind`.
    ///
    /// When a previous bulk fetch declared the kind complete, the store
    /// answers without a network call. Otherwise `path` is fetched,
    /// `parse` decomposes the endpoint-shaped body into key/value
    /// pairs (shapes vary by endpoint, so this is the caller's job),
    /// and the batch is stored with the kind's completeness flag set.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](ApiClient::execute), plus store errors.
    pub async fn fetch_all<P>(&self, kind: EntityKind, path: &str, parse: P) -> Result<Vec<Entity>>
    where
        P: FnOnce(Value) -> Vec<(EntityKey, Value)>,
    {
        if self.store.has_all(kind).await {
            log::debug!("full {kind} extent served from store");
            return Ok(self.store.get_all(kind).await);
        }

        let body = self.execute(path).await?;
        let mut keys = Vec::new();
        let mut values: Vec<Entity> = Vec::new();
        for (key, value) in parse(body) {
            keys.push(key);
            values.push(Arc::new(value));
        }
        self.store
            .store_many(kind, keys, values.clone(), &[kind])
            .await?;
        Ok(values)
    }

    /// Current eager/lazy resolution policy.
    #[must_use]
    pub fn load_policy(&self) -> LoadPolicy {
        self.policy.get()
    }

    /// Replace the resolution policy, visible to all threads (and all
    /// clones of this client) immediately.
    pub fn set_load_policy(&self, policy: LoadPolicy) {
        self.policy.set(policy);
    }

    /// The composite limiter governing this client's calls.
    #[must_use]
    pub fn limiter(&self) -> &CompositeLimiter {
        &self.limiter
    }

    /// The entity store consulted by the fetch paths.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Absolute URL for an endpoint path.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let region = self.region.ok_or(ErrorKind::MissingRegion)?;
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => Url::parse(&format!("https://{}/", region.host()))?,
        };
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// The admission-governed GET underneath every call path.
    ///
    /// Quota rejections are handled here and nowhere else: the limiter
    /// is emptied for the server-supplied delay plus a grace second,
    /// then the same logical call is retried, at most
    /// `max_quota_retries` times. Every attempt, also a rejected one,
    /// runs its accounting on the limiter, because the server counted
    /// it too.
    async fn governed_get(&self, url: &Url) -> Result<Option<Value>> {
        let api_key = self.api_key.as_ref().ok_or(ErrorKind::MissingApiKey)?;

        for attempt in 0..=self.max_quota_retries {
            let _admission = self.limiter.wait().await;
            let response = self
                .remote
                .get(url.clone())
                .header(API_KEY_HEADER, api_key.expose_secret())
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let value = response
                    .json::<Value>()
                    .await
                    .map_err(ErrorKind::ReadResponseBody)?;
                return Ok(Some(value));
            }
            match status {
                StatusCode::NOT_FOUND => return Ok(None),
                StatusCode::TOO_MANY_REQUESTS => {
                    let delay = retry_after(response.headers()) + RETRY_AFTER_GRACE;
                    log::warn!(
                        "quota exceeded for {url}, attempt {}/{}; next window in {}s",
                        attempt + 1,
                        self.max_quota_retries + 1,
                        delay.as_secs()
                    );
                    self.limiter.reset_in(delay);
                }
                _ => {
                    return Err(ErrorKind::RejectedStatusCode {
                        status,
                        url: url.clone(),
                    });
                }
            }
        }

        Err(ErrorKind::QuotaExhausted {
            url: url.clone(),
            attempts: self.max_quota_retries + 1,
        })
    }
}

/// Seconds the server asked us to back off, if it said so.
fn retry_after(headers: &http::HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map_or(Duration::ZERO, Duration::from_secs)
}
