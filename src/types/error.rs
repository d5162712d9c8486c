use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Possible errors when talking to the remote API through `riftgate`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No API key was configured before a governed call was attempted.
    /// Fatal to the attempted call; never retried.
    #[error("API key not set. Configure one on the client before issuing requests")]
    MissingApiKey,

    /// No region was configured before a governed call was attempted.
    /// Fatal to the attempted call; never retried.
    #[error("Region not set. Configure one on the client before issuing requests")]
    MissingRegion,

    /// The server answered 429 on every allowed attempt. The transparent
    /// retry budget is spent; the caller decides what happens next.
    #[error("Quota for {url} still exhausted after {attempts} attempts")]
    QuotaExhausted {
        /// The request that kept being rejected
        url: Url,
        /// Total attempts made, including the first one
        attempts: u32,
    },

    /// The server answered 404 on a path where the entity was required.
    /// Optional lookups map 404 to `None` instead of this error.
    #[error("No such entity at {url}")]
    NotFound {
        /// The request that came back empty
        url: Url,
    },

    /// Any non-2xx response other than the transparently handled 429.
    /// Not retried by this layer.
    #[error("Request to {url} rejected with status code: {status}")]
    RejectedStatusCode {
        /// Status code the server answered with
        status: StatusCode,
        /// The rejected request
        url: Url,
    },

    /// Network error while trying to reach the API endpoint.
    #[error("Network error while contacting the API")]
    NetworkRequest(#[from] reqwest::Error),

    /// The response arrived but its body could not be decoded as JSON.
    #[error("Failed to decode response body: {0}")]
    ReadResponseBody(reqwest::Error),

    /// A bulk store was handed key and value lists of different lengths.
    /// Nothing is written when this is returned.
    #[error("Batch length mismatch: {keys} keys for {values} values")]
    BatchLengthMismatch {
        /// Number of keys supplied
        keys: usize,
        /// Number of values supplied
        values: usize,
    },

    /// An endpoint path could not be turned into a valid URL.
    #[error("Cannot parse URL: {0}")]
    UrlParse(#[from] url::ParseError),
}
