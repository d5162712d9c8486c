//! Chunk-aware dispatch for batch endpoints.
//!
//! Several endpoints take a list argument but cap how many items one
//! physical request may carry. [`call_chunked`] fans a logical call out
//! over as many physical calls as the cap requires and keeps the
//! per-chunk results separate. Result shapes vary by endpoint, so
//! merging them back into one structure is the caller's job.

use std::future::Future;

use crate::types::Result;

/// Result of a chunk-aware call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunked<R> {
    /// The input fit the provider cap; the single result, unmodified.
    Single(R),
    /// One result per chunk, in call order.
    PerChunk(Vec<R>),
}

impl<R> Chunked<R> {
    /// Number of physical calls this outcome took.
    #[must_use]
    pub fn calls(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::PerChunk(results) => results.len(),
        }
    }

    /// The single result, if the input was not chunked.
    pub fn into_single(self) -> Option<R> {
        match self {
            Self::Single(result) => Some(result),
            Self::PerChunk(_) => None,
        }
    }
}

/// Call `f` once if `items` fits within `max_chunk_size`, otherwise
/// once per consecutive chunk of at most `max_chunk_size` items, in
/// ascending order. The last chunk may be shorter. Chunk boundaries and
/// call order are deterministic for a given input.
///
/// `f` is expected to be a rate-governed remote call; chunking never
/// bypasses admission, so `n` items at chunk size `k` consume
/// `n.div_ceil(k)` quota-governed calls. A failing chunk call aborts
/// the remaining chunks and propagates its error.
///
/// # Panics
///
/// Panics if `max_chunk_size` is zero.
///
/// # Errors
///
/// Whatever `f` returns for the failing chunk.
pub async fn call_chunked<T, R, F, Fut>(
    mut f: F,
    max_chunk_size: usize,
    items: &[T],
) -> Result<Chunked<R>>
where
    T: Clone,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    assert!(max_chunk_size > 0, "chunk size must be positive");

    if items.len() <= max_chunk_size {
        return Ok(Chunked::Single(f(items.to_vec()).await?));
    }

    let mut results = Vec::with_capacity(items.len().div_ceil(max_chunk_size));
    for chunk in items.chunks(max_chunk_size) {
        results.push(f(chunk.to_vec()).await?);
    }
    Ok(Chunked::PerChunk(results))
}
