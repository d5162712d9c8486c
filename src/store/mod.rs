//! Entity storage consulted before the network and written after it.
//!
//! The storage contract is deliberately small: point lookups, batch
//! lookups that preserve input order, single and bulk writes, and a
//! per-kind completeness flag recording that the full extent of a kind
//! has been fetched. The in-memory [`MemoryStore`] is the default
//! backend; anything else satisfying [`EntityStore`] (a SQL table, a
//! directory of JSON files) can be swapped in through the client
//! builder and is treated interchangeably.

mod kind;
mod memory;

pub use kind::{EntityKey, EntityKind};
pub use memory::{MemoryStore, StoreStats};

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::Result;

/// Entity payload as delivered by the remote API.
///
/// The governance layer is shape-agnostic; decoding a payload into a
/// concrete model type is the caller's business.
pub type Entity = Arc<serde_json::Value>;

/// Backend contract for entity storage.
///
/// All operations are safe for concurrent invocation. Lookups never
/// error: a missing entity is `None`, not a failure. A bulk write must
/// appear atomic to readers of the same kind; nobody observes half of a
/// [`store_many`](EntityStore::store_many) batch.
#[async_trait]
pub trait EntityStore: Debug + Send + Sync {
    /// Look up one entity.
    async fn get(&self, kind: EntityKind, key: &EntityKey) -> Option<Entity>;

    /// Look up a batch of entities.
    ///
    /// The result has the same length and order as `keys`, with `None`
    /// at every position whose key is not stored.
    async fn get_many(&self, kind: EntityKind, keys: &[EntityKey]) -> Vec<Option<Entity>>;

    /// Insert or overwrite one entity. Never touches completeness
    /// flags.
    async fn store(&self, kind: EntityKind, key: EntityKey, value: Entity) -> Result<()>;

    /// Insert or overwrite a batch of entities.
    ///
    /// `complete_kinds` names the kinds whose completeness flag this
    /// bulk write establishes, typically `&[kind]` right after fetching
    /// the full extent of a kind.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::BatchLengthMismatch`](crate::ErrorKind::BatchLengthMismatch)
    /// when `keys` and `values` differ in length; nothing is written in
    /// that case.
    async fn store_many(
        &self,
        kind: EntityKind,
        keys: Vec<EntityKey>,
        values: Vec<Entity>,
        complete_kinds: &[EntityKind],
    ) -> Result<()>;

    /// Whether every instance of `kind` that exists upstream is stored
    /// here.
    async fn has_all(&self, kind: EntityKind) -> bool;

    /// Every stored entity of `kind`, in no particular order.
    ///
    /// The store does not verify completeness before answering; callers
    /// pair this with [`has_all`](EntityStore::has_all).
    async fn get_all(&self, kind: EntityKind) -> Vec<Entity>;
}
