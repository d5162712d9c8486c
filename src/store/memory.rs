use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use super::{Entity, EntityKey, EntityKind, EntityStore};
use crate::types::{ErrorKind, Result};

/// In-memory entity store.
///
/// Entries are partitioned by [`EntityKind`]: the outer `DashMap` is
/// keyed by kind and each partition is a plain `HashMap` behind the
/// shard guard, so a bulk write to one kind holds that partition's
/// write lock for the whole batch and readers never observe it half
/// done. Entries live until the process ends; eviction is an external
/// concern.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: DashMap<EntityKind, HashMap<EntityKey, Entity>>,
    complete: DashSet<EntityKind>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Lookup counters for a [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

impl StoreStats {
    /// Fraction of lookups answered from the store. 1.0 when no lookup
    /// happened yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.hits as f64 / total as f64;
        rate
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup counters since construction.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of stored entries of `kind`.
    #[must_use]
    pub fn len_of(&self, kind: EntityKind) -> usize {
        self.partitions.get(&kind).map_or(0, |p| p.len())
    }

    fn record(&self, found: bool) {
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, kind: EntityKind, key: &EntityKey) -> Option<Entity> {
        let value = self
            .partitions
            .get(&kind)
            .and_then(|partition| partition.get(key).cloned());
        self.record(value.is_some());
        value
    }

    async fn get_many(&self, kind: EntityKind, keys: &[EntityKey]) -> Vec<Option<Entity>> {
        let values = match self.partitions.get(&kind) {
            Some(partition) => keys
                .iter()
                .map(|key| partition.get(key).cloned())
                .collect(),
            None => vec![None; keys.len()],
        };
        for value in &values {
            self.record(value.is_some());
        }
        values
    }

    async fn store(&self, kind: EntityKind, key: EntityKey, value: Entity) -> Result<()> {
        self.partitions.entry(kind).or_default().insert(key, value);
        Ok(())
    }

    async fn store_many(
        &self,
        kind: EntityKind,
        keys: Vec<EntityKey>,
        values: Vec<Entity>,
        complete_kinds: &[EntityKind],
    ) -> Result<()> {
        if keys.len() != values.len() {
            return Err(ErrorKind::BatchLengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }

        // The entry guard keeps the partition's shard write-locked for
        // the whole batch, so concurrent readers of this kind see
        // either none of it or all of it.
        let mut partition = self.partitions.entry(kind).or_default();
        for (key, value) in keys.into_iter().zip(values) {
            partition.insert(key, value);
        }
        for complete in complete_kinds {
            self.complete.insert(*complete);
        }
        drop(partition);

        Ok(())
    }

    async fn has_all(&self, kind: EntityKind) -> bool {
        self.complete.contains(&kind)
    }

    async fn get_all(&self, kind: EntityKind) -> Vec<Entity> {
        self.partitions
            .get(&kind)
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entity(json: serde_json::Value) -> Entity {
        Arc::new(json)
    }

    #[tokio::test]
    async fn test_store_get_round_trip() {
        let store = MemoryStore::new();
        let aatrox = entity(serde_json::json!({"id": 266, "name": "Aatrox"}));

        store
            .store(EntityKind::Champion, "266".into(), Arc::clone(&aatrox))
            .await
            .unwrap();

        let found = store.get(EntityKind::Champion, &"266".into()).await;
        assert_eq!(found, Some(aatrox));
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(EntityKind::Item, &"1001".into()).await, None);
    }

    #[tokio::test]
    async fn test_same_entity_under_multiple_keys() {
        let store = MemoryStore::new();
        let aatrox = entity(serde_json::json!({"id": 266, "name": "Aatrox"}));

        store
            .store(EntityKind::Champion, 266u64.into(), Arc::clone(&aatrox))
            .await
            .unwrap();
        store
            .store(EntityKind::Champion, "Aatrox".into(), Arc::clone(&aatrox))
            .await
            .unwrap();

        let by_id = store.get(EntityKind::Champion, &266u64.into()).await;
        let by_name = store.get(EntityKind::Champion, &"Aatrox".into()).await;
        assert_eq!(by_id, by_name);
    }

    #[tokio::test]
    async fn test_get_many_preserves_length_and_order() {
        let store = MemoryStore::new();
        let annie = entity(serde_json::json!({"id": 1}));
        store
            .store(EntityKind::Champion, "1".into(), Arc::clone(&annie))
            .await
            .unwrap();

        let keys: Vec<EntityKey> = vec!["0".into(), "1".into(), "2".into()];
        let found = store.get_many(EntityKind::Champion, &keys).await;

        assert_eq!(found.len(), keys.len());
        assert_eq!(found[0], None);
        assert_eq!(found[1], Some(annie));
        assert_eq!(found[2], None);
    }

    #[tokio::test]
    async fn test_store_many_length_mismatch_writes_nothing() {
        let store = MemoryStore::new();
        let result = store
            .store_many(
                EntityKind::Champion,
                vec!["1".into(), "2".into()],
                vec![entity(serde_json::json!({"id": 1}))],
                &[EntityKind::Champion],
            )
            .await;

        assert!(matches!(
            result,
            Err(ErrorKind::BatchLengthMismatch { keys: 2, values: 1 })
        ));
        assert_eq!(store.get(EntityKind::Champion, &"1".into()).await, None);
        assert!(!store.has_all(EntityKind::Champion).await);
    }

    #[tokio::test]
    async fn test_completeness_lifecycle() {
        let store = MemoryStore::new();
        let champ1 = entity(serde_json::json!({"id": 1}));
        let champ2 = entity(serde_json::json!({"id": 2}));

        // Individual stores never establish completeness.
        store
            .store(EntityKind::Champion, "1".into(), Arc::clone(&champ1))
            .await
            .unwrap();
        assert!(!store.has_all(EntityKind::Champion).await);

        // A bulk store without a declaration does not either.
        store
            .store_many(
                EntityKind::Item,
                vec!["1001".into()],
                vec![entity(serde_json::json!({"id": 1001}))],
                &[],
            )
            .await
            .unwrap();
        assert!(!store.has_all(EntityKind::Item).await);

        // A declaring bulk store does, and the flag is sticky across
        // later individual stores.
        store
            .store_many(
                EntityKind::Champion,
                vec!["1".into(), "2".into()],
                vec![Arc::clone(&champ1), Arc::clone(&champ2)],
                &[EntityKind::Champion],
            )
            .await
            .unwrap();
        assert!(store.has_all(EntityKind::Champion).await);

        store
            .store(EntityKind::Champion, "3".into(), entity(serde_json::json!({"id": 3})))
            .await
            .unwrap();
        assert!(store.has_all(EntityKind::Champion).await);

        let mut all: Vec<i64> = store
            .get_all(EntityKind::Champion)
            .await
            .iter()
            .map(|champion| champion["id"].as_i64().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_all_of_unknown_kind_is_empty() {
        let store = MemoryStore::new();
        assert!(store.get_all(EntityKind::Rune).await.is_empty());
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let store = MemoryStore::new();
        assert!((store.stats().hit_rate() - 1.0).abs() < f64::EPSILON);

        store
            .store(EntityKind::Summoner, "s1".into(), entity(serde_json::json!({})))
            .await
            .unwrap();
        store.get(EntityKind::Summoner, &"s1".into()).await;
        store.get(EntityKind::Summoner, &"s2".into()).await;

        let stats = store.stats();
        assert_eq!(stats, StoreStats { hits: 1, misses: 1 });
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
