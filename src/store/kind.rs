use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Closed set of entity kinds the store partitions by.
///
/// Kinds correspond to the remote API's resource families. Using an
/// explicit enumeration (rather than something open like a string)
/// keeps every partition known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    /// Static champion data
    Champion,
    /// Static item data
    Item,
    /// Static mastery data
    Mastery,
    /// Static rune data
    Rune,
    /// Static summoner spell data
    SummonerSpell,
    /// Summoner accounts
    Summoner,
    /// Ranked league entries
    League,
    /// Finished match records
    Match,
    /// Live game snapshots
    CurrentGame,
}

/// Key under which one entity instance is stored.
///
/// Keys are opaque to the store. The same entity may be indexed under
/// several keys; champions, for example, are stored both under their
/// numeric identifier and under their display name so either lookup
/// hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the key as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<u64> for EntityKey {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for EntityKey {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
