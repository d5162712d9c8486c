//! Eager/lazy reference resolution policy.
//!
//! The policy itself is consulted by the fetch orchestration sitting on
//! top of this crate: under [`LoadPolicy::Eager`] it resolves every
//! foreign-key reference an entity carries right after the primary
//! fetch, under [`LoadPolicy::Lazy`] only when a reference is actually
//! followed. This module's job is merely to hold the value so that a
//! write is visible to every thread immediately.

use std::sync::atomic::{AtomicU8, Ordering};

/// Whether fetch paths should chase foreign-key references up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Resolve references only when they are accessed.
    #[default]
    Lazy,
    /// Resolve every reference right after the primary fetch.
    Eager,
}

const LAZY: u8 = 0;
const EAGER: u8 = 1;

/// Shares a [`LoadPolicy`] across threads without a staleness window.
#[derive(Debug)]
pub struct PolicyCell(AtomicU8);

impl PolicyCell {
    /// Create a cell holding `policy`.
    #[must_use]
    pub const fn new(policy: LoadPolicy) -> Self {
        Self(AtomicU8::new(match policy {
            LoadPolicy::Lazy => LAZY,
            LoadPolicy::Eager => EAGER,
        }))
    }

    /// Current policy.
    #[must_use]
    pub fn get(&self) -> LoadPolicy {
        match self.0.load(Ordering::SeqCst) {
            EAGER => LoadPolicy::Eager,
            _ => LoadPolicy::Lazy,
        }
    }

    /// Replace the policy. Visible to all threads immediately.
    pub fn set(&self, policy: LoadPolicy) {
        let raw = match policy {
            LoadPolicy::Lazy => LAZY,
            LoadPolicy::Eager => EAGER,
        };
        self.0.store(raw, Ordering::SeqCst);
    }
}

impl Default for PolicyCell {
    fn default() -> Self {
        Self::new(LoadPolicy::default())
    }
}
