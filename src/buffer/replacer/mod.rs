//! Eviction policy implementations (replacers).
//!
//! Currently implements:
//! - [`LruStrategy`] - Least Recently Used
//! - [`MidpointStrategy`] - Scan-resistant midpoint insertion (InnoDB style)
//!
//! Both track keys only. The buffer pool owns the pages and asks the
//! strategy which key to give up.

mod list;
mod lru;
mod midpoint;

use std::hash::Hash;

pub use lru::LruStrategy;
pub use midpoint::MidpointStrategy;

/// Decides eviction order for a bounded set of cached keys.
pub trait ReplacementStrategy<K: Clone + Eq + Hash> {
    /// Record a use of `key`. Unknown keys are ignored.
    fn access(&mut self, key: &K);

    /// Start tracking `key`. A key already tracked counts as an access.
    ///
    /// If the strategy is full, it evicts first and returns the victim.
    fn put(&mut self, key: K) -> Option<K>;

    /// Remove and return the next victim, or `None` if nothing is tracked.
    fn evict(&mut self) -> Option<K>;

    /// Stop tracking `key`. Returns whether it was tracked.
    fn remove(&mut self, key: &K) -> bool;

    fn contains(&self, key: &K) -> bool;

    /// Keys in the strategy's own order.
    fn keys(&self) -> Vec<K>;

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether inserting a new key would exceed capacity.
    fn should_evict(&self) -> bool {
        self.len() >= self.capacity()
    }
}
