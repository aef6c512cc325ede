//! LRU (Least Recently Used) replacement policy.

use std::hash::Hash;

use super::list::KeyList;
use super::ReplacementStrategy;

/// Evicts the key that was put or accessed longest ago.
///
/// Keys are kept oldest first: `put` and `access` move a key to the back,
/// `evict` takes the front.
pub struct LruStrategy<K> {
    list: KeyList<K>,
    capacity: usize,
}

impl<K: Clone + Eq + Hash> LruStrategy<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            list: KeyList::with_capacity(capacity),
            capacity,
        }
    }
}

impl<K: Clone + Eq + Hash> ReplacementStrategy<K> for LruStrategy<K> {
    fn access(&mut self, key: &K) {
        self.list.move_to_back(key);
    }

    fn put(&mut self, key: K) -> Option<K> {
        if self.list.move_to_back(&key) {
            return None;
        }
        let victim = if self.should_evict() {
            self.evict()
        } else {
            None
        };
        self.list.push_back(key);
        victim
    }

    fn evict(&mut self) -> Option<K> {
        self.list.pop_front()
    }

    fn remove(&mut self, key: &K) -> bool {
        self.list.remove(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.list.contains(key)
    }

    fn keys(&self) -> Vec<K> {
        self.list.keys()
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_evicts_oldest_on_overflow() {
        let mut lru = LruStrategy::new(3);
        lru.put(1);
        lru.put(2);
        lru.put(3);

        assert_eq!(lru.put(4), Some(1));
        assert!(!lru.contains(&1));
        assert!(lru.contains(&4));
        assert_eq!(lru.len(), 3);
    }

    #[test]
    fn test_lru_evict() {
        let mut lru = LruStrategy::new(3);
        lru.put(1);
        lru.put(2);
        lru.put(3);

        let evicted = lru.evict();
        assert_eq!(evicted, Some(1));
        assert!(!lru.contains(&1));
    }

    #[test]
    fn test_lru_access_refreshes() {
        let mut lru = LruStrategy::new(3);
        lru.put(1);
        lru.put(2);
        lru.put(3);
        lru.access(&1);

        assert_eq!(lru.keys(), vec![2, 3, 1]);
        assert_eq!(lru.evict(), Some(2));
    }

    #[test]
    fn test_lru_put_existing_is_access() {
        let mut lru = LruStrategy::new(2);
        lru.put(1);
        lru.put(2);

        assert_eq!(lru.put(1), None);
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.keys(), vec![2, 1]);
    }

    #[test]
    fn test_lru_empty() {
        let mut lru: LruStrategy<u32> = LruStrategy::new(2);
        assert!(lru.is_empty());
        assert_eq!(lru.evict(), None);
        assert!(!lru.remove(&1));
        lru.access(&1);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_should_evict() {
        let mut lru = LruStrategy::new(2);
        lru.put(1);
        assert!(!lru.should_evict());
        lru.put(2);
        assert!(lru.should_evict());
        assert!(lru.remove(&1));
        assert!(!lru.should_evict());
    }
}
