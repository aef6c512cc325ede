//! Midpoint insertion replacement policy.
//!
//! One list, head = most recently promoted, tail = next victim. The tail
//! end (the "old" sublist) holds `old_size` keys; new keys enter at its
//! boundary instead of at the head, so a one-off scan only churns the old
//! sublist. A key touched `threshold_hits` times is promoted to the head.
//!
//! ```text
//! head                      midpoint                 tail
//!  [ new sublist ......... ] ^ [ old sublist ....... ]
//!                            new keys land here
//! ```

use std::hash::Hash;

use log::trace;

use super::list::KeyList;
use super::ReplacementStrategy;

pub struct MidpointStrategy<K> {
    list: KeyList<K>,
    capacity: usize,
    threshold_hits: u32,
    old_size: usize,
}

impl<K: Clone + Eq + Hash> MidpointStrategy<K> {
    /// `old_sublist_percent` of `capacity` (rounded) forms the old sublist.
    pub fn new(capacity: usize, threshold_hits: u32, old_sublist_percent: u32) -> Self {
        let old_size = (capacity as f32 * old_sublist_percent as f32 / 100.0).round() as usize;
        Self {
            list: KeyList::with_capacity(capacity),
            capacity,
            threshold_hits,
            old_size,
        }
    }

    /// Size of the old sublist.
    #[inline]
    pub fn old_size(&self) -> usize {
        self.old_size
    }

    pub fn head(&self) -> Option<&K> {
        self.list.head()
    }

    pub fn tail(&self) -> Option<&K> {
        self.list.tail()
    }
}

impl<K: Clone + Eq + Hash> ReplacementStrategy<K> for MidpointStrategy<K> {
    fn access(&mut self, key: &K) {
        if let Some(hits) = self.list.hit(key) {
            if hits >= self.threshold_hits {
                self.list.move_to_front(key);
            }
        }
    }

    fn put(&mut self, key: K) -> Option<K> {
        if self.list.contains(&key) {
            self.access(&key);
            return None;
        }
        let victim = if self.should_evict() {
            self.evict()
        } else {
            None
        };

        if self.list.len() <= self.old_size {
            self.list.push_front(key);
        } else {
            self.list.insert_from_back(key, self.old_size);
        }
        victim
    }

    fn evict(&mut self) -> Option<K> {
        let victim = self.list.pop_back();
        if victim.is_some() {
            trace!("midpoint strategy evicted tail, {} left", self.list.len());
        }
        victim
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
