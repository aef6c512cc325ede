//! Index-linked key list shared by the replacement strategies.
//!
//! Nodes live in a slot vector and link to each other by slot index, with a
//! hash index from key to slot. Every operation the strategies need
//! (push, splice, unlink, move) is O(1) without `Rc<RefCell<_>>` chains.

use std::collections::HashMap;
use std::hash::Hash;

struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
    hits: u32,
}

/// Doubly-linked list of unique keys, head first.
pub(crate) struct KeyList<K> {
    slots: Vec<Option<Node<K>>>,
    vacant: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> KeyList<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            head: None,
            tail: None,
            index: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn head(&self) -> Option<&K> {
        self.head.map(|slot| &self.node(slot).key)
    }

    #[inline]
    pub fn tail(&self) -> Option<&K> {
        self.tail.map(|slot| &self.node(slot).key)
    }

    /// Keys from head to tail.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            keys.push(node.key.clone());
            cursor = node.next;
        }
        keys
    }

    pub fn push_front(&mut self, key: K) {
        let slot = self.alloc(key);
        self.attach_front(slot);
    }

    pub fn push_back(&mut self, key: K) {
        let slot = self.alloc(key);
        self.attach_back(slot);
    }

    /// Insert `key` so that it ends up `depth` positions from the tail,
    /// counting the tail as position 1. Depths below 2 behave like 2: the
    /// key goes just before the tail. Falls back to the head when the
    /// target node would be the head or the list is too short.
    pub fn insert_from_back(&mut self, key: K, depth: usize) {
        let mut cursor = self.tail;
        for _ in 1..depth.saturating_sub(1) {
            cursor = cursor.and_then(|slot| self.node(slot).prev);
        }
        let at = match cursor {
            Some(slot) if self.node(slot).prev.is_some() => slot,
            _ => {
                self.push_front(key);
                return;
            }
        };
        let slot = self.alloc(key);
        self.attach_before(slot, at);
    }

    pub fn pop_front(&mut self) -> Option<K> {
        let slot = self.head?;
        Some(self.release(slot))
    }

    pub fn pop_back(&mut self) -> Option<K> {
        let slot = self.tail?;
        Some(self.release(slot))
    }

    /// Unlink `key` wherever it sits.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                self.release(slot);
                true
            }
            None => false,
        }
    }

    pub fn move_to_front(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                if self.head != Some(slot) {
                    self.detach(slot);
                    self.attach_front(slot);
                }
                true
            }
            None => false,
        }
    }

    pub fn move_to_back(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                if self.tail != Some(slot) {
                    self.detach(slot);
                    self.attach_back(slot);
                }
                true
            }
            None => false,
        }
    }

    /// Count one more hit on `key`, returning the new total.
    pub fn hit(&mut self, key: &K) -> Option<u32> {
        let slot = *self.index.get(key)?;
        let node = self.node_mut(slot);
        node.hits = node.hits.saturating_add(1);
        Some(node.hits)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn node(&self, slot: usize) -> &Node<K> {
        self.slots[slot].as_ref().expect("linked slot is vacant")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<K> {
        self.slots[slot].as_mut().expect("linked slot is vacant")
    }

    fn alloc(&mut self, key: K) -> usize {
        debug_assert!(!self.contains(&key), "duplicate key in KeyList");
        let node = Node {
            key: key.clone(),
            prev: None,
            next: None,
            hits: 0,
        };
        let slot = match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        slot
    }

    fn release(&mut self, slot: usize) -> K {
        self.detach(slot);
        let node = self.slots[slot].take().expect("linked slot is vacant");
        self.vacant.push(slot);
        self.index.remove(&node.key);
        node.key
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn attach_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn attach_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(slot);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    /// Link `slot` immediately before `at`, which must have a predecessor.
    fn attach_before(&mut self, slot: usize, at: usize) {
        let prev = self.node(at).prev;
        {
            let node = self.node_mut(slot);
            node.prev = prev;
            node.next = Some(at);
        }
        match prev {
            Some(p) => self.node_mut(p).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.node_mut(at).prev = Some(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(keys: &[u32]) -> KeyList<u32> {
        let mut list = KeyList::with_capacity(keys.len());
        for &key in keys {
            list.push_back(key);
        }
        list
    }

    #[test]
    fn test_push_and_pop() {
        let mut list = list_of(&[1, 2, 3]);
        list.push_front(0);
        assert_eq!(list.keys(), vec![0, 1, 2, 3]);
        assert_eq!(list.pop_front(), Some(0));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.keys(), vec![1, 2]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut list = list_of(&[1, 2, 3, 4]);
        assert!(list.remove(&2));
        assert!(list.remove(&4));
        assert!(list.remove(&1));
        assert!(!list.remove(&1));
        assert_eq!(list.keys(), vec![3]);
        assert_eq!(list.head(), Some(&3));
        assert_eq!(list.tail(), Some(&3));
        assert!(list.remove(&3));
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut list = list_of(&[1, 2]);
        list.remove(&1);
        list.push_back(3);
        assert_eq!(list.slots.len(), 2);
        assert_eq!(list.keys(), vec![2, 3]);
    }

    #[test]
    fn test_moves() {
        let mut list = list_of(&[1, 2, 3]);
        assert!(list.move_to_front(&3));
        assert_eq!(list.keys(), vec![3, 1, 2]);
        assert!(list.move_to_back(&3));
        assert_eq!(list.keys(), vec![1, 2, 3]);
        assert!(!list.move_to_front(&9));
    }

    #[test]
    fn test_insert_from_back() {
        let mut list = list_of(&[1, 2, 3, 4]);
        list.insert_from_back(9, 2);
        assert_eq!(list.keys(), vec![1, 2, 3, 9, 4]);

        list.insert_from_back(8, 3);
        assert_eq!(list.keys(), vec![1, 2, 3, 8, 9, 4]);

        // Too deep for the list: goes to the head.
        list.insert_from_back(7, 50);
        assert_eq!(list.head(), Some(&7));

        let mut single = list_of(&[1]);
        single.insert_from_back(2, 2);
        assert_eq!(single.keys(), vec![2, 1]);
    }

    #[test]
    fn test_insert_from_back_shallow_depths() {
        // Depths 0, 1 and 2 all land just before the tail.
        for depth in 0..=2 {
            let mut list = list_of(&[1, 2, 3]);
            list.insert_from_back(9, depth);
            assert_eq!(list.keys(), vec![1, 2, 9, 3], "depth {}", depth);
        }

        // The target is the head: push to the front instead.
        let mut pair = list_of(&[1, 2]);
        pair.insert_from_back(9, 3);
        assert_eq!(pair.keys(), vec![9, 1, 2]);
    }

    #[test]
    fn test_hits() {
        let mut list = list_of(&[1]);
        assert_eq!(list.hit(&1), Some(1));
        assert_eq!(list.hit(&1), Some(2));
        assert_eq!(list.hit(&2), None);
    }
}
