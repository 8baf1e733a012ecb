//! Eviction Policy Module
//!
//! Victim selection strategies for bounded local caches. The store drives a
//! tracker through insert/access/remove notifications and asks it for a
//! victim when an insertion would exceed capacity.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use rand::Rng;

use crate::cache::CacheKey;
use crate::config::EvictionPolicy;

// == Eviction Tracker ==
/// Policy-specific bookkeeping driven by the local store.
///
/// Tracker state is mirrored from the entry map under the same lock: every
/// map mutation notifies the tracker, so a victim returned here always names
/// a live entry.
pub(crate) trait EvictionTracker<K>: Send + fmt::Debug {
    /// Records that `key` was inserted or overwritten.
    fn on_insert(&mut self, key: &K);

    /// Records a successful read of `key`.
    fn on_access(&mut self, key: &K);

    /// Records that `key` left the map (removal, expiration or eviction).
    fn on_remove(&mut self, key: &K);

    /// Names the entry the policy would evict next, without removing it.
    fn victim(&self) -> Option<K>;

    /// Forgets all tracked keys.
    fn reset(&mut self);

    /// Number of tracked keys.
    fn len(&self) -> usize;
}

/// Builds the tracker implementing `policy`.
pub(crate) fn tracker_for<K: CacheKey>(policy: EvictionPolicy) -> Box<dyn EvictionTracker<K>> {
    match policy {
        EvictionPolicy::Lru => Box::new(LruTracker::new()),
        EvictionPolicy::Lfu => Box::new(LfuTracker::new()),
        EvictionPolicy::Fifo => Box::new(FifoTracker::new()),
        EvictionPolicy::Random => Box::new(RandomTracker::new()),
    }
}

// == LRU Tracker ==
/// Tracks recency with an arena-backed doubly linked list plus a hash index,
/// giving O(1) touch and O(1) victim selection.
///
/// List order: head = most recently used, tail = least recently used. Freed
/// arena slots are recycled through a free list; a freed slot keeps its last
/// key until reuse, and is never read while free.
#[derive(Debug)]
pub(crate) struct LruTracker<K> {
    nodes: Vec<Node<K>>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Vec<usize>,
}

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K: CacheKey> LruTracker<K> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            free: Vec::new(),
        }
    }

    /// Detaches `slot` from the list without touching the index.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        self.nodes[slot].prev = None;
        self.nodes[slot].next = None;
    }

    /// Attaches `slot` at the head (most recently used position).
    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;

        if let Some(old_head) = self.head {
            self.nodes[old_head].prev = Some(slot);
        }
        self.head = Some(slot);

        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

impl<K: CacheKey> EvictionTracker<K> for LruTracker<K> {
    fn on_insert(&mut self, key: &K) {
        // Overwriting counts as a use
        if let Some(&slot) = self.index.get(key) {
            self.unlink(slot);
            self.push_front(slot);
            return;
        }

        let node = Node {
            key: key.clone(),
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        self.index.insert(key.clone(), slot);
        self.push_front(slot);
    }

    fn on_access(&mut self, key: &K) {
        if let Some(&slot) = self.index.get(key) {
            self.unlink(slot);
            self.push_front(slot);
        }
    }

    fn on_remove(&mut self, key: &K) {
        if let Some(slot) = self.index.remove(key) {
            self.unlink(slot);
            self.free.push(slot);
        }
    }

    fn victim(&self) -> Option<K> {
        self.tail.map(|slot| self.nodes[slot].key.clone())
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
        self.free.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

// == LFU Tracker ==
/// Tracks access frequency per key.
///
/// The victim is the lowest-count entry; ties fall to the oldest last use.
/// Insertion seeds the use clock without counting as an access, so
/// never-read entries tie-break by insertion order. Victim selection scans
/// the table, which only runs on over-capacity insertions.
#[derive(Debug)]
pub(crate) struct LfuTracker<K> {
    records: HashMap<K, AccessRecord>,
    clock: u64,
}

#[derive(Debug)]
struct AccessRecord {
    count: u64,
    last_used: u64,
}

impl<K: CacheKey> LfuTracker<K> {
    pub(crate) fn new() -> Self {
        Self {
            records: HashMap::new(),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl<K: CacheKey> EvictionTracker<K> for LfuTracker<K> {
    fn on_insert(&mut self, key: &K) {
        let now = self.tick();
        self.records.insert(
            key.clone(),
            AccessRecord {
                count: 0,
                last_used: now,
            },
        );
    }

    fn on_access(&mut self, key: &K) {
        let now = self.tick();
        if let Some(record) = self.records.get_mut(key) {
            record.count += 1;
            record.last_used = now;
        }
    }

    fn on_remove(&mut self, key: &K) {
        self.records.remove(key);
    }

    fn victim(&self) -> Option<K> {
        self.records
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.count
                    .cmp(&b.count)
                    .then(a.last_used.cmp(&b.last_used))
            })
            .map(|(key, _)| key.clone())
    }

    fn reset(&mut self) {
        self.records.clear();
        self.clock = 0;
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

// == FIFO Tracker ==
/// Tracks insertion order with a queue, front = oldest.
///
/// Accesses never move a key; overwriting replaces the entry and therefore
/// re-enqueues the key at the back.
#[derive(Debug)]
pub(crate) struct FifoTracker<K> {
    order: VecDeque<K>,
}

impl<K: CacheKey> FifoTracker<K> {
    pub(crate) fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: CacheKey> EvictionTracker<K> for FifoTracker<K> {
    fn on_insert(&mut self, key: &K) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.clone());
    }

    fn on_access(&mut self, _key: &K) {}

    fn on_remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    fn victim(&self) -> Option<K> {
        self.order.front().cloned()
    }

    fn reset(&mut self) {
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

// == Random Tracker ==
/// Tracks the live key set in a dense vector for O(1) uniform victim picks.
///
/// Removal swaps the last key into the vacated slot and fixes its index.
#[derive(Debug)]
pub(crate) struct RandomTracker<K> {
    keys: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K: CacheKey> RandomTracker<K> {
    pub(crate) fn new() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: CacheKey> EvictionTracker<K> for RandomTracker<K> {
    fn on_insert(&mut self, key: &K) {
        if self.index.contains_key(key) {
            return;
        }
        self.index.insert(key.clone(), self.keys.len());
        self.keys.push(key.clone());
    }

    fn on_access(&mut self, _key: &K) {}

    fn on_remove(&mut self, key: &K) {
        if let Some(slot) = self.index.remove(key) {
            self.keys.swap_remove(slot);
            if slot < self.keys.len() {
                self.index.insert(self.keys[slot].clone(), slot);
            }
        }
    }

    fn victim(&self) -> Option<K> {
        if self.keys.is_empty() {
            None
        } else {
            let pick = rand::thread_rng().gen_range(0..self.keys.len());
            Some(self.keys[pick].clone())
        }
    }

    fn reset(&mut self) {
        self.keys.clear();
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys(tracker: &dyn EvictionTracker<String>, expected: usize) {
        assert_eq!(tracker.len(), expected);
    }

    #[test]
    fn test_lru_victim_is_least_recently_used() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_insert(&"b".to_string());
        lru.on_insert(&"c".to_string());

        assert_eq!(lru.victim(), Some("a".to_string()));
    }

    #[test]
    fn test_lru_access_refreshes_recency() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_insert(&"b".to_string());
        lru.on_insert(&"c".to_string());

        // a becomes most recent; b is now oldest
        lru.on_access(&"a".to_string());

        assert_eq!(lru.victim(), Some("b".to_string()));
    }

    #[test]
    fn test_lru_overwrite_counts_as_use() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_insert(&"b".to_string());
        lru.on_insert(&"a".to_string());

        assert_eq!(lru.victim(), Some("b".to_string()));
        keys(&lru, 2);
    }

    #[test]
    fn test_lru_remove_head_middle_tail() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_insert(&"b".to_string());
        lru.on_insert(&"c".to_string());

        lru.on_remove(&"b".to_string());
        assert_eq!(lru.victim(), Some("a".to_string()));

        lru.on_remove(&"a".to_string());
        assert_eq!(lru.victim(), Some("c".to_string()));

        lru.on_remove(&"c".to_string());
        assert_eq!(lru.victim(), None);
        keys(&lru, 0);
    }

    #[test]
    fn test_lru_slot_reuse_keeps_order() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_insert(&"b".to_string());
        lru.on_remove(&"a".to_string());
        // d reuses a's freed slot
        lru.on_insert(&"d".to_string());

        assert_eq!(lru.victim(), Some("b".to_string()));
        keys(&lru, 2);
    }

    #[test]
    fn test_lru_remove_nonexistent_is_noop() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_remove(&"ghost".to_string());
        lru.on_access(&"ghost".to_string());

        assert_eq!(lru.victim(), Some("a".to_string()));
        keys(&lru, 1);
    }

    #[test]
    fn test_lru_reset() {
        let mut lru = LruTracker::new();

        lru.on_insert(&"a".to_string());
        lru.on_insert(&"b".to_string());
        lru.reset();

        assert_eq!(lru.victim(), None);
        keys(&lru, 0);
    }

    #[test]
    fn test_lfu_victim_is_lowest_count() {
        let mut lfu = LfuTracker::new();

        lfu.on_insert(&"a".to_string());
        lfu.on_insert(&"b".to_string());
        lfu.on_insert(&"c".to_string());

        lfu.on_access(&"a".to_string());
        lfu.on_access(&"a".to_string());
        lfu.on_access(&"b".to_string());

        assert_eq!(lfu.victim(), Some("c".to_string()));
    }

    #[test]
    fn test_lfu_ties_break_by_oldest_use() {
        let mut lfu = LfuTracker::new();

        // Never-read entries tie at count zero; insertion order decides
        lfu.on_insert(&"old".to_string());
        lfu.on_insert(&"new".to_string());
        assert_eq!(lfu.victim(), Some("old".to_string()));

        // Equal counts after reads; the earlier reader loses
        lfu.on_access(&"old".to_string());
        lfu.on_access(&"new".to_string());
        assert_eq!(lfu.victim(), Some("old".to_string()));

        lfu.on_access(&"old".to_string());
        assert_eq!(lfu.victim(), Some("new".to_string()));
    }

    #[test]
    fn test_lfu_overwrite_resets_count() {
        let mut lfu = LfuTracker::new();

        lfu.on_insert(&"a".to_string());
        lfu.on_insert(&"b".to_string());
        lfu.on_access(&"a".to_string());
        lfu.on_access(&"a".to_string());
        lfu.on_access(&"b".to_string());

        // Overwriting a replaces its entry, dropping its count lead
        lfu.on_insert(&"a".to_string());

        assert_eq!(lfu.victim(), Some("a".to_string()));
    }

    #[test]
    fn test_lfu_remove() {
        let mut lfu = LfuTracker::new();

        lfu.on_insert(&"a".to_string());
        lfu.on_insert(&"b".to_string());
        lfu.on_remove(&"a".to_string());

        assert_eq!(lfu.victim(), Some("b".to_string()));
        keys(&lfu, 1);
    }

    #[test]
    fn test_fifo_victim_ignores_accesses() {
        let mut fifo = FifoTracker::new();

        fifo.on_insert(&"a".to_string());
        fifo.on_insert(&"b".to_string());
        fifo.on_insert(&"c".to_string());

        fifo.on_access(&"a".to_string());
        fifo.on_access(&"a".to_string());

        assert_eq!(fifo.victim(), Some("a".to_string()));
    }

    #[test]
    fn test_fifo_overwrite_moves_to_back() {
        let mut fifo = FifoTracker::new();

        fifo.on_insert(&"a".to_string());
        fifo.on_insert(&"b".to_string());
        fifo.on_insert(&"a".to_string());

        assert_eq!(fifo.victim(), Some("b".to_string()));
        keys(&fifo, 2);
    }

    #[test]
    fn test_fifo_remove() {
        let mut fifo = FifoTracker::new();

        fifo.on_insert(&"a".to_string());
        fifo.on_insert(&"b".to_string());
        fifo.on_remove(&"a".to_string());

        assert_eq!(fifo.victim(), Some("b".to_string()));
    }

    #[test]
    fn test_random_victim_is_live_key() {
        let mut random = RandomTracker::new();

        random.on_insert(&"a".to_string());
        random.on_insert(&"b".to_string());
        random.on_insert(&"c".to_string());
        random.on_remove(&"b".to_string());

        for _ in 0..50 {
            let victim = random.victim().unwrap();
            assert!(victim == "a" || victim == "c", "victim {victim} not live");
        }
    }

    #[test]
    fn test_random_swap_remove_keeps_index_consistent() {
        let mut random = RandomTracker::new();

        for k in ["a", "b", "c", "d"] {
            random.on_insert(&k.to_string());
        }

        // Removing the first slot swaps d into its place
        random.on_remove(&"a".to_string());
        random.on_remove(&"d".to_string());

        keys(&random, 2);
        for _ in 0..50 {
            let victim = random.victim().unwrap();
            assert!(victim == "b" || victim == "c");
        }
    }

    #[test]
    fn test_random_duplicate_insert_is_noop() {
        let mut random = RandomTracker::new();

        random.on_insert(&"a".to_string());
        random.on_insert(&"a".to_string());

        keys(&random, 1);
    }

    #[test]
    fn test_random_empty_has_no_victim() {
        let random: RandomTracker<String> = RandomTracker::new();
        assert_eq!(random.victim(), None);
    }

    #[test]
    fn test_tracker_for_selects_policy_behavior() {
        // LRU and FIFO disagree about an accessed oldest key
        let mut lru = tracker_for::<String>(EvictionPolicy::Lru);
        let mut fifo = tracker_for::<String>(EvictionPolicy::Fifo);

        for tracker in [&mut lru, &mut fifo] {
            tracker.on_insert(&"a".to_string());
            tracker.on_insert(&"b".to_string());
            tracker.on_access(&"a".to_string());
        }

        assert_eq!(lru.victim(), Some("b".to_string()));
        assert_eq!(fifo.victim(), Some("a".to_string()));
    }
}
