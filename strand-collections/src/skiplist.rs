//! Skip list - a probabilistic ordered map.
//!
//! A skip list provides O(log n) expected time for insert, lookup, and
//! removal with no rebalancing. Nodes live in an internal arena and link to
//! each other by `u32` index.
//!
//! ```text
//! Level 2:  HEAD ─────────────────────► 0.50 ─────────────────► NIL
//!             │                          │
//! Level 1:  HEAD ────────► 0.20 ────────► 0.50 ─────────────────► NIL
//!             │             │             │
//! Level 0:  HEAD ──► 0.10 ──► 0.20 ──► 0.30 ──► 0.50 ──► 0.60 ──► NIL
//! ```
//!
//! Keys only need [`PartialOrd`], so `f64` works directly. A key that does
//! not compare equal to itself (`NaN`) is rejected on insert.
//!
//! Inserting a key that is already present adds a second node after the
//! existing ones; [`SkipList::get`] keeps returning the first. Callers that
//! need "set if absent" check with [`SkipList::contains_key`] first.
//!
//! # Example
//!
//! ```rust
//! use strand_collections::SkipList;
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let mut map: SkipList<f64, &str> = SkipList::new(SmallRng::seed_from_u64(12345));
//!
//! map.set(0.75, "first").unwrap();
//! map.set(0.25, "second").unwrap();
//!
//! assert_eq!(map.get(&0.25), Some(&"second"));
//! assert_eq!(map.first(), Some((&0.25, &"second")));
//! assert!(map.set(f64::NAN, "rejected").is_err());
//! ```

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_core::RngCore;
use strand_log::Logger;
use tracing::debug;

use crate::error::UnorderedKey;

/// Sentinel index for "no node".
const NIL: u32 = u32::MAX;

// ============================================================================
// SkipNode
// ============================================================================

/// A node in the skip list containing key, value, and forward links.
///
/// `forward[i]` is the next node at level i; a node has one link per level
/// it participates in.
#[derive(Debug, Clone)]
pub struct SkipNode<K, V> {
    key: K,
    value: V,
    forward: Box<[u32]>,
}

impl<K, V> SkipNode<K, V> {
    #[inline]
    fn new(key: K, value: V, level: usize) -> Self {
        Self {
            key,
            value,
            forward: vec![NIL; level + 1].into_boxed_slice(),
        }
    }

    /// Returns the node's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the node's value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the number of levels this node is linked at.
    #[inline]
    pub fn levels(&self) -> usize {
        self.forward.len()
    }
}

// ============================================================================
// SkipList
// ============================================================================

/// A probabilistic ordered map.
///
/// # Type Parameters
///
/// - `K`: Key type, must implement `PartialOrd`
/// - `V`: Value type
/// - `R`: Random number generator implementing [`RngCore`]
/// - `MAX_LEVEL`: Maximum number of levels, defaults to 16 (~65K elements efficient)
#[derive(Debug, Clone)]
pub struct SkipList<K, V, R = SmallRng, const MAX_LEVEL: usize = 16> {
    /// Node arena. `None` marks a free slot.
    nodes: Vec<Option<SkipNode<K, V>>>,
    /// Free slots in `nodes`, reused before growing.
    free: Vec<u32>,
    /// `head[i]` is the first node at level i.
    head: [u32; MAX_LEVEL],
    /// Last node at level 0, for O(1) `last()`.
    tail: u32,
    rng: R,
    /// Highest level currently in use (0-indexed).
    level: usize,
    len: usize,
    /// log2 of the level ratio. Higher values produce sparser upper levels.
    level_divisor: u8,
    logger: Logger,
}

impl<K, V, const MAX_LEVEL: usize> Default for SkipList<K, V, SmallRng, MAX_LEVEL>
where
    K: PartialOrd,
{
    /// Creates an empty skip list seeded from the operating system.
    fn default() -> Self {
        Self::new(SmallRng::from_os_rng())
    }
}

impl<K, V, R, const MAX_LEVEL: usize> SkipList<K, V, R, MAX_LEVEL>
where
    K: PartialOrd,
    R: RngCore,
{
    /// Creates a new empty skip list.
    ///
    /// Uses the default level ratio of 2 (p=0.5).
    pub fn new(rng: R) -> Self {
        Self::with_level_ratio(rng, 2)
    }

    /// Creates a new empty skip list with custom level ratio.
    ///
    /// `level_ratio` controls memory vs search speed tradeoff:
    /// - 2: Standard (p=0.5), ~2 links per node average
    /// - 4: Redis-style (p=0.25), ~1.33 links per node average
    ///
    /// Must be a power of 2 and >= 2. Other values are rounded up.
    pub fn with_level_ratio(rng: R, level_ratio: u32) -> Self {
        const { assert!(MAX_LEVEL > 0, "MAX_LEVEL must be at least 1") };

        let level_ratio = level_ratio.max(2).next_power_of_two();
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: [NIL; MAX_LEVEL],
            tail: NIL,
            rng,
            level: 0,
            len: 0,
            level_divisor: level_ratio.trailing_zeros() as u8,
            logger: Logger::disabled(),
        }
    }

    /// Attaches a logger for diagnostic events.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        logger.emit(|| {
            debug!(
                max_level = MAX_LEVEL,
                level_ratio = 1u32 << self.level_divisor,
                "skip list created"
            )
        });
        self.logger = logger;
        self
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the skip list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if some entry has the given key.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns the value of the first entry with the given key.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|idx| &self.node(idx).value)
    }

    /// Returns the first node with the given key.
    #[inline]
    pub fn get_node(&self, key: &K) -> Option<&SkipNode<K, V>> {
        self.find(key).map(|idx| self.node(idx))
    }

    /// Returns the key and value of the first entry with the given key.
    #[inline]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.get_node(key).map(|node| (&node.key, &node.value))
    }

    /// Returns a mutable reference to the value of the first entry with the given key.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find(key)?;
        Some(&mut self.node_mut(idx).value)
    }

    /// Returns the first (smallest) key-value pair.
    #[inline]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entry_at(self.head[0])
    }

    /// Returns the last (largest) key-value pair. O(1).
    #[inline]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tail)
    }

    /// Inserts a key-value pair.
    ///
    /// Always inserts: an existing equal key gets a second node after it.
    ///
    /// # Errors
    ///
    /// Returns [`UnorderedKey`] holding the pair if `key` does not compare
    /// equal to itself.
    pub fn set(&mut self, key: K, value: V) -> Result<(), UnorderedKey<(K, V)>> {
        if key.partial_cmp(&key).is_none() {
            self.logger.emit(|| debug!("skip list rejected unordered key"));
            return Err(UnorderedKey((key, value)));
        }

        let mut update = [NIL; MAX_LEVEL];
        self.descend(&key, true, Some(&mut update));

        let new_level = self.random_level();
        let idx = self.alloc(SkipNode::new(key, value, new_level));
        self.link_node(idx, new_level, &update);

        Ok(())
    }

    /// Removes the first entry with the given key and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut update = [NIL; MAX_LEVEL];
        let pred = self.descend(key, false, Some(&mut update));
        let idx = self.next(pred, 0);
        if idx == NIL || self.node(idx).key != *key {
            return None;
        }

        let node = self.nodes[idx as usize]
            .take()
            .expect("linked skip list node is occupied");

        // Predecessors at every level the node was linked at now skip it
        for (i, &next) in node.forward.iter().enumerate() {
            self.set_next(update[i], i, next);
        }

        if node.forward[0] == NIL {
            self.tail = update[0];
        }

        while self.level > 0 && self.head[self.level] == NIL {
            self.level -= 1;
        }

        self.free.push(idx);
        self.len -= 1;

        Some(node.value)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = [NIL; MAX_LEVEL];
        self.tail = NIL;
        self.level = 0;
        self.len = 0;
    }

    /// Returns an iterator over key-value pairs in key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V, R, MAX_LEVEL> {
        Iter {
            list: self,
            current: self.head[0],
            remaining: self.len,
        }
    }

    /// Returns an iterator over keys in order.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over values in key order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    #[inline]
    fn node(&self, idx: u32) -> &SkipNode<K, V> {
        self.nodes[idx as usize]
            .as_ref()
            .expect("linked skip list node is occupied")
    }

    #[inline]
    fn node_mut(&mut self, idx: u32) -> &mut SkipNode<K, V> {
        self.nodes[idx as usize]
            .as_mut()
            .expect("linked skip list node is occupied")
    }

    #[inline]
    fn entry_at(&self, idx: u32) -> Option<(&K, &V)> {
        if idx == NIL {
            return None;
        }
        let node = self.node(idx);
        Some((&node.key, &node.value))
    }

    /// Successor of `idx` at `level`, treating `NIL` as the head.
    #[inline]
    fn next(&self, idx: u32, level: usize) -> u32 {
        if idx == NIL {
            self.head[level]
        } else {
            self.node(idx).forward[level]
        }
    }

    #[inline]
    fn set_next(&mut self, idx: u32, level: usize, next: u32) {
        if idx == NIL {
            self.head[level] = next;
        } else {
            self.node_mut(idx).forward[level] = next;
        }
    }

    /// Finds the first node with the given key without recording predecessors.
    #[inline]
    fn find(&self, key: &K) -> Option<u32> {
        let pred = self.descend(key, false, None);
        let next = self.next(pred, 0);
        (next != NIL && self.node(next).key == *key).then_some(next)
    }

    /// Walks from the top level down, returning the level-0 predecessor.
    ///
    /// With `inclusive == false` the walk stops before the first key `>= key`;
    /// with `inclusive == true` it passes equal keys and stops before the
    /// first key `> key`. Predecessors at each level go into `update`.
    fn descend(&self, key: &K, inclusive: bool, mut update: Option<&mut [u32; MAX_LEVEL]>) -> u32 {
        let mut current = NIL;

        // Start from the highest level
        for i in (0..=self.level).rev() {
            let mut next = self.next(current, i);

            while next != NIL {
                let next_node = self.node(next);
                let advance = if inclusive {
                    next_node.key <= *key
                } else {
                    next_node.key < *key
                };
                if !advance {
                    break;
                }
                current = next;
                next = next_node.forward[i];
            }

            if let Some(update) = update.as_deref_mut() {
                update[i] = current;
            }
        }

        current
    }

    /// Generates a random level for a new node.
    ///
    /// Uses a geometric distribution by counting trailing ones in a random
    /// number.
    #[inline]
    fn random_level(&mut self) -> usize {
        let r = self.rng.next_u32();
        let level = (r.trailing_ones() as usize) / (self.level_divisor as usize);
        level.min(MAX_LEVEL - 1)
    }

    fn alloc(&mut self, node: SkipNode<K, V>) -> u32 {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx as usize] = Some(node);
            return idx;
        }

        let idx = u32::try_from(self.nodes.len())
            .ok()
            .filter(|&idx| idx != NIL)
            .expect("skip list node count exceeds u32 index space");
        self.nodes.push(Some(node));
        idx
    }

    /// Links a newly allocated node after its predecessors.
    fn link_node(&mut self, idx: u32, new_level: usize, update: &[u32; MAX_LEVEL]) {
        for (i, &pred) in update.iter().enumerate().take(new_level + 1) {
            let next = self.next(pred, i);
            self.node_mut(idx).forward[i] = next;
            self.set_next(pred, i, idx);
        }

        if self.node(idx).forward[0] == NIL {
            self.tail = idx;
        }

        if new_level > self.level {
            self.level = new_level;
        }

        self.len += 1;
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Iterator over key-value pairs in key order.
pub struct Iter<'a, K, V, R, const MAX_LEVEL: usize> {
    list: &'a SkipList<K, V, R, MAX_LEVEL>,
    current: u32,
    remaining: usize,
}

impl<'a, K, V, R, const MAX_LEVEL: usize> Iterator for Iter<'a, K, V, R, MAX_LEVEL>
where
    K: PartialOrd,
    R: RngCore,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NIL {
            return None;
        }
        let node = self.list.node(self.current);
        self.current = node.forward[0];
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, R, const MAX_LEVEL: usize> ExactSizeIterator for Iter<'_, K, V, R, MAX_LEVEL>
where
    K: PartialOrd,
    R: RngCore,
{
}

impl<'a, K, V, R, const MAX_LEVEL: usize> IntoIterator for &'a SkipList<K, V, R, MAX_LEVEL>
where
    K: PartialOrd,
    R: RngCore,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, R, MAX_LEVEL>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
