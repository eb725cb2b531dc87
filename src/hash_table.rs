use alloc::boxed::Box;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::marker::PhantomData;

use log::debug;
use log::trace;

use crate::error::CapacityError;
use crate::hash::DEFAULT_CAPACITY;
use crate::hash::MIN_CAPACITY;
use crate::hash::bucket_index;
use crate::hash::target_load_factor;

type Link<T> = Option<Box<Node<T>>>;

/// One link of a collision chain.
///
/// The hash code is cached so the table can be resized without consulting the
/// hasher again. `None` marks an item stored under the absent key.
struct Node<T> {
    hash: Option<u32>,
    item: T,
    next: Link<T>,
}

fn alloc_buckets<T>(capacity: usize) -> Box<[Link<T>]> {
    (0..capacity).map(|_| None).collect()
}

fn check_layout<T>(capacity: usize) -> Result<(), CapacityError> {
    Layout::array::<Link<T>>(capacity)
        .map(|_| ())
        .map_err(|_| CapacityError::CapacityOverflow)
}

/// Drops a chain front to back so long chains cannot overflow the stack
/// through recursive `Box` drops.
fn drop_chain<T>(mut link: Link<T>) {
    while let Some(mut node) = link {
        link = node.next.take();
    }
}

/// Chain statistics for a hash table.
///
/// Only available with the `stats` feature (or in tests).
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct ChainStats {
    /// Number of items currently in the table
    pub populated: usize,
    /// Number of buckets allocated
    pub capacity: usize,
    /// Population that triggers the next resize
    pub threshold: usize,
    /// Number of buckets holding at least one item
    pub used_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Population divided by bucket count
    pub load_factor: f64,
    /// `histogram[n]` is the number of buckets whose chain has length `n`
    pub histogram: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ChainStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Chain Statistics ===");
        println!(
            "Population: {}/{} buckets ({:.2}% load, resize above {})",
            self.populated,
            self.capacity,
            self.load_factor * 100.0,
            self.threshold
        );
        println!(
            "Buckets in use: {}/{} (longest chain {})",
            self.used_buckets, self.capacity, self.longest_chain
        );
        for (len, count) in self.histogram.iter().enumerate() {
            if *count > 0 {
                println!("  chain length {:>3}: {} buckets", len, count);
            }
        }
    }
}

/// A hash table that resolves collisions by chaining.
///
/// `HashTable<T>` stores items of type `T` in an array of buckets, each bucket
/// owning a singly linked chain of nodes. Like a raw table it does not know
/// how to hash or compare items: every operation receives the item's hash code
/// and an equality predicate from the caller.
///
/// A hash code of `None` denotes the absent key. It is never spread and always
/// lands in bucket 0, where it chains like any other item.
///
/// The table doubles its bucket count as soon as its population exceeds
/// `floor(capacity * 0.75)`, relinking every node into the new bucket array.
///
/// ## Example
///
/// ```rust
/// use chain_hash::hash_table::Entry;
/// use chain_hash::hash_table::HashTable;
///
/// let mut table: HashTable<(u32, &str)> = HashTable::new();
///
/// match table.entry(Some(7), |(k, _)| *k == 7) {
///     Entry::Vacant(entry) => {
///         entry.insert((7, "seven"));
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(Some(7), |(k, _)| *k == 7), Some(&(7, "seven")));
/// assert_eq!(table.len(), 1);
/// ```
pub struct HashTable<T> {
    buckets: Box<[Link<T>]>,

    populated: usize,
    max_pop: usize,
}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("capacity", &self.capacity())
            .field("threshold", &self.max_pop)
            .field("chains", &self.chain_lengths())
            .finish()
    }
}

impl<T> Clone for HashTable<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut buckets = alloc_buckets(self.capacity());
        for (src, dst) in self.buckets.iter().zip(buckets.iter_mut()) {
            let mut tail = dst;
            let mut link = src.as_deref();
            while let Some(node) = link {
                tail = &mut tail
                    .insert(Box::new(Node {
                        hash: node.hash,
                        item: node.item.clone(),
                        next: None,
                    }))
                    .next;
                link = node.next.as_deref();
            }
        }

        Self {
            buckets,
            populated: self.populated,
            max_pop: self.max_pop,
        }
    }
}

impl<T> Drop for HashTable<T> {
    fn drop(&mut self) {
        for link in self.buckets.iter_mut() {
            drop_chain(link.take());
        }
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with the default bucket count of 8.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with `capacity` buckets.
    ///
    /// Capacities below 2 are raised to 2. The resize threshold is
    /// `floor(capacity * 0.75)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(64);
    /// assert_eq!(table.capacity(), 64);
    /// assert_eq!(table.threshold(), 48);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self::with_capacity_and_threshold(capacity, target_load_factor(capacity))
    }

    /// Creates an empty table with `capacity` buckets that first resizes once
    /// its population exceeds `threshold`.
    ///
    /// The explicit threshold only applies until the first resize; from then
    /// on the usual load factor is used.
    pub fn with_capacity_and_threshold(capacity: usize, threshold: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            buckets: alloc_buckets(capacity),
            populated: 0,
            max_pop: threshold,
        }
    }

    /// Returns the number of items in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no items.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the population above which the table will resize.
    pub fn threshold(&self) -> usize {
        self.max_pop
    }

    /// Returns an iterator over all items in bucket order, then chain order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::new();
    /// for v in [1u32, 2, 3] {
    ///     table.entry(Some(v), |x| *x == v).or_insert(v);
    /// }
    ///
    /// let mut items: Vec<u32> = table.iter().copied().collect();
    /// items.sort();
    /// assert_eq!(items, vec![1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.populated,
        }
    }

    /// Removes every item, returning them through an iterator.
    ///
    /// The bucket count is preserved. Items not consumed by the iterator are
    /// dropped with it.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let capacity = self.capacity();
        let buckets = core::mem::replace(&mut self.buckets, alloc_buckets(capacity));
        let remaining = core::mem::take(&mut self.populated);
        Drain {
            inner: IntoIter::new(buckets, remaining),
            _marker: PhantomData,
        }
    }

    /// Removes every item and returns the table to the default bucket count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::with_capacity(1024);
    /// table.entry(Some(1), |x| *x == 1).or_insert(1);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        trace!(
            "clearing hash table ({} entries, {} buckets)",
            self.populated,
            self.capacity()
        );
        let old = core::mem::replace(&mut self.buckets, alloc_buckets(DEFAULT_CAPACITY));
        self.max_pop = target_load_factor(DEFAULT_CAPACITY);
        self.populated = 0;
        for link in old.into_vec() {
            drop_chain(link);
        }
    }

    /// Grows the table so that `additional` more items fit without a resize.
    ///
    /// # Panics
    ///
    /// Panics if the new bucket count overflows.
    pub fn reserve(&mut self, additional: usize) {
        if self.try_reserve(additional).is_err() {
            panic!("capacity overflow");
        }
    }

    /// Grows the table so that `additional` more items fit without a resize.
    ///
    /// The bucket count is doubled until the load-factor threshold covers the
    /// current population plus `additional`, and the table is resized once.
    /// An explicit threshold set at construction that is too low is replaced
    /// by the load-factor threshold, even when the bucket count already
    /// suffices.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::CapacityOverflow`] if the required bucket
    /// count cannot be represented. The table is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::new();
    /// table.try_reserve(100).unwrap();
    /// assert!(table.threshold() >= 100);
    ///
    /// assert!(table.try_reserve(usize::MAX).is_err());
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        let required = self
            .populated
            .checked_add(additional)
            .ok_or(CapacityError::CapacityOverflow)?;
        if required <= self.max_pop {
            return Ok(());
        }

        let mut capacity = self.capacity();
        while target_load_factor(capacity) < required {
            capacity = capacity
                .checked_mul(2)
                .ok_or(CapacityError::CapacityOverflow)?;
        }

        if capacity == self.capacity() {
            // Bucket indices do not change, only the threshold is lifted.
            self.max_pop = target_load_factor(capacity);
        } else {
            check_layout::<T>(capacity)?;
            self.resize(capacity);
        }

        Ok(())
    }

    /// Grows the table so that at least `additional` buckets exceed the
    /// current population, doubling the bucket count as often as needed and
    /// resizing once.
    ///
    /// This is the pre-sizing rule used by bulk insertion. It looks at free
    /// buckets, not at the load-factor threshold, so the inserts that follow
    /// may still trigger ordinary resizes.
    ///
    /// # Panics
    ///
    /// Panics if the new bucket count overflows.
    pub fn reserve_buckets(&mut self, additional: usize) {
        let mut capacity = self.capacity();
        if additional <= capacity.saturating_sub(self.populated) {
            return;
        }

        while capacity.saturating_sub(self.populated) < additional {
            capacity = capacity.checked_mul(2).expect("capacity overflow");
        }

        trace!(
            "pre-sizing hash table for {} incoming entries: {} -> {} buckets",
            additional,
            self.capacity(),
            capacity
        );
        self.resize(capacity);
    }

    /// Removes and returns the item matching `eq` in the chain selected by
    /// `hash`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::new();
    /// table.entry(Some(5), |x| *x == 5).or_insert(5);
    ///
    /// assert_eq!(table.remove(Some(5), |x| *x == 5), Some(5));
    /// assert_eq!(table.remove(Some(5), |x| *x == 5), None);
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(&mut self, hash: Option<u32>, eq: impl Fn(&T) -> bool) -> Option<T> {
        let bucket = bucket_index(hash, self.capacity());

        // Walk with a cursor on the link that owns the current node, so
        // unlinking hands the tail to the predecessor or to the bucket slot.
        let mut link = &mut self.buckets[bucket];
        while link.as_ref().is_some_and(|node| !eq(&node.item)) {
            if let Some(node) = link {
                link = &mut node.next;
            }
        }

        let mut node = link.take()?;
        *link = node.next.take();
        self.populated -= 1;
        Some(node.item)
    }

    /// Gets the entry for the item matching `eq` in the chain selected by
    /// `hash`, for in-place manipulation.
    pub fn entry(&mut self, hash: Option<u32>, eq: impl Fn(&T) -> bool) -> Entry<'_, T> {
        let bucket = bucket_index(hash, self.capacity());
        match self.chain_position(bucket, eq) {
            Some(depth) => Entry::Occupied(OccupiedEntry {
                table: self,
                bucket,
                depth,
            }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Finds the item matching `eq` in the chain selected by `hash`.
    pub fn find(&self, hash: Option<u32>, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let bucket = bucket_index(hash, self.capacity());
        let mut link = self.buckets[bucket].as_deref();
        while let Some(node) = link {
            if eq(&node.item) {
                return Some(&node.item);
            }
            link = node.next.as_deref();
        }
        None
    }

    /// Finds the item matching `eq` in the chain selected by `hash`, returning
    /// a mutable reference.
    ///
    /// The caller must not change the item in a way that alters its hash code
    /// or its equality.
    pub fn find_mut(&mut self, hash: Option<u32>, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        let bucket = bucket_index(hash, self.capacity());
        let mut link = self.buckets[bucket].as_deref_mut();
        while let Some(node) = link {
            if eq(&node.item) {
                return Some(&mut node.item);
            }
            link = node.next.as_deref_mut();
        }
        None
    }

    fn chain_position(&self, bucket: usize, eq: impl Fn(&T) -> bool) -> Option<usize> {
        let mut link = self.buckets[bucket].as_deref();
        let mut depth = 0;
        while let Some(node) = link {
            if eq(&node.item) {
                return Some(depth);
            }
            link = node.next.as_deref();
            depth += 1;
        }
        None
    }

    fn node(&self, bucket: usize, depth: usize) -> &Node<T> {
        let mut link = self.buckets[bucket].as_deref();
        for _ in 0..depth {
            link = link.and_then(|node| node.next.as_deref());
        }
        link.expect("entry refers to a live node")
    }

    fn node_mut(&mut self, bucket: usize, depth: usize) -> &mut Node<T> {
        let mut link = self.buckets[bucket].as_deref_mut();
        for _ in 0..depth {
            link = link.and_then(|node| node.next.as_deref_mut());
        }
        link.expect("entry refers to a live node")
    }

    fn unlink(&mut self, bucket: usize, depth: usize) -> Box<Node<T>> {
        let mut link = &mut self.buckets[bucket];
        for _ in 0..depth {
            match link {
                Some(node) => link = &mut node.next,
                None => break,
            }
        }

        let mut node = link.take().expect("entry refers to a live node");
        *link = node.next.take();
        self.populated -= 1;
        node
    }

    /// Appends `node` to the tail of the chain its hash selects.
    fn link_tail(&mut self, node: Box<Node<T>>) -> &mut Node<T> {
        let bucket = bucket_index(node.hash, self.capacity());
        let mut link = &mut self.buckets[bucket];
        while let Some(existing) = link {
            link = &mut existing.next;
        }
        link.insert(node)
    }

    #[inline]
    fn maybe_resize(&mut self) {
        if self.populated > self.max_pop {
            self.grow();
        }
    }

    #[cold]
    fn grow(&mut self) {
        let capacity = self.capacity().checked_mul(2).expect("capacity overflow");
        self.resize(capacity);
    }

    /// Moves every node into a fresh bucket array of `capacity` buckets.
    ///
    /// Nodes are visited in old-bucket-then-chain order and appended to the
    /// tail of their new chain, so relative order within a chain is kept.
    fn resize(&mut self, capacity: usize) {
        debug!(
            "resizing hash table: {} -> {} buckets ({} entries)",
            self.capacity(),
            capacity,
            self.populated
        );

        let old = core::mem::replace(&mut self.buckets, alloc_buckets(capacity));
        self.max_pop = target_load_factor(capacity);

        for mut link in old.into_vec() {
            while let Some(mut node) = link {
                link = node.next.take();
                self.link_tail(node);
            }
        }
    }

    fn chain_lengths(&self) -> Vec<usize> {
        self.buckets
            .iter()
            .map(|head| {
                let mut len = 0;
                let mut link = head.as_deref();
                while let Some(node) = link {
                    len += 1;
                    link = node.next.as_deref();
                }
                len
            })
            .collect()
    }

    /// Collects chain statistics.
    ///
    /// Only available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> ChainStats {
        let lengths = self.chain_lengths();
        let longest_chain = lengths.iter().copied().max().unwrap_or(0);
        let mut histogram = alloc::vec![0; longest_chain + 1];
        for len in &lengths {
            histogram[*len] += 1;
        }

        ChainStats {
            populated: self.populated,
            capacity: self.capacity(),
            threshold: self.max_pop,
            used_buckets: lengths.iter().filter(|len| **len > 0).count(),
            longest_chain,
            load_factor: self.populated as f64 / self.capacity() as f64,
            histogram,
        }
    }
}

/// A view into a single entry in the table, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, T>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns a mutable reference
    /// to the item.
    pub fn or_insert(self, default: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the item.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Modifies an occupied entry in place before any potential insert.
    pub fn and_modify(self, f: impl FnOnce(&mut T)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: Option<u32>,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Appends `item` to the tail of its chain and returns a mutable reference
    /// to it.
    ///
    /// If the population would exceed the threshold the table doubles first,
    /// so the item still ends up last in its chain.
    pub fn insert(self, item: T) -> &'a mut T {
        let table = self.table;
        table.populated += 1;
        table.maybe_resize();

        let node = table.link_tail(Box::new(Node {
            hash: self.hash,
            item,
            next: None,
        }));
        &mut node.item
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    bucket: usize,
    depth: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Gets a reference to the item.
    pub fn get(&self) -> &T {
        &self.table.node(self.bucket, self.depth).item
    }

    /// Gets a mutable reference to the item.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.table.node_mut(self.bucket, self.depth).item
    }

    /// Converts the entry into a mutable reference bound to the table.
    pub fn into_mut(self) -> &'a mut T {
        let table = self.table;
        &mut table.node_mut(self.bucket, self.depth).item
    }

    /// Unlinks the item from its chain and returns it.
    pub fn remove(self) -> T {
        self.table.unlink(self.bucket, self.depth).item
    }
}

/// Borrowing iterator over the items of a [`HashTable`].
pub struct Iter<'a, T> {
    buckets: core::slice::Iter<'a, Link<T>>,
    chain: Option<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain {
                self.chain = node.next.as_deref();
                self.remaining -= 1;
                return Some(&node.item);
            }
            self.chain = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            chain: self.chain,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> IntoIterator for &'a HashTable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over the items of a [`HashTable`].
pub struct IntoIter<T> {
    buckets: alloc::vec::IntoIter<Link<T>>,
    chain: Link<T>,
    remaining: usize,
}

impl<T> IntoIter<T> {
    fn new(buckets: Box<[Link<T>]>, remaining: usize) -> Self {
        Self {
            buckets: buckets.into_vec().into_iter(),
            chain: None,
            remaining,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain.take() {
                let Node { item, next, .. } = *node;
                self.chain = next;
                self.remaining -= 1;
                return Some(item);
            }
            self.chain = self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}

impl<T> IntoIterator for HashTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        let buckets = core::mem::take(&mut self.buckets);
        let remaining = core::mem::take(&mut self.populated);
        IntoIter::new(buckets, remaining)
    }
}

/// Draining iterator over the items of a [`HashTable`].
///
/// Created by [`HashTable::drain`].
pub struct Drain<'a, T> {
    inner: IntoIter<T>,
    _marker: PhantomData<&'a mut HashTable<T>>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}
