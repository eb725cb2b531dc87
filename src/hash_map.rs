use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::error::CapacityError;
use crate::hash::hash_code;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// Compares a stored key against a lookup key by equality. Two absent keys
/// are equal; an absent key never equals a present one.
#[inline]
fn key_eq<K: Eq>(stored: &Option<K>, key: Option<&K>) -> bool {
    match (stored, key) {
        (Some(stored), Some(key)) => stored == key,
        (None, None) => true,
        _ => false,
    }
}

/// Like [`key_eq`], but checks whether both refer to the same key object
/// before falling back to equality.
#[inline]
fn key_same_or_eq<K: Eq>(stored: &Option<K>, key: Option<&K>) -> bool {
    match (stored, key) {
        (Some(stored), Some(key)) => core::ptr::eq(stored, key) || stored == key,
        (None, None) => true,
        _ => false,
    }
}

/// A hash map built on the chaining [`HashTable`].
///
/// `HashMap<K, V, S>` maps keys to values, where keys implement `Hash + Eq`
/// and are hashed by the hasher builder `S`. Keys are passed as `Option<K>`:
/// `Some(k)` is an ordinary key, while `None` is the absent key, which is a
/// valid key of its own that always lives in bucket 0 without being hashed.
///
/// The map starts with 8 buckets and doubles whenever its population exceeds
/// three quarters of its bucket count.
///
/// # Performance Characteristics
///
/// - **Memory**: one pointer per bucket plus one heap node per entry holding
///   the key, the value, a cached 32-bit hash code and the next pointer.
/// - **Lookups**: a single bucket walk; `contains_value` is a full scan.
#[derive(Clone)]
pub struct HashMap<K, V, S> {
    table: HashTable<(Option<K>, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(&k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with the given hasher builder and the default
    /// bucket count of 8.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates an empty map with `capacity` buckets and the given hasher
    /// builder.
    ///
    /// Capacities below 2 are raised to 2.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Creates an empty map with `capacity` buckets that first resizes once it
    /// holds more than `threshold` entries.
    ///
    /// After the first resize the threshold follows the usual 0.75 load
    /// factor.
    pub fn with_capacity_threshold_and_hasher(
        capacity: usize,
        threshold: usize,
        hash_builder: S,
    ) -> Self {
        Self {
            table: HashTable::with_capacity_and_threshold(capacity, threshold),
            hash_builder,
        }
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.put(Some(1), "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of entries above which the map resizes.
    pub fn threshold(&self) -> usize {
        self.table.threshold()
    }

    /// Removes every entry and returns the map to the default bucket count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::with_capacity(256);
    /// map.put(Some("a"), 1);
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// assert_eq!(map.get(Some(&"a")), None);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grows the map so that `additional` more entries fit without a resize.
    ///
    /// # Panics
    ///
    /// Panics if the new bucket count overflows.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Grows the map so that `additional` more entries fit without a resize.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::CapacityOverflow`] if the required bucket
    /// count cannot be represented; the map is left untouched.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        self.table.try_reserve(additional)
    }

    fn key_hash(&self, key: Option<&K>) -> Option<u32> {
        key.map(|k| hash_code(&self.hash_builder, k))
    }

    /// Associates `value` with `key`, returning the value it replaced.
    ///
    /// If the key is already present its value is overwritten in place (the
    /// stored key is kept) and the map's length does not change. Otherwise the
    /// entry is appended to the tail of its bucket's chain, and the map doubles
    /// if it now holds more entries than its threshold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// assert_eq!(map.put(Some(37), "a"), None);
    /// assert_eq!(map.put(Some(37), "b"), Some("a"));
    /// assert_eq!(map.get(Some(&37)), Some(&"b"));
    ///
    /// // The absent key is a key like any other.
    /// assert_eq!(map.put(None, "none"), None);
    /// assert_eq!(map.get(None), Some(&"none"));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn put(&mut self, key: Option<K>, value: V) -> Option<V> {
        let hash = self.key_hash(key.as_ref());
        match self.table.entry(hash, |(k, _)| key_eq(k, key.as_ref())) {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Some(old_value)
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Inserts every pair of `pairs`, in iteration order.
    ///
    /// If the number of incoming pairs exceeds the number of free buckets the
    /// bucket count is doubled until it does not, with a single resize, before
    /// anything is inserted. Pairs are then inserted one by one with
    /// [`put`](Self::put), so a key repeated in `pairs` keeps its last value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// map.put_all(vec![(Some("x"), 1), (Some("y"), 2), (Some("x"), 3)]);
    ///
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(Some(&"x")), Some(&3));
    /// ```
    pub fn put_all<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (Option<K>, V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let pairs = pairs.into_iter();
        self.table.reserve_buckets(pairs.len());
        for (key, value) in pairs {
            self.put(key, value);
        }
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// map.put(Some(1), "a");
    /// assert_eq!(map.get(Some(&1)), Some(&"a"));
    /// assert_eq!(map.get(Some(&2)), None);
    /// assert_eq!(map.get(None), None);
    /// ```
    pub fn get(&self, key: Option<&K>) -> Option<&V> {
        let hash = self.key_hash(key);
        self.table
            .find(hash, |(k, _)| key_same_or_eq(k, key))
            .map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut(&mut self, key: Option<&K>) -> Option<&mut V> {
        let hash = self.key_hash(key);
        self.table
            .find_mut(hash, |(k, _)| key_eq(k, key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map holds an entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// map.put(Some("aaa"), 2);
    /// assert!(map.contains_key(Some(&"aaa")));
    /// assert!(!map.contains_key(Some(&"bbb")));
    /// assert!(!map.contains_key(None));
    /// ```
    pub fn contains_key(&self, key: Option<&K>) -> bool {
        let hash = self.key_hash(key);
        self.table.find(hash, |(k, _)| key_eq(k, key)).is_some()
    }

    /// Returns `true` if some entry holds a value equal to `value`.
    ///
    /// Values are not indexed, so this scans every chain.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.table.iter().any(|(_, v)| v == value)
    }

    /// Removes the entry for `key`, returning its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// map.put(Some(1), "a");
    /// assert_eq!(map.remove(Some(&1)), Some("a"));
    /// assert_eq!(map.remove(Some(&1)), None);
    /// assert!(map.is_empty());
    /// ```
    pub fn remove(&mut self, key: Option<&K>) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the entry for `key`, returning the stored key and its value.
    pub fn remove_entry(&mut self, key: Option<&K>) -> Option<(Option<K>, V)> {
        let hash = self.key_hash(key);
        self.table.remove(hash, |(k, _)| key_eq(k, key))
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Returns an iterator over the entries in bucket order, then chain order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// map.put(Some(1), "a");
    /// map.put(None, "b");
    ///
    /// let mut pairs: Vec<_> = map.iter().collect();
    /// pairs.sort();
    /// assert_eq!(pairs, vec![(None, &"b"), (Some(&1), &"a")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys, in the same order as [`iter`].
    ///
    /// [`iter`]: Self::iter
    pub fn iter_keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the values, in the same order as [`iter`].
    ///
    /// [`iter`]: Self::iter
    pub fn iter_values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.table.iter(),
        }
    }

    /// Removes every entry, returning them through an iterator. The bucket
    /// count is kept.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Clone,
{
    /// Returns a snapshot of every key, in bucket order, then chain order.
    ///
    /// The returned vector is independent of the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashMap;
    /// #
    /// let mut map = DefaultHashMap::new();
    /// map.put(Some("a"), 1);
    /// let keys = map.keys();
    ///
    /// map.clear();
    /// assert_eq!(keys, vec![Some("a")]);
    /// ```
    pub fn keys(&self) -> Vec<Option<K>> {
        self.iter_keys().map(|k| k.cloned()).collect()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    V: Clone,
{
    /// Returns a snapshot of every value, in bucket order, then chain order.
    pub fn values(&self) -> Vec<V> {
        self.iter_values().cloned().collect()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Clone,
    V: Clone,
{
    /// Returns a snapshot of every entry, in bucket order, then chain order.
    pub fn entries(&self) -> Vec<(Option<K>, V)> {
        self.table.iter().cloned().collect()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty map with `capacity` buckets using the default hasher
    /// builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Extend<(Option<K>, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (Option<K>, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(Option<K>, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (Option<K>, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (Option<&'a K>, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (Option<K>, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// Iterator over the entries of a [`HashMap`].
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (Option<K>, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Option<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_ref(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the keys of a [`HashMap`].
pub struct Keys<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (Option<K>, V)>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = Option<&'a K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k.as_ref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over the values of a [`HashMap`].
pub struct Values<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (Option<K>, V)>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Draining iterator over the entries of a [`HashMap`].
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (Option<K>, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (Option<K>, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Owning iterator over the entries of a [`HashMap`].
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(Option<K>, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (Option<K>, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
