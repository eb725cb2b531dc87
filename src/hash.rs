//! Hash-code folding, bit spreading and bucket index reduction.

use core::hash::BuildHasher;
use core::hash::Hash;

/// Number of buckets a freshly created or cleared table starts with.
pub const DEFAULT_CAPACITY: usize = 8;

/// Fraction of the bucket count that may be populated before the table
/// doubles.
pub const LOAD_FACTOR: f64 = 0.75;

/// Smallest bucket count a table will ever use. Index reduction divides by
/// `capacity - 1`, so a single bucket is not representable.
pub const MIN_CAPACITY: usize = 2;

/// Computes `floor(capacity * LOAD_FACTOR)`.
#[inline(always)]
pub(crate) fn target_load_factor(capacity: usize) -> usize {
    (capacity as f64 * LOAD_FACTOR) as usize
}

/// Computes the 32-bit hash code of `key` with the given hasher builder.
///
/// The 64-bit hasher output is folded by xoring its upper half into its lower
/// half so that every input bit can influence the bucket index.
#[inline]
pub fn hash_code<K, S>(hash_builder: &S, key: &K) -> u32
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    let hash = hash_builder.hash_one(key);
    (hash ^ (hash >> 32)) as u32
}

/// Spreads the high bits of a hash code into the low bits.
///
/// Keys whose hash codes differ only in their upper bits would otherwise land
/// in the same bucket once the code is reduced modulo a small capacity.
#[inline(always)]
pub fn spread(mut h: u32) -> u32 {
    h ^= (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "full-modulus")] {
        #[inline(always)]
        fn reduce(spread: u32, capacity: usize) -> usize {
            spread as usize % capacity
        }
    } else {
        // The last bucket is never addressed. Kept so bucket placement matches
        // tables built by other implementations of this layout.
        #[inline(always)]
        fn reduce(spread: u32, capacity: usize) -> usize {
            spread as usize % (capacity - 1)
        }
    }
}

/// Maps an optional hash code to a bucket index for a table with `capacity`
/// buckets.
///
/// `None` stands for the absent key and always maps to bucket 0 without being
/// spread.
#[inline]
pub fn bucket_index(hash: Option<u32>, capacity: usize) -> usize {
    debug_assert!(capacity >= MIN_CAPACITY);
    match hash {
        Some(h) => reduce(spread(h), capacity),
        None => 0,
    }
}
