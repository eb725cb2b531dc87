#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Hash-code folding, bit spreading and bucket index reduction.
pub mod hash;

/// A HashMap implementation using separate chaining.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// the key-value map interface, including the absent (`None`) key.
pub mod hash_map;

/// The raw chaining hash table.
///
/// Callers supply hash codes and equality predicates; the table owns buckets,
/// chains, resizing and iteration.
pub mod hash_table;

mod error;

pub use error::CapacityError;
pub use hash_map::HashMap;
pub use hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`DefaultHashMap`].
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`DefaultHashMap`].
        pub type DefaultHashBuilder = std::hash::RandomState;
    }
}

/// A [`HashMap`] using the default hasher builder.
#[cfg(any(feature = "foldhash", feature = "std"))]
pub type DefaultHashMap<K, V> = HashMap<K, V, DefaultHashBuilder>;
