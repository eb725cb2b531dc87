use std::collections::HashMap as StdHashMap;
use std::collections::HashSet;
use std::hash::BuildHasher;
use std::hash::Hasher;

use chain_hash::DefaultHashMap;
use chain_hash::HashMap;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use siphasher::sip::SipHasher;
use test_log::test;

#[derive(Clone, Default)]
struct SipHashBuilder;

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

/// Sends every key to the same hash code, so every entry shares one chain.
#[derive(Clone, Default)]
struct ConstantHashBuilder;

struct ConstantHasher;

impl Hasher for ConstantHasher {
    fn finish(&self) -> u64 {
        0x1234_5678
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for ConstantHashBuilder {
    type Hasher = ConstantHasher;

    fn build_hasher(&self) -> Self::Hasher {
        ConstantHasher
    }
}

fn assert_matches_model<S: BuildHasher>(
    map: &HashMap<u32, u64, S>,
    model: &StdHashMap<Option<u32>, u64>,
    context: &str,
) {
    assert_eq!(map.len(), model.len(), "{context}");
    assert_eq!(map.is_empty(), model.is_empty(), "{context}");
    for (key, value) in model {
        assert_eq!(map.get(key.as_ref()), Some(value), "{context}: key {key:?}");
        assert!(map.contains_key(key.as_ref()), "{context}: key {key:?}");
    }

    let entries: StdHashMap<Option<u32>, u64> = map.entries().into_iter().collect();
    assert_eq!(&entries, model, "{context}");
    assert_eq!(map.entries().len(), model.len(), "{context}: duplicate keys");
}

fn random_ops<S: BuildHasher + Default>(seed: u64, rounds: usize, key_space: u32) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut map: HashMap<u32, u64, S> = HashMap::new();
    let mut model: StdHashMap<Option<u32>, u64> = StdHashMap::new();

    for round in 0..rounds {
        let key = if rng.random_ratio(1, 50) {
            None
        } else {
            Some(rng.random_range(0..key_space))
        };
        let value: u64 = rng.random();

        match rng.random_range(0..10) {
            0..=5 => {
                assert_eq!(
                    map.put(key, value),
                    model.insert(key, value),
                    "round {round}: put {key:?}"
                );
            }
            6..=7 => {
                assert_eq!(
                    map.remove(key.as_ref()),
                    model.remove(&key),
                    "round {round}: remove {key:?}"
                );
            }
            8 => {
                let batch: Vec<(Option<u32>, u64)> = (0..rng.random_range(0..20))
                    .map(|_| (Some(rng.random_range(0..key_space)), rng.random()))
                    .collect();
                for (k, v) in &batch {
                    model.insert(*k, *v);
                }
                map.put_all(batch);
            }
            _ => {
                assert_eq!(
                    map.get(key.as_ref()),
                    model.get(&key),
                    "round {round}: get {key:?}"
                );
            }
        }

        assert!(map.len() <= map.threshold(), "round {round}");
    }

    assert_matches_model(&map, &model, &format!("seed {seed}"));
}

#[test]
fn random_operations_match_std() {
    for seed in 0..8 {
        random_ops::<SipHashBuilder>(seed, 5_000, 512);
    }
}

#[test]
fn random_operations_match_std_single_chain() {
    for seed in 0..4 {
        random_ops::<ConstantHashBuilder>(seed, 1_000, 64);
    }
}

#[test]
fn distinct_puts_count_and_last_write_wins() {
    let mut map = DefaultHashMap::new();
    for round in 0..3u64 {
        for key in 0..200u32 {
            let previous = map.put(Some(key), u64::from(key) * 10 + round);
            if round == 0 {
                assert_eq!(previous, None);
            } else {
                assert_eq!(previous, Some(u64::from(key) * 10 + round - 1));
            }
        }
        assert_eq!(map.len(), 200);
    }

    for key in 0..200u32 {
        assert_eq!(map.get(Some(&key)), Some(&(u64::from(key) * 10 + 2)));
    }
}

#[test]
fn entries_round_trip_across_resizes() {
    // 1 entry, then enough to force at least one resize from 8 buckets.
    for n in [1usize, 8 * 2 + 1, 1_000] {
        let mut map: HashMap<String, usize, SipHashBuilder> = HashMap::new();
        let mut expected = HashSet::new();
        for i in 0..n {
            map.put(Some(format!("key-{i}")), i);
            expected.insert((Some(format!("key-{i}")), i));
        }
        if n > 6 {
            assert!(map.capacity() > 8, "n = {n}");
        }

        let entries: HashSet<(Option<String>, usize)> = map.entries().into_iter().collect();
        assert_eq!(entries, expected, "n = {n}");
    }
}

#[test]
fn remove_absent_key_is_noop() {
    let mut map: HashMap<u32, u32, SipHashBuilder> = HashMap::new();
    map.put_all((0..10u32).map(|i| (Some(i), i)));
    let before = map.entries();

    assert_eq!(map.remove(Some(&99)), None);
    assert_eq!(map.remove(None), None);
    assert_eq!(map.entries(), before);
    assert_eq!(map.len(), 10);
}

#[test]
fn clear_forgets_everything() {
    let mut map: HashMap<u32, u32, SipHashBuilder> = HashMap::new();
    map.put_all((0..100u32).map(|i| (Some(i), i)));
    map.put(None, 0);

    map.clear();
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.capacity(), 8);
    for i in 0..100u32 {
        assert_eq!(map.get(Some(&i)), None);
    }
    assert_eq!(map.get(None), None);
    assert!(map.entries().is_empty());

    // Still usable afterwards.
    map.put(Some(5), 5);
    assert_eq!(map.get(Some(&5)), Some(&5));
}

#[test]
fn only_one_absent_key() {
    let mut map: HashMap<u32, &str, ConstantHashBuilder> = HashMap::new();
    map.put(Some(1), "one");
    map.put(None, "first");
    map.put(Some(2), "two");
    assert_eq!(map.put(None, "second"), Some("first"));

    assert_eq!(map.len(), 3);
    assert_eq!(map.get(None), Some(&"second"));
    assert_eq!(map.keys().iter().filter(|k| k.is_none()).count(), 1);
}

#[test]
fn single_chain_survives_resizes() {
    let mut map: HashMap<u32, u32, ConstantHashBuilder> = HashMap::new();
    for i in 0..50u32 {
        map.put(Some(i), i);
    }
    assert_eq!(map.len(), 50);
    assert!(map.capacity() >= 64);

    // Every entry shares one chain, which keeps insertion order through
    // resizes.
    assert_eq!(
        map.keys(),
        (0..50u32).map(Some).collect::<Vec<_>>(),
        "chain order"
    );

    for i in (0..50u32).rev() {
        assert_eq!(map.remove(Some(&i)), Some(i));
    }
    assert!(map.is_empty());
}

#[test]
fn values_follow_entries_order() {
    let mut map: HashMap<u32, u32, SipHashBuilder> = HashMap::new();
    map.put_all((0..40u32).map(|i| (Some(i), i * 3)));

    let entries = map.entries();
    let keys = map.keys();
    let values = map.values();
    assert_eq!(
        entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
        keys
    );
    assert_eq!(
        entries.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
        values
    );
}
