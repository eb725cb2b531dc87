use core::hash::BuildHasher;
use core::hint::black_box;

use chain_hash::HashMap as ChainHashMap;
use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashMap as HashbrownHashMap;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use siphasher::sip::SipHasher;

#[derive(Clone, Default)]
struct SipHashBuilder;

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

trait TestKey: Clone + core::hash::Hash + Eq {
    fn new(key: u64) -> Self;
}

impl TestKey for u64 {
    fn new(key: u64) -> Self {
        black_box(key)
    }
}

impl TestKey for String {
    fn new(key: u64) -> Self {
        black_box(format!("key_{:016X}", key))
    }
}

const SIZES: &[usize] = &[(1 << 10), (1 << 12), (1 << 14), (1 << 16)];

fn random_keys<K: TestKey>(count: usize) -> Vec<K> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| K::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn bench_insert_random<K: TestKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_random_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES.iter() {
        let keys = random_keys::<K>(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut keys = keys.clone();
                    keys.shuffle(&mut SmallRng::from_os_rng());
                    keys
                },
                |keys| {
                    let mut map = ChainHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.put(Some(key), i as u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut keys = keys.clone();
                    keys.shuffle(&mut SmallRng::from_os_rng());
                    keys
                },
                |keys| {
                    let mut map = HashbrownHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i as u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("std/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map =
                        std::collections::HashMap::<K, u64, _>::with_hasher(SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i as u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_put_all<K: TestKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("put_all_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES.iter() {
        let pairs: Vec<(Option<K>, u64)> = random_keys::<K>(*size)
            .into_iter()
            .enumerate()
            .map(|(i, k)| (Some(k), i as u64))
            .collect();
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter_batched(
                || pairs.clone(),
                |pairs| {
                    let mut map = ChainHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
                    map.put_all(pairs);
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit_miss<K: TestKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_hit_miss_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES.iter() {
        let present = random_keys::<K>(*size);
        let absent = random_keys::<K>(*size);

        let mut chain = ChainHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
        let mut brown = HashbrownHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
        for (i, key) in present.iter().enumerate() {
            chain.put(Some(key.clone()), i as u64);
            brown.insert(key.clone(), i as u64);
        }

        group.throughput(Throughput::Elements(2 * *size as u64));

        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter(|| {
                for (hit, miss) in present.iter().zip(absent.iter()) {
                    black_box(chain.get(Some(hit)));
                    black_box(chain.get(Some(miss)));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for (hit, miss) in present.iter().zip(absent.iter()) {
                    black_box(brown.get(hit));
                    black_box(brown.get(miss));
                }
            })
        });
    }

    group.finish();
}

fn bench_remove<K: TestKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("remove_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES.iter() {
        let keys = random_keys::<K>(*size);
        let mut chain = ChainHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
        let mut brown = HashbrownHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
        for (i, key) in keys.iter().enumerate() {
            chain.put(Some(key.clone()), i as u64);
            brown.insert(key.clone(), i as u64);
        }

        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter_batched(
                || chain.clone(),
                |mut map| {
                    for key in keys.iter() {
                        black_box(map.remove(Some(key)));
                    }
                    black_box(map)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || brown.clone(),
                |mut map| {
                    for key in keys.iter() {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_snapshots<K: TestKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("snapshots_{}", core::any::type_name::<K>()));

    for size in SIZES.iter() {
        let mut map = ChainHashMap::<K, u64, _>::with_hasher(SipHashBuilder);
        for (i, key) in random_keys::<K>(*size).into_iter().enumerate() {
            map.put(Some(key), i as u64);
        }

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("entries/{size}"), |b| {
            b.iter(|| black_box(map.entries()))
        });
        group.bench_function(format!("iter/{size}"), |b| {
            b.iter(|| {
                for entry in map.iter() {
                    black_box(entry);
                }
            })
        });
        group.bench_function(format!("contains_value/{size}"), |b| {
            b.iter(|| black_box(map.contains_value(&u64::MAX)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<u64>,
    bench_insert_random::<String>,
    bench_put_all::<u64>,
    bench_find_hit_miss::<u64>,
    bench_find_hit_miss::<String>,
    bench_remove::<u64>,
    bench_snapshots::<u64>,
);
criterion_main!(benches);
