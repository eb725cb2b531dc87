use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasherDefault;

use chain_hash::HashTable;
use chain_hash::hash::hash_code;
use chain_hash::hash_table::Entry;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: usize,

    /// Initial bucket count
    #[arg(short = 'c', long = "capacity", default_value_t = 8)]
    capacity: usize,

    /// Hash keys with the identity function instead of SipHash
    #[arg(long = "identity")]
    identity: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!(
        "Creating HashTable with {} buckets, inserting {} keys",
        args.capacity, args.count
    );

    let hash_builder = BuildHasherDefault::<DefaultHasher>::default();
    let mut table: HashTable<u64> = HashTable::with_capacity(args.capacity);
    println!(
        "Actual capacity: {} (resize above {})",
        table.capacity(),
        table.threshold()
    );

    let mut resizes = 0;
    for i in 0..args.count {
        let value = i as u64;
        let hash = if args.identity {
            value as u32
        } else {
            hash_code(&hash_builder, &value)
        };

        let capacity = table.capacity();
        match table.entry(Some(hash), |&v| v == value) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }
        if table.capacity() != capacity {
            resizes += 1;
        }
    }

    println!("Inserted {} values into table ({} resizes)", table.len(), resizes);
    table.stats().print();
}
