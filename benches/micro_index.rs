//! Micro benchmarks for the name index, the quadtree and the buffer pool.
#![forbid(unsafe_code)]
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use geodex::cache::BufferPool;
use geodex::index::{HashIndex, NameEntry, QuadTree, DEFAULT_HASH_SLOTS, DEFAULT_LOAD_LIMIT};
use geodex::{GeoPoint, Locator, Rect};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const RECORDS: u64 = 16_384;
const LOOKUP_SAMPLES: usize = 4_096;
// Virginia, in arc-seconds
const WORLD: Rect = Rect::new(-300_600, -271_800, 131_400, 142_200);

fn random_points(count: u64, seed: u64) -> Vec<GeoPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            GeoPoint::new(
                rng.gen_range(WORLD.x_min..=WORLD.x_max),
                rng.gen_range(WORLD.y_min..=WORLD.y_max),
            )
        })
        .collect()
}

fn keys(count: u64) -> Vec<String> {
    (0..count).map(|i| format!("Feature {i}:VA")).collect()
}

fn filled_tree(points: &[GeoPoint], capacity: usize) -> QuadTree {
    let mut tree = QuadTree::new(WORLD, capacity).expect("tree");
    for (offset, point) in points.iter().enumerate() {
        tree.insert(*point, Locator(offset as u64));
    }
    tree
}

fn micro_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro/hash");
    group.sample_size(30);
    let names = keys(RECORDS);

    group.throughput(Throughput::Elements(RECORDS));
    group.bench_function("insert_with_rehash", |b| {
        b.iter_batched(
            || HashIndex::new(DEFAULT_HASH_SLOTS, DEFAULT_LOAD_LIMIT).expect("index"),
            |mut index| {
                for (offset, key) in names.iter().enumerate() {
                    index.insert(NameEntry::new(key.as_str(), Locator(offset as u64)));
                }
                black_box(index.slot_count());
            },
            BatchSize::SmallInput,
        );
    });

    let mut index = HashIndex::new(DEFAULT_HASH_SLOTS, DEFAULT_LOAD_LIMIT).expect("index");
    for (offset, key) in names.iter().enumerate() {
        index.insert(NameEntry::new(key.as_str(), Locator(offset as u64)));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let probes: Vec<&str> = (0..LOOKUP_SAMPLES)
        .map(|_| names[rng.gen_range(0..names.len())].as_str())
        .collect();
    group.throughput(Throughput::Elements(LOOKUP_SAMPLES as u64));
    group.bench_function("find", |b| {
        b.iter(|| {
            for key in &probes {
                black_box(index.find(key));
            }
        })
    });
    group.finish();
}

fn micro_quadtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro/quadtree");
    group.sample_size(30);
    let points = random_points(RECORDS, 0xBEEF_F00D);

    for capacity in [1usize, 4, 16] {
        group.throughput(Throughput::Elements(RECORDS));
        group.bench_function(format!("insert_cap{capacity}"), |b| {
            b.iter(|| black_box(filled_tree(&points, capacity).height()))
        });
    }

    let tree = filled_tree(&points, 4);
    group.throughput(Throughput::Elements(LOOKUP_SAMPLES as u64));
    group.bench_function("find", |b| {
        b.iter(|| {
            for point in points.iter().take(LOOKUP_SAMPLES) {
                black_box(tree.find(*point));
            }
        })
    });

    let centers = random_points(256, 0xC0FFEE);
    group.throughput(Throughput::Elements(centers.len() as u64));
    group.bench_function("range_query_15min", |b| {
        b.iter(|| {
            for center in &centers {
                black_box(tree.query_rect(&Rect::around(*center, 900, 900)).len());
            }
        })
    });
    group.finish();
}

fn micro_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro/pool");
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let accesses: Vec<u64> = (0..LOOKUP_SAMPLES).map(|_| rng.gen_range(0..40)).collect();
    group.throughput(Throughput::Elements(accesses.len() as u64));
    group.bench_function("insert_promote", |b| {
        b.iter_batched(
            || BufferPool::<u64>::new(15).expect("pool"),
            |mut pool| {
                for item in &accesses {
                    black_box(pool.find(|cached| cached == item).is_some());
                    pool.insert(*item);
                }
                black_box(pool.stats());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, micro_hash, micro_quadtree, micro_pool);
criterion_main!(benches);
