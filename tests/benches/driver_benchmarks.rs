//! # Scatter/Gather Driver Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Codec | Encode/decode of base and data frames |
//! | Cache | Lookup hit and miss on a full cache, insert with eviction |
//! | Driver | Quadrant rewrites and cached reads against the in-memory service |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use sg_driver::domain::BLOCK_SIZE;
use sg_driver::{
    BlockCache, BlockIdentity, Operation, Packet, ScatterGatherApi, QUADRANT_SIZE,
};
use sg_tests::fixtures::driver_with_capacity;

// ============================================================================
// Packet Codec
// ============================================================================

fn bench_packet_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet-codec");

    let mut payload = [0u8; BLOCK_SIZE];
    rand::thread_rng().fill(&mut payload[..]);
    let base = Packet::new(0x11, 0x22, 0x33, Operation::ObtainBlock, 7, 9);
    let data = base.clone().with_payload(&payload);
    let base_bytes = base.encode().unwrap();
    let data_bytes = data.encode().unwrap();

    group.bench_function("encode_base", |b| b.iter(|| black_box(base.encode().unwrap())));
    group.bench_function("encode_data", |b| b.iter(|| black_box(data.encode().unwrap())));
    group.bench_function("decode_base", |b| {
        b.iter(|| black_box(Packet::decode(&base_bytes, false).unwrap()))
    });
    group.bench_function("decode_data", |b| {
        b.iter(|| black_box(Packet::decode(&data_bytes, true).unwrap()))
    });

    group.finish();
}

// ============================================================================
// Block Cache
// ============================================================================

fn bench_block_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-cache");
    let block = [0xABu8; BLOCK_SIZE];

    for capacity in [8usize, 32, 128] {
        let mut cache = BlockCache::new(capacity).unwrap();
        for n in 0..capacity as u64 {
            cache
                .insert_or_update(BlockIdentity::new(1 + n % 4, n + 1), &block)
                .unwrap();
        }
        let last = capacity as u64;

        group.bench_with_input(BenchmarkId::new("lookup_hit", capacity), &capacity, |b, _| {
            b.iter(|| black_box(cache.lookup(BlockIdentity::new(1 + (last - 1) % 4, last)).is_some()))
        });
        group.bench_with_input(BenchmarkId::new("lookup_miss", capacity), &capacity, |b, _| {
            b.iter(|| black_box(cache.lookup(BlockIdentity::new(99, 99_999)).is_none()))
        });

        let mut next = last + 1;
        group.bench_with_input(BenchmarkId::new("insert_evict", capacity), &capacity, |b, _| {
            b.iter(|| {
                next += 1;
                cache
                    .insert_or_update(BlockIdentity::new(5, next), &block)
                    .unwrap()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Driver
// ============================================================================

fn bench_driver_io(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver");
    group.throughput(Throughput::Bytes(QUADRANT_SIZE as u64));
    let quadrant = [0x5Au8; QUADRANT_SIZE];

    group.bench_function("rewrite_quadrant", |b| {
        let mut driver = driver_with_capacity(32, 1);
        let fh = driver.open("bench.dat").unwrap();
        driver.write(fh, &quadrant).unwrap();
        b.iter(|| {
            driver.seek(fh, 0).unwrap();
            black_box(driver.write(fh, &quadrant).unwrap())
        })
    });

    group.bench_function("read_cached_quadrant", |b| {
        let mut driver = driver_with_capacity(32, 2);
        let fh = driver.open("bench.dat").unwrap();
        for _ in 0..4 {
            driver.write(fh, &quadrant).unwrap();
        }
        let mut buf = [0u8; QUADRANT_SIZE];
        b.iter(|| {
            driver.seek(fh, 0).unwrap();
            black_box(driver.read(fh, &mut buf).unwrap())
        })
    });

    group.bench_function("read_evicted_quadrant", |b| {
        let mut driver = driver_with_capacity(1, 3);
        let fh = driver.open("bench.dat").unwrap();
        driver.write(fh, &[0x11u8; 2 * BLOCK_SIZE]).unwrap();
        let mut buf = [0u8; QUADRANT_SIZE];
        let mut index = 0u64;
        b.iter(|| {
            // Alternate blocks so every read misses a one-entry cache
            index ^= 1;
            driver.seek(fh, index * BLOCK_SIZE as u64).unwrap();
            black_box(driver.read(fh, &mut buf).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_packet_codec, bench_block_cache, bench_driver_io);

criterion_main!(benches);
