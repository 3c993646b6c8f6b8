use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geecache::consistenthash::HashRing;
use geecache::lru::LruCache;
use geecache::{BoxError, ByteView, Registry};

fn source(key: &str) -> Result<Vec<u8>, BoxError> {
    Ok(vec![b'x'; 64 + key.len()])
}

fn bench_group_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_hit", |b| {
        let registry = Registry::new();
        let scores = registry.new_group("bench", 0, source);
        let keys: Vec<String> = (0..100).map(|i| format!("key{}", i)).collect();

        // Warm the cache
        for key in &keys {
            scores.get(key).unwrap();
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(scores.get(&keys[counter % 100]).unwrap());
            counter += 1;
        });
    });

    group.bench_function("get_miss_evicting", |b| {
        let registry = Registry::new();
        // Roughly ten entries fit.
        let scores = registry.new_group("bench", 10 * 72, source);

        let mut counter = 0u64;
        b.iter(|| {
            black_box(scores.get(&format!("key{}", counter % 1000)).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_lru_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_1kb_evicting", |b| {
        let mut lru = LruCache::new(64 * 1024);
        let value = ByteView::from(vec![b'x'; 1024]);

        let mut counter = 0u64;
        b.iter(|| {
            lru.add(format!("key{}", counter), value.clone());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_ring_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_get");
    group.throughput(Throughput::Elements(1));

    for replicas in [10, 50, 200] {
        let mut ring = HashRing::new(replicas);
        ring.add((0..16).map(|i| format!("10.0.0.{}:8001", i)));

        group.bench_with_input(BenchmarkId::from_parameter(replicas), &ring, |b, ring| {
            let mut counter = 0u64;
            b.iter(|| {
                black_box(ring.get(&format!("key{}", counter)));
                counter += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_group_hit, bench_lru_add, bench_ring_get);
criterion_main!(benches);
