use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipfence::{Backend, RangeStore, SharedRangeStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

// Random blocks shaped like a real blocklist: mostly /24-/32, a few wide ones
fn generate_blocks(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let addr: u32 = rng.random();
            let prefix: u8 = match rng.random_range(0..100) {
                0..=4 => rng.random_range(8..16),
                5..=29 => rng.random_range(16..24),
                _ => rng.random_range(24..=32),
            };
            format!("{}/{}", ipfence::cidr::format_ipv4(addr), prefix)
        })
        .collect()
}

fn generate_queries(count: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random()).collect()
}

fn bench_check_addr(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_addr");
    let queries = generate_queries(10_000, 7);

    for size in [1_000usize, 10_000, 100_000] {
        let blocks = generate_blocks(size, 42);

        for backend in [Backend::Intervals, Backend::Trie] {
            let mut store = RangeStore::with_backend(backend);
            for block in &blocks {
                store.ingest(block).unwrap();
            }
            store.build();

            group.throughput(Throughput::Elements(queries.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", backend).to_lowercase(), size),
                &queries,
                |b, queries| {
                    b.iter(|| {
                        let mut hits = 0usize;
                        for &addr in queries {
                            hits += store.check_addr(black_box(addr)) as usize;
                        }
                        black_box(hits);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_check_ip_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_ip_text");

    let mut store = RangeStore::new();
    for block in generate_blocks(10_000, 42) {
        store.ingest(&block).unwrap();
    }
    store.build();
    let shared: SharedRangeStore = store.clone().into_shared();

    let queries: Vec<String> = generate_queries(1_000, 9)
        .into_iter()
        .map(ipfence::cidr::format_ipv4)
        .collect();

    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("exclusive", |b| {
        b.iter(|| {
            for ip in &queries {
                black_box(store.check_ip(black_box(ip)).unwrap());
            }
        });
    });
    group.bench_function("shared", |b| {
        b.iter(|| {
            for ip in &queries {
                black_box(shared.check_ip(black_box(ip)).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_check_addr, bench_check_ip_text);
criterion_main!(benches);
