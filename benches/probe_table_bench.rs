use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use probe_table::{Djb2, ProbeTable, StdStrategy};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    let keys: Vec<String> = lcg(1).take(10_000).map(key).collect();
    c.bench_function("probe_table_insert_10k", |b| {
        b.iter_batched(
            || keys.clone(),
            |keys| {
                let mut m: ProbeTable<String, u64> = ProbeTable::new();
                for (i, k) in keys.into_iter().enumerate() {
                    let _ = m.insert(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("hashbrown_insert_10k", |b| {
        b.iter_batched(
            || keys.clone(),
            |keys| {
                let mut m: hashbrown::HashMap<String, u64> = hashbrown::HashMap::new();
                for (i, k) in keys.into_iter().enumerate() {
                    m.insert(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("probe_table_get_hit", |b| {
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        let m: ProbeTable<String, u64> = keys.iter().cloned().zip(0..).collect();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k.as_str()));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("probe_table_get_miss", |b| {
        let m: ProbeTable<String, u64> = lcg(11).take(10_000).map(key).zip(0..).collect();
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(k.as_str()));
        })
    });
}

// Remove/insert churn at a steady size; exercises tombstone reuse and
// in-place rehashing.
fn bench_churn(c: &mut Criterion) {
    c.bench_function("probe_table_churn", |b| {
        let mut m: ProbeTable<u64, u64> = ProbeTable::with_capacity(1_000);
        let mut next = 0u64;
        for _ in 0..1_000 {
            let _ = m.insert(next, next);
            next += 1;
        }
        b.iter(|| {
            black_box(m.remove(&(next - 1_000)));
            let _ = m.insert(next, next);
            next += 1;
        })
    });
}

fn bench_word_count(c: &mut Criterion) {
    let words = ["the", "cat", "sat", "on", "mat", "and", "a", "dog", "ran", "off"];
    let text: String = lcg(3)
        .take(50_000)
        .map(|x| words[(x >> 33) as usize % words.len()])
        .collect::<Vec<_>>()
        .join(" ");
    c.bench_function("word_count_djb2_50k", |b| {
        b.iter(|| {
            let mut m: ProbeTable<&str, u64, StdStrategy<Djb2>> = ProbeTable::default();
            for w in text.split_whitespace() {
                *m.entry(w) += 1;
            }
            black_box(m.len())
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_miss, bench_churn, bench_word_count
}
criterion_main!(benches);
