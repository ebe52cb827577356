// Splice benchmark: repeated small random edits on a large string.
//
// Compares:
// - Node: persistent tree
// - Hybrid: flat below the high mark, tree above it
// - String: flat copy-on-splice baseline

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use trope::{Hybrid, HybridConfig, Node};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const EDITS: usize = 100;

// =============================================================================
// Workload
// =============================================================================

fn random_string(size: usize) -> String {
    let mut rng = StdRng::seed_from_u64(42);
    return (0..size)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect();
}

/// Pre-computed `(offset, count, replacement)` edits so the benchmarks
/// measure splicing only.
fn edits(size: usize) -> Vec<(usize, usize, String)> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut len = size;
    let mut out = Vec::with_capacity(EDITS);
    for _ in 0..EDITS {
        let letter = ((b'a' + rng.gen_range(0..26u8)) as char).to_string();
        let offset = if len == 0 { 0 } else { rng.gen_range(0..len) };
        let diff = (len - offset).min(100);
        let count = if diff > 0 { rng.gen_range(0..diff) } else { 0 };
        out.push((offset, count, letter));
        len = len + 1 - count;
    }
    return out;
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_splice(c: &mut Criterion) {
    let mut group = c.benchmark_group("splice");
    group.throughput(Throughput::Elements(EDITS as u64));

    for size in [1_000, 100_000, 1_000_000] {
        let initial = random_string(size);
        let ops = edits(size);

        group.bench_with_input(BenchmarkId::new("node", size), &size, |b, _| {
            b.iter(|| {
                let mut node = Node::new(initial.clone(), initial.len());
                for (offset, count, r) in &ops {
                    node = node.splice(*offset, *count, &Node::new(r.clone(), r.len()));
                }
                black_box(node)
            });
        });

        group.bench_with_input(BenchmarkId::new("hybrid", size), &size, |b, _| {
            let config = HybridConfig::default();
            b.iter(|| {
                let mut h = Hybrid::new(config, initial.clone(), initial.len());
                for (offset, count, r) in &ops {
                    h = h.splice(*offset, *count, &Hybrid::new(config, r.clone(), r.len()));
                }
                black_box(h)
            });
        });

        group.bench_with_input(BenchmarkId::new("string", size), &size, |b, _| {
            b.iter(|| {
                let mut s = initial.clone();
                for (offset, count, r) in &ops {
                    let mut next = String::with_capacity(s.len() + r.len());
                    next.push_str(&s[..*offset]);
                    next.push_str(r);
                    next.push_str(&s[offset + count..]);
                    s = next;
                }
                black_box(s)
            });
        });
    }

    group.finish();
}

fn bench_slice(c: &mut Criterion) {
    let initial = random_string(1_000_000);
    let mut node = Node::new(initial.clone(), initial.len());
    for (offset, count, r) in edits(initial.len()) {
        node = node.splice(offset, count, &Node::new(r.clone(), r.len()));
    }
    let flattened = node.flatten(32);

    let mut group = c.benchmark_group("slice");
    group.bench_function("edited", |b| {
        b.iter(|| black_box(node.slice(black_box(250_000), 500_000)))
    });
    group.bench_function("flattened", |b| {
        b.iter(|| black_box(flattened.slice(black_box(250_000), 500_000)))
    });
    group.finish();
}

criterion_group!(benches, bench_splice, bench_slice);
criterion_main!(benches);
