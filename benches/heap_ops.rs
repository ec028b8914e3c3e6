//! Operation benchmarks across all heap variants and the splay tree
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench heap_ops
//! cargo bench --bench heap_ops -- dijkstra
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meldable_heaps::fibonacci::FibonacciHeap;
use meldable_heaps::leftist::LeftistHeap;
use meldable_heaps::pairing::PairingHeap;
use meldable_heaps::skew::SkewHeap;
use meldable_heaps::{MeldableHeap, NodeRef, SplayTree};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 16
    }
}

fn random_keys(n: usize, seed: u64) -> Vec<u32> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| (rng.next() % 1_000_000) as u32).collect()
}

/// Sparse random graph as adjacency lists of (target, weight)
fn synthetic_graph(nodes: usize, degree: usize, seed: u64) -> Vec<Vec<(usize, u32)>> {
    let mut rng = Lcg::new(seed);
    (0..nodes)
        .map(|_| {
            (0..degree)
                .map(|_| ((rng.next() as usize) % nodes, (rng.next() % 100 + 1) as u32))
                .collect()
        })
        .collect()
}

fn heap_sort<H: MeldableHeap<u32>>(keys: &[u32]) -> u64 {
    let mut heap = H::new();
    for &k in keys {
        heap.insert(k);
    }
    let mut checksum = 0u64;
    while let Ok(k) = heap.extract_min() {
        checksum = checksum.wrapping_add(k as u64);
    }
    checksum
}

/// Dijkstra from node 0, driven by decrease_key
fn dijkstra<H: MeldableHeap<(u32, usize)>>(graph: &[Vec<(usize, u32)>]) -> u64 {
    let mut dist = vec![u32::MAX; graph.len()];
    let mut handles: Vec<Option<NodeRef>> = vec![None; graph.len()];
    let mut heap = H::new();

    dist[0] = 0;
    handles[0] = Some(heap.insert((0, 0)));
    while let Ok((d, node)) = heap.extract_min() {
        handles[node] = None;
        for &(next, weight) in &graph[node] {
            let candidate = d + weight;
            if candidate >= dist[next] {
                continue;
            }
            dist[next] = candidate;
            match handles[next] {
                Some(handle) => {
                    let _ = heap.decrease_key(&handle, (candidate, next));
                }
                None => handles[next] = Some(heap.insert((candidate, next))),
            }
        }
    }
    dist.iter().filter(|&&d| d != u32::MAX).map(|&d| d as u64).sum()
}

fn merge_chunks<H: MeldableHeap<u32>>(keys: &[u32]) -> usize {
    let mut total = H::new();
    for chunk in keys.chunks(64) {
        let mut part = H::new();
        for &k in chunk {
            part.insert(k);
        }
        total.merge(part);
    }
    total.len()
}

fn benchmark_insert_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_extract");
    for size in SIZES {
        let keys = random_keys(size, 7);
        group.bench_with_input(BenchmarkId::new("fibonacci", size), &keys, |b, k| {
            b.iter(|| black_box(heap_sort::<FibonacciHeap<u32>>(k)))
        });
        group.bench_with_input(BenchmarkId::new("pairing", size), &keys, |b, k| {
            b.iter(|| black_box(heap_sort::<PairingHeap<u32>>(k)))
        });
        group.bench_with_input(BenchmarkId::new("skew", size), &keys, |b, k| {
            b.iter(|| black_box(heap_sort::<SkewHeap<u32>>(k)))
        });
        group.bench_with_input(BenchmarkId::new("leftist", size), &keys, |b, k| {
            b.iter(|| black_box(heap_sort::<LeftistHeap<u32>>(k)))
        });
    }
    group.finish();
}

fn benchmark_dijkstra(c: &mut Criterion) {
    let mut group = c.benchmark_group("dijkstra");
    for nodes in [1_000, 10_000] {
        let graph = synthetic_graph(nodes, 8, 11);
        group.bench_with_input(BenchmarkId::new("fibonacci", nodes), &graph, |b, g| {
            b.iter(|| black_box(dijkstra::<FibonacciHeap<(u32, usize)>>(g)))
        });
        group.bench_with_input(BenchmarkId::new("pairing", nodes), &graph, |b, g| {
            b.iter(|| black_box(dijkstra::<PairingHeap<(u32, usize)>>(g)))
        });
        group.bench_with_input(BenchmarkId::new("skew", nodes), &graph, |b, g| {
            b.iter(|| black_box(dijkstra::<SkewHeap<(u32, usize)>>(g)))
        });
        group.bench_with_input(BenchmarkId::new("leftist", nodes), &graph, |b, g| {
            b.iter(|| black_box(dijkstra::<LeftistHeap<(u32, usize)>>(g)))
        });
    }
    group.finish();
}

fn benchmark_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let keys = random_keys(10_000, 3);
    group.bench_function("fibonacci", |b| b.iter(|| black_box(merge_chunks::<FibonacciHeap<u32>>(&keys))));
    group.bench_function("pairing", |b| b.iter(|| black_box(merge_chunks::<PairingHeap<u32>>(&keys))));
    group.bench_function("skew", |b| b.iter(|| black_box(merge_chunks::<SkewHeap<u32>>(&keys))));
    group.bench_function("leftist", |b| b.iter(|| black_box(merge_chunks::<LeftistHeap<u32>>(&keys))));
    group.finish();
}

fn benchmark_splay(c: &mut Criterion) {
    let mut group = c.benchmark_group("splay");
    for size in SIZES {
        let keys = random_keys(size, 5);
        group.bench_with_input(BenchmarkId::new("random_access", size), &keys, |b, k| {
            b.iter(|| {
                let mut tree: SplayTree<u32> = k.iter().copied().collect();
                let hits = k.iter().rev().filter(|key| tree.search(key)).count();
                black_box((hits, tree.rotations()))
            })
        });
        group.bench_with_input(BenchmarkId::new("sequential_access", size), &size, |b, &n| {
            b.iter(|| {
                let mut tree: SplayTree<usize> = (0..n).collect();
                for key in 0..n {
                    tree.search(&key);
                }
                black_box(tree.rotations())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_insert_extract,
    benchmark_dijkstra,
    benchmark_merge,
    benchmark_splay,
);

criterion_main!(benches);
