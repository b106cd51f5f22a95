//! Allocator throughput benchmarks.
//!
//! Compares the arena allocators against each other on a tight
//! allocate-then-release loop of small objects.
//!
//! Run with: `cargo bench --bench allocator_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use arundos_memory::prelude::*;

const ARENA_SIZE: usize = 1 << 20;

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

fn bench_stack_allocate(c: &mut Criterion) {
    let manager = MemoryManager::new(ARENA_SIZE).unwrap();
    let mut stack = StackAllocator::new(manager.carve(ARENA_SIZE).unwrap());

    c.bench_function("stack_allocate_1k_x_32b", |b| {
        b.iter(|| {
            let marker = stack.marker();
            for _ in 0..1000 {
                black_box(stack.allocate(32, 8).unwrap());
            }
            stack.deallocate_to_marker(marker);
        });
    });
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

fn bench_pool_allocate_release(c: &mut Criterion) {
    let manager = MemoryManager::new(ARENA_SIZE).unwrap();
    let mut pool = PoolAllocator::new(manager.carve(ARENA_SIZE).unwrap(), 32, 8).unwrap();
    let mut live = Vec::with_capacity(1000);

    c.bench_function("pool_allocate_release_1k", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                live.push(pool.allocate(32, 8).unwrap());
            }
            for ptr in live.drain(..) {
                unsafe { pool.deallocate(ptr).unwrap() };
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Free list -- fragmentation makes first-fit slower as the list grows
// ---------------------------------------------------------------------------

fn bench_free_list_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("free_list_allocate_release");

    for &count in &[10usize, 100, 1000] {
        let manager = MemoryManager::new(ARENA_SIZE).unwrap();
        let mut allocator = FreeListAllocator::new(manager.carve(ARENA_SIZE).unwrap()).unwrap();
        let mut live = Vec::with_capacity(count);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                for i in 0..count {
                    live.push(allocator.allocate(16 + (i % 7) * 8, 8).unwrap());
                }
                for ptr in live.drain(..).rev() {
                    unsafe { allocator.deallocate(ptr).unwrap() };
                }
            });
        });

        allocator.reset();
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_stack_allocate,
    bench_pool_allocate_release,
    bench_free_list_scaling,
);
criterion_main!(benches);
