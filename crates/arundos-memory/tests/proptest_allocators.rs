//! Property tests for the arena allocators.
//!
//! Random allocate/release sequences are replayed against each allocator and
//! the byte accounting, alignment and non-overlap guarantees are checked after
//! every step.

use arundos_memory::base;
use arundos_memory::prelude::*;
use proptest::prelude::*;
use std::ptr::NonNull;

/// Operations replayed against an allocator.
#[derive(Debug, Clone)]
enum AllocOp {
    Allocate { size: usize, alignment_shift: u32 },
    Release(usize),
}

fn alloc_op_strategy() -> impl Strategy<Value = AllocOp> {
    prop_oneof![
        3 => (1..96usize, 0..7u32).prop_map(|(size, alignment_shift)| AllocOp::Allocate {
            size,
            alignment_shift,
        }),
        2 => (0..64usize).prop_map(AllocOp::Release),
    ]
}

fn ranges_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.0 + b.1 && b.0 < a.0 + a.1
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn free_list_accounting_holds(ops in prop::collection::vec(alloc_op_strategy(), 1..80)) {
        let manager = MemoryManager::new(4096).unwrap();
        let mut allocator = FreeListAllocator::new(manager.carve(2048).unwrap()).unwrap();
        let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

        for op in ops {
            match op {
                AllocOp::Allocate { size, alignment_shift } => {
                    let alignment = 1usize << alignment_shift;
                    let before = allocator.memory_in_use();
                    match allocator.allocate(size, alignment) {
                        Ok(ptr) => {
                            let address = ptr.as_ptr() as usize;
                            prop_assert_eq!(address % alignment, 0);
                            for &(other, other_size) in &live {
                                prop_assert!(!ranges_overlap(
                                    (address, size),
                                    (other.as_ptr() as usize, other_size)
                                ));
                            }
                            live.push((ptr, size));
                        }
                        Err(err) => {
                            prop_assert!(
                                matches!(err, MemoryError::OutOfMemory { .. }),
                                "unexpected error {:?}",
                                err
                            );
                            prop_assert_eq!(allocator.memory_in_use(), before);
                        }
                    }
                }
                AllocOp::Release(index) => {
                    if !live.is_empty() {
                        let (ptr, _) = live.swap_remove(index % live.len());
                        unsafe { allocator.deallocate(ptr).unwrap() };
                    }
                }
            }

            let free: usize = allocator.free_chunks().iter().map(|&(_, size)| size).sum();
            prop_assert_eq!(free + allocator.memory_in_use(), allocator.memory_size());
        }

        for (ptr, _) in live {
            unsafe { allocator.deallocate(ptr).unwrap() };
        }
        prop_assert_eq!(allocator.memory_in_use(), 0);
    }

    #[test]
    fn pool_in_use_tracks_live_chunks(ops in prop::collection::vec(alloc_op_strategy(), 1..80)) {
        let manager = MemoryManager::new(1024).unwrap();
        let mut pool = PoolAllocator::new(manager.carve(512).unwrap(), 32, 8).unwrap();
        let mut live: Vec<NonNull<u8>> = Vec::new();

        for op in ops {
            match op {
                AllocOp::Allocate { .. } => match pool.allocate(32, 8) {
                    Ok(ptr) => {
                        prop_assert!(!live.contains(&ptr));
                        live.push(ptr);
                    }
                    Err(err) => {
                        prop_assert!(matches!(err, MemoryError::OutOfMemory { .. }), "expected OutOfMemory, got {:?}", err);
                        prop_assert_eq!(live.len(), pool.chunk_count());
                    }
                },
                AllocOp::Release(index) => {
                    if !live.is_empty() {
                        let ptr = live.swap_remove(index % live.len());
                        unsafe { pool.deallocate(ptr).unwrap() };
                    }
                }
            }
            prop_assert_eq!(pool.memory_in_use(), live.len() * pool.aligned_chunk_size());
            prop_assert_eq!(pool.free_chunk_count(), pool.chunk_count() - live.len());
        }

        pool.reset();
    }

    #[test]
    fn stack_marker_restores_in_use(
        before in prop::collection::vec(1..64usize, 0..8),
        after in prop::collection::vec(1..64usize, 0..8),
    ) {
        let manager = MemoryManager::new(2048).unwrap();
        let mut stack = StackAllocator::new(manager.carve(2048).unwrap());
        for size in before {
            stack.allocate(size, 8).unwrap();
        }
        let marker = stack.marker();
        let in_use = stack.memory_in_use();
        for size in after {
            stack.allocate(size, 4).unwrap();
        }
        stack.deallocate_to_marker(marker);
        prop_assert_eq!(stack.memory_in_use(), in_use);
        stack.clear_stack();
    }

    #[test]
    fn aligned_address_is_smallest_aligned_not_below(address in 0..usize::MAX / 2, shift in 0..12u32) {
        let alignment = 1usize << shift;
        let aligned = base::aligned_address(address, alignment).unwrap();
        prop_assert_eq!(aligned % alignment, 0);
        prop_assert!(aligned >= address);
        prop_assert!(aligned - address < alignment);
        prop_assert_eq!(base::alignment_offset(address, alignment).unwrap(), aligned - address);
    }
}
