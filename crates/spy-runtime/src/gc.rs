//! Garbage-collected heap for the SPy runtime
//!
//! Every runtime object (managed-pointer storage, strings) lives in a block
//! owned by a [`GcHeap`]. Callers only ever hold a [`GcRef`], a small index
//! into the heap's block table, so the collector keeps full knowledge of
//! what is allocated without scanning raw addresses.
//!
//! Block indices are handed out monotonically and never reused. A handle
//! whose block has been dropped therefore reports [`RuntimeError::DanglingRef`]
//! instead of silently aliasing a newer allocation.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{LazyLock, Mutex, PoisonError};

use dashmap::DashMap;

use crate::config::{HeapConfig, runtime_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::panic::OrFatal;

/// Opaque reference to a block of GC memory
///
/// Index 0 is reserved as the null reference and is never backed by a block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcRef {
    pub index: u32,
}

impl GcRef {
    pub const NULL: GcRef = GcRef { index: 0 };

    pub fn is_null(self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for GcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcRef({})", self.index)
    }
}

/// Allocation counters for a heap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of allocations ever served.
    pub allocations: u64,
    /// Blocks currently held by the heap.
    pub live_blocks: usize,
    /// Bytes currently held by the heap.
    pub bytes_in_use: usize,
    /// High-water mark of `bytes_in_use`.
    pub peak_bytes: usize,
}

/// Block table backing every [`GcRef`]
pub struct GcHeap {
    blocks: DashMap<u32, Box<[u8]>>,
    next_index: AtomicU32,
    max_bytes: Option<usize>,
    stats: Mutex<HeapStats>,
}

impl GcHeap {
    /// Create an unlimited heap.
    pub fn new() -> Self {
        Self::with_config(&HeapConfig::default())
    }

    pub fn with_config(config: &HeapConfig) -> Self {
        Self {
            blocks: DashMap::new(),
            next_index: AtomicU32::new(1), // 0 is GcRef::NULL
            max_bytes: config.max_bytes,
            stats: Mutex::new(HeapStats::default()),
        }
    }

    /// Allocate `size` zeroed bytes.
    ///
    /// Fails with [`RuntimeError::OutOfMemory`] when the configured limit
    /// would be exceeded. A zero-byte request yields a live, empty block.
    pub fn try_alloc(&self, size: usize) -> RuntimeResult<GcRef> {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(limit) = self.max_bytes {
            let fits = stats
                .bytes_in_use
                .checked_add(size)
                .is_some_and(|total| total <= limit);
            if !fits {
                return Err(RuntimeError::OutOfMemory {
                    requested: size,
                    in_use: stats.bytes_in_use,
                    limit,
                });
            }
        }

        // The counter saturates once the index space is spent; it never wraps
        // back onto a live block.
        let index = self
            .next_index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| i.checked_add(1))
            .map_err(|_| RuntimeError::OutOfMemory {
                requested: size,
                in_use: stats.bytes_in_use,
                limit: self.max_bytes.unwrap_or(usize::MAX),
            })?;
        self.blocks.insert(index, vec![0u8; size].into_boxed_slice());

        stats.allocations += 1;
        stats.live_blocks += 1;
        stats.bytes_in_use += size;
        stats.peak_bytes = stats.peak_bytes.max(stats.bytes_in_use);

        tracing::trace!(index, size, "gc alloc");
        Ok(GcRef { index })
    }

    /// Allocate `size` zeroed bytes, terminating on failure.
    pub fn alloc(&self, size: usize) -> GcRef {
        self.try_alloc(size).or_fatal()
    }

    /// Size in bytes of the block behind `gc`, if it is live.
    pub fn block_size(&self, gc: GcRef) -> Option<usize> {
        if gc.is_null() {
            return None;
        }
        self.blocks.get(&gc.index).map(|block| block.len())
    }

    pub fn contains(&self, gc: GcRef) -> bool {
        !gc.is_null() && self.blocks.contains_key(&gc.index)
    }

    /// Run `f` over `len` bytes of the block starting at `offset`.
    pub fn try_with_bytes<R>(
        &self,
        gc: GcRef,
        offset: usize,
        len: usize,
        f: impl FnOnce(&[u8]) -> R,
    ) -> RuntimeResult<R> {
        if gc.is_null() {
            return Err(RuntimeError::DanglingRef { gc });
        }
        let block = self
            .blocks
            .get(&gc.index)
            .ok_or(RuntimeError::DanglingRef { gc })?;
        let range = block_range(gc, block.len(), offset, len)?;
        Ok(f(&block[range]))
    }

    /// Run `f` over `len` mutable bytes of the block starting at `offset`.
    pub fn try_with_bytes_mut<R>(
        &self,
        gc: GcRef,
        offset: usize,
        len: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> RuntimeResult<R> {
        if gc.is_null() {
            return Err(RuntimeError::DanglingRef { gc });
        }
        let mut block = self
            .blocks
            .get_mut(&gc.index)
            .ok_or(RuntimeError::DanglingRef { gc })?;
        let range = block_range(gc, block.len(), offset, len)?;
        Ok(f(&mut block[range]))
    }

    pub fn with_bytes<R>(
        &self,
        gc: GcRef,
        offset: usize,
        len: usize,
        f: impl FnOnce(&[u8]) -> R,
    ) -> R {
        self.try_with_bytes(gc, offset, len, f).or_fatal()
    }

    pub fn with_bytes_mut<R>(
        &self,
        gc: GcRef,
        offset: usize,
        len: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        self.try_with_bytes_mut(gc, offset, len, f).or_fatal()
    }

    /// Copy bytes from one block into another (or the same) block.
    ///
    /// The source is copied out first, so `src` and `dst` may name the same
    /// block without holding two guards on one table shard.
    pub fn copy_within_heap(
        &self,
        src: GcRef,
        src_offset: usize,
        dst: GcRef,
        dst_offset: usize,
        len: usize,
    ) {
        let bytes = self.with_bytes(src, src_offset, len, <[u8]>::to_vec);
        self.with_bytes_mut(dst, dst_offset, len, |out| out.copy_from_slice(&bytes));
    }

    pub fn stats(&self) -> HeapStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every block. Outstanding handles become dangling.
    pub fn clear(&self) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(
            live_blocks = stats.live_blocks,
            bytes = stats.bytes_in_use,
            "gc heap cleared"
        );
        self.blocks.clear();
        stats.live_blocks = 0;
        stats.bytes_in_use = 0;
    }
}

impl Default for GcHeap {
    fn default() -> Self {
        Self::new()
    }
}

fn block_range(
    gc: GcRef,
    size: usize,
    offset: usize,
    len: usize,
) -> RuntimeResult<std::ops::Range<usize>> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(offset..end),
        _ => Err(RuntimeError::BlockFault {
            gc,
            offset,
            len,
            size,
        }),
    }
}

/// Process-wide heap instance
static GC_HEAP: LazyLock<GcHeap> = LazyLock::new(|| GcHeap::with_config(&runtime_config().heap));

/// The heap that generated code allocates from.
pub fn gc_heap() -> &'static GcHeap {
    &GC_HEAP
}

/// Allocate `size` zeroed bytes from the process heap.
pub fn gc_alloc_mem(size: usize) -> GcRef {
    gc_heap().alloc(size)
}
