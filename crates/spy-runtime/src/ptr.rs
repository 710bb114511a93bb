//! Managed pointers into GC memory
//!
//! A managed pointer is a value-semantic view of a GC block holding an
//! array of `T`. Two representations exist and share one capability set,
//! [`ManagedPtr`]:
//!
//! - [`CheckedPtr`] carries the element count fixed at allocation time and
//!   compares every index against it before touching memory. A violation is
//!   fatal.
//! - [`UncheckedPtr`] carries only the block reference and skips the count
//!   comparison. Out-of-range indices are the caller's responsibility; the
//!   heap still refuses to step outside the block itself, so a stray index
//!   faults instead of corrupting a neighbouring allocation.
//!
//! Both flavours resolve the handle in the heap's block table and range-check
//! the byte access on every load and store. The unchecked flavour is not
//! free: it saves the count comparison and one `usize` per pointer, nothing
//! more.
//!
//! [`Ptr`] picks one of the two at build time (`unchecked-ptr` feature).
//! Copying a pointer never copies the elements it refers to, and equality
//! is identity of the underlying block.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

use crate::error::{RuntimeError, RuntimeResult};
use crate::gc::{GcHeap, GcRef, gc_heap};
use crate::panic::OrFatal;

/// Types a managed pointer may hold: plain data with no padding, no
/// references and a non-zero size.
pub trait Element: Pod {}

impl<T: Pod> Element for T {}

/// Byte size of `n` elements, rejecting zero-sized element types at compile
/// time and overflowing requests at run time.
fn array_bytes<T: Element>(n: usize) -> RuntimeResult<usize> {
    const { assert!(size_of::<T>() != 0, "zero-sized element types are not allowed") };
    n.checked_mul(size_of::<T>())
        .ok_or(RuntimeError::SizeOverflow {
            count: n,
            elem_size: size_of::<T>(),
        })
}

fn read_element<T: Element>(heap: &GcHeap, gc: GcRef, i: usize) -> RuntimeResult<T> {
    let offset = i
        .checked_mul(size_of::<T>())
        .ok_or(RuntimeError::SizeOverflow {
            count: i,
            elem_size: size_of::<T>(),
        })?;
    heap.try_with_bytes(gc, offset, size_of::<T>(), bytemuck::pod_read_unaligned::<T>)
}

fn write_element<T: Element>(heap: &GcHeap, gc: GcRef, i: usize, value: T) -> RuntimeResult<()> {
    let offset = i
        .checked_mul(size_of::<T>())
        .ok_or(RuntimeError::SizeOverflow {
            count: i,
            elem_size: size_of::<T>(),
        })?;
    heap.try_with_bytes_mut(gc, offset, size_of::<T>(), |bytes| {
        bytes.copy_from_slice(bytemuck::bytes_of(&value))
    })
}

/// The operations generated code performs on a managed pointer.
///
/// The `*_in` methods work against an explicit heap; the short forms use
/// the process heap.
pub trait ManagedPtr<T: Element>: Copy {
    /// Allocate room for `n` elements, all zero.
    fn try_alloc_in(heap: &GcHeap, n: usize) -> RuntimeResult<Self>;

    fn try_load_in(self, heap: &GcHeap, i: usize) -> RuntimeResult<T>;

    fn try_store_in(self, heap: &GcHeap, i: usize, value: T) -> RuntimeResult<()>;

    /// The block this pointer refers to.
    fn gc_ref(self) -> GcRef;

    fn alloc_in(heap: &GcHeap, n: usize) -> Self {
        Self::try_alloc_in(heap, n).or_fatal()
    }

    fn load_in(self, heap: &GcHeap, i: usize) -> T {
        self.try_load_in(heap, i).or_fatal()
    }

    fn store_in(self, heap: &GcHeap, i: usize, value: T) {
        self.try_store_in(heap, i, value).or_fatal()
    }

    fn gc_alloc(n: usize) -> Self {
        Self::alloc_in(gc_heap(), n)
    }

    fn load(self, i: usize) -> T {
        self.load_in(gc_heap(), i)
    }

    fn store(self, i: usize, value: T) {
        self.store_in(gc_heap(), i, value)
    }
}

// =============================================================================
// Checked pointers
// =============================================================================

/// Bounds-checked managed pointer
#[repr(C)]
pub struct CheckedPtr<T> {
    gc: GcRef,
    length: usize,
    _marker: PhantomData<T>,
}

impl<T> CheckedPtr<T> {
    /// A pointer to nothing. Every access fails the bounds check.
    pub const fn null() -> Self {
        Self {
            gc: GcRef::NULL,
            length: 0,
            _marker: PhantomData,
        }
    }

    pub fn is_null(&self) -> bool {
        self.gc.is_null()
    }

    /// Number of elements fixed at allocation.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn check(&self, op: &'static str, index: usize) -> RuntimeResult<()> {
        if index < self.length {
            Ok(())
        } else {
            Err(RuntimeError::PtrOutOfBounds {
                op,
                index,
                length: self.length,
            })
        }
    }
}

impl<T: Element> ManagedPtr<T> for CheckedPtr<T> {
    fn try_alloc_in(heap: &GcHeap, n: usize) -> RuntimeResult<Self> {
        let gc = heap.try_alloc(array_bytes::<T>(n)?)?;
        Ok(Self {
            gc,
            length: n,
            _marker: PhantomData,
        })
    }

    #[inline]
    fn try_load_in(self, heap: &GcHeap, i: usize) -> RuntimeResult<T> {
        self.check("ptr_load", i)?;
        read_element(heap, self.gc, i)
    }

    #[inline]
    fn try_store_in(self, heap: &GcHeap, i: usize, value: T) -> RuntimeResult<()> {
        self.check("ptr_store", i)?;
        write_element(heap, self.gc, i, value)
    }

    fn gc_ref(self) -> GcRef {
        self.gc
    }
}

// =============================================================================
// Unchecked pointers
// =============================================================================

/// Managed pointer without bounds metadata
#[repr(C)]
pub struct UncheckedPtr<T> {
    gc: GcRef,
    _marker: PhantomData<T>,
}

impl<T> UncheckedPtr<T> {
    pub const fn null() -> Self {
        Self {
            gc: GcRef::NULL,
            _marker: PhantomData,
        }
    }

    pub fn is_null(&self) -> bool {
        self.gc.is_null()
    }
}

impl<T: Element> ManagedPtr<T> for UncheckedPtr<T> {
    fn try_alloc_in(heap: &GcHeap, n: usize) -> RuntimeResult<Self> {
        let gc = heap.try_alloc(array_bytes::<T>(n)?)?;
        Ok(Self {
            gc,
            _marker: PhantomData,
        })
    }

    #[inline]
    fn try_load_in(self, heap: &GcHeap, i: usize) -> RuntimeResult<T> {
        read_element(heap, self.gc, i)
    }

    #[inline]
    fn try_store_in(self, heap: &GcHeap, i: usize, value: T) -> RuntimeResult<()> {
        write_element(heap, self.gc, i, value)
    }

    fn gc_ref(self) -> GcRef {
        self.gc
    }
}

// Manual impls: the derives would demand `T: Clone` / `T: PartialEq` even
// though no `T` is stored.
macro_rules! impl_ptr_value_traits {
    ($ptr:ident) => {
        impl<T> Clone for $ptr<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $ptr<T> {}

        impl<T> PartialEq for $ptr<T> {
            fn eq(&self, other: &Self) -> bool {
                self.gc == other.gc
            }
        }

        impl<T> Eq for $ptr<T> {}

        impl<T> Default for $ptr<T> {
            fn default() -> Self {
                Self::null()
            }
        }
    };
}

impl_ptr_value_traits!(CheckedPtr);
impl_ptr_value_traits!(UncheckedPtr);

impl<T> fmt::Debug for CheckedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedPtr")
            .field("gc", &self.gc)
            .field("length", &self.length)
            .finish()
    }
}

impl<T> fmt::Debug for UncheckedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncheckedPtr").field("gc", &self.gc).finish()
    }
}

/// The managed pointer representation this build uses.
#[cfg(not(feature = "unchecked-ptr"))]
pub type Ptr<T> = CheckedPtr<T>;

/// The managed pointer representation this build uses.
#[cfg(feature = "unchecked-ptr")]
pub type Ptr<T> = UncheckedPtr<T>;
