//! Immutable, length-prefixed strings
//!
//! A [`SpyStr`] is a handle to one GC block laid out as
//!
//! ```text
//! [ length: usize (native endian) ][ bytes; length ]
//! ```
//!
//! There is no terminator and no spare capacity. Strings are never mutated
//! once built: concatenation, repetition and indexing each allocate a new
//! block. Copying a `SpyStr` copies the handle, not the bytes.
//!
//! Each operation has an `*_in` form taking an explicit [`GcHeap`] and a
//! short form running against the process heap.

use std::fmt;
use std::ops::Add;

use crate::error::{RuntimeError, RuntimeResult};
use crate::gc::{GcHeap, GcRef, gc_heap};
use crate::panic::OrFatal;

/// Size of the length header in front of the bytes.
pub const HEADER_SIZE: usize = size_of::<usize>();

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SpyStr {
    gc: GcRef,
}

impl SpyStr {
    /// Wrap an existing block. The block must carry a string header.
    pub fn from_gc_ref(gc: GcRef) -> Self {
        Self { gc }
    }

    pub fn gc_ref(self) -> GcRef {
        self.gc
    }

    /// Whether both handles name the same allocation.
    pub fn ptr_eq(self, other: SpyStr) -> bool {
        self.gc == other.gc
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Allocate a string of `length` bytes. The bytes start out zeroed; the
    /// caller is expected to fill them before handing the string out.
    pub fn try_alloc_in(heap: &GcHeap, length: usize) -> RuntimeResult<Self> {
        let size = HEADER_SIZE
            .checked_add(length)
            .ok_or(RuntimeError::SizeOverflow {
                count: length,
                elem_size: 1,
            })?;
        let gc = heap.try_alloc(size)?;
        heap.try_with_bytes_mut(gc, 0, HEADER_SIZE, |header| {
            header.copy_from_slice(&length.to_ne_bytes())
        })?;
        Ok(Self { gc })
    }

    pub fn alloc_in(heap: &GcHeap, length: usize) -> Self {
        Self::try_alloc_in(heap, length).or_fatal()
    }

    pub fn alloc(length: usize) -> Self {
        Self::alloc_in(gc_heap(), length)
    }

    pub fn from_bytes_in(heap: &GcHeap, bytes: &[u8]) -> Self {
        let s = Self::alloc_in(heap, bytes.len());
        heap.with_bytes_mut(s.gc, HEADER_SIZE, bytes.len(), |out| {
            out.copy_from_slice(bytes)
        });
        s
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes_in(gc_heap(), bytes)
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn len_in(self, heap: &GcHeap) -> usize {
        heap.with_bytes(self.gc, 0, HEADER_SIZE, |header| {
            let mut raw = [0u8; HEADER_SIZE];
            raw.copy_from_slice(header);
            usize::from_ne_bytes(raw)
        })
    }

    pub fn len(self) -> usize {
        self.len_in(gc_heap())
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Run `f` over the string's bytes.
    pub fn with_bytes_in<R>(self, heap: &GcHeap, f: impl FnOnce(&[u8]) -> R) -> R {
        let length = self.len_in(heap);
        heap.with_bytes(self.gc, HEADER_SIZE, length, f)
    }

    pub fn with_bytes<R>(self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.with_bytes_in(gc_heap(), f)
    }

    pub fn to_bytes_in(self, heap: &GcHeap) -> Vec<u8> {
        self.with_bytes_in(heap, <[u8]>::to_vec)
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.to_bytes_in(gc_heap())
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Concatenate `self` and `other` into a new string.
    pub fn add_in(self, heap: &GcHeap, other: SpyStr) -> SpyStr {
        let (la, lb) = (self.len_in(heap), other.len_in(heap));
        let total = la.checked_add(lb).ok_or(RuntimeError::SizeOverflow {
            count: la,
            elem_size: 1,
        });
        let res = Self::alloc_in(heap, total.or_fatal());
        heap.copy_within_heap(self.gc, HEADER_SIZE, res.gc, HEADER_SIZE, la);
        heap.copy_within_heap(other.gc, HEADER_SIZE, res.gc, HEADER_SIZE + la, lb);
        res
    }

    pub fn add(self, other: SpyStr) -> SpyStr {
        self.add_in(gc_heap(), other)
    }

    /// Repeat `self` `n` times. Negative counts are rejected.
    pub fn try_mul_in(self, heap: &GcHeap, n: i32) -> RuntimeResult<SpyStr> {
        let times = usize::try_from(n).map_err(|_| RuntimeError::NegativeRepeat { count: n })?;
        let unit = self.to_bytes_in(heap);
        let total = unit
            .len()
            .checked_mul(times)
            .ok_or(RuntimeError::SizeOverflow {
                count: times,
                elem_size: unit.len(),
            })?;
        let res = Self::try_alloc_in(heap, total)?;
        if total > 0 {
            heap.try_with_bytes_mut(res.gc, HEADER_SIZE, total, |out| {
                for chunk in out.chunks_exact_mut(unit.len()) {
                    chunk.copy_from_slice(&unit);
                }
            })?;
        }
        Ok(res)
    }

    pub fn mul_in(self, heap: &GcHeap, n: i32) -> SpyStr {
        self.try_mul_in(heap, n).or_fatal()
    }

    pub fn try_mul(self, n: i32) -> RuntimeResult<SpyStr> {
        self.try_mul_in(gc_heap(), n)
    }

    pub fn mul(self, n: i32) -> SpyStr {
        self.mul_in(gc_heap(), n)
    }

    /// Byte-wise equality; allocation identity does not matter.
    pub fn eq_in(self, heap: &GcHeap, other: SpyStr) -> bool {
        if self.ptr_eq(other) && heap.contains(self.gc) {
            return true;
        }
        if self.len_in(heap) != other.len_in(heap) {
            return false;
        }
        let mine = self.to_bytes_in(heap);
        other.with_bytes_in(heap, |theirs| mine == theirs)
    }

    /// One-byte string holding the byte at `i`.
    ///
    /// Negative `i` counts from the end. This indexes raw bytes, not code
    /// points: on multi-byte UTF-8 text it can return a fragment of a
    /// character. Use [`SpyStr::char_at`] for code-point indexing.
    pub fn try_getitem_in(self, heap: &GcHeap, i: i32) -> RuntimeResult<SpyStr> {
        let length = self.len_in(heap);
        let index = wrap_index(i, length)?;
        let byte = heap.try_with_bytes(self.gc, HEADER_SIZE + index, 1, |b| b[0])?;
        Ok(Self::from_bytes_in(heap, &[byte]))
    }

    pub fn getitem_in(self, heap: &GcHeap, i: i32) -> SpyStr {
        self.try_getitem_in(heap, i).or_fatal()
    }

    pub fn try_getitem(self, i: i32) -> RuntimeResult<SpyStr> {
        self.try_getitem_in(gc_heap(), i)
    }

    pub fn getitem(self, i: i32) -> SpyStr {
        self.getitem_in(gc_heap(), i)
    }

    /// String holding the code point at `i`, with the same negative-index
    /// wraparound as [`SpyStr::getitem`]. Fails on non-UTF-8 contents.
    pub fn try_char_at_in(self, heap: &GcHeap, i: i32) -> RuntimeResult<SpyStr> {
        let bytes = self.to_bytes_in(heap);
        let text = std::str::from_utf8(&bytes).map_err(|_| RuntimeError::InvalidUtf8)?;
        let chars = text.chars().count();
        let index = wrap_index(i, chars)?;
        let mut buf = [0u8; 4];
        let ch = text
            .chars()
            .nth(index)
            .ok_or(RuntimeError::StrIndexOutOfBounds {
                index: i64::from(i),
                length: chars,
            })?;
        Ok(Self::from_bytes_in(heap, ch.encode_utf8(&mut buf).as_bytes()))
    }

    pub fn char_at_in(self, heap: &GcHeap, i: i32) -> SpyStr {
        self.try_char_at_in(heap, i).or_fatal()
    }

    pub fn try_char_at(self, i: i32) -> RuntimeResult<SpyStr> {
        self.try_char_at_in(gc_heap(), i)
    }

    pub fn char_at(self, i: i32) -> SpyStr {
        self.char_at_in(gc_heap(), i)
    }
}

/// Resolve a possibly negative index against `length`.
fn wrap_index(i: i32, length: usize) -> RuntimeResult<usize> {
    let out_of_bounds = RuntimeError::StrIndexOutOfBounds {
        index: i64::from(i),
        length,
    };
    let signed_len = i64::try_from(length).map_err(|_| out_of_bounds.clone())?;
    let mut index = i64::from(i);
    if index < 0 {
        index += signed_len;
    }
    if index < 0 || index >= signed_len {
        return Err(out_of_bounds);
    }
    usize::try_from(index).map_err(|_| out_of_bounds)
}

impl Add for SpyStr {
    type Output = SpyStr;

    fn add(self, rhs: SpyStr) -> SpyStr {
        SpyStr::add(self, rhs)
    }
}

impl PartialEq for SpyStr {
    fn eq(&self, other: &Self) -> bool {
        self.eq_in(gc_heap(), *other)
    }
}

impl Eq for SpyStr {}

impl From<&str> for SpyStr {
    fn from(s: &str) -> Self {
        SpyStr::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for SpyStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_bytes(|bytes| f.write_str(&String::from_utf8_lossy(bytes)))
    }
}

impl fmt::Debug for SpyStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.with_bytes(|bytes| String::from_utf8_lossy(bytes).into_owned());
        f.debug_tuple("SpyStr").field(&text).finish()
    }
}
