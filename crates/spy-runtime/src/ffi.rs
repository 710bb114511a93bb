//! C ABI exported to generated code.
//!
//! Signatures here are a binary contract: generated code is produced
//! independently of this crate, so argument order and units (byte sizes vs
//! element counts, signed vs unsigned indices) must not change. Every fatal
//! condition unwinds into the `extern "C"` boundary, which aborts the
//! process.

use crate::builtins::int_to_str;
use crate::gc::{GcRef, gc_alloc_mem};
use crate::panic::spy_panic as fail;
use crate::ptr::{ManagedPtr, Ptr};
use crate::string::SpyStr;

// =============================================================================
// Allocator
// =============================================================================

/// Allocate `size` zeroed bytes of GC memory.
#[unsafe(no_mangle)]
pub extern "C" fn spy_gc_alloc_mem(size: usize) -> GcRef {
    gc_alloc_mem(size)
}

// =============================================================================
// Managed pointers
// =============================================================================

// One family of symbols per element type; all of them share the generic
// implementation in `crate::ptr`.
macro_rules! export_ptr_type {
    ($($t:ty => $alloc:ident, $load:ident, $store:ident;)*) => {
        $(
            /// Allocate `n` zeroed elements.
            #[unsafe(no_mangle)]
            pub extern "C" fn $alloc(n: usize) -> Ptr<$t> {
                <Ptr<$t> as ManagedPtr<$t>>::gc_alloc(n)
            }

            #[unsafe(no_mangle)]
            pub extern "C" fn $load(p: Ptr<$t>, i: usize) -> $t {
                p.load(i)
            }

            #[unsafe(no_mangle)]
            pub extern "C" fn $store(p: Ptr<$t>, i: usize, v: $t) {
                p.store(i, v)
            }
        )*
    };
}

export_ptr_type! {
    i8 => spy_ptr_i8_gc_alloc, spy_ptr_i8_load, spy_ptr_i8_store;
    u8 => spy_ptr_u8_gc_alloc, spy_ptr_u8_load, spy_ptr_u8_store;
    i32 => spy_ptr_i32_gc_alloc, spy_ptr_i32_load, spy_ptr_i32_store;
    u32 => spy_ptr_u32_gc_alloc, spy_ptr_u32_load, spy_ptr_u32_store;
    i64 => spy_ptr_i64_gc_alloc, spy_ptr_i64_load, spy_ptr_i64_store;
    u64 => spy_ptr_u64_gc_alloc, spy_ptr_u64_load, spy_ptr_u64_store;
    f32 => spy_ptr_f32_gc_alloc, spy_ptr_f32_load, spy_ptr_f32_store;
    f64 => spy_ptr_f64_gc_alloc, spy_ptr_f64_load, spy_ptr_f64_store;
}

// =============================================================================
// Strings
// =============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn spy_str_alloc(length: usize) -> SpyStr {
    SpyStr::alloc(length)
}

#[unsafe(no_mangle)]
pub extern "C" fn spy_str_add(a: SpyStr, b: SpyStr) -> SpyStr {
    a.add(b)
}

/// Repeat `a` `b` times; a negative count is fatal.
#[unsafe(no_mangle)]
pub extern "C" fn spy_str_mul(a: SpyStr, b: i32) -> SpyStr {
    a.mul(b)
}

#[unsafe(no_mangle)]
pub extern "C" fn spy_str_eq(a: SpyStr, b: SpyStr) -> bool {
    a == b
}

/// Byte at `i` (negative counts from the end) as a new one-byte string.
#[unsafe(no_mangle)]
pub extern "C" fn spy_str_getitem(s: SpyStr, i: i32) -> SpyStr {
    s.getitem(i)
}

#[unsafe(no_mangle)]
pub extern "C" fn spy_str_len(s: SpyStr) -> usize {
    s.len()
}

/// Build a string from a byte buffer, e.g. a literal in the data section.
///
/// # Safety
///
/// `data` must be valid for reads of `length` bytes, or null with
/// `length == 0`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spy_str_from_bytes(data: *const u8, length: usize) -> SpyStr {
    let bytes: &[u8] = if data.is_null() || length == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(data, length) }
    };
    SpyStr::from_bytes(bytes)
}

/// Copy up to `buffer_size` bytes of `s` into `buffer` and return the full
/// string length.
///
/// # Safety
///
/// `buffer` must be valid for writes of `buffer_size` bytes, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spy_str_copy_bytes(
    s: SpyStr,
    buffer: *mut u8,
    buffer_size: usize,
) -> usize {
    s.with_bytes(|bytes| {
        let copy_len = bytes.len().min(buffer_size);
        if !buffer.is_null() && copy_len > 0 {
            unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer, copy_len) };
        }
        bytes.len()
    })
}

// =============================================================================
// Builtins and failure
// =============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn spy_builtins_int2str(x: i32) -> SpyStr {
    int_to_str(x)
}

/// Terminate with `message`. Never returns.
///
/// # Safety
///
/// `message` must be valid for reads of `length` bytes, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spy_panic(message: *const u8, length: usize) -> ! {
    let bytes: &[u8] = if message.is_null() {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(message, length) }
    };
    fail(&String::from_utf8_lossy(bytes))
}
