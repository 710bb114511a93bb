//! Built-in functions available to every SPy program

use crate::gc::{GcHeap, gc_heap};
use crate::string::SpyStr;

/// Format `x` in base 10: a leading `-` for negatives, no padding, no
/// grouping.
pub fn int_to_str_in(heap: &GcHeap, x: i32) -> SpyStr {
    SpyStr::from_bytes_in(heap, x.to_string().as_bytes())
}

pub fn int_to_str(x: i32) -> SpyStr {
    int_to_str_in(gc_heap(), x)
}
