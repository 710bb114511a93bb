//! SPy runtime library.
//!
//! Provides the native support required by SPy's compiled output:
//! - GC heap allocation (`spy_gc_alloc_mem`)
//! - Managed pointers per element type, bounds-checked unless built with the
//!   `unchecked-ptr` feature (`spy_ptr_<t>_gc_alloc`, `_load`, `_store`)
//! - Immutable length-prefixed strings (`spy_str_*`)
//! - Integer formatting (`spy_builtins_int2str`)
//! - The fatal-error path (`spy_panic`)
//!
//! The runtime assumes a single-threaded execution model. Every violation it
//! detects is fatal; see [`panic`].

pub mod builtins;
pub mod config;
pub mod error;
pub mod ffi;
pub mod gc;
pub mod panic;
pub mod ptr;
pub mod string;

pub use builtins::int_to_str;
pub use config::{HeapConfig, PanicMode, RuntimeConfig, init, runtime_config};
pub use error::{ConfigError, RuntimeError, RuntimeResult};
pub use gc::{GcHeap, GcRef, HeapStats, gc_alloc_mem, gc_heap};
pub use panic::{fatal, spy_panic};
pub use ptr::{CheckedPtr, Element, ManagedPtr, Ptr, UncheckedPtr};
pub use string::SpyStr;
