//! Embedding facade for the SPy runtime.
//!
//! Hosts that link compiled SPy code depend on this crate instead of
//! `spy-runtime` directly: it re-exports the runtime API and wires up
//! logging. The C ABI symbols live in `spy-runtime` and are linked either
//! way.

pub mod logging;

pub use spy_runtime::{
    CheckedPtr, ConfigError, Element, GcHeap, GcRef, HeapConfig, HeapStats, ManagedPtr,
    PanicMode, Ptr, RuntimeConfig, RuntimeError, RuntimeResult, SpyStr, UncheckedPtr, fatal,
    gc_alloc_mem, gc_heap, int_to_str, runtime_config, spy_panic,
};
pub use spy_runtime::{builtins, config, ffi, gc, ptr, string};

/// Install logging and fix the runtime configuration from the environment.
///
/// Call once at host startup, before any generated code runs. Returns
/// `AlreadyInitialized` if the runtime configuration was already fixed,
/// either by an earlier call or by a runtime operation that loaded it
/// lazily.
pub fn init_from_env() -> RuntimeResult<RuntimeConfig> {
    logging::init();
    let config = RuntimeConfig::from_env()?;
    spy_runtime::init(config.clone())?;
    tracing::debug!(?config, "runtime configured");
    Ok(config)
}
