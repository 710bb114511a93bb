//! Runtime configuration.
//!
//! The process-wide [`RuntimeConfig`] is fixed once, either explicitly via
//! [`init`] or lazily from the environment on first use. Pointer checking is
//! not configured here: it is chosen at build time by the `unchecked-ptr`
//! cargo feature.

use std::sync::OnceLock;

use serde::de::IntoDeserializer;
use serde::de::value::{Error as DeError, StrDeserializer};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RuntimeError, RuntimeResult};

pub const ENV_MAX_HEAP_BYTES: &str = "SPY_MAX_HEAP_BYTES";
pub const ENV_PANIC: &str = "SPY_PANIC";

/// How [`crate::panic::fatal`] terminates execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanicMode {
    /// Raise a Rust panic carrying the error message.
    #[default]
    Unwind,
    /// Abort the process immediately.
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Upper bound on live bytes in the GC heap; `None` is unlimited.
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub heap: HeapConfig,
    pub panic: PanicMode,
}

impl RuntimeConfig {
    /// Read `SPY_MAX_HEAP_BYTES` and `SPY_PANIC` from the process environment.
    pub fn from_env() -> RuntimeResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RuntimeResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_HEAP_BYTES) {
            let raw = raw.trim();
            if !raw.is_empty() {
                let max = raw.parse::<usize>().map_err(|_| ConfigError {
                    var: ENV_MAX_HEAP_BYTES,
                    value: raw.to_owned(),
                })?;
                config.heap.max_bytes = Some(max);
            }
        }

        if let Some(raw) = lookup(ENV_PANIC) {
            let normalized = raw.trim().to_ascii_lowercase();
            let de: StrDeserializer<'_, DeError> = normalized.as_str().into_deserializer();
            config.panic = PanicMode::deserialize(de).map_err(|_| ConfigError {
                var: ENV_PANIC,
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }
}

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Fix the process-wide configuration. Must run before the first allocation.
pub fn init(config: RuntimeConfig) -> RuntimeResult<()> {
    CONFIG
        .set(config)
        .map_err(|_| RuntimeError::AlreadyInitialized)
}

/// The process-wide configuration, loaded from the environment if [`init`]
/// was never called.
pub fn runtime_config() -> &'static RuntimeConfig {
    CONFIG.get_or_init(|| {
        RuntimeConfig::from_env().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring invalid runtime environment");
            RuntimeConfig::default()
        })
    })
}
