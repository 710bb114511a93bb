//! Error types for the SPy runtime

use derive_more::{Display, Error, From};

use crate::gc::GcRef;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Everything the runtime can detect going wrong.
///
/// None of these are recovered locally: the fallible `try_*` entry points
/// hand them back so a host can validate arguments, and every other path
/// sends them to [`crate::panic::fatal`].
#[derive(Display, Debug, Clone, PartialEq, Eq, Error, From)]
pub enum RuntimeError {
    #[display("{op} out of bounds: index {index}, length {length}")]
    PtrOutOfBounds {
        op: &'static str,
        index: usize,
        length: usize,
    },

    #[display("string index out of bound: index {index}, length {length}")]
    StrIndexOutOfBounds { index: i64, length: usize },

    #[display("negative repeat count: {count}")]
    NegativeRepeat { count: i32 },

    #[display(
        "out of memory: requested {requested} bytes with {in_use} bytes in use (limit {limit})"
    )]
    OutOfMemory {
        requested: usize,
        in_use: usize,
        limit: usize,
    },

    #[display("allocation size overflow: {count} x {elem_size} bytes")]
    SizeOverflow { count: usize, elem_size: usize },

    #[display("dangling gc reference: {gc}")]
    DanglingRef { gc: GcRef },

    #[display("gc access outside block {gc}: offset {offset}, len {len}, block size {size}")]
    BlockFault {
        gc: GcRef,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[display("string is not valid utf-8")]
    InvalidUtf8,

    #[display("{_0}")]
    #[from]
    Config(ConfigError),

    #[display("runtime configuration is already initialized")]
    AlreadyInitialized,
}

/// An environment variable that could not be turned into configuration.
#[derive(Display, Debug, Clone, PartialEq, Eq, Error)]
#[display("invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}
