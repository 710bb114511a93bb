//! The fatal-error path.
//!
//! Bounds violations, invalid arguments and allocation failures all end
//! here. Nothing in the runtime catches or retries them.

use crate::config::{PanicMode, runtime_config};
use crate::error::RuntimeError;

/// Report `err` and terminate the current execution unit.
#[cold]
#[track_caller]
pub fn fatal(err: RuntimeError) -> ! {
    terminate(&err.to_string())
}

/// Terminate with a plain message, as requested by generated code.
#[cold]
#[track_caller]
pub fn spy_panic(message: &str) -> ! {
    terminate(message)
}

#[track_caller]
fn terminate(message: &str) -> ! {
    tracing::error!(reason = message, "fatal runtime error");
    match runtime_config().panic {
        PanicMode::Unwind => panic!("{message}"),
        PanicMode::Abort => {
            eprintln!("spy: fatal: {message}");
            std::process::abort()
        }
    }
}

/// Unwrap a runtime result, routing the error to [`fatal`].
pub(crate) trait OrFatal<T> {
    fn or_fatal(self) -> T;
}

impl<T> OrFatal<T> for Result<T, RuntimeError> {
    #[inline]
    #[track_caller]
    fn or_fatal(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => fatal(err),
        }
    }
}
