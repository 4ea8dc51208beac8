//! Conditional logging macros.
//!
//! With the `tracing` feature these are the `tracing` macros. Without it they
//! expand to dead code that still type-checks their arguments.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if false {
            ::std::mem::drop(::std::format!($($arg)*));
        }
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        if false {
            ::std::mem::drop(::std::format!($($arg)*));
        }
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        if false {
            ::std::mem::drop(::std::format!($($arg)*));
        }
    };
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, trace, warn};
