//! Feature-gated tracing macros.
//!
//! With the `tracing` feature on, this module re-exports the tracing
//! crate's macros. With it off, every macro expands to nothing and spans
//! are zero-sized.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::trace::{debug, debug_span};
//!
//! fn ground_rule() {
//!     let _span = debug_span!("ground_rule", vars = 3).entered();
//!     debug!(found = 7, "ground_rule_done");
//! }
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, warn, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Span that records nothing.
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, info, trace, warn};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
/// Later calls are ignored.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}

/// Write folded stacks to `path` for flamegraph tools. Hold the returned
/// guard until the run being profiled is over.
#[cfg(feature = "tracing")]
pub fn init_flamegraph(path: &str) -> Result<impl Drop, Box<dyn std::error::Error>> {
    use tracing_flame::FlameLayer;
    use tracing_subscriber::{prelude::*, registry::Registry};

    let (flame_layer, guard) = FlameLayer::with_file(path)?;
    Registry::default().with(flame_layer).try_init()?;
    Ok(guard)
}

#[cfg(not(feature = "tracing"))]
pub fn init_flamegraph(_path: &str) -> Result<impl Drop, Box<dyn std::error::Error>> {
    struct NoopGuard;
    impl Drop for NoopGuard {
        fn drop(&mut self) {}
    }
    Ok(NoopGuard)
}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;
