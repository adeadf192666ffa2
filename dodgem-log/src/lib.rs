//! dodgem-log - structured logging
//!
//! Logging for the Dodgem compiler and runtime:
//! - **No global logger**: configuration is passed in as `Arc<Logger>`
//! - **Pluggable sinks**: stdout/stderr behind feature flags, plus an
//!   in-memory sink for tests
//! - **Lazy formatting**: messages are only formatted when the level is
//!   enabled
//!
//! # Quick start
//!
//! ```ignore
//! use dodgem_log::{Level, Logger, debug};
//!
//! let logger = Logger::new(Level::Debug).with_sink(dodgem_log::StdoutSink);
//! debug!(logger, "pipeline started");
//! ```

mod logger;
mod macros;
mod record;

pub use record::{Level, Record};

// Macros are exported to the crate root via #[macro_export]:
// trace!, debug!, info!, warn!, error!, log!

pub use logger::{LogSink, Logger, MemorySink};

#[cfg(feature = "stdout")]
pub use logger::StdoutSink;

#[cfg(feature = "stderr")]
pub use logger::StderrSink;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Error > Level::Warn);
    }
}
