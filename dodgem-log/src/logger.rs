//! Logger implementation
//!
//! No global logger: configuration is passed explicitly as `Arc<Logger>`.

use crate::record::{Level, Record};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Log output target trait
pub trait LogSink: Send + Sync {
    /// Write a log record
    fn write(&self, record: &Record);
}

/// Logger configuration and state
pub struct Logger {
    /// Current log level (atomic storage)
    level: AtomicU8,
    /// Output targets
    sinks: Mutex<Vec<Box<dyn LogSink>>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Create a new logger
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            sinks: Mutex::new(Vec::new()),
        })
    }

    /// Attach an output target
    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    /// Attach an output target (non-consuming form, used by config)
    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.push(Box::new(sink));
        }
    }

    /// Change the log level at runtime
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Current log level
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    /// Check whether a level is enabled
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Record a log message (used by the macros)
    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }

        let record = Record::new(level, target, message);
        if let Ok(sinks) = self.sinks.lock() {
            for sink in sinks.iter() {
                sink.write(&record);
            }
        }
    }

    /// Logger that records nothing: Error level with no sinks
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }
}

#[cfg(feature = "stdout")]
/// Standard output sink
pub struct StdoutSink;

#[cfg(feature = "stdout")]
impl LogSink for StdoutSink {
    fn write(&self, record: &Record) {
        println!("{}", record.format());
    }
}

#[cfg(feature = "stderr")]
/// Standard error sink
pub struct StderrSink;

#[cfg(feature = "stderr")]
impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{}", record.format());
    }
}

/// Sink that keeps records in memory, for tests and crash reports
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out every record written so far
    pub fn dump_records(&self) -> Vec<Record> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = Logger::new(Level::Debug);
        assert_eq!(logger.level(), Level::Debug);
        assert!(logger.is_enabled(Level::Debug));
        assert!(!logger.is_enabled(Level::Trace));
    }

    #[test]
    fn test_level_change() {
        let logger = Logger::new(Level::Info);
        assert!(!logger.is_enabled(Level::Debug));

        logger.set_level(Level::Debug);
        assert!(logger.is_enabled(Level::Debug));
    }

    #[test]
    fn test_log_with_memory_sink() {
        let sink = MemorySink::new();
        let logger = Logger::new(Level::Debug).with_sink(sink.clone());

        logger.log(Level::Info, "test", "hello world");

        let records = sink.dump_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "hello world");
    }

    #[test]
    fn test_log_disabled_level() {
        let sink = MemorySink::new();
        let logger = Logger::new(Level::Warn).with_sink(sink.clone());

        logger.log(Level::Debug, "test", "should not appear");
        assert_eq!(sink.len(), 0);

        logger.log(Level::Warn, "test", "should appear");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_noop_logger() {
        let logger = Logger::noop();
        // Error level with no sinks: nothing to observe, just must not panic
        logger.log(Level::Error, "test", "should not appear");
    }
}
