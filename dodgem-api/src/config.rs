//! Pipeline configuration

use std::sync::Arc;

use once_cell::sync::OnceCell;

use dodgem_config::{CompilerConfig, LimitConfig};
use dodgem_log::Logger;

/// Configuration threaded through one compile-and-load pipeline
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Log each pipeline step at info level
    pub show_steps: bool,
    pub compiler: CompilerConfig,
    pub limits: LimitConfig,
    pub logger: Arc<Logger>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            show_steps: false,
            compiler: CompilerConfig::default(),
            limits: LimitConfig::default(),
            logger: Logger::noop(),
        }
    }
}

impl RunConfig {
    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            ..Self::default()
        }
    }
}

static GLOBAL: OnceCell<RunConfig> = OnceCell::new();

/// Install a process-wide configuration. Returns the rejected value when
/// one is already installed.
pub fn init(config: RunConfig) -> Result<(), RunConfig> {
    GLOBAL.set(config)
}

/// Process-wide configuration; defaults lazily when [`init`] was never
/// called
pub fn global() -> &'static RunConfig {
    GLOBAL.get_or_init(RunConfig::default)
}

pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(!config.show_steps);
        assert!(config.compiler.emit_line_info);
        assert_eq!(config.limits.max_call_depth, 64);
    }

    #[test]
    fn test_global_lazily_defaults() {
        // First access settles the cell for the whole test process
        let config = global();
        assert_eq!(config.limits.max_stack_size, 1024);
        assert!(is_initialized());
    }
}
