//! Dodgem Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Dodgem crates.

/// Configuration for compiler behavior
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Whether to emit line information into compiled class images
    pub emit_line_info: bool,
    /// Whether to report WARNING diagnostics (errors are always reported)
    pub report_warnings: bool,
}

/// Configuration for execution limits
#[derive(Debug, Clone)]
pub struct LimitConfig {
    /// Maximum operand stack size
    pub max_stack_size: usize,
    /// Maximum call depth for self method calls
    pub max_call_depth: usize,
}

/// Pipeline phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexer,
    Parser,
    Codegen,
    Loader,
    Vm,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Parser => "parser",
            Phase::Codegen => "codegen",
            Phase::Loader => "loader",
            Phase::Vm => "vm",
        }
    }

    /// Log target for records emitted by this phase
    pub fn target(&self) -> &'static str {
        match self {
            Phase::Lexer => "dodgem::lexer",
            Phase::Parser => "dodgem::parser",
            Phase::Codegen => "dodgem::codegen",
            Phase::Loader => "dodgem::loader",
            Phase::Vm => "dodgem::vm",
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            emit_line_info: true,
            report_warnings: true,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 1024,
            max_call_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_compiler_config() {
        let cfg = CompilerConfig::default();
        assert!(cfg.emit_line_info);
        assert!(cfg.report_warnings);
    }

    #[test]
    fn test_default_limit_config() {
        let cfg = LimitConfig::default();
        assert_eq!(cfg.max_stack_size, 1024);
        assert_eq!(cfg.max_call_depth, 64);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Lexer.as_str(), "lexer");
        assert_eq!(Phase::Vm.target(), "dodgem::vm");
    }
}
