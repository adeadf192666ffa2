//! Dodgem Core - Core compiler and runtime (pure logic, no disk IO)
//!
//! Contains the lexer, parser, bytecode codegen, class-image binary format,
//! the in-memory artifact store and class loader, and the virtual machine.
//! Sources and compiled artifacts move exclusively through in-memory data
//! structures; configuration is passed explicitly via parameters, not via
//! global state.

pub mod binary;
pub mod compiler;
pub mod loader;
pub mod runtime;

// Re-export common types
pub use compiler::diagnostics::{Diagnostic, DiagnosticReport, Severity};
pub use loader::{ArtifactSink, ArtifactStore, ClassLoader, LoadError, LoadedClass, TypeId};
pub use runtime::chunk::Chunk;
pub use runtime::image::{ClassImage, MethodImage};
pub use runtime::object::Instance;
pub use runtime::opcode::OpCode;
pub use runtime::value::Value;
pub use runtime::vm::{RuntimeError, Vm};

// Re-export config types from dodgem-config
pub use dodgem_config::{CompilerConfig, LimitConfig, Phase};
