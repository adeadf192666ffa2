//! Dodgem API - compile source text and load classes without touching disk
//!
//! The pipeline takes a unit name and source text, materializes the source
//! into an in-memory filesystem, compiles it to binary class artifacts in
//! an isolated staging store, publishes the artifacts only when compilation
//! is completely clean, and loads the named class through a fresh class
//! loader. The result is a [`TypeHandle`] that can construct instances and
//! invoke methods, with `print` output captured per invocation.
//!
//! ```no_run
//! use dodgem_api::{compile_and_load, RunConfig, Value};
//!
//! let source = r#"
//!     package com.stellariver.dodgem;
//!     class Student {
//!         var name;
//!         init() { this.name = "work"; }
//!         fn testPrint() { print this.name; }
//!     }
//! "#;
//! let handle = compile_and_load(
//!     "com.stellariver.dodgem.Student",
//!     source,
//!     &RunConfig::default(),
//! )?;
//! let instance = handle.construct(&[])?;
//! let output = handle.invoke(&instance, "testPrint", &[])?;
//! assert_eq!(output.stdout, "work\n");
//! # Ok::<(), dodgem_api::DodgemError>(())
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod invoker;
pub mod source;

use dodgem_core::{ArtifactStore, ClassLoader};
use dodgem_log::debug;

pub use config::{global, init, is_initialized, RunConfig};
pub use error::{DodgemError, InvocationError, SourceError};
pub use handle::{InstanceHandle, InvokeOutput, MemberInfo, MemberKind, TypeHandle};
pub use invoker::{compile, CompileOutput};
pub use source::{SourceUnit, SOURCE_EXTENSION};

// Re-export the value and diagnostic vocabulary callers interact with
pub use dodgem_core::{Diagnostic, DiagnosticReport, Severity, TypeId, Value};

/// Compile one unit and load its class through a fresh loader.
///
/// Every call builds an isolated store and loader, so two calls with the
/// same inputs yield classes that behave identically but carry distinct
/// [`TypeId`]s.
pub fn compile_and_load(
    unit_name: &str,
    source_text: &str,
    config: &RunConfig,
) -> Result<TypeHandle, DodgemError> {
    let unit = SourceUnit::new(unit_name, source_text);
    let store = ArtifactStore::new();
    let output = invoker::compile(&[unit], &store, config)?;
    debug!(
        config.logger,
        "compiled unit {} into {} artifact(s)",
        unit_name,
        output.artifacts.len()
    );

    let loader = ClassLoader::new(store, config.logger.clone());
    let class = loader.load(unit_name)?;
    Ok(TypeHandle::new(
        class,
        config.limits.clone(),
        config.logger.clone(),
        output.warnings,
    ))
}
