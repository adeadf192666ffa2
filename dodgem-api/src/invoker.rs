//! Compiler invocation over in-memory sources
//!
//! Sources are materialized into a session filesystem, compiled, and the
//! resulting artifacts staged in a private store. Only when every unit
//! compiles without an ERROR diagnostic does the staging store publish
//! into the caller's store, so a failed batch leaves no partial artifacts
//! behind.

use dodgem_core::binary::encode_class;
use dodgem_core::compiler::{compile_source, Lexer, Parser};
use dodgem_core::{ArtifactSink, ArtifactStore, Diagnostic, DiagnosticReport};
use dodgem_config::Phase;
use dodgem_log::{debug, info};
use dodgem_vfs::{MemoryFileSystem, VirtualFileSystem};

use crate::config::RunConfig;
use crate::error::{DodgemError, SourceError};
use crate::source::SourceUnit;

/// Result of a clean compile
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Fully-qualified names of the published artifacts, nested classes
    /// included
    pub artifacts: Vec<String>,
    /// WARNING diagnostics; never contains errors
    pub warnings: DiagnosticReport,
}

/// Compile a batch of units into `store`. All units succeed or none are
/// published.
pub fn compile(
    units: &[SourceUnit],
    store: &ArtifactStore,
    config: &RunConfig,
) -> Result<CompileOutput, DodgemError> {
    let session = MemoryFileSystem::new();
    for unit in units {
        unit.materialize_into(&session)?;
        if config.show_steps {
            info!(
                config.logger,
                "materialized {} at {}",
                unit.unit_name(),
                unit.memory_path()
            );
        }
    }

    let staging = ArtifactStore::new();
    let mut report = DiagnosticReport::new();
    let mut artifacts = Vec::new();

    for unit in units {
        let bytes = session.read_file(std::path::Path::new(&unit.memory_path()))?;
        let source = String::from_utf8_lossy(&bytes);
        let unit_name = unit.unit_name();

        let tokens = match Lexer::tokenize(&source) {
            Ok(tokens) => tokens,
            Err(err) => {
                debug!(config.logger, target: Phase::Lexer.target(), "{unit_name}: {err}");
                report.push(
                    Diagnostic::error(unit_name, err.message())
                        .with_position(err.line(), err.column()),
                );
                continue;
            }
        };

        let file = match Parser::parse(tokens) {
            Ok(file) => file,
            Err(err) => {
                debug!(config.logger, target: Phase::Parser.target(), "{unit_name}: {err}");
                let mut diagnostic = Diagnostic::error(unit_name, err.message());
                if let (Some(line), Some(column)) = (err.line(), err.column()) {
                    diagnostic = diagnostic.with_position(line, column);
                }
                report.push(diagnostic);
                continue;
            }
        };

        // A name mismatch is a caller mistake, not a source defect; it
        // aborts the whole batch
        let declared = file.fqn();
        if declared != unit_name {
            return Err(SourceError {
                requested: unit_name.to_string(),
                declared,
            }
            .into());
        }

        let output = match compile_source(&file, &config.logger) {
            Ok(output) => output,
            Err(err) => {
                report.push(Diagnostic::error(unit_name, err.message()).with_line(err.line));
                continue;
            }
        };

        if config.compiler.report_warnings {
            report.extend(output.warnings);
        }

        for image in &output.classes {
            let encoded = encode_class(image, config.compiler.emit_line_info);
            staging.write_artifact(&image.fqn, &encoded)?;
            artifacts.push(image.fqn.clone());
            if config.show_steps {
                info!(config.logger, "compiled {} ({} bytes)", image.fqn, encoded.len());
            }
        }
    }

    if report.has_errors() {
        return Err(DodgemError::Compile(report));
    }

    staging.commit_into(store)?;
    if config.show_steps {
        info!(config.logger, "published {} artifact(s)", artifacts.len());
    }
    Ok(CompileOutput {
        artifacts,
        warnings: report,
    })
}
