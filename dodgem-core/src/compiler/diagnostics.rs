//! Structured compiler diagnostics

use serde::Serialize;

/// Diagnostic severity; only `Error` blocks artifact publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic tied to a compilation unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub unit_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn error(unit_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            unit_name: unit_name.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn warning(unit_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            unit_name: unit_name.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "[{line}:{column}] {}: {}", self.severity, self.message)
            }
            (Some(line), None) => write!(f, "[{line}] {}: {}", self.severity, self.message),
            _ => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// All diagnostics from one compile invocation, in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticReport {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl std::fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, diagnostic) in self.diagnostics.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {diagnostic}", diagnostic.unit_name)?;
        }
        Ok(())
    }
}

impl IntoIterator for DiagnosticReport {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position() {
        let diagnostic =
            Diagnostic::error("a.B", "Unexpected token '}'").with_position(3, 14);
        assert_eq!(diagnostic.to_string(), "[3:14] ERROR: Unexpected token '}'");
    }

    #[test]
    fn test_display_without_position() {
        let diagnostic = Diagnostic::warning("a.B", "Unused import 'Helper'");
        assert_eq!(diagnostic.to_string(), "WARNING: Unused import 'Helper'");
    }

    #[test]
    fn test_report_has_errors() {
        let mut report = DiagnosticReport::new();
        assert!(!report.has_errors());
        report.push(Diagnostic::warning("a.B", "unused"));
        assert!(!report.has_errors());
        report.push(Diagnostic::error("a.B", "broken"));
        assert!(report.has_errors());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_report_preserves_order() {
        let mut report = DiagnosticReport::new();
        report.push(Diagnostic::error("a.B", "first"));
        report.push(Diagnostic::error("a.B", "second"));
        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_serialize_severity() {
        let json = serde_json::to_string(&Severity::Error).unwrap();
        assert_eq!(json, "\"ERROR\"");
    }
}
