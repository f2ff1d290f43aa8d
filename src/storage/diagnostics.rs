//! Parse diagnostics
//!
//! The decoder reports every problem it finds to a [`DiagnosticSink`]
//! instead of stopping at the first one. Callers choose what to do with
//! them: log them ([`LoggingSink`]), collect them (`Vec<Diagnostic>`), or
//! pass any `FnMut(&Diagnostic)`.

use std::fmt;

use serde::Serialize;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Reported, but the parse may still succeed
    Warning,
    /// Fails the parse once the input is exhausted
    Error,
    /// Fails the parse immediately
    Critical,
}

impl Severity {
    /// Returns true if this severity fails the parse
    pub fn is_failure(self) -> bool {
        self >= Severity::Error
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location in a named input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Usually a file path
    pub source: String,
    /// 1-based
    pub line: u64,
    /// 1-based
    pub column: u64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// One problem found while decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub position: Position,
    pub severity: Severity,
    pub message: String,
    /// The underlying error, when the problem came from a lower layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl Diagnostic {
    pub fn new(position: Position, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            position,
            severity,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}

/// Receives diagnostics as they are found
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn report(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Sends diagnostics to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl DiagnosticSink for LoggingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Error | Severity::Critical => tracing::error!("{}", diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: u64, column: u64) -> Position {
        Position {
            source: "README-CHANGES.xml".to_string(),
            line,
            column,
        }
    }

    #[test]
    fn severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
        assert!(!Severity::Warning.is_failure());
        assert!(Severity::Error.is_failure());
        assert!(Severity::Critical.is_failure());
    }

    #[test]
    fn display_format() {
        let diagnostic = Diagnostic::new(at(3, 7), Severity::Error, "Unknown element 'foo'");
        assert_eq!(
            diagnostic.to_string(),
            "README-CHANGES.xml:3:7: Unknown element 'foo'"
        );

        let caused = diagnostic.with_cause("bad things");
        assert!(caused.to_string().ends_with("(bad things)"));
    }

    #[test]
    fn closures_and_vectors_are_sinks() {
        let diagnostic = Diagnostic::new(at(1, 1), Severity::Warning, "text");

        let mut count = 0;
        let mut counter = |_: &Diagnostic| count += 1;
        counter.report(&diagnostic);
        counter.report(&diagnostic);
        assert_eq!(count, 2);

        let mut collected: Vec<Diagnostic> = Vec::new();
        collected.report(&diagnostic);
        assert_eq!(collected, vec![diagnostic]);
    }
}
