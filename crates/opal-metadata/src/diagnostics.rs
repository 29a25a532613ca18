//! Diagnostic collection for the metadata importers
//!
//! Importers never print; they collect structured diagnostics that the
//! compiler driver renders (or serializes) after each pass. Internal-error
//! diagnostics indicate a bug in the core or its caller and should abort the
//! run; plain errors are user-facing and recoverable per declaration.

use serde::Serialize;
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// An internal error: a contract of the metadata core was violated
    InternalError,
    /// A user-facing error
    Error,
    /// A warning
    Warning,
}

/// Stable diagnostic codes emitted by this crate
pub mod codes {
    /// No decision was registered for a queried symbol
    pub const MISSING_SEMANTICS: &str = "M1001";
    /// A symbol belongs to a module no importer was registered for
    pub const UNKNOWN_MODULE: &str = "M1002";
    /// The symbol matcher found zero or several candidates
    pub const MATCH_FAILED: &str = "M1003";
    /// A persisted record could not be decoded
    pub const MALFORMED_RECORD: &str = "M2001";
    /// A persisted record was absent where one was expected
    pub const MISSING_RECORD: &str = "M2002";
    /// The type dependency graph contains a cycle
    pub const DEPENDENCY_CYCLE: &str = "M3001";
}

/// One structured diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Stable code from [`codes`]
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
    /// Qualified name of the symbol or module the diagnostic is about
    pub subject: Option<String>,
}

impl Diagnostic {
    /// An internal-error diagnostic
    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::InternalError,
            code,
            message: message.into(),
            subject: None,
        }
    }

    /// A user-facing error diagnostic
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            subject: None,
        }
    }

    /// A warning diagnostic
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
            message: message.into(),
            subject: None,
        }
    }

    /// Attach the subject symbol or module name
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::InternalError => "internal error",
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{label}[{}]: {}", self.code, self.message)?;
        if let Some(subject) = &self.subject {
            write!(f, " ({subject})")?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// An empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// The collected diagnostics in emission order
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Whether any diagnostic is an error or internal error
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|d| matches!(d.severity, Severity::Error | Severity::InternalError))
    }

    /// Whether any diagnostic is an internal error (the run should abort)
    pub fn has_internal_errors(&self) -> bool {
        self.items
            .iter()
            .any(|d| d.severity == Severity::InternalError)
    }

    /// Drain all diagnostics, leaving the collection empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }

    /// Move all diagnostics from `other` into this collection
    pub fn absorb(&mut self, other: &mut Diagnostics) {
        self.items.append(&mut other.items);
    }
}
