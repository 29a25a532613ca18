//! Metadata importer errors
//!
//! Everything here is a contract violation or an invalid input graph; none
//! of these are retryable. Environmental failures (unreadable records in a
//! referenced module) never surface as errors — they are reported as
//! diagnostics and recovered with `NotUsableFromScript`.

use thiserror::Error;

/// Errors from the importer surface and the persistence writer
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetaError {
    /// A decision was assigned twice for the same symbol
    #[error("semantics already set for {symbol}")]
    AlreadySet {
        /// Qualified name of the symbol
        symbol: String,
    },

    /// `prepare` was called twice for the same type
    #[error("type {type_name} was already prepared")]
    AlreadyPrepared {
        /// Qualified name of the type
        type_name: String,
    },

    /// `prepare` was called before a dependency of the type was prepared
    #[error("type {type_name} prepared before its dependency {dependency}")]
    OutOfOrderPreparation {
        /// Qualified name of the type being prepared
        type_name: String,
        /// Qualified name of the unprepared dependency
        dependency: String,
    },

    /// A mutating operation was attempted against a referenced module
    #[error("{operation} is not supported for referenced module {module}")]
    NotSupported {
        /// The rejected operation
        operation: &'static str,
        /// The referenced module
        module: String,
    },

    /// Zero or several low-level members matched a symbol's signature
    #[error("no unique member definition matches {symbol} ({candidates} candidate(s))")]
    AmbiguousOrMissingMatch {
        /// Qualified name of the symbol
        symbol: String,
        /// Number of candidates that matched
        candidates: usize,
    },

    /// The type dependency graph contains a cycle
    #[error("dependency cycle among types: {}", types.join(", "))]
    DependencyCycle {
        /// Qualified names of the participating types
        types: Vec<String>,
    },

    /// The module builder and the semantic model disagree about what was
    /// compiled, or a comparable internal inconsistency
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Failure of the symbol matcher to find exactly one candidate
#[derive(Debug, Clone, Error, PartialEq)]
#[error("no unique member definition matches {symbol} ({candidates} candidate(s))")]
pub struct MatchError {
    /// Qualified name of the symbol being matched
    pub symbol: String,
    /// Number of candidates that satisfied full shape equality
    pub candidates: usize,
}

impl From<MatchError> for MetaError {
    fn from(err: MatchError) -> Self {
        MetaError::AmbiguousOrMissingMatch {
            symbol: err.symbol,
            candidates: err.candidates,
        }
    }
}
