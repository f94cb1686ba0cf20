//! Severity levels for diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The severity level of a diagnostic.
///
/// Severity determines how downstream consumers react:
/// - [`Severity::Error`] blocks exports and builds
/// - [`Severity::Warning`] is advisory and should be addressed
/// - [`Severity::Info`] annotates without implying action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// An issue that must be fixed before the map can be exported.
    Error,

    /// A non-fatal issue about code that is likely to misbehave in the
    /// engine.
    Warning,

    /// An advisory note.
    Info,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}
