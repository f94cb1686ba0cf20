//! Error-gate wrapper for consumers that refuse documents with errors.
//!
//! The pipeline itself never fails; exporters and build steps that must
//! reject broken maps convert an outcome into a `Result` with
//! [`crate::ParseOutcome::into_result`], which yields this type.

use thiserror::Error;

use crate::error::Diagnostic;

/// One or more error-severity diagnostics blocked the gate.
#[derive(Debug, Error)]
#[error("{} error(s) in the document", errors)]
pub struct ParseFailed {
    errors: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ParseFailed {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let errors = diagnostics
            .iter()
            .filter(|d| d.severity().is_error())
            .count();
        Self {
            errors,
            diagnostics,
        }
    }

    /// Every diagnostic from the run, not only the errors.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_counts_errors_only() {
        let failed = ParseFailed::new(vec![
            Diagnostic::error("a"),
            Diagnostic::warning("b"),
            Diagnostic::error("c"),
        ]);
        assert_eq!(failed.to_string(), "2 error(s) in the document");
        assert_eq!(failed.diagnostics().len(), 3);
    }
}
