//! Collector for accumulating diagnostics across pipeline phases.
//!
//! Every phase reports into a [`DiagnosticCollector`] instead of failing on
//! the first finding. Warnings and infos are kept alongside errors: the
//! whole list is published with the document model, and consumers decide
//! how to react per severity.

use cavern_core::span::Span;

use crate::error::Diagnostic;

/// Order-preserving diagnostic accumulator.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Emit every diagnostic from an iterator.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    /// Whether any error-severity diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of diagnostics collected so far.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Finish collection, returning diagnostics ordered by primary span
    /// start, then code.
    ///
    /// The sort is stable so findings at one location keep their emission
    /// order, which keeps the list identical across reparses of unchanged
    /// text.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| {
            let span = d.primary_span().unwrap_or_else(|| Span::point(usize::MAX));
            (span.start(), d.code().map(|c| c.as_str()))
        });
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn tracks_error_presence() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("w"));
        assert!(!collector.has_errors());
        collector.emit(Diagnostic::error("e"));
        assert!(collector.has_errors());
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn finish_orders_by_span() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::error("second").with_label(Span::new(10..12), ""));
        collector.emit(Diagnostic::error("first").with_label(Span::new(2..4), ""));
        let out = collector.finish();
        assert_eq!(out[0].message(), "first");
        assert_eq!(out[1].message(), "second");
    }

    #[test]
    fn unlabeled_diagnostics_sort_last() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::error("structural"));
        collector.emit(
            Diagnostic::error("located")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(0..1), ""),
        );
        let out = collector.finish();
        assert_eq!(out[0].message(), "located");
    }
}
