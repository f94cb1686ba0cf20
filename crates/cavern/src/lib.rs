//! # Cavern
//!
//! Map analysis for the Cavern DAT container format. This crate is the
//! one-stop facade over [`cavern_core`] (the document model) and
//! [`cavern_parser`] (the pipeline): parse a map, collect diagnostics,
//! and optionally keep a [`Session`] that reparses in the background as
//! the text changes.
//!
//! ```
//! use cavern::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! let analysis = analyzer.analyze("info{\nrowcount:1\ncolcount:1\n}\ntiles{\n1,\n}\n");
//! assert!(!analysis.has_errors());
//! ```

mod config;
mod session;

pub use config::AnalyzerConfig;
pub use session::{Session, Snapshot};

pub use cavern_core::document::{Document, Section, SectionBody, SectionKind};
pub use cavern_core::grid::Grid;
pub use cavern_core::objects::{ObjectKey, ObjectKind, ObjectRecord};
pub use cavern_core::script::ScriptModel;
pub use cavern_core::span::{LineCol, LineIndex, Span};
pub use cavern_parser::error::{Diagnostic, ErrorCode, Severity};

use serde::Serialize;
use thiserror::Error;

/// Top-level error type for consumers driving the analyzer from files.
///
/// Parsing itself never fails; grammar and validation findings are
/// [`Diagnostic`]s on the [`Analysis`], not errors.
#[derive(Debug, Error)]
pub enum CavernError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// A parse/validate pass over one document snapshot.
#[derive(Debug)]
pub struct Analysis {
    pub document: Document,
    /// Ordered by source position; stable across reparses of unchanged
    /// text.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    /// Resolve diagnostics to line/column records for editor surfaces and
    /// machine output.
    pub fn resolve(&self, source: &str) -> Vec<SourceDiagnostic> {
        let index = LineIndex::new(source);
        self.diagnostics
            .iter()
            .map(|diagnostic| {
                let (line, column, length) = match diagnostic.primary_span() {
                    Some(span) => {
                        let at = index.position(span.start());
                        (at.line, at.column, span.len() as u32)
                    }
                    None => (1, 1, 0),
                };
                SourceDiagnostic {
                    severity: diagnostic.severity(),
                    code: diagnostic.code().map(|c| c.as_str().to_string()),
                    message: diagnostic.message().to_string(),
                    section: diagnostic.section().map(str::to_string),
                    line,
                    column,
                    length,
                }
            })
            .collect()
    }
}

/// A diagnostic resolved to `{severity, code, message, section, line,
/// column, length}` for external consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDiagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub section: Option<String>,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

/// The analyzer facade: configuration plus the full pipeline.
#[derive(Debug, Default, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run the full pipeline over one immutable text snapshot.
    pub fn analyze(&self, source: &str) -> Analysis {
        let outcome = cavern_parser::analyze(source, &self.config.validate_options());
        log::debug!(
            diagnostics = outcome.diagnostics.len(),
            sections = outcome.document.sections().len();
            "analysis complete"
        );
        Analysis {
            document: outcome.document,
            diagnostics: outcome.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_produces_line_column_records() {
        let analyzer = Analyzer::new(AnalyzerConfig::default());
        let source = "tiles{\n1,x,\n}\n";
        let analysis = analyzer.analyze(source);
        let resolved = analysis.resolve(source);
        assert_eq!(resolved.len(), 1);
        let record = &resolved[0];
        assert_eq!(record.section.as_deref(), Some("tiles"));
        assert_eq!(record.line, 2);
        assert_eq!(record.column, 3);
        assert_eq!(record.length, 1);
    }

    #[test]
    fn identical_text_resolves_to_identical_diagnostics() {
        let analyzer = Analyzer::new(AnalyzerConfig::default());
        let source = "script{\nint crystals=1\nint crystals=2\n}\n";
        let first = analyzer.analyze(source).resolve(source);
        let second = analyzer.analyze(source).resolve(source);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn config_ceiling_is_honored() {
        let mut config = AnalyzerConfig::default();
        config.max_tile_mutations = 1;
        let analyzer = Analyzer::new(config);
        let source = "script{\nDig::\ndrill:1,1;\ndrill:1,2;\n\nif(time:1)[Dig]\n}\n";
        let analysis = analyzer.analyze(source);
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.code() == Some(ErrorCode::E212)));
    }
}
