//! The core diagnostic type.
//!
//! A [`Diagnostic`] is a single finding with a severity, an optional error
//! code, one or more labeled source spans, optional help text, and the
//! section it was found in. Findings are additive annotations: they never
//! abort the pipeline and never block model production.

use std::fmt;

use serde::{Deserialize, Serialize};

use cavern_core::span::Span;

use crate::error::{ErrorCode, Label, Severity};

/// A rich diagnostic message with source location information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    section: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an info diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The section this finding belongs to, when known.
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// The primary span, when a label is attached.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.is_primary())
            .or_else(|| self.labels.first())
            .map(Label::span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Tag the diagnostic with its section name.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            section: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_fields() {
        let diag = Diagnostic::error("duplicate trigger")
            .with_code(ErrorCode::E205)
            .with_label(Span::new(4..10), "declared here")
            .with_secondary_label(Span::new(0..3), "first declared here")
            .with_help("remove one of the triggers")
            .with_section("script");

        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), Some(ErrorCode::E205));
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.primary_span(), Some(Span::new(4..10)));
        assert_eq!(diag.section(), Some("script"));
    }

    #[test]
    fn display_includes_code() {
        let diag = Diagnostic::warning("tile-mutation ceiling").with_code(ErrorCode::E212);
        assert_eq!(diag.to_string(), "warning[E212]: tile-mutation ceiling");
    }
}
