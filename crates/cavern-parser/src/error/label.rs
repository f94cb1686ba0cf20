//! Labeled source spans for diagnostic messages.

use serde::{Deserialize, Serialize};

use cavern_core::span::Span;

/// A labeled span in source code.
///
/// Primary labels mark the main location of a finding; secondary labels
/// add context such as "first declared here".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}
