//! Error codes for the Cavern diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Tokenizer
//! - `E1xx` - Script parser
//! - `E2xx` - Semantic validation
//! - `E3xx` - Container structure and data sections

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // =========================================================================
    // Tokenizer (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    ///
    /// The character becomes an `Unknown` token and the tokenizer
    /// continues.
    E002,

    /// Malformed number literal.
    E003,

    // =========================================================================
    // Script parser (E1xx)
    // =========================================================================
    /// Malformed statement.
    ///
    /// The parser skips to the next line boundary and continues.
    E100,

    /// Condition written with single parentheses.
    ///
    /// Inline conditions require the double-paren form `((...))`.
    E101,

    /// More than one arithmetic operation in a statement.
    E102,

    /// Statement modifier (`~`/`?`) in an invalid position.
    E103,

    /// Malformed trigger statement.
    E104,

    /// Malformed variable declaration.
    E105,

    /// Trigger without an event reference.
    E106,

    /// Unterminated condition.
    E107,

    /// Statement outside any event chain.
    E108,

    // =========================================================================
    // Semantic validation (E2xx)
    // =========================================================================
    /// Name collides with a reserved word.
    E200,

    /// Duplicate variable declaration.
    E201,

    /// Duplicate event chain declaration.
    E202,

    /// Two object variables bound to the same entity.
    E203,

    /// Object binding does not match any declared entity.
    E204,

    /// Duplicate trigger head.
    ///
    /// Identical occurrence heads are engine-undefined, except `time`
    /// triggers.
    E205,

    /// Write to a read-only macro.
    E206,

    /// Capture command with a mismatched or non-object target.
    E207,

    /// Arithmetic on a non-numeric variable.
    E208,

    /// Declared value does not match the variable type.
    E209,

    /// Reference to an undeclared name.
    E210,

    /// User trigger targets a special chain (`init`/`tick`).
    E211,

    /// Tile-mutation count above the per-trigger ceiling.
    E212,

    /// Fluid and solid tile writes mixed in one trigger body.
    E213,

    /// Failure guard (`~`) followed by more commands in its chain.
    E214,

    /// Declared dimensions disagree with parsed grid dimensions.
    E215,

    /// Unknown command or chain invocation.
    E216,

    /// Invalid use of an `intarray` variable.
    E217,

    /// Command parameters do not match the command's schema.
    E218,

    /// Unknown trigger kind.
    E219,

    /// Trigger head arguments do not match the kind's schema.
    E220,

    // =========================================================================
    // Structure and data sections (E3xx)
    // =========================================================================
    /// Unterminated section.
    ///
    /// End-of-file is treated as an implicit close and parsing continues.
    E300,

    /// Text outside any section.
    E301,

    /// Duplicate section name.
    E302,

    /// Unknown section name.
    E303,

    /// Ragged grid row.
    E304,

    /// Grid cell is not an integer.
    E305,

    /// Malformed object record.
    E306,

    /// Unknown object type spelling.
    E307,

    /// Malformed key-value line.
    E308,

    /// Missing resource layer.
    E309,
}

impl ErrorCode {
    /// The code as displayed to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E108 => "E108",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::E210 => "E210",
            ErrorCode::E211 => "E211",
            ErrorCode::E212 => "E212",
            ErrorCode::E213 => "E213",
            ErrorCode::E214 => "E214",
            ErrorCode::E215 => "E215",
            ErrorCode::E216 => "E216",
            ErrorCode::E217 => "E217",
            ErrorCode::E218 => "E218",
            ErrorCode::E219 => "E219",
            ErrorCode::E220 => "E220",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E308 => "E308",
            ErrorCode::E309 => "E309",
        }
    }

    /// Short label used in diagnostic labels.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "malformed number",
            ErrorCode::E100 => "malformed statement",
            ErrorCode::E101 => "single-paren condition",
            ErrorCode::E102 => "more than one operation",
            ErrorCode::E103 => "misplaced modifier",
            ErrorCode::E104 => "malformed trigger",
            ErrorCode::E105 => "malformed declaration",
            ErrorCode::E106 => "missing event reference",
            ErrorCode::E107 => "unterminated condition",
            ErrorCode::E108 => "statement outside a chain",
            ErrorCode::E200 => "reserved word",
            ErrorCode::E201 => "duplicate variable",
            ErrorCode::E202 => "duplicate chain",
            ErrorCode::E203 => "duplicate binding",
            ErrorCode::E204 => "unknown entity",
            ErrorCode::E205 => "duplicate trigger",
            ErrorCode::E206 => "read-only macro",
            ErrorCode::E207 => "invalid capture target",
            ErrorCode::E208 => "non-numeric arithmetic",
            ErrorCode::E209 => "type mismatch",
            ErrorCode::E210 => "undeclared name",
            ErrorCode::E211 => "special chain target",
            ErrorCode::E212 => "tile-mutation ceiling",
            ErrorCode::E213 => "mixed fluid writes",
            ErrorCode::E214 => "early chain exit",
            ErrorCode::E215 => "dimension mismatch",
            ErrorCode::E216 => "unknown command",
            ErrorCode::E217 => "invalid intarray use",
            ErrorCode::E218 => "bad command parameters",
            ErrorCode::E219 => "unknown trigger kind",
            ErrorCode::E220 => "bad trigger arguments",
            ErrorCode::E300 => "unterminated section",
            ErrorCode::E301 => "stray text",
            ErrorCode::E302 => "duplicate section",
            ErrorCode::E303 => "unknown section",
            ErrorCode::E304 => "ragged row",
            ErrorCode::E305 => "bad cell",
            ErrorCode::E306 => "malformed record",
            ErrorCode::E307 => "unknown type",
            ErrorCode::E308 => "malformed line",
            ErrorCode::E309 => "missing layer",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        assert_eq!(ErrorCode::E205.to_string(), "E205");
        assert_eq!(ErrorCode::E101.as_str(), "E101");
    }
}
