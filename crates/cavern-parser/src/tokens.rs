//! Token types produced by the tokenizer.

use std::fmt;

use cavern_core::span::Span;

/// Token types for the map container and its script.
///
/// Compound forms (`::`, `((`, `))`, comparison operators) are dedicated
/// variants so the parser can distinguish them structurally: a chain
/// declaration is not two colons, and a condition opener is not two
/// arithmetic parens.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    If,
    When,
    And,
    Or,
    Not,
    True,
    False,

    // Literals
    Identifier(&'src str),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),

    // Compound operators
    DoubleColon,      // ::
    DoubleOpenParen,  // ((
    DoubleCloseParen, // ))
    EqEq,             // ==
    NotEq,            // !=
    LessEq,           // <=
    GreaterEq,        // >=

    // Punctuation and single-character operators
    Colon,
    Semicolon,
    Comma,
    Dot,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    Assign, // =
    Tilde,
    Question,

    // Trivia
    Comment(&'src str), // # to end of line
    Whitespace,
    Newline,
    /// A line with no content at all. Emitted by the blank-line pass;
    /// the structural terminator for event chains.
    BlankLine,

    /// An unrecognized character, consumed by downstream recovery.
    Unknown(char),
}

impl<'src> Token<'src> {
    /// Whitespace and comments: skipped between statement elements.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Comment(_))
    }

    /// Newline or blank line: statement boundaries.
    pub fn is_line_end(&self) -> bool {
        matches!(self, Token::Newline | Token::BlankLine)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::If => write!(f, "if"),
            Token::When => write!(f, "when"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::DoubleColon => write!(f, "::"),
            Token::DoubleOpenParen => write!(f, "(("),
            Token::DoubleCloseParen => write!(f, "))"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::LessEq => write!(f, "<="),
            Token::GreaterEq => write!(f, ">="),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::OpenBracket => write!(f, "["),
            Token::CloseBracket => write!(f, "]"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::Assign => write!(f, "="),
            Token::Tilde => write!(f, "~"),
            Token::Question => write!(f, "?"),
            Token::Comment(s) => write!(f, "#{s}"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => write!(f, "\\n"),
            Token::BlankLine => write!(f, "<blank>"),
            Token::Unknown(c) => write!(f, "{c}"),
        }
    }
}

/// A token with position information for winnow integration.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}
