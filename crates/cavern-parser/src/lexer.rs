//! Tokenizer for section bodies.
//!
//! The public entry point is [`tokenize`], which never fails: lexical
//! problems become diagnostics, unrecognized characters become
//! [`Token::Unknown`] tokens, and the token stream always covers the whole
//! input so downstream recovery can keep going.
//!
//! Two modes share the machinery: [`LexMode::Script`] knows the DSL's
//! lexical forms (`::`, `((`/`))`, `#` comments, `~`/`?` modifiers,
//! keywords), while [`LexMode::Data`] covers the grid, object-list, and
//! key-value bodies (words, numbers, commas, colons).
//!
//! A post-pass rewrites the closing newline of every contentless line into
//! a [`Token::BlankLine`], so the script parser's chain-termination rule is
//! structural. Comment-only lines keep a plain newline: a comment does not
//! terminate an event chain.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use cavern_core::span::Span;

use crate::error::{Diagnostic, ErrorCode};
use crate::tokens::{PositionedToken, Token};

/// Lexing mode selected by the section kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Full DSL lexing for `script{}` bodies.
    Script,
    /// Words, numbers, commas, and colons for data sections.
    Data,
}

/// Rich diagnostic information for lexer errors, attached to winnow errors
/// via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type LResult<O> = ModalResult<O, ContextError<LexDiagnostic>>;

fn ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a line comment starting with `#`.
fn line_comment<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    preceded('#', take_while(0.., |c| c != '\n'))
        .map(Token::Comment)
        .parse_next(input)
}

/// Parse a double-quoted string literal.
///
/// Escapes are limited to `\"` and `\\`; a newline or end-of-file before
/// the closing quote is an unterminated string (E001).
fn string_literal<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    let start_pos = input.current_token_start();

    '"'.parse_next(input)
        .map_err(|_: ErrMode<ContextError<LexDiagnostic>>| {
            ErrMode::Backtrack(ContextError::new())
        })?;

    let content = repeat(
        0..,
        alt((
            preceded('\\', one_of(['"', '\\'])),
            none_of(['"', '\\', '\n']),
        )),
    )
    .fold(String::new, |mut acc, ch| {
        acc.push(ch);
        acc
    });

    cut_err(terminated(content, '"'))
        .context(LexDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add a closing `\"` before the end of the line"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse an unsigned number literal. In data mode a leading `-` is
/// accepted; in script mode `-` stays a separate token so arithmetic
/// statements see it.
fn number_literal<'a>(input: &mut Input<'a>, allow_sign: bool) -> LResult<Token<'a>> {
    let start_pos = input.current_token_start();
    let checkpoint = input.checkpoint();

    let negative = if allow_sign {
        opt('-').parse_next(input)?.is_some()
    } else {
        false
    };

    let int_part: &str = match take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input) {
        Ok(digits) => digits,
        Err(e) => {
            input.reset(&checkpoint);
            return Err(e);
        }
    };
    let frac_part: Option<&str> = opt(preceded(
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    ))
    .parse_next(input)?;

    // A number immediately followed by an identifier char is a word like
    // `4x4`; leave it to the identifier/word parsers.
    let lookahead: LResult<()> = peek(not(one_of(ident_char))).parse_next(input);
    if lookahead.is_err() {
        input.reset(&checkpoint);
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => {
            let text = format!("{sign}{int_part}.{frac}");
            text.parse::<f64>()
                .map(Token::FloatLiteral)
                .map_err(|_| malformed_number(input, start_pos))
        }
        None => {
            let text = format!("{sign}{int_part}");
            text.parse::<i64>()
                .map(Token::IntLiteral)
                .map_err(|_| malformed_number(input, start_pos))
        }
    }
}

fn malformed_number(input: &mut Input<'_>, start: usize) -> ErrMode<ContextError<LexDiagnostic>> {
    ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexDiagnostic {
            code: ErrorCode::E003,
            message: "number literal out of range",
            help: None,
            start,
        },
    ))
}

/// Parse keywords with word-boundary checking.
fn keyword<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    terminated(
        alt((
            literal("when"),
            literal("if"),
            literal("and"),
            literal("or"),
            literal("not"),
            literal("true"),
            literal("false"),
        )),
        peek(not(one_of(ident_char))),
    )
    .map(|kw: &str| match kw {
        "when" => Token::When,
        "if" => Token::If,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" => Token::True,
        "false" => Token::False,
        _ => unreachable!(),
    })
    .parse_next(input)
}

/// Parse identifiers.
fn identifier<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    take_while(1.., ident_char)
        .verify(|s: &str| s.chars().next().is_some_and(|c| !c.is_ascii_digit()))
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse multi-character operators (longest first).
fn multi_char_operator<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    alt((
        literal("((").value(Token::DoubleOpenParen),
        literal("))").value(Token::DoubleCloseParen),
        literal("::").value(Token::DoubleColon),
        literal("==").value(Token::EqEq),
        literal("!=").value(Token::NotEq),
        literal("<=").value(Token::LessEq),
        literal(">=").value(Token::GreaterEq),
    ))
    .parse_next(input)
}

/// Parse single-character tokens of the script mode.
fn single_char_token<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    alt((
        alt((
            ':'.value(Token::Colon),
            ';'.value(Token::Semicolon),
            ','.value(Token::Comma),
            '.'.value(Token::Dot),
            '('.value(Token::OpenParen),
            ')'.value(Token::CloseParen),
            '['.value(Token::OpenBracket),
            ']'.value(Token::CloseBracket),
        )),
        alt((
            '+'.value(Token::Plus),
            '-'.value(Token::Minus),
            '*'.value(Token::Star),
            '/'.value(Token::Slash),
            '<'.value(Token::Less),
            '>'.value(Token::Greater),
            '='.value(Token::Assign),
            '~'.value(Token::Tilde),
            '?'.value(Token::Question),
        )),
    ))
    .parse_next(input)
}

/// Parse horizontal whitespace (not newlines).
fn whitespace<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a word in data mode: any run free of separators.
fn data_word<'a>(input: &mut Input<'a>) -> LResult<Token<'a>> {
    take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, ',' | ':' | '"')
    })
    .map(Token::Identifier)
    .parse_next(input)
}

/// Parse a single token with position tracking.
fn positioned_token<'a>(input: &mut Input<'a>, mode: LexMode) -> LResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = match mode {
        LexMode::Script => alt((
            line_comment,
            string_literal,
            |i: &mut Input<'a>| number_literal(i, false),
            multi_char_operator,
            keyword,
            identifier,
            single_char_token,
            newline,
            whitespace,
        ))
        .parse_next(input)?,
        LexMode::Data => alt((
            string_literal,
            |i: &mut Input<'a>| number_literal(i, true),
            ':'.value(Token::Colon),
            ','.value(Token::Comma),
            data_word,
            newline,
            whitespace,
        ))
        .parse_next(input)?,
    };

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Tokenizer that accumulates tokens and diagnostics in one pass.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: Vec<Diagnostic>,
    mode: LexMode,
    base: usize,
}

impl<'a> Lexer<'a> {
    fn new(mode: LexMode, base: usize) -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            mode,
            base,
        }
    }

    fn run(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input, self.mode) {
                Ok(mut token) => {
                    token.span = Span::new(
                        token.span.start() + self.base..token.span.end() + self.base,
                    );
                    self.tokens.push(token);
                }
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let code = self.emit(e, error_pos);

                    if code == Some(ErrorCode::E001) {
                        // The rest of the line belongs to the broken
                        // string; consuming it avoids cascading errors.
                        let _: LResult<&str> =
                            take_while(0.., |c| c != '\n').parse_next(&mut input);
                    } else if let Some(ch) = input.next_token() {
                        self.tokens.push(PositionedToken::new(
                            Token::Unknown(ch),
                            Span::new(
                                error_pos + self.base..input.current_token_start() + self.base,
                            ),
                        ));
                    }
                }
            }
        }
    }

    /// Convert a winnow error into a diagnostic; returns its code.
    fn emit(
        &mut self,
        err: ErrMode<ContextError<LexDiagnostic>>,
        error_pos: usize,
    ) -> Option<ErrorCode> {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span =
                Span::new(*start + self.base..error_pos.max(*start) + self.base);
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            self.diagnostics.push(diag);
            return Some(*code);
        }

        let error_pos = error_pos + self.base;
        let span = Span::new(error_pos..error_pos.saturating_add(1));
        self.diagnostics.push(
            Diagnostic::error("unexpected character")
                .with_code(ErrorCode::E002)
                .with_label(span, ErrorCode::E002.description()),
        );
        Some(ErrorCode::E002)
    }
}

/// Rewrite the closing newline of contentless lines into [`Token::BlankLine`].
///
/// Comments count as content: a comment-only line keeps its plain newline.
fn mark_blank_lines(tokens: &mut [PositionedToken<'_>]) {
    let mut line_has_content = false;
    for positioned in tokens.iter_mut() {
        match &positioned.token {
            Token::Whitespace => {}
            Token::Newline => {
                if !line_has_content {
                    positioned.token = Token::BlankLine;
                }
                line_has_content = false;
            }
            _ => line_has_content = true,
        }
    }
}

/// Tokenize a section body. Never fails.
///
/// Returns the token stream covering the whole input plus any lexical
/// diagnostics. Spans are relative to the start of `input`; use
/// [`tokenize_at`] when lexing a slice of a larger document.
pub fn tokenize(input: &str, mode: LexMode) -> (Vec<PositionedToken<'_>>, Vec<Diagnostic>) {
    tokenize_at(input, mode, 0)
}

/// Tokenize a section body located at byte offset `base` of the document,
/// producing document-absolute spans.
pub fn tokenize_at(
    input: &str,
    mode: LexMode,
    base: usize,
) -> (Vec<PositionedToken<'_>>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(mode, base);
    lexer.run(LocatingSlice::new(input));
    mark_blank_lines(&mut lexer.tokens);
    (lexer.tokens, lexer.diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<'a>(tokens: &'a [PositionedToken<'a>]) -> Vec<&'a Token<'a>> {
        tokens.iter().map(|t| &t.token).collect()
    }

    #[test]
    fn compound_tokens_lex_as_units() {
        let (tokens, diags) = tokenize("Chain::((a))::", LexMode::Script);
        assert!(diags.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                &Token::Identifier("Chain"),
                &Token::DoubleColon,
                &Token::DoubleOpenParen,
                &Token::Identifier("a"),
                &Token::DoubleCloseParen,
                &Token::DoubleColon,
            ]
        );
    }

    #[test]
    fn comparison_operators() {
        let (tokens, _) = tokenize("a>=b==c!=d<=e", LexMode::Script);
        let ops: Vec<_> = tokens
            .iter()
            .filter(|t| !matches!(t.token, Token::Identifier(_)))
            .map(|t| t.token.clone())
            .collect();
        assert_eq!(
            ops,
            vec![Token::GreaterEq, Token::EqEq, Token::NotEq, Token::LessEq]
        );
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let (tokens, _) = tokenize("msg:Hi; # say hi\nwait:2;", LexMode::Script);
        assert!(tokens
            .iter()
            .any(|t| matches!(t.token, Token::Comment(" say hi"))));
        assert!(tokens.iter().any(|t| matches!(t.token, Token::Newline)));
    }

    #[test]
    fn blank_lines_are_marked() {
        let (tokens, _) = tokenize("a;\n\nb;\n# note\nc;\n   \nd;", LexMode::Script);
        let blanks = tokens
            .iter()
            .filter(|t| matches!(t.token, Token::BlankLine))
            .count();
        // Line 2 is empty and line 6 is whitespace-only; the comment line
        // is content.
        assert_eq!(blanks, 2);
    }

    #[test]
    fn keywords_respect_word_boundaries() {
        let (tokens, _) = tokenize("when whenever", LexMode::Script);
        assert_eq!(tokens[0].token, Token::When);
        assert_eq!(tokens[2].token, Token::Identifier("whenever"));
    }

    #[test]
    fn unknown_character_becomes_token_and_diagnostic() {
        let (tokens, diags) = tokenize("a@b", LexMode::Script);
        assert!(tokens.iter().any(|t| matches!(t.token, Token::Unknown('@'))));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E002));
    }

    #[test]
    fn unterminated_string_recovers_at_line_end() {
        let (tokens, diags) = tokenize("msg:\"oops\nwait:1;", LexMode::Script);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E001));
        // The next line still lexes.
        assert!(tokens.iter().any(|t| matches!(t.token, Token::Identifier("wait"))));
    }

    #[test]
    fn string_escapes() {
        let (tokens, diags) = tokenize(r#""a\"b\\c""#, LexMode::Script);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].token, Token::StringLiteral("a\"b\\c".to_string()));
    }

    #[test]
    fn numbers_int_and_float() {
        let (tokens, _) = tokenize("42 4.5", LexMode::Script);
        assert_eq!(tokens[0].token, Token::IntLiteral(42));
        assert_eq!(tokens[2].token, Token::FloatLiteral(4.5));
    }

    #[test]
    fn script_mode_keeps_minus_separate() {
        let (tokens, _) = tokenize("5-3", LexMode::Script);
        assert_eq!(
            kinds(&tokens),
            vec![
                &Token::IntLiteral(5),
                &Token::Minus,
                &Token::IntLiteral(3)
            ]
        );
    }

    #[test]
    fn data_mode_takes_signed_numbers_and_words() {
        let (tokens, diags) = tokenize("Toolstore,-4,5.5,X=400", LexMode::Data);
        assert!(diags.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                &Token::Identifier("Toolstore"),
                &Token::Comma,
                &Token::IntLiteral(-4),
                &Token::Comma,
                &Token::FloatLiteral(5.5),
                &Token::Comma,
                &Token::Identifier("X=400"),
            ]
        );
    }

    #[test]
    fn data_mode_has_no_comments() {
        let (tokens, _) = tokenize("#5", LexMode::Data);
        assert_eq!(tokens[0].token, Token::Identifier("#5"));
    }

    #[test]
    fn spans_cover_input() {
        let source = "when(enter:4,5)[Open]";
        let (tokens, _) = tokenize(source, LexMode::Script);
        assert_eq!(tokens.first().unwrap().span.start(), 0);
        assert_eq!(tokens.last().unwrap().span.end(), source.len());
    }
}
