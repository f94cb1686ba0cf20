//! Recursive-descent parser for the `script{}` section.
//!
//! The grammar is line-oriented: one statement per line. The outer loop
//! groups tokens into lines and dispatches on the first significant token;
//! statement internals parse over a winnow [`TokenSlice`]. A malformed
//! statement produces one diagnostic and the loop continues with the next
//! line; a bad line never aborts the script parse.
//!
//! Chain termination is structural: an event chain is closed by a
//! [`Token::BlankLine`], the next `Name::` declaration, or the end of the
//! section. Comment-only lines carry a plain newline and therefore keep
//! the chain open.

use winnow::{
    Parser as _,
    combinator::separated,
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use cavern_core::script::{
    CompareOp, Condition, DeclValue, EventChain, Literal, MathOp, Modifier, Occurrence, Operand,
    Param, ScriptModel, Trigger, TriggerHead, Variable, VarType,
};
use cavern_core::span::{Span, Spanned};
use cavern_core::symbol::{SymbolTable, VarEntry};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};
use crate::tokens::{PositionedToken, Token};

/// Context carried on winnow errors: the diagnostic to emit.
#[derive(Debug, Clone, PartialEq)]
struct ScriptCtx {
    code: ErrorCode,
    message: &'static str,
    /// Explicit span; when absent the dispatcher falls back to the line.
    span: Option<Span>,
}

type Input<'t, 'src> = TokenSlice<'t, PositionedToken<'src>>;
type SResult<O> = Result<O, ErrMode<ContextError<ScriptCtx>>>;

/// Build a committed error with diagnostic context.
fn cut(code: ErrorCode, message: &'static str, span: Option<Span>) -> ErrMode<ContextError<ScriptCtx>> {
    let mut e = ContextError::new();
    e.push(ScriptCtx {
        code,
        message,
        span,
    });
    ErrMode::Cut(e)
}

fn backtrack() -> ErrMode<ContextError<ScriptCtx>> {
    ErrMode::Backtrack(ContextError::new())
}

/// Peek the next token without consuming it.
fn peek_token<'t, 'src>(input: &mut Input<'t, 'src>) -> Option<&'t PositionedToken<'src>> {
    let checkpoint = input.checkpoint();
    let result: SResult<&'t PositionedToken<'src>> = any.parse_next(input);
    input.reset(&checkpoint);
    result.ok()
}

/// Consume one token matching `expected`.
fn token<'t, 'src>(input: &mut Input<'t, 'src>, expected: &Token<'static>) -> SResult<Span> {
    any.verify(|t: &PositionedToken<'_>| t.token == *expected)
        .parse_next(input)
        .map(|t: &PositionedToken<'_>| t.span)
}

/// Consume an identifier token.
fn ident<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Spanned<String>> {
    any.verify_map(|t: &PositionedToken<'_>| match &t.token {
        Token::Identifier(name) => Some(Spanned::new((*name).to_string(), t.span)),
        _ => None,
    })
    .parse_next(input)
}

/// Consume a literal: number, string, boolean, or a leading `-` number.
fn literal<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Spanned<Literal>> {
    let checkpoint = input.checkpoint();
    if let Ok(minus_span) = token(input, &Token::Minus) {
        let negated: SResult<Spanned<Literal>> = any
            .verify_map(|t: &PositionedToken<'_>| match &t.token {
                Token::IntLiteral(v) => Some(Spanned::new(Literal::Int(-v), t.span)),
                Token::FloatLiteral(v) => Some(Spanned::new(Literal::Float(-v), t.span)),
                _ => None,
            })
            .parse_next(input);
        match negated {
            Ok(value) => {
                return Ok(Spanned::new(
                    value.value().clone(),
                    minus_span.union(value.span()),
                ));
            }
            Err(_) => {
                input.reset(&checkpoint);
                return Err(backtrack());
            }
        }
    }
    any.verify_map(|t: &PositionedToken<'_>| {
        let lit = match &t.token {
            Token::IntLiteral(v) => Literal::Int(*v),
            Token::FloatLiteral(v) => Literal::Float(*v),
            Token::StringLiteral(s) => Literal::Str(s.clone()),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            _ => return None,
        };
        Some(Spanned::new(lit, t.span))
    })
    .parse_next(input)
}

/// Consume an operand: a literal, a reference (optionally with a `.member`
/// collection selector), or an indexed `intarray` element.
fn operand<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Operand> {
    if let Ok(lit) = literal(input) {
        return Ok(Operand::Literal(lit));
    }
    let name = ident(input)?;

    if token(input, &Token::Dot).is_ok() {
        let member = ident(input).map_err(|_| {
            cut(
                ErrorCode::E100,
                "expected a member name after `.`",
                Some(name.span()),
            )
        })?;
        return Ok(Operand::Ref {
            name,
            member: Some(member),
        });
    }

    if token(input, &Token::OpenBracket).is_ok() {
        let index = operand(input)?;
        let close = token(input, &Token::CloseBracket).map_err(|_| {
            cut(
                ErrorCode::E100,
                "expected `]` after the index",
                Some(name.span()),
            )
        })?;
        let index_span = index.span();
        return Ok(Operand::Index {
            name,
            index: Box::new(Spanned::new(index, index_span.union(close))),
        });
    }

    Ok(Operand::Ref { name, member: None })
}

fn compare_op<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<CompareOp> {
    any.verify_map(|t: &PositionedToken<'_>| match &t.token {
        Token::EqEq => Some(CompareOp::Eq),
        Token::NotEq => Some(CompareOp::Ne),
        Token::Less => Some(CompareOp::Lt),
        Token::Greater => Some(CompareOp::Gt),
        Token::LessEq => Some(CompareOp::Le),
        Token::GreaterEq => Some(CompareOp::Ge),
        _ => None,
    })
    .parse_next(input)
}

fn math_op<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<MathOp> {
    any.verify_map(|t: &PositionedToken<'_>| match &t.token {
        Token::Plus => Some(MathOp::Add),
        Token::Minus => Some(MathOp::Sub),
        Token::Star => Some(MathOp::Mul),
        Token::Slash => Some(MathOp::Div),
        _ => None,
    })
    .parse_next(input)
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// `or_expr := and_expr ('or' and_expr)*`
fn condition<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Condition> {
    let mut lhs = and_expr(input)?;
    while token(input, &Token::Or).is_ok() {
        let rhs = and_expr(input)?;
        lhs = Condition::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

/// `and_expr := not_expr ('and' not_expr)*`
fn and_expr<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Condition> {
    let mut lhs = not_expr(input)?;
    while token(input, &Token::And).is_ok() {
        let rhs = not_expr(input)?;
        lhs = Condition::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

/// `not_expr := 'not' not_expr | primary`
fn not_expr<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Condition> {
    if token(input, &Token::Not).is_ok() {
        let inner = not_expr(input)?;
        return Ok(Condition::Not(Box::new(inner)));
    }
    condition_primary(input)
}

/// `primary := '(' or_expr ')' | operand cmp operand`
fn condition_primary<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Condition> {
    if token(input, &Token::OpenParen).is_ok() {
        let inner = condition(input)?;
        token(input, &Token::CloseParen).map_err(|_| {
            cut(
                ErrorCode::E107,
                "expected `)` to close the group",
                None,
            )
        })?;
        return Ok(inner);
    }

    let lhs = operand(input).map_err(|e| match e {
        ErrMode::Backtrack(_) => cut(ErrorCode::E104, "expected a comparison", None),
        other => other,
    })?;
    let op = compare_op(input).map_err(|_| {
        cut(
            ErrorCode::E104,
            "expected a comparison operator",
            Some(lhs.span()),
        )
    })?;
    let rhs = operand(input).map_err(|e| match e {
        ErrMode::Backtrack(_) => cut(
            ErrorCode::E104,
            "expected a value after the comparison operator",
            Some(lhs.span()),
        ),
        other => other,
    })?;
    let span = lhs.span().union(rhs.span());
    Ok(Condition::Compare { lhs, op, rhs, span })
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// `VarDecl := Type Identifier ('=' DeclValue)? ';'?`
fn var_decl<'t, 'src>(input: &mut Input<'t, 'src>, ty: VarType) -> SResult<Variable> {
    // Consume the type keyword the dispatcher matched.
    let type_span = any
        .parse_next(input)
        .map(|t: &PositionedToken<'_>| t.span)?;

    let name = ident(input).map_err(|_| {
        cut(
            ErrorCode::E105,
            "expected a variable name after the type",
            Some(type_span),
        )
    })?;

    let value = if token(input, &Token::Assign).is_ok() {
        Some(decl_value(input).map_err(|e| match e {
            ErrMode::Backtrack(_) => cut(
                ErrorCode::E105,
                "expected a value after `=`",
                Some(name.span()),
            ),
            other => other,
        })?)
    } else {
        None
    };

    let _ = token(input, &Token::Semicolon);
    let span = match &value {
        Some(v) => type_span.union(v.span()),
        None => type_span.union(name.span()),
    };
    Ok(Variable {
        name,
        ty,
        value,
        span,
    })
}

/// A declared value: `row,col` coordinate, literal, or bare identifier.
fn decl_value<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Spanned<DeclValue>> {
    // Coordinate form: `int , int` (building foot points).
    let checkpoint = input.checkpoint();
    if let Ok(row) = literal(input) {
        if let (Some(Literal::Int(r)), Ok(_)) =
            (Some(row.value().clone()), token(input, &Token::Comma))
        {
            if let Ok(col) = literal(input) {
                if let Literal::Int(c) = col.value() {
                    if let (Ok(r), Ok(c)) = (u32::try_from(r), u32::try_from(*c)) {
                        return Ok(Spanned::new(
                            DeclValue::Coord { row: r, col: c },
                            row.span().union(col.span()),
                        ));
                    }
                }
            }
            input.reset(&checkpoint);
        } else {
            input.reset(&checkpoint);
        }
    } else {
        input.reset(&checkpoint);
    }

    if let Ok(lit) = literal(input) {
        let span = lit.span();
        return Ok(Spanned::new(DeclValue::Literal(lit.into_value()), span));
    }
    let name = ident(input)?;
    let span = name.span();
    Ok(Spanned::new(
        DeclValue::Literal(Literal::Ident(name.into_value())),
        span,
    ))
}

/// `TriggerStmt := ('if'|'when') '(' Head ')' ('((' Condition '))')?
///                 '[' EventRef ']' ('[' EventRef ']')? ';'?`
fn trigger_stmt<'t, 'src>(
    input: &mut Input<'t, 'src>,
    line: &[PositionedToken<'src>],
) -> SResult<Trigger> {
    let (occurrence, occ_span) = any
        .verify_map(|t: &PositionedToken<'_>| match &t.token {
            Token::If => Some((Occurrence::If, t.span)),
            Token::When => Some((Occurrence::When, t.span)),
            _ => None,
        })
        .parse_next(input)?;

    token(input, &Token::OpenParen).map_err(|_| {
        cut(
            ErrorCode::E104,
            "expected `(` after the trigger keyword",
            Some(occ_span),
        )
    })?;

    let head = trigger_head(input, occ_span)?;

    token(input, &Token::CloseParen).map_err(|_| {
        cut(
            ErrorCode::E104,
            "expected `)` to close the trigger head",
            Some(head.span()),
        )
    })?;

    let condition = match peek_token(input).map(|t| t.token.clone()) {
        Some(Token::DoubleOpenParen) => {
            let open = token(input, &Token::DoubleOpenParen)?;
            let cond = condition(input)?;
            token(input, &Token::DoubleCloseParen).map_err(|_| {
                cut(
                    ErrorCode::E107,
                    "expected `))` to close the condition",
                    Some(open.union(cond.span())),
                )
            })?;
            Some(cond)
        }
        Some(Token::OpenParen) => {
            return Err(cut(
                ErrorCode::E101,
                "inline conditions require double parentheses `((...))`",
                Some(single_paren_span(input, line)),
            ));
        }
        _ => None,
    };

    let true_event = event_ref(input).map_err(|e| match e {
        ErrMode::Backtrack(_) => cut(
            ErrorCode::E106,
            "expected `[EventChain]` after the trigger",
            Some(occ_span),
        ),
        other => other,
    })?;
    let false_event = match peek_token(input).map(|t| t.token.clone()) {
        Some(Token::OpenBracket) => Some(event_ref(input)?),
        _ => None,
    };

    let _ = token(input, &Token::Semicolon);

    let end_span = false_event
        .as_ref()
        .map(Spanned::span)
        .unwrap_or_else(|| true_event.span());
    Ok(Trigger {
        occurrence,
        head,
        condition,
        true_event,
        false_event,
        span: occ_span.union(end_span),
    })
}

/// The head between the trigger's parens: a value comparison
/// (`crystals>50`) or an engine occurrence (`enter:4,5`).
fn trigger_head<'t, 'src>(input: &mut Input<'t, 'src>, occ_span: Span) -> SResult<TriggerHead> {
    // Comparison form first: `enter:4,5` fails it cheaply at the operator.
    let checkpoint = input.checkpoint();
    if let Ok(lhs) = operand(input) {
        if let Ok(op) = compare_op(input) {
            let rhs = operand(input).map_err(|e| match e {
                ErrMode::Backtrack(_) => cut(
                    ErrorCode::E104,
                    "expected a value after the comparison operator",
                    Some(lhs.span()),
                ),
                other => other,
            })?;
            let span = lhs.span().union(rhs.span());
            return Ok(TriggerHead::Comparison(Condition::Compare {
                lhs,
                op,
                rhs,
                span,
            }));
        }
    }
    input.reset(&checkpoint);

    let kind = ident(input).map_err(|_| {
        cut(
            ErrorCode::E104,
            "expected a trigger kind or comparison",
            Some(occ_span),
        )
    })?;

    let args = if token(input, &Token::Colon).is_ok() {
        let args: Vec<Spanned<Literal>> = separated(
            1..,
            |i: &mut Input<'t, 'src>| head_arg(i),
            |i: &mut Input<'t, 'src>| token(i, &Token::Comma),
        )
        .parse_next(input)
        .map_err(|_: ErrMode<ContextError<ScriptCtx>>| {
            cut(
                ErrorCode::E104,
                "expected trigger arguments after `:`",
                Some(kind.span()),
            )
        })?;
        args
    } else {
        Vec::new()
    };

    Ok(TriggerHead::Event { kind, args })
}

/// A trigger-head argument: literal or bare identifier.
fn head_arg<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Spanned<Literal>> {
    if let Ok(lit) = literal(input) {
        return Ok(lit);
    }
    ident(input).map(|name| {
        let span = name.span();
        Spanned::new(Literal::Ident(name.into_value()), span)
    })
}

/// `'[' Identifier ']'`
fn event_ref<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Spanned<String>> {
    let open = token(input, &Token::OpenBracket)?;
    let name = ident(input).map_err(|_| {
        cut(
            ErrorCode::E106,
            "expected an event chain name inside `[...]`",
            Some(open),
        )
    })?;
    let close = token(input, &Token::CloseBracket).map_err(|_| {
        cut(
            ErrorCode::E106,
            "expected `]` after the event chain name",
            Some(name.span()),
        )
    })?;
    Ok(Spanned::new(
        name.value().clone(),
        open.union(close),
    ))
}

/// The span of a single-paren condition, from its `(` through the `)` that
/// precedes the event reference (or to the end of the line).
fn single_paren_span(
    input: &mut Input<'_, '_>,
    line: &[PositionedToken<'_>],
) -> Span {
    let index = line.len() - input.eof_offset();
    let start = line[index].span;
    let mut end = start;
    for tok in &line[index..] {
        if matches!(tok.token, Token::OpenBracket) {
            break;
        }
        end = tok.span;
    }
    start.union(end)
}

/// `Command := ('~'|'?')? Identifier ('[' Operand ']')? (':' ParamList)? ';'?`
fn command_stmt<'t, 'src>(
    input: &mut Input<'t, 'src>,
) -> SResult<cavern_core::script::Command> {
    let modifier_res: SResult<Spanned<Modifier>> = any
        .verify_map(|t: &PositionedToken<'_>| match &t.token {
            Token::Tilde => Some(Spanned::new(Modifier::FailureGuard, t.span)),
            Token::Question => Some(Spanned::new(Modifier::Optional, t.span)),
            _ => None,
        })
        .parse_next(input);
    let modifier = modifier_res.ok();

    let name = ident(input)?;

    let index = if token(input, &Token::OpenBracket).is_ok() {
        let idx = operand(input).map_err(|e| match e {
            ErrMode::Backtrack(_) => cut(
                ErrorCode::E100,
                "expected an index inside `[...]`",
                Some(name.span()),
            ),
            other => other,
        })?;
        let close = token(input, &Token::CloseBracket).map_err(|_| {
            cut(
                ErrorCode::E100,
                "expected `]` after the index",
                Some(name.span()),
            )
        })?;
        let span = idx.span().union(close);
        Some(Box::new(Spanned::new(idx, span)))
    } else {
        None
    };

    let params = if token(input, &Token::Colon).is_ok() {
        separated(
            1..,
            |i: &mut Input<'t, 'src>| param(i),
            |i: &mut Input<'t, 'src>| token(i, &Token::Comma),
        )
        .parse_next(input)
        .map_err(|e: ErrMode<ContextError<ScriptCtx>>| match e {
            ErrMode::Backtrack(_) => cut(
                ErrorCode::E100,
                "expected parameters after `:`",
                Some(name.span()),
            ),
            other => other,
        })?
    } else {
        Vec::new()
    };

    let _ = token(input, &Token::Semicolon);

    let end = params
        .last()
        .map(|p: &Spanned<Param>| p.span())
        .unwrap_or_else(|| name.span());
    let start = modifier
        .as_ref()
        .map(Spanned::span)
        .unwrap_or_else(|| name.span());
    Ok(cavern_core::script::Command {
        modifier,
        name,
        index,
        params,
        span: start.union(end),
    })
}

/// One parameter: an operand, optionally one arithmetic operation. A
/// second operator in the same parameter is rejected at parse time.
fn param<'t, 'src>(input: &mut Input<'t, 'src>) -> SResult<Spanned<Param>> {
    let lhs = operand(input)?;

    let Ok(op) = math_op(input) else {
        let span = lhs.span();
        return Ok(Spanned::new(Param::Value(lhs), span));
    };

    let rhs = operand(input).map_err(|e| match e {
        ErrMode::Backtrack(_) => cut(
            ErrorCode::E100,
            "expected a value after the operator",
            Some(lhs.span()),
        ),
        other => other,
    })?;

    // `a+b-c` is a compile-time rejection, not a silent mis-evaluation.
    let chained = {
        let checkpoint = input.checkpoint();
        let extra = math_op(input).is_ok();
        input.reset(&checkpoint);
        extra
    };
    if chained {
        return Err(cut(
            ErrorCode::E102,
            "arithmetic is limited to one operation per statement",
            Some(lhs.span().union(rhs.span())),
        ));
    }

    let span = lhs.span().union(rhs.span());
    Ok(Spanned::new(Param::Math { lhs, op, rhs }, span))
}

// ---------------------------------------------------------------------------
// Line dispatch
// ---------------------------------------------------------------------------

/// One grouped source line.
struct Line<'src> {
    tokens: Vec<PositionedToken<'src>>,
    /// Closed by a blank line (as opposed to a plain newline).
    blank: bool,
}

impl Line<'_> {
    fn span(&self) -> Span {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.union(last.span),
            _ => Span::default(),
        }
    }
}

/// Group a token stream into lines of significant tokens.
fn group_lines<'src>(tokens: &[PositionedToken<'src>]) -> Vec<Line<'src>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match &token.token {
            Token::Newline => {
                lines.push(Line {
                    tokens: std::mem::take(&mut current),
                    blank: false,
                });
            }
            Token::BlankLine => {
                lines.push(Line {
                    tokens: std::mem::take(&mut current),
                    blank: true,
                });
            }
            t if t.is_trivia() => {}
            _ => current.push(token.clone()),
        }
    }
    if !current.is_empty() {
        lines.push(Line {
            tokens: current,
            blank: false,
        });
    }
    lines
}

/// Parse script tokens into a [`ScriptModel`] plus diagnostics.
pub fn parse_script(tokens: &[PositionedToken<'_>]) -> (ScriptModel, Vec<Diagnostic>) {
    let mut collector = DiagnosticCollector::new();
    let mut variables = Vec::new();
    let mut triggers = Vec::new();
    let mut chains: Vec<EventChain> = Vec::new();
    let mut current: Option<EventChain> = None;

    let mut close_chain = |current: &mut Option<EventChain>, chains: &mut Vec<EventChain>| {
        if let Some(chain) = current.take() {
            chains.push(chain);
        }
    };

    for line in group_lines(tokens) {
        if line.tokens.is_empty() {
            if line.blank {
                close_chain(&mut current, &mut chains);
            }
            continue;
        }

        let first = &line.tokens[0].token;
        let second = line.tokens.get(1).map(|t| &t.token);

        // `Name::` opens a new chain; the previous one closes.
        if matches!(first, Token::Identifier(_)) && matches!(second, Some(Token::DoubleColon)) {
            close_chain(&mut current, &mut chains);
            let Token::Identifier(name) = first else {
                unreachable!()
            };
            let name_span = line.tokens[0].span;
            current = Some(EventChain {
                name: Spanned::new((*name).to_string(), name_span),
                commands: Vec::new(),
                span: name_span,
            });

            // Commands may follow the declaration on the same line.
            let rest = &line.tokens[2..];
            if !rest.is_empty() {
                parse_command_line(rest, &mut current, &mut collector);
            }
            continue;
        }

        match first {
            Token::Identifier(word) if VarType::from_keyword(word).is_some() => {
                close_chain(&mut current, &mut chains);
                let ty = VarType::from_keyword(word).expect("matched above");
                let mut input = TokenSlice::new(&line.tokens);
                match var_decl(&mut input, ty) {
                    Ok(variable) => {
                        expect_line_end(&mut input, &line, &mut collector);
                        variables.push(variable);
                    }
                    Err(e) => emit_parse_error(e, &line, &mut collector),
                }
            }
            Token::If | Token::When => {
                close_chain(&mut current, &mut chains);
                let mut input = TokenSlice::new(&line.tokens);
                match trigger_stmt(&mut input, &line.tokens) {
                    Ok(trigger) => {
                        expect_line_end(&mut input, &line, &mut collector);
                        triggers.push(trigger);
                    }
                    Err(e) => emit_parse_error(e, &line, &mut collector),
                }
            }
            Token::Identifier(_) | Token::Tilde | Token::Question => {
                if current.is_none() {
                    collector.emit(
                        Diagnostic::error("command outside any event chain")
                            .with_code(ErrorCode::E108)
                            .with_label(line.span(), ErrorCode::E108.description())
                            .with_help("declare a chain with `Name::` first"),
                    );
                    continue;
                }
                parse_command_line(&line.tokens, &mut current, &mut collector);
            }
            _ => {
                collector.emit(
                    Diagnostic::error("malformed statement")
                        .with_code(ErrorCode::E100)
                        .with_label(line.span(), ErrorCode::E100.description()),
                );
            }
        }
    }
    close_chain(&mut current, &mut chains);

    let mut symbols = SymbolTable::new();
    for variable in &variables {
        // First declaration wins; duplicates are reported by the validator.
        if symbols.variable(variable.name.value()).is_none() {
            symbols.declare_variable(
                variable.name.value(),
                VarEntry {
                    ty: variable.ty,
                    decl_span: variable.name.span(),
                },
            );
        }
    }
    for chain in &chains {
        if symbols.chain(chain.name.value()).is_none() {
            symbols.declare_chain(chain.name.value(), chain.name.span());
        }
    }

    (
        ScriptModel {
            variables,
            triggers,
            chains,
            symbols,
        },
        collector.finish(),
    )
}

/// Parse one command line into the open chain.
fn parse_command_line<'src>(
    tokens: &[PositionedToken<'src>],
    current: &mut Option<EventChain>,
    collector: &mut DiagnosticCollector,
) {
    let mut input = TokenSlice::new(tokens);
    match command_stmt(&mut input) {
        Ok(command) => {
            let leftover = input.eof_offset();
            if leftover > 0 {
                let index = tokens.len() - leftover;
                report_leftover(&tokens[index..], collector);
            }
            if let Some(chain) = current.as_mut() {
                chain.span = chain.span.union(command.span);
                chain.commands.push(command);
            }
        }
        Err(e) => {
            let line = Line {
                tokens: tokens.to_vec(),
                blank: false,
            };
            emit_parse_error(e, &line, collector);
        }
    }
}

/// After a successful statement parse, any remaining tokens are a
/// diagnostic (one statement per line).
fn expect_line_end(
    input: &mut Input<'_, '_>,
    line: &Line<'_>,
    collector: &mut DiagnosticCollector,
) {
    let leftover = input.eof_offset();
    if leftover > 0 {
        let index = line.tokens.len() - leftover;
        report_leftover(&line.tokens[index..], collector);
    }
}

fn report_leftover(rest: &[PositionedToken<'_>], collector: &mut DiagnosticCollector) {
    let Some(first) = rest.first() else {
        return;
    };
    let span = rest
        .iter()
        .fold(first.span, |acc, t| acc.union(t.span));

    // A modifier that is not at statement start gets its own code.
    if matches!(first.token, Token::Tilde | Token::Question) {
        collector.emit(
            Diagnostic::error("`~` and `?` are only valid at the start of a statement")
                .with_code(ErrorCode::E103)
                .with_label(span, ErrorCode::E103.description()),
        );
        return;
    }
    collector.emit(
        Diagnostic::error("unexpected tokens after the statement")
            .with_code(ErrorCode::E100)
            .with_label(span, ErrorCode::E100.description())
            .with_help("the grammar is one statement per line"),
    );
}

/// Convert a statement parse error into a diagnostic.
fn emit_parse_error(
    err: ErrMode<ContextError<ScriptCtx>>,
    line: &Line<'_>,
    collector: &mut DiagnosticCollector,
) {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(ScriptCtx {
        code,
        message,
        span,
    }) = context_error.context().next()
    {
        let span = span.unwrap_or_else(|| line.span());
        collector.emit(
            Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description()),
        );
        return;
    }

    collector.emit(
        Diagnostic::error("malformed statement")
            .with_code(ErrorCode::E100)
            .with_label(line.span(), ErrorCode::E100.description()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{LexMode, tokenize};

    fn parse(source: &str) -> (ScriptModel, Vec<Diagnostic>) {
        let (tokens, lex_diags) = tokenize(source, LexMode::Script);
        assert!(lex_diags.is_empty(), "unexpected lexer diagnostics: {lex_diags:?}");
        parse_script(&tokens)
    }

    fn assert_clean(source: &str) -> ScriptModel {
        let (model, diags) = parse(source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        model
    }

    #[test]
    fn variable_declarations() {
        let model = assert_clean(
            "int Count=5\nfloat Rate=0.5\nbool Flag=true\nstring Name=\"hi\"\nminer Chief=3\nbuilding Dock=2,3\nintarray Stash\n",
        );
        assert_eq!(model.variables.len(), 7);
        assert_eq!(model.variables[0].ty, VarType::Int);
        assert_eq!(
            model.variables[5].value.as_ref().map(|v| v.value().clone()),
            Some(DeclValue::Coord { row: 2, col: 3 })
        );
        assert!(model.variables[6].value.is_none());
        assert!(model.symbols.variable("Count").is_some());
    }

    #[test]
    fn trigger_with_event_head() {
        let model = assert_clean("when(enter:4,5)[Open]\n");
        assert_eq!(model.triggers.len(), 1);
        let trigger = &model.triggers[0];
        assert_eq!(trigger.occurrence, Occurrence::When);
        assert_eq!(trigger.head.kind(), Some("enter"));
        assert_eq!(trigger.head.signature(), "enter:4:5");
        assert_eq!(trigger.true_event.value(), "Open");
        assert!(trigger.false_event.is_none());
    }

    #[test]
    fn trigger_with_comparison_head_and_condition() {
        let model = assert_clean("when(crystals>50)((HasKey==true))[Open][Stay]\n");
        let trigger = &model.triggers[0];
        assert_eq!(trigger.head.kind(), None);
        assert_eq!(trigger.head.signature(), "cmp:crystals>50");
        assert!(trigger.condition.is_some());
        assert_eq!(
            trigger.false_event.as_ref().map(|e| e.value().as_str()),
            Some("Stay")
        );
    }

    #[test]
    fn single_paren_condition_is_a_parse_error() {
        let (model, diags) = parse("when(crystals>50)(HasKey==true)[Open]\n");
        assert!(model.triggers.is_empty());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E101));
        // The label points at the condition, not the head.
        let span = diags[0].primary_span().unwrap();
        let source = "when(crystals>50)(HasKey==true)[Open]\n";
        assert_eq!(&source[span.start()..span.end()], "(HasKey==true)");
    }

    #[test]
    fn double_paren_condition_parses_clean() {
        let (_, diags) = parse("when(crystals>50)((HasKey==true))[Open]\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn chains_collect_commands() {
        let model = assert_clean("Open::\nmsg:Greeting;\nwait:2;\npan:4,5;\n");
        assert_eq!(model.chains.len(), 1);
        let chain = &model.chains[0];
        assert_eq!(chain.name.value(), "Open");
        assert_eq!(chain.commands.len(), 3);
        assert_eq!(chain.commands[1].name.value(), "wait");
    }

    #[test]
    fn comment_line_keeps_chain_open_blank_line_closes_it() {
        let model = assert_clean(
            "Open::\nmsg:Greeting;\n# still inside the chain\nwait:2;\n\nNext::\npan:1,1;\n",
        );
        assert_eq!(model.chains.len(), 2);
        assert_eq!(model.chains[0].commands.len(), 2);
        assert_eq!(model.chains[1].commands.len(), 1);
    }

    #[test]
    fn chain_declaration_closes_previous_chain() {
        let model = assert_clean("A::\nmsg:x;\nB::\nmsg:y;\n");
        assert_eq!(model.chains.len(), 2);
        assert_eq!(model.chains[0].commands.len(), 1);
    }

    #[test]
    fn arithmetic_allows_exactly_one_operation() {
        let model = assert_clean("Sum::\nCount:Count+1;\n");
        match model.chains[0].commands[0].params[0].value() {
            Param::Math { op, .. } => assert_eq!(*op, MathOp::Add),
            other => panic!("expected math param, got {other:?}"),
        }

        let (_, diags) = parse("Sum::\nCount:Count+1-2;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E102));
    }

    #[test]
    fn failure_guard_modifier_parses_at_statement_start() {
        let model = assert_clean("Spawn::\nemerge:4,5,N,CreatureRockMonster_C,2;\n~msg:Failed;\n");
        let guarded = &model.chains[0].commands[1];
        assert_eq!(
            guarded.modifier.as_ref().map(|m| *m.value()),
            Some(Modifier::FailureGuard)
        );
    }

    #[test]
    fn misplaced_modifier_is_reported() {
        let (_, diags) = parse("Spawn::\nmsg:Hi; ~\n");
        assert!(diags.iter().any(|d| d.code() == Some(ErrorCode::E103)));
    }

    #[test]
    fn command_outside_chain_is_reported() {
        let (_, diags) = parse("msg:Hello;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E108));
    }

    #[test]
    fn malformed_line_recovers_and_next_statement_parses() {
        let (model, diags) = parse("int = broken\nint Fine=1\n");
        assert!(!diags.is_empty());
        assert_eq!(model.variables.len(), 1);
        assert_eq!(model.variables[0].name.value(), "Fine");
    }

    #[test]
    fn indexed_assignment_parses() {
        let model = assert_clean("intarray Stash\nFill::\nStash[0]:5;\n");
        let command = &model.chains[0].commands[0];
        assert!(command.index.is_some());
    }

    #[test]
    fn collection_member_reads_parse() {
        let model = assert_clean("when(buildings.BuildingToolStore_C==0)[Rebuild]\n");
        assert_eq!(
            model.triggers[0].head.signature(),
            "cmp:buildings.BuildingToolStore_C==0"
        );
    }

    #[test]
    fn chain_symbols_are_declared() {
        let model = assert_clean("A::\nmsg:x;\n\nB::\nmsg:y;\n");
        assert!(model.symbols.chain("A").is_some());
        assert!(model.symbols.chain("B").is_some());
        assert!(model.symbols.chain("C").is_none());
    }
}
