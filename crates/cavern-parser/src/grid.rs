//! Grid section parser for `tiles`, `height`, and the resource layers.

use cavern_core::grid::Grid;
use cavern_core::span::Span;

use crate::error::{Diagnostic, ErrorCode};
use crate::lexer::{LexMode, tokenize_at};
use crate::splitter::RawSection;
use crate::tokens::{PositionedToken, Token};

/// Parse a grid section body into a rectangular [`Grid`].
///
/// Comma-separated integers per line; trailing commas are tolerated.
/// Ragged rows are an error carrying the row index, and the offending row
/// is padded or truncated to the expected width so the returned grid is
/// always rectangular. Dimension checks against `info` happen later in
/// validation.
pub fn parse_grid(section: &RawSection<'_>) -> (Grid, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) =
        tokenize_at(section.body, LexMode::Data, section.body_offset);
    let grid = rows_to_grid(
        collect_rows(&tokens, &mut diagnostics),
        &mut diagnostics,
    );
    (grid, diagnostics)
}

/// One parsed row plus the span it covers.
pub(crate) struct RawRow {
    pub cells: Vec<u32>,
    pub span: Span,
}

/// Group data tokens into numeric rows, one per line.
pub(crate) fn collect_rows(
    tokens: &[PositionedToken<'_>],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<RawRow> {
    let mut rows = Vec::new();
    let mut cells = Vec::new();
    let mut row_span: Option<Span> = None;

    let mut flush = |cells: &mut Vec<u32>, row_span: &mut Option<Span>| {
        if let Some(span) = row_span.take() {
            if !cells.is_empty() {
                rows.push(RawRow {
                    cells: std::mem::take(cells),
                    span,
                });
            }
        }
        cells.clear();
    };

    for token in tokens {
        match &token.token {
            Token::IntLiteral(value) => {
                let widened = u32::try_from(*value).unwrap_or_else(|_| {
                    diagnostics.push(
                        Diagnostic::error(format!("cell value `{value}` is not a valid tile id"))
                            .with_code(ErrorCode::E305)
                            .with_label(token.span, ErrorCode::E305.description()),
                    );
                    0
                });
                cells.push(widened);
                row_span = Some(match row_span {
                    Some(span) => span.union(token.span),
                    None => token.span,
                });
            }
            Token::Comma | Token::Whitespace => {}
            Token::Newline | Token::BlankLine => flush(&mut cells, &mut row_span),
            other => {
                diagnostics.push(
                    Diagnostic::error(format!("expected an integer cell, found `{other}`"))
                        .with_code(ErrorCode::E305)
                        .with_label(token.span, ErrorCode::E305.description()),
                );
            }
        }
    }
    flush(&mut cells, &mut row_span);
    rows
}

/// Enforce rectangularity, repairing ragged rows to the first row's width.
pub(crate) fn rows_to_grid(rows: Vec<RawRow>, diagnostics: &mut Vec<Diagnostic>) -> Grid {
    let Some(width) = rows.first().map(|r| r.cells.len()) else {
        return Grid::empty();
    };

    let height = rows.len();
    let mut cells = Vec::with_capacity(width * height);
    for (index, mut row) in rows.into_iter().enumerate() {
        if row.cells.len() != width {
            diagnostics.push(
                Diagnostic::error(format!(
                    "row {} has {} cells, expected {}",
                    index,
                    row.cells.len(),
                    width
                ))
                .with_code(ErrorCode::E304)
                .with_label(row.span, ErrorCode::E304.description()),
            );
            row.cells.resize(width, 0);
        }
        cells.extend(row.cells);
    }

    Grid::from_cells(width, height, cells).unwrap_or_else(|_| Grid::empty())
}

/// Parse the `resources{}` section: `crystals:` and `ore:` labeled layers,
/// each a grid of its own.
pub fn parse_resources(
    section: &RawSection<'_>,
) -> (cavern_core::document::ResourceLayers, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) =
        tokenize_at(section.body, LexMode::Data, section.body_offset);

    let mut crystals: Option<Grid> = None;
    let mut ore: Option<Grid> = None;
    let mut current: Option<(String, Span, Vec<PositionedToken<'_>>)> = None;
    let mut at_line_start = true;

    let mut close = |layer: Option<(String, Span, Vec<PositionedToken<'_>>)>,
                     diagnostics: &mut Vec<Diagnostic>| {
        let Some((label, label_span, tokens)) = layer else {
            return;
        };
        let rows = collect_rows(&tokens, diagnostics);
        let grid = rows_to_grid(rows, diagnostics);
        match label.as_str() {
            "crystals" => crystals = Some(grid),
            "ore" => ore = Some(grid),
            other => diagnostics.push(
                Diagnostic::warning(format!("unknown resource layer `{other}`"))
                    .with_code(ErrorCode::E308)
                    .with_label(label_span, ErrorCode::E308.description()),
            ),
        }
    };

    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        // A layer label is `name:` at the start of a line.
        if at_line_start
            && matches!(token.token, Token::Identifier(_))
            && matches!(tokens.get(index + 1).map(|t| &t.token), Some(Token::Colon))
        {
            let Token::Identifier(label) = &token.token else {
                unreachable!()
            };
            close(current.take(), &mut diagnostics);
            current = Some((label.to_string(), token.span, Vec::new()));
            index += 2;
            at_line_start = false;
            continue;
        }

        match &token.token {
            Token::Newline | Token::BlankLine => at_line_start = true,
            Token::Whitespace => {}
            _ => at_line_start = false,
        }
        if let Some((_, _, layer_tokens)) = current.as_mut() {
            layer_tokens.push(token.clone());
        } else if !token.token.is_trivia() && !token.token.is_line_end() {
            diagnostics.push(
                Diagnostic::error(format!("expected a layer label, found `{}`", token.token))
                    .with_code(ErrorCode::E308)
                    .with_label(token.span, ErrorCode::E308.description()),
            );
        }
        index += 1;
    }
    close(current.take(), &mut diagnostics);

    for (name, grid) in [("crystals", &crystals), ("ore", &ore)] {
        if grid.is_none() {
            diagnostics.push(
                Diagnostic::warning(format!("resources section has no `{name}` layer"))
                    .with_code(ErrorCode::E309)
                    .with_label(section.name.span(), ErrorCode::E309.description()),
            );
        }
    }

    (
        cavern_core::document::ResourceLayers {
            crystals: crystals.unwrap_or_else(Grid::empty),
            ore: ore.unwrap_or_else(Grid::empty),
        },
        diagnostics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::split;

    fn grid_of(body: &str) -> (Grid, Vec<Diagnostic>) {
        let source = format!("tiles{{\n{body}}}\n");
        let (sections, _) = split(&source);
        parse_grid(&sections[0])
    }

    #[test]
    fn parses_rows_with_trailing_commas() {
        let (grid, diags) = grid_of("1,2,3,\n4,5,6,\n");
        assert!(diags.is_empty());
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(1, 2), Some(6));
    }

    #[test]
    fn ragged_row_reports_index_and_repairs() {
        let (grid, diags) = grid_of("1,2,3,\n4,5,\n7,8,9,\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E304));
        assert!(diags[0].message().contains("row 1"));
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(1, 2), Some(0));
    }

    #[test]
    fn non_integer_cell_is_reported() {
        let (grid, diags) = grid_of("1,x,3,\n");
        assert!(diags.iter().any(|d| d.code() == Some(ErrorCode::E305)));
        assert_eq!(grid.width(), 2);
    }

    #[test]
    fn empty_body_is_empty_grid() {
        let (grid, diags) = grid_of("");
        assert!(diags.is_empty());
        assert_eq!(grid.width(), 0);
        assert_eq!(grid.height(), 0);
    }

    #[test]
    fn round_trips_serialized_grids() {
        let original = Grid::from_cells(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let (parsed, diags) = grid_of(&original.serialize());
        assert!(diags.is_empty());
        assert_eq!(parsed, original);
    }

    #[test]
    fn resources_layers_parse_independently() {
        let source = "resources{\ncrystals:\n1,0,\n0,2,\nore:\n0,3,\n4,0,\n}\n";
        let (sections, _) = split(source);
        let (layers, diags) = parse_resources(&sections[0]);
        assert!(diags.is_empty());
        assert_eq!(layers.crystals.get(1, 1), Some(2));
        assert_eq!(layers.ore.get(1, 0), Some(4));
    }

    #[test]
    fn missing_ore_layer_warns() {
        let source = "resources{\ncrystals:\n1,\n}\n";
        let (sections, _) = split(source);
        let (layers, diags) = parse_resources(&sections[0]);
        assert!(diags.iter().any(|d| d.code() == Some(ErrorCode::E309)));
        assert_eq!(layers.ore.height(), 0);
    }
}
