//! Top-level section splitter.
//!
//! Divides a whole document into named brace-delimited blocks with exact
//! spans. This is a balanced-brace scan, not a regex split: quoted strings
//! inside bodies (briefing text) may contain braces and must not close a
//! section early. An unterminated section is reported once and closed at
//! end-of-file so the rest of the pipeline still runs.

use cavern_core::span::{Span, Spanned};

use crate::error::{Diagnostic, ErrorCode};

/// A raw, unparsed section located in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection<'src> {
    pub name: Spanned<String>,
    /// Body text between the braces.
    pub body: &'src str,
    /// Byte offset of `body` within the source.
    pub body_offset: usize,
    /// Whole section span including braces.
    pub span: Span,
    /// Body span between the braces.
    pub body_span: Span,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a document into raw sections, in on-disk order.
///
/// Never fails; structural problems become diagnostics and the scan
/// continues past them.
pub fn split(source: &str) -> (Vec<RawSection<'_>>, Vec<Diagnostic>) {
    let mut sections = Vec::new();
    let mut diagnostics = Vec::new();
    let bytes = source.as_bytes();
    let len = source.len();
    let mut pos = 0;

    while pos < len {
        // Skip inter-section whitespace.
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let name_start = pos;
        while pos < len && is_name_char(bytes[pos] as char) {
            pos += 1;
        }
        let name_end = pos;

        // A name must be followed (after optional spaces) by `{`.
        let mut brace_pos = pos;
        while brace_pos < len && matches!(bytes[brace_pos], b' ' | b'\t' | b'\r') {
            brace_pos += 1;
        }

        if name_end == name_start || brace_pos >= len || bytes[brace_pos] != b'{' {
            // Stray text: consume the rest of the line and report the run.
            let stray_start = name_start;
            let mut stray_end = pos.max(brace_pos);
            while stray_end < len && bytes[stray_end] != b'\n' {
                stray_end += 1;
            }
            diagnostics.push(
                Diagnostic::warning("text outside any section")
                    .with_code(ErrorCode::E301)
                    .with_label(
                        Span::new(stray_start..stray_end),
                        ErrorCode::E301.description(),
                    ),
            );
            pos = stray_end;
            continue;
        }

        let name = &source[name_start..name_end];
        let name_span = Span::new(name_start..name_end);
        let body_start = brace_pos + 1;

        // Balanced-brace scan, quote-aware.
        let mut depth = 1usize;
        let mut in_quote = false;
        let mut escaped = false;
        let mut scan = body_start;
        let mut body_end = None;
        while scan < len {
            let b = bytes[scan];
            if in_quote {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_quote = false;
                }
            } else {
                match b {
                    b'"' => in_quote = true,
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            body_end = Some(scan);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            scan += 1;
        }

        let (body_end, section_end) = match body_end {
            Some(end) => (end, end + 1),
            None => {
                diagnostics.push(
                    Diagnostic::error(format!("section `{name}` is never closed"))
                        .with_code(ErrorCode::E300)
                        .with_label(name_span, ErrorCode::E300.description())
                        .with_help("add a closing `}`; end-of-file is treated as the close"),
                );
                (len, len)
            }
        };

        if sections
            .iter()
            .any(|s: &RawSection<'_>| s.name.value() == name)
        {
            diagnostics.push(
                Diagnostic::warning(format!("duplicate section `{name}`"))
                    .with_code(ErrorCode::E302)
                    .with_label(name_span, ErrorCode::E302.description()),
            );
        }

        sections.push(RawSection {
            name: Spanned::new(name.to_string(), name_span),
            body: &source[body_start..body_end],
            body_offset: body_start,
            span: Span::new(name_start..section_end),
            body_span: Span::new(body_start..body_end),
        });
        pos = section_end;
    }

    (sections, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_named_sections_with_spans() {
        let source = "info{\nrowcount:4\n}\ntiles{\n1,1,\n}\n";
        let (sections, diags) = split(source);
        assert!(diags.is_empty());
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name.value(), "info");
        assert_eq!(sections[0].body, "\nrowcount:4\n");
        assert_eq!(sections[1].name.value(), "tiles");
        assert_eq!(&source[sections[1].body_span.start()..sections[1].body_span.end()], "\n1,1,\n");
    }

    #[test]
    fn braces_inside_quotes_do_not_close() {
        let source = "briefing{\nmessage:\"use the { and } keys\"\n}\n";
        let (sections, diags) = split(source);
        assert!(diags.is_empty());
        assert_eq!(sections.len(), 1);
        assert!(sections[0].body.contains("{ and }"));
    }

    #[test]
    fn nested_braces_balance() {
        let source = "script{\nif(time:1)[a]\n{nested {deeper}}\n}";
        let (sections, diags) = split(source);
        assert!(diags.is_empty());
        assert_eq!(sections.len(), 1);
        assert!(sections[0].body.ends_with("{nested {deeper}}\n"));
    }

    #[test]
    fn unterminated_section_recovers_at_eof() {
        let source = "info{\nrowcount:4\n";
        let (sections, diags) = split(source);
        assert_eq!(sections.len(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E300));
        assert_eq!(sections[0].body, "\nrowcount:4\n");
    }

    #[test]
    fn stray_text_is_reported_and_skipped() {
        let source = "junk here\ninfo{\n}\n";
        let (sections, diags) = split(source);
        assert_eq!(sections.len(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E301));
    }

    #[test]
    fn duplicate_sections_warn() {
        let source = "info{\n}\ninfo{\n}\n";
        let (sections, diags) = split(source);
        assert_eq!(sections.len(), 2);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E302));
    }

    #[test]
    fn empty_input_is_empty() {
        let (sections, diags) = split("");
        assert!(sections.is_empty());
        assert!(diags.is_empty());
    }
}
