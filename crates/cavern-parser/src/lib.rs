//! # Cavern Parser
//!
//! Parsing and semantic-validation pipeline for the Cavern map container
//! format and its embedded trigger script.
//!
//! The pipeline never fails and never panics on any input: every stage
//! reports findings as [`error::Diagnostic`]s and the document always
//! parses into *some* model, worst case an empty one with a structural
//! diagnostic. Diagnostics are additive annotations; consumers decide how
//! to react per severity.
//!
//! ```
//! use cavern_parser::{analyze, ValidateOptions};
//!
//! let source = "info{\nrowcount:1\ncolcount:2\n}\ntiles{\n1,1,\n}\n";
//! let outcome = analyze(source, &ValidateOptions::default());
//! assert!(outcome.diagnostics.is_empty());
//! assert_eq!(outcome.document.sections().len(), 2);
//! ```

pub mod error;
pub mod lexer;
pub mod schema;
pub mod splitter;
pub mod tokens;

mod grid;
mod keyvalue;
mod objects;
mod script;
mod validate;

pub use grid::{parse_grid, parse_resources};
pub use keyvalue::parse_keyvalue;
pub use objects::parse_objects;
pub use script::parse_script;
pub use validate::{ValidateOptions, validate};

use cavern_core::arena::{Entity, EntityArena};
use cavern_core::document::{Document, Section, SectionBody, SectionKind};
use cavern_core::script::ScriptModel;

use crate::error::{Diagnostic, DiagnosticCollector};
use crate::lexer::LexMode;
use crate::splitter::RawSection;

/// The result of running the pipeline: the model plus everything the
/// pipeline had to say about the text.
#[derive(Debug)]
pub struct ParseOutcome {
    pub document: Document,
    /// Ordered by primary span; stable across reparses of unchanged text.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// Whether any error-severity diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity().is_error())
    }

    /// Apply the error gate: the document when no errors were reported,
    /// [`error::ParseFailed`] otherwise. Exporters use this; editor
    /// surfaces keep the outcome and render the diagnostics instead.
    pub fn into_result(self) -> Result<Document, error::ParseFailed> {
        if self.has_errors() {
            Err(error::ParseFailed::new(self.diagnostics))
        } else {
            Ok(self.document)
        }
    }
}

/// Parse a document without semantic validation.
///
/// Sections are parsed in on-disk order, except that `info` is processed
/// first so later stages can see the declared dimensions.
pub fn parse(source: &str) -> ParseOutcome {
    let mut collector = DiagnosticCollector::new();
    let (raw_sections, split_diags) = splitter::split(source);
    log::debug!(sections = raw_sections.len(), bytes = source.len(); "document split");
    collector.extend(split_diags);

    // `info` first, regardless of physical position.
    let order: Vec<usize> = {
        let mut order: Vec<usize> = (0..raw_sections.len()).collect();
        order.sort_by_key(|&i| {
            (
                SectionKind::from_name(raw_sections[i].name.value()) != SectionKind::Info,
                i,
            )
        });
        order
    };

    let mut parsed: Vec<(usize, Section)> = Vec::with_capacity(raw_sections.len());
    for index in order {
        let raw = &raw_sections[index];
        let section = parse_section(raw, &mut collector);
        parsed.push((index, section));
    }
    parsed.sort_by_key(|(index, _)| *index);

    let sections: Vec<Section> = parsed.into_iter().map(|(_, s)| s).collect();
    let arena = build_arena(&sections);

    ParseOutcome {
        document: Document::new(sections, arena),
        diagnostics: collector.finish(),
    }
}

/// Parse a document and run the semantic validator over the result.
pub fn analyze(source: &str, options: &ValidateOptions) -> ParseOutcome {
    let outcome = parse(source);
    let mut collector = DiagnosticCollector::new();
    collector.extend(outcome.diagnostics);
    collector.extend(validate(&outcome.document, options));
    ParseOutcome {
        document: outcome.document,
        diagnostics: collector.finish(),
    }
}

/// Parse one raw section according to its kind.
fn parse_section(raw: &RawSection<'_>, collector: &mut DiagnosticCollector) -> Section {
    let kind = SectionKind::from_name(raw.name.value());
    let section_name = raw.name.value().clone();

    let tag = |diags: Vec<Diagnostic>, collector: &mut DiagnosticCollector| {
        collector.extend(
            diags
                .into_iter()
                .map(|d| d.with_section(section_name.clone())),
        );
    };

    let body = match kind {
        SectionKind::Info => {
            let (map, diags) = parse_keyvalue(raw);
            tag(diags, collector);
            SectionBody::KeyValue(map)
        }
        SectionKind::Tiles | SectionKind::Height => {
            let (grid, diags) = parse_grid(raw);
            tag(diags, collector);
            SectionBody::Grid(grid)
        }
        SectionKind::Resources => {
            let (layers, diags) = parse_resources(raw);
            tag(diags, collector);
            SectionBody::Resources(layers)
        }
        SectionKind::Buildings
        | SectionKind::Vehicles
        | SectionKind::Creatures
        | SectionKind::Miners => {
            let object_kind = kind.object_kind().expect("object sections have a kind");
            let (records, diags) = parse_objects(raw, object_kind);
            tag(diags, collector);
            SectionBody::ObjectList(records)
        }
        SectionKind::Script => {
            let (model, diags) = parse_script_section(raw);
            tag(diags, collector);
            SectionBody::Script(model)
        }
        SectionKind::Briefing
        | SectionKind::BriefingSuccess
        | SectionKind::BriefingFailure
        | SectionKind::Comments => SectionBody::Text(text_lines(raw.body)),
        SectionKind::Unknown => {
            collector.emit(
                Diagnostic::warning(format!("unknown section `{}`", raw.name.value()))
                    .with_code(error::ErrorCode::E303)
                    .with_label(raw.name.span(), error::ErrorCode::E303.description()),
            );
            SectionBody::Text(text_lines(raw.body))
        }
    };

    Section {
        name: raw.name.clone(),
        kind,
        body,
        span: raw.span,
        body_span: raw.body_span,
    }
}

/// Tokenize and parse a `script{}` body.
fn parse_script_section(raw: &RawSection<'_>) -> (ScriptModel, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) =
        lexer::tokenize_at(raw.body, LexMode::Script, raw.body_offset);
    let (model, parse_diags) = parse_script(&tokens);
    diagnostics.extend(parse_diags);
    (model, diagnostics)
}

fn text_lines(body: &str) -> Vec<String> {
    body.lines().map(str::to_string).collect()
}

/// Populate the entity arena from the object-list sections.
fn build_arena(sections: &[Section]) -> EntityArena {
    let mut arena = EntityArena::new();
    for section in sections {
        let (SectionBody::ObjectList(records), Some(_)) =
            (&section.body, section.kind.object_kind())
        else {
            continue;
        };
        for record in records {
            // Duplicate keys collapse to the first entity; the validator
            // reports bindings against them uniformly.
            if arena.find(record.kind, record.key).is_none() {
                arena.insert(Entity {
                    kind: record.kind,
                    key: record.key,
                    type_name: record.type_name.clone(),
                });
            }
        }
    }
    arena
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_parses_every_section_kind() {
        let source = "\
info{
rowcount:2
colcount:2
}
tiles{
1,1,
1,6,
}
height{
0,0,
0,0,
}
resources{
crystals:
0,1,
0,0,
ore:
0,0,
1,0,
}
miners{
pilot,0,1,1
}
buildings{
toolstore,0,0
}
script{
int Count=0

Open::
msg:Count;
}
briefing{
Welcome to the cavern.
}
";
        let outcome = parse(source);
        assert!(
            outcome.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            outcome.diagnostics
        );
        let doc = &outcome.document;
        assert_eq!(doc.sections().len(), 8);
        assert_eq!(doc.grid(SectionKind::Tiles).unwrap().width(), 2);
        assert!(doc.script().is_some());
        assert_eq!(doc.info_int("rowcount"), Some(2));
        assert_eq!(
            doc.arena()
                .count(cavern_core::objects::ObjectKind::Miner),
            1
        );
    }

    #[test]
    fn empty_input_yields_empty_document() {
        let outcome = parse("");
        assert!(outcome.document.sections().is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn info_is_processed_first_regardless_of_position() {
        // `tiles` precedes `info` on disk; the parse still succeeds and
        // the validator sees declared dimensions.
        let source = "tiles{\n1,1,\n}\ninfo{\nrowcount:1\ncolcount:2\n}\n";
        let outcome = analyze(source, &ValidateOptions::default());
        assert!(
            outcome.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            outcome.diagnostics
        );
        // On-disk order is preserved in the model.
        assert_eq!(outcome.document.sections()[0].kind, SectionKind::Tiles);
    }

    #[test]
    fn section_diagnostics_carry_the_section_name() {
        let source = "tiles{\n1,x,\n}\n";
        let outcome = parse(source);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].section(), Some("tiles"));
    }

    #[test]
    fn error_gate_blocks_on_errors_only() {
        let clean = analyze("tiles{\n1,\n}\n", &ValidateOptions::default());
        assert!(clean.into_result().is_ok());

        let warned = analyze(
            "script{\na::\nmsg:\"x\";\n\nwhen(enter:1,1)[a]\nwhen(enter:1,1)[a]\n}\n",
            &ValidateOptions::default(),
        );
        assert!(warned.into_result().is_ok());

        let broken = analyze("script{\nint crystals=1\n}\n", &ValidateOptions::default());
        let err = broken.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 error(s) in the document");
    }

    #[test]
    fn unknown_section_warns_and_keeps_text() {
        let outcome = parse("weather{\nrainy\n}\n");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].code(),
            Some(error::ErrorCode::E303)
        );
        match &outcome.document.sections()[0].body {
            SectionBody::Text(lines) => assert!(lines.iter().any(|l| l == "rainy")),
            other => panic!("expected text body, got {other:?}"),
        }
    }
}
