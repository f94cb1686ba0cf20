//! Key-value section parser (`info{}` and friends).

use indexmap::IndexMap;

use cavern_core::span::Span;

use crate::error::{Diagnostic, ErrorCode};
use crate::splitter::RawSection;

/// Iterate the lines of a section body with their document-absolute byte
/// offsets.
pub(crate) fn lines_with_offsets<'src>(
    body: &'src str,
    base: usize,
) -> impl Iterator<Item = (usize, &'src str)> {
    let mut offset = 0;
    body.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (base + start, line)
    })
}

/// Parse `key:value` lines into an ordered map.
///
/// The first colon splits key and value; both are trimmed. Later
/// duplicates of a key overwrite earlier ones, matching how the engine
/// reads these sections. A line without a colon is a diagnostic and is
/// skipped.
pub fn parse_keyvalue(
    section: &RawSection<'_>,
) -> (IndexMap<String, String>, Vec<Diagnostic>) {
    let mut map = IndexMap::new();
    let mut diagnostics = Vec::new();

    for (offset, line) in lines_with_offsets(section.body, section.body_offset) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                let start = offset + (line.len() - line.trim_start().len());
                diagnostics.push(
                    Diagnostic::error("expected `key:value`")
                        .with_code(ErrorCode::E308)
                        .with_label(
                            Span::new(start..start + trimmed.len()),
                            ErrorCode::E308.description(),
                        ),
                );
            }
        }
    }

    (map, diagnostics)
}
