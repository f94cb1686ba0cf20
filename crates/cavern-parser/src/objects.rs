//! Object-list section parser for `buildings`, `vehicles`, `creatures`,
//! and `miners`.
//!
//! Two physical forms are accepted:
//!
//! - single-line CSV: `Type,row,col[,orientation[,level]]` for buildings,
//!   `Type,id,row,col[,orientation[,level]]` for id-keyed kinds;
//! - multi-line blocks of `key: value` lines separated by blank lines.
//!
//! Type spellings are resolved to canonical ids before records are
//! returned; an unknown spelling is a warning and the raw spelling is
//! kept so the record stays visible downstream.

use indexmap::IndexMap;

use cavern_core::catalog;
use cavern_core::objects::{ObjectKey, ObjectKind, ObjectRecord};
use cavern_core::span::Span;

use crate::error::{Diagnostic, ErrorCode};
use crate::keyvalue::lines_with_offsets;
use crate::splitter::RawSection;

/// Parse an object-list section body.
pub fn parse_objects(
    section: &RawSection<'_>,
    kind: ObjectKind,
) -> (Vec<ObjectRecord>, Vec<Diagnostic>) {
    let mut records = Vec::new();
    let mut diagnostics = Vec::new();
    let mut block: Option<(IndexMap<String, String>, Span)> = None;

    for (offset, line) in lines_with_offsets(section.body, section.body_offset) {
        let trimmed = line.trim();
        let line_span = line_span(offset, line);

        if trimmed.is_empty() {
            if let Some((map, span)) = block.take() {
                build_block_record(kind, map, span, &mut records, &mut diagnostics);
            }
            continue;
        }

        let colon = trimmed.find(':');
        let comma = trimmed.find(',');
        let is_kv = match (colon, comma) {
            (Some(c), Some(m)) => c < m,
            (Some(_), None) => true,
            _ => false,
        };

        if is_kv {
            let (key, value) = trimmed.split_once(':').expect("checked above");
            let (map, span) = block.get_or_insert_with(|| (IndexMap::new(), line_span));
            map.insert(key.trim().to_string(), value.trim().to_string());
            *span = span.union(line_span);
        } else {
            if let Some((map, span)) = block.take() {
                build_block_record(kind, map, span, &mut records, &mut diagnostics);
            }
            parse_csv_record(kind, trimmed, line_span, &mut records, &mut diagnostics);
        }
    }
    if let Some((map, span)) = block.take() {
        build_block_record(kind, map, span, &mut records, &mut diagnostics);
    }

    (records, diagnostics)
}

fn line_span(offset: usize, line: &str) -> Span {
    let start = offset + (line.len() - line.trim_start().len());
    Span::new(start..start + line.trim().len())
}

/// Resolve a type spelling, warning on unknown spellings.
fn resolve(
    kind: ObjectKind,
    spelling: &str,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    match catalog::resolve_type(kind, spelling) {
        Some(canonical) => canonical.to_string(),
        None => {
            diagnostics.push(
                Diagnostic::warning(format!("unknown {kind} type `{spelling}`"))
                    .with_code(ErrorCode::E307)
                    .with_label(span, ErrorCode::E307.description()),
            );
            spelling.to_string()
        }
    }
}

fn parse_u32(
    field: &str,
    what: &str,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<u32> {
    match field.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            diagnostics.push(
                Diagnostic::error(format!("{what} `{}` is not a number", field.trim()))
                    .with_code(ErrorCode::E306)
                    .with_label(span, ErrorCode::E306.description()),
            );
            None
        }
    }
}

fn parse_csv_record(
    kind: ObjectKind,
    line: &str,
    span: Span,
    records: &mut Vec<ObjectRecord>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
    while fields.last() == Some(&"") {
        fields.pop();
    }

    let positional: &[&str] = match kind {
        ObjectKind::Building => &["row", "col", "orientation", "level"],
        _ => &["id", "row", "col", "orientation", "level"],
    };
    let required = match kind {
        ObjectKind::Building => 2,
        _ => 3,
    };

    let Some((type_field, rest)) = fields.split_first() else {
        return;
    };
    if rest.len() < required {
        diagnostics.push(
            Diagnostic::error(format!(
                "{kind} record needs at least {} fields after the type",
                required
            ))
            .with_code(ErrorCode::E306)
            .with_label(span, ErrorCode::E306.description()),
        );
        return;
    }

    let type_name = resolve(kind, type_field, span, diagnostics);
    let mut properties = IndexMap::new();
    for (name, value) in positional.iter().zip(rest.iter()) {
        properties.insert(name.to_string(), value.to_string());
    }

    let Some(key) = key_from_properties(kind, &properties, span, diagnostics) else {
        return;
    };
    records.push(ObjectRecord {
        kind,
        type_name,
        key,
        properties,
        span,
    });
}

fn build_block_record(
    kind: ObjectKind,
    mut map: IndexMap<String, String>,
    span: Span,
    records: &mut Vec<ObjectRecord>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(type_field) = map.shift_remove("type") else {
        diagnostics.push(
            Diagnostic::error(format!("{kind} record has no `type`"))
                .with_code(ErrorCode::E306)
                .with_label(span, ErrorCode::E306.description()),
        );
        return;
    };

    let type_name = resolve(kind, &type_field, span, diagnostics);
    let Some(key) = key_from_properties(kind, &map, span, diagnostics) else {
        return;
    };
    records.push(ObjectRecord {
        kind,
        type_name,
        key,
        properties: map,
        span,
    });
}

fn key_from_properties(
    kind: ObjectKind,
    properties: &IndexMap<String, String>,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ObjectKey> {
    let missing = |what: &str, diagnostics: &mut Vec<Diagnostic>| {
        diagnostics.push(
            Diagnostic::error(format!("{kind} record has no `{what}`"))
                .with_code(ErrorCode::E306)
                .with_label(span, ErrorCode::E306.description()),
        );
    };

    match kind {
        ObjectKind::Building => {
            let (Some(row), Some(col)) = (properties.get("row"), properties.get("col")) else {
                missing("row/col", diagnostics);
                return None;
            };
            Some(ObjectKey::Foot {
                row: parse_u32(row, "row", span, diagnostics)?,
                col: parse_u32(col, "col", span, diagnostics)?,
            })
        }
        _ => {
            let Some(id) = properties.get("id") else {
                missing("id", diagnostics);
                return None;
            };
            Some(ObjectKey::Id(parse_u32(id, "id", span, diagnostics)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::split;

    fn objects_of(kind: ObjectKind, body: &str) -> (Vec<ObjectRecord>, Vec<Diagnostic>) {
        let source = format!("{}{{\n{body}}}\n", kind.section_name());
        let (sections, _) = split(&source);
        parse_objects(&sections[0], kind)
    }

    #[test]
    fn csv_building_with_alias() {
        let (records, diags) = objects_of(ObjectKind::Building, "toolstore,2,3,90,1\n");
        assert!(diags.is_empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].type_name, "BuildingToolStore_C");
        assert_eq!(records[0].key, ObjectKey::Foot { row: 2, col: 3 });
        assert_eq!(records[0].orientation(), Some(90));
        assert_eq!(records[0].level(), Some(1));
    }

    #[test]
    fn csv_vehicle_keys_on_id() {
        let (records, diags) = objects_of(ObjectKind::Vehicle, "VehicleHoverScout_C,4,6,7\n");
        assert!(diags.is_empty());
        assert_eq!(records[0].key, ObjectKey::Id(4));
        assert_eq!(records[0].properties.get("row").map(String::as_str), Some("6"));
    }

    #[test]
    fn block_records_split_on_blank_lines() {
        let body = "type: pilot\nid: 0\nrow: 2\ncol: 2\n\ntype: pilot\nid: 1\nrow: 3\ncol: 3\n";
        let (records, diags) = objects_of(ObjectKind::Miner, body);
        assert!(diags.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, ObjectKey::Id(0));
        assert_eq!(records[1].key, ObjectKey::Id(1));
        assert_eq!(records[0].type_name, "Pilot_C");
    }

    #[test]
    fn unknown_type_warns_but_keeps_record() {
        let (records, diags) = objects_of(ObjectKind::Creature, "CreatureGremlin_C,9,4,4\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].type_name, "CreatureGremlin_C");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), Some(ErrorCode::E307));
    }

    #[test]
    fn missing_fields_are_errors() {
        let (records, diags) = objects_of(ObjectKind::Vehicle, "VehicleHoverScout_C,4\n");
        assert!(records.is_empty());
        assert!(diags.iter().any(|d| d.code() == Some(ErrorCode::E306)));
    }

    #[test]
    fn block_without_type_is_an_error() {
        let (records, diags) = objects_of(ObjectKind::Miner, "id: 0\nrow: 1\ncol: 1\n");
        assert!(records.is_empty());
        assert!(diags.iter().any(|d| d.code() == Some(ErrorCode::E306)));
    }

    #[test]
    fn mixed_forms_in_one_section() {
        let body = "toolstore,2,3\n\ntype: docks\nrow: 5\ncol: 6\n";
        let (records, diags) = objects_of(ObjectKind::Building, body);
        assert!(diags.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].type_name, "BuildingDocks_C");
    }
}
