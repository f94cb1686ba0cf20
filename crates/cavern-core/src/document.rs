//! The document model: an ordered sequence of parsed sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::arena::EntityArena;
use crate::grid::Grid;
use crate::objects::{ObjectKind, ObjectRecord};
use crate::script::ScriptModel;
use crate::span::{Span, Spanned};

/// Known top-level section names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Info,
    Tiles,
    Height,
    Resources,
    Buildings,
    Vehicles,
    Creatures,
    Miners,
    Script,
    Briefing,
    BriefingSuccess,
    BriefingFailure,
    Comments,
    Unknown,
}

impl SectionKind {
    /// Classify a section name. Names are case-sensitive on disk.
    pub fn from_name(name: &str) -> SectionKind {
        match name {
            "info" => SectionKind::Info,
            "tiles" => SectionKind::Tiles,
            "height" => SectionKind::Height,
            "resources" => SectionKind::Resources,
            "buildings" => SectionKind::Buildings,
            "vehicles" => SectionKind::Vehicles,
            "creatures" => SectionKind::Creatures,
            "miners" => SectionKind::Miners,
            "script" => SectionKind::Script,
            "briefing" => SectionKind::Briefing,
            "briefingsuccess" => SectionKind::BriefingSuccess,
            "briefingfailure" => SectionKind::BriefingFailure,
            "comments" => SectionKind::Comments,
            _ => SectionKind::Unknown,
        }
    }

    /// The object kind for object-list sections.
    pub fn object_kind(&self) -> Option<ObjectKind> {
        Some(match self {
            SectionKind::Buildings => ObjectKind::Building,
            SectionKind::Vehicles => ObjectKind::Vehicle,
            SectionKind::Creatures => ObjectKind::Creature,
            SectionKind::Miners => ObjectKind::Miner,
            _ => return None,
        })
    }
}

/// The two labeled layers of the `resources{}` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLayers {
    pub crystals: Grid,
    pub ore: Grid,
}

/// A parsed section body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionBody {
    Grid(Grid),
    KeyValue(IndexMap<String, String>),
    ObjectList(Vec<ObjectRecord>),
    Script(ScriptModel),
    Resources(ResourceLayers),
    /// Freeform text kept as raw lines (`briefing`, `comments`, unknown
    /// sections).
    Text(Vec<String>),
}

/// One named, brace-delimited section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: Spanned<String>,
    pub kind: SectionKind,
    pub body: SectionBody,
    /// Span of the whole section including the braces.
    pub span: Span,
    /// Span of the body between the braces.
    pub body_span: Span,
}

/// The fully parsed document.
///
/// Created fresh per parse, immutable once published. Consumers read
/// sections through the accessors; edits go through the source text and a
/// reparse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    sections: Vec<Section>,
    arena: EntityArena,
}

impl Document {
    pub fn new(sections: Vec<Section>, arena: EntityArena) -> Self {
        Self { sections, arena }
    }

    /// Sections in on-disk order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section with the given kind.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// The entity arena built from the object-list sections.
    pub fn arena(&self) -> &EntityArena {
        &self.arena
    }

    /// The `info` key-value body, when present.
    pub fn info(&self) -> Option<&IndexMap<String, String>> {
        match &self.section(SectionKind::Info)?.body {
            SectionBody::KeyValue(map) => Some(map),
            _ => None,
        }
    }

    /// A declared integer value from `info` (`rowcount`, `colcount`).
    pub fn info_int(&self, key: &str) -> Option<i64> {
        self.info()?.get(key)?.trim().parse().ok()
    }

    /// The grid body of a section, when present.
    pub fn grid(&self, kind: SectionKind) -> Option<&Grid> {
        match &self.section(kind)?.body {
            SectionBody::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    /// The parsed script, when present.
    pub fn script(&self) -> Option<&ScriptModel> {
        match &self.section(SectionKind::Script)?.body {
            SectionBody::Script(model) => Some(model),
            _ => None,
        }
    }

    /// Object records of one kind across all matching sections.
    pub fn objects(&self, kind: ObjectKind) -> impl Iterator<Item = &ObjectRecord> {
        self.sections.iter().flat_map(move |section| {
            match (&section.body, section.kind.object_kind()) {
                (SectionBody::ObjectList(records), Some(k)) if k == kind => records.iter(),
                _ => [].iter(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_kind_classification() {
        assert_eq!(SectionKind::from_name("tiles"), SectionKind::Tiles);
        assert_eq!(SectionKind::from_name("Tiles"), SectionKind::Unknown);
        assert_eq!(SectionKind::from_name("weather"), SectionKind::Unknown);
    }

    #[test]
    fn info_int_parses_declared_dimensions() {
        let mut map = IndexMap::new();
        map.insert("rowcount".to_string(), "8".to_string());
        let doc = Document::new(
            vec![Section {
                name: Spanned::new("info".to_string(), Span::default()),
                kind: SectionKind::Info,
                body: SectionBody::KeyValue(map),
                span: Span::default(),
                body_span: Span::default(),
            }],
            EntityArena::new(),
        );
        assert_eq!(doc.info_int("rowcount"), Some(8));
        assert_eq!(doc.info_int("colcount"), None);
    }
}
