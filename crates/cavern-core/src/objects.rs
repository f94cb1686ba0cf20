//! Object records parsed from the `buildings`, `vehicles`, `creatures`,
//! and `miners` sections.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::span::Span;

/// The four object-list section kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Building,
    Vehicle,
    Creature,
    Miner,
}

impl ObjectKind {
    /// Section name carrying this kind of object.
    pub fn section_name(&self) -> &'static str {
        match self {
            ObjectKind::Building => "buildings",
            ObjectKind::Vehicle => "vehicles",
            ObjectKind::Creature => "creatures",
            ObjectKind::Miner => "miners",
        }
    }

    /// The script variable type that can bind to this kind of object.
    pub fn variable_type_name(&self) -> &'static str {
        match self {
            ObjectKind::Building => "building",
            ObjectKind::Vehicle => "vehicle",
            ObjectKind::Creature => "creature",
            ObjectKind::Miner => "miner",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable_type_name())
    }
}

/// How an object is addressed by script bindings.
///
/// Buildings key on their foot-point coordinate; vehicles, creatures, and
/// miners key on an integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKey {
    Id(u32),
    Foot { row: u32, col: u32 },
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKey::Id(id) => write!(f, "{id}"),
            ObjectKey::Foot { row, col } => write!(f, "{row},{col}"),
        }
    }
}

/// One declared object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub kind: ObjectKind,
    /// Canonical type id after alias resolution. Unknown types keep the
    /// raw spelling so the record is still visible downstream.
    pub type_name: String,
    pub key: ObjectKey,
    /// Remaining declaration properties, insertion-ordered.
    pub properties: IndexMap<String, String>,
    pub span: Span,
}

impl ObjectRecord {
    /// Orientation in degrees, when declared.
    pub fn orientation(&self) -> Option<i32> {
        self.properties.get("orientation")?.parse().ok()
    }

    /// Upgrade/experience level, when declared.
    pub fn level(&self) -> Option<u32> {
        self.properties.get("level")?.parse().ok()
    }
}
