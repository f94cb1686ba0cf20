//! The built-in macro registry.
//!
//! Macros are engine-state symbols visible everywhere in a script.
//! Read-only macros may appear in conditions and arithmetic reads;
//! read-write macros are additionally mutated through their own command
//! syntax (`crystals:5;`), never through assignment to arbitrary
//! macro-like names.

use crate::script::VarType;

/// Whether a macro accepts command-position writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    ReadOnly,
    ReadWrite,
}

/// One entry of the registry.
#[derive(Debug, Clone, Copy)]
pub struct MacroDef {
    pub name: &'static str,
    pub kind: MacroKind,
    pub value_type: VarType,
}

/// The process-wide, immutable macro table.
pub const MACROS: &[MacroDef] = &[
    MacroDef {
        name: "time",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Float,
    },
    MacroDef {
        name: "rowcount",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "colcount",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Int,
    },
    // Collection counts over all live entities of a type.
    MacroDef {
        name: "miners",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "vehicles",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "buildings",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "creatures",
        kind: MacroKind::ReadOnly,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "crystals",
        kind: MacroKind::ReadWrite,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "ore",
        kind: MacroKind::ReadWrite,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "air",
        kind: MacroKind::ReadWrite,
        value_type: VarType::Int,
    },
    MacroDef {
        name: "erosionscale",
        kind: MacroKind::ReadWrite,
        value_type: VarType::Float,
    },
];

/// Look up a macro by name (case-sensitive).
pub fn lookup(name: &str) -> Option<&'static MacroDef> {
    MACROS.iter().find(|m| m.name == name)
}

/// Whether `name` is a collection-count macro, which also admits typed
/// member reads (`buildings.BuildingToolStore_C`).
pub fn is_collection(name: &str) -> bool {
    matches!(name, "miners" | "vehicles" | "buildings" | "creatures")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("crystals").is_some());
        assert!(lookup("Crystals").is_none());
    }

    #[test]
    fn read_write_split() {
        assert_eq!(lookup("time").unwrap().kind, MacroKind::ReadOnly);
        assert_eq!(lookup("crystals").unwrap().kind, MacroKind::ReadWrite);
    }

    #[test]
    fn collections() {
        assert!(is_collection("buildings"));
        assert!(!is_collection("crystals"));
    }
}
