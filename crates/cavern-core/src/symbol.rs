//! The script's symbol table.
//!
//! One explicit value owned by the [`ScriptModel`](crate::script::ScriptModel),
//! built during parsing and read by the validator and downstream consumers.
//! There is no ambient global state; everything a name can resolve to is
//! reachable from here or from the static macro registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::macros;
use crate::script::{SPECIAL_CHAINS, VarType};
use crate::span::Span;

/// A declared variable entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarEntry {
    pub ty: VarType,
    pub decl_span: Span,
}

/// Declared names of a script: variables and event chains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    variables: IndexMap<String, VarEntry>,
    chains: IndexMap<String, Span>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a variable declaration. Returns the previous entry when the
    /// name was already declared.
    pub fn declare_variable(&mut self, name: &str, entry: VarEntry) -> Option<VarEntry> {
        self.variables.insert(name.to_string(), entry)
    }

    /// Record a chain declaration. Returns the previous span when the name
    /// was already declared.
    pub fn declare_chain(&mut self, name: &str, span: Span) -> Option<Span> {
        self.chains.insert(name.to_string(), span)
    }

    pub fn variable(&self, name: &str) -> Option<&VarEntry> {
        self.variables.get(name)
    }

    pub fn chain(&self, name: &str) -> Option<Span> {
        self.chains.get(name).copied()
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &VarEntry)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn chains(&self) -> impl Iterator<Item = (&str, Span)> {
        self.chains.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Why a name is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedClass {
    TypeKeyword,
    Occurrence,
    ConditionKeyword,
    Macro,
    TriggerKind,
    CommandName,
    SpecialChain,
}

impl ReservedClass {
    pub fn describe(&self) -> &'static str {
        match self {
            ReservedClass::TypeKeyword => "a type keyword",
            ReservedClass::Occurrence => "a trigger keyword",
            ReservedClass::ConditionKeyword => "a condition keyword",
            ReservedClass::Macro => "a built-in macro",
            ReservedClass::TriggerKind => "a trigger kind",
            ReservedClass::CommandName => "a built-in command",
            ReservedClass::SpecialChain => "a special chain name",
        }
    }
}

/// Check a user-chosen name against every reserved class (case-sensitive).
///
/// Trigger kinds and command names are supplied by the caller because the
/// schema tables live with the parser.
pub fn reserved_class(
    name: &str,
    trigger_kinds: &[&str],
    command_names: &[&str],
) -> Option<ReservedClass> {
    if VarType::from_keyword(name).is_some() {
        return Some(ReservedClass::TypeKeyword);
    }
    if matches!(name, "if" | "when") {
        return Some(ReservedClass::Occurrence);
    }
    if matches!(name, "and" | "or" | "not" | "true" | "false") {
        return Some(ReservedClass::ConditionKeyword);
    }
    if macros::lookup(name).is_some() {
        return Some(ReservedClass::Macro);
    }
    if SPECIAL_CHAINS.contains(&name) {
        return Some(ReservedClass::SpecialChain);
    }
    if trigger_kinds.contains(&name) {
        return Some(ReservedClass::TriggerKind);
    }
    if command_names.contains(&name) {
        return Some(ReservedClass::CommandName);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaration_returns_previous() {
        let mut table = SymbolTable::new();
        let entry = VarEntry {
            ty: VarType::Int,
            decl_span: Span::default(),
        };
        assert!(table.declare_variable("Count", entry).is_none());
        assert!(table.declare_variable("Count", entry).is_some());
    }

    #[test]
    fn reserved_classes() {
        assert_eq!(
            reserved_class("int", &[], &[]),
            Some(ReservedClass::TypeKeyword)
        );
        assert_eq!(
            reserved_class("crystals", &[], &[]),
            Some(ReservedClass::Macro)
        );
        assert_eq!(
            reserved_class("enter", &["enter"], &[]),
            Some(ReservedClass::TriggerKind)
        );
        assert_eq!(
            reserved_class("init", &[], &[]),
            Some(ReservedClass::SpecialChain)
        );
        assert_eq!(reserved_class("MyName", &["enter"], &["msg"]), None);
    }

    #[test]
    fn reserved_is_case_sensitive() {
        assert_eq!(reserved_class("Int", &[], &[]), None);
        assert_eq!(reserved_class("When", &[], &[]), None);
    }
}
