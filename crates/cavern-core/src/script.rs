//! The parsed model of the `script{}` section.
//!
//! Nodes keep the spans they were parsed from so the validator and editor
//! surfaces can point at exact source locations. The model is immutable
//! once published; an edit produces a whole new model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::objects::ObjectKind;
use crate::span::{Span, Spanned};
use crate::symbol::SymbolTable;

/// Variable types of the scripting language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarType {
    Int,
    Float,
    Bool,
    Str,
    Arrow,
    Timer,
    Miner,
    Vehicle,
    Building,
    Creature,
    IntArray,
}

impl VarType {
    /// The declaration keyword for this type.
    pub fn keyword(&self) -> &'static str {
        match self {
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Bool => "bool",
            VarType::Str => "string",
            VarType::Arrow => "arrow",
            VarType::Timer => "timer",
            VarType::Miner => "miner",
            VarType::Vehicle => "vehicle",
            VarType::Building => "building",
            VarType::Creature => "creature",
            VarType::IntArray => "intarray",
        }
    }

    /// Parse a declaration keyword.
    pub fn from_keyword(word: &str) -> Option<VarType> {
        Some(match word {
            "int" => VarType::Int,
            "float" => VarType::Float,
            "bool" => VarType::Bool,
            "string" => VarType::Str,
            "arrow" => VarType::Arrow,
            "timer" => VarType::Timer,
            "miner" => VarType::Miner,
            "vehicle" => VarType::Vehicle,
            "building" => VarType::Building,
            "creature" => VarType::Creature,
            "intarray" => VarType::IntArray,
            _ => return None,
        })
    }

    /// All declaration keywords, used for the reserved-word table.
    pub fn keywords() -> impl Iterator<Item = &'static str> {
        [
            "int", "float", "bool", "string", "arrow", "timer", "miner", "vehicle", "building",
            "creature", "intarray",
        ]
        .into_iter()
    }

    /// The object kind this type binds to, for object-typed variables.
    pub fn object_kind(&self) -> Option<ObjectKind> {
        Some(match self {
            VarType::Miner => ObjectKind::Miner,
            VarType::Vehicle => ObjectKind::Vehicle,
            VarType::Building => ObjectKind::Building,
            VarType::Creature => ObjectKind::Creature,
            _ => return None,
        })
    }

    /// Whether arithmetic is permitted on this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, VarType::Int | VarType::Float)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A literal value as written in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// A bare word: a variable, macro, chain, or type-name reference,
    /// resolved lazily by the validator.
    Ident(String),
}

impl Literal {
    /// The identifier text when this literal is a bare word.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Literal::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The integer value when this literal is an int.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Str(v) => write!(f, "\"{v}\""),
            Literal::Ident(v) => write!(f, "{v}"),
        }
    }
}

/// The value a variable is declared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclValue {
    Literal(Literal),
    /// A `row,col` pair; buildings bind by foot-point coordinate.
    Coord { row: u32, col: u32 },
}

/// A declared script variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: Spanned<String>,
    pub ty: VarType,
    pub value: Option<Spanned<DeclValue>>,
    pub span: Span,
}

/// Whether a trigger fires once (`if`) or persists (`when`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occurrence {
    If,
    When,
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Occurrence::If => "if",
            Occurrence::When => "when",
        })
    }
}

/// The occurrence head of a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerHead {
    /// An engine occurrence: `enter:4,5`, `time:30`, `drill:2,3`.
    Event {
        kind: Spanned<String>,
        args: Vec<Spanned<Literal>>,
    },
    /// A value-comparison occurrence that fires when it becomes true:
    /// `crystals>50`.
    Comparison(Condition),
}

impl TriggerHead {
    /// The event kind name, for event heads.
    pub fn kind(&self) -> Option<&str> {
        match self {
            TriggerHead::Event { kind, .. } => Some(kind.value()),
            TriggerHead::Comparison(_) => None,
        }
    }

    /// Occurrence-independent identity used for duplicate detection.
    pub fn signature(&self) -> String {
        match self {
            TriggerHead::Event { kind, args } => {
                let mut sig = kind.value().clone();
                for arg in args {
                    sig.push(':');
                    sig.push_str(&arg.value().to_string());
                }
                sig
            }
            TriggerHead::Comparison(condition) => format!("cmp:{condition}"),
        }
    }

    /// The span of the whole head.
    pub fn span(&self) -> Span {
        match self {
            TriggerHead::Event { kind, args } => args
                .iter()
                .fold(kind.span(), |acc, arg| acc.union(arg.span())),
            TriggerHead::Comparison(condition) => condition.span(),
        }
    }
}

/// A trigger statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub occurrence: Occurrence,
    pub head: TriggerHead,
    pub condition: Option<Condition>,
    pub true_event: Spanned<String>,
    pub false_event: Option<Spanned<String>>,
    pub span: Span,
}

/// Comparison operators usable in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        })
    }
}

/// One side of a comparison or arithmetic operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Spanned<Literal>),
    /// A variable or macro read, optionally a typed collection count
    /// (`buildings.BuildingToolStore_C`).
    Ref {
        name: Spanned<String>,
        member: Option<Spanned<String>>,
    },
    /// An `intarray` element read (`arr[i]`).
    Index {
        name: Spanned<String>,
        index: Box<Spanned<Operand>>,
    },
}

impl Operand {
    /// The span covering the whole operand.
    pub fn span(&self) -> Span {
        match self {
            Operand::Literal(lit) => lit.span(),
            Operand::Ref { name, member } => match member {
                Some(m) => name.span().union(m.span()),
                None => name.span(),
            },
            Operand::Index { name, index } => name.span().union(index.span()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => lit.value().fmt(f),
            Operand::Ref { name, member } => match member {
                Some(m) => write!(f, "{}.{}", name.value(), m.value()),
                None => name.value().fmt(f),
            },
            Operand::Index { name, index } => {
                write!(f, "{}[{}]", name.value(), index.value())
            }
        }
    }
}

/// A boolean condition expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Operand,
        span: Span,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// The span covering the whole condition.
    pub fn span(&self) -> Span {
        match self {
            Condition::Compare { span, .. } => *span,
            Condition::And(a, b) | Condition::Or(a, b) => a.span().union(b.span()),
            Condition::Not(inner) => inner.span(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { lhs, op, rhs, .. } => write!(f, "{lhs}{op}{rhs}"),
            Condition::And(a, b) => write!(f, "({a} and {b})"),
            Condition::Or(a, b) => write!(f, "({a} or {b})"),
            Condition::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}

/// Statement-start modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// `~`: exits the chain when the preceding action succeeded.
    FailureGuard,
    /// `?`: carried through without further attributed semantics.
    Optional,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Modifier::FailureGuard => "~",
            Modifier::Optional => "?",
        })
    }
}

/// Arithmetic operators. One operation per statement, enforced at parse
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MathOp::Add => "+",
            MathOp::Sub => "-",
            MathOp::Mul => "*",
            MathOp::Div => "/",
        })
    }
}

/// A command parameter: a plain value or a single arithmetic operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Param {
    Value(Operand),
    Math {
        lhs: Operand,
        op: MathOp,
        rhs: Operand,
    },
}

impl Param {
    pub fn span(&self) -> Span {
        match self {
            Param::Value(op) => op.span(),
            Param::Math { lhs, rhs, .. } => lhs.span().union(rhs.span()),
        }
    }
}

/// One command statement inside an event chain.
///
/// The surface form is shared between built-in commands (`msg:Greeting`),
/// macro writes (`crystals:5`), variable assignments (`Count:Count+1`),
/// and chain invocations (`OpenGate`); the validator disambiguates by the
/// head name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub modifier: Option<Spanned<Modifier>>,
    pub name: Spanned<String>,
    /// Present for indexed assignment targets (`arr[0]:5`).
    pub index: Option<Box<Spanned<Operand>>>,
    pub params: Vec<Spanned<Param>>,
    pub span: Span,
}

/// A named event chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventChain {
    pub name: Spanned<String>,
    pub commands: Vec<Command>,
    pub span: Span,
}

/// Chain names with engine-defined meaning. User triggers must not target
/// them.
pub const SPECIAL_CHAINS: &[&str] = &["init", "tick"];

/// The complete parsed script section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptModel {
    pub variables: Vec<Variable>,
    pub triggers: Vec<Trigger>,
    pub chains: Vec<EventChain>,
    pub symbols: SymbolTable,
}

impl ScriptModel {
    /// Look up a declared chain by name.
    pub fn chain(&self, name: &str) -> Option<&EventChain> {
        self.chains.iter().find(|c| c.name.value() == name)
    }

    /// Look up a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name.value() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_signature_ignores_occurrence() {
        let head = TriggerHead::Event {
            kind: Spanned::new("enter".to_string(), Span::default()),
            args: vec![
                Spanned::new(Literal::Int(4), Span::default()),
                Spanned::new(Literal::Int(5), Span::default()),
            ],
        };
        assert_eq!(head.signature(), "enter:4:5");
    }

    #[test]
    fn comparison_head_signature_is_canonical() {
        let head = TriggerHead::Comparison(Condition::Compare {
            lhs: Operand::Ref {
                name: Spanned::new("crystals".to_string(), Span::default()),
                member: None,
            },
            op: CompareOp::Gt,
            rhs: Operand::Literal(Spanned::new(Literal::Int(50), Span::default())),
            span: Span::default(),
        });
        assert_eq!(head.signature(), "cmp:crystals>50");
    }

    #[test]
    fn var_type_keywords_round_trip() {
        for kw in VarType::keywords() {
            assert_eq!(VarType::from_keyword(kw).unwrap().keyword(), kw);
        }
        assert_eq!(VarType::from_keyword("vehicles"), None);
    }

    #[test]
    fn object_kinds() {
        assert_eq!(VarType::Miner.object_kind(), Some(ObjectKind::Miner));
        assert_eq!(VarType::Int.object_kind(), None);
    }
}
