//! Static schemas for trigger kinds and built-in commands.
//!
//! The script parser stores heads and parameters as raw typed literals;
//! the validator resolves them against these tables.

use cavern_core::objects::ObjectKind;

/// Parameter kinds accepted by built-in commands and trigger heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// An integer literal or a reference resolving to one.
    Int,
    /// An integer or float literal or a reference.
    Number,
    /// A string literal or a string-typed reference.
    Text,
    /// A bare name (variable, chain, or engine symbol).
    Ident,
}

/// Schema of one trigger kind.
#[derive(Debug, Clone, Copy)]
pub struct TriggerKindDef {
    pub name: &'static str,
    pub min_args: usize,
    /// Argument kinds by position; its length is the maximum arity.
    pub args: &'static [ParamKind],
}

/// Trigger kinds recognized by the engine.
///
/// `time` is the one kind exempt from duplicate-head detection.
pub const TRIGGER_KINDS: &[TriggerKindDef] = &[
    TriggerKindDef {
        name: "time",
        min_args: 1,
        args: &[ParamKind::Number],
    },
    TriggerKindDef {
        name: "enter",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int, ParamKind::Ident],
    },
    TriggerKindDef {
        name: "drill",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int],
    },
    TriggerKindDef {
        name: "change",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int, ParamKind::Int],
    },
    TriggerKindDef {
        name: "built",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int],
    },
    TriggerKindDef {
        name: "laserhit",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int],
    },
    TriggerKindDef {
        name: "click",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int],
    },
    TriggerKindDef {
        name: "hover",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int],
    },
    TriggerKindDef {
        name: "walk",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int, ParamKind::Ident],
    },
    TriggerKindDef {
        name: "drive",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int, ParamKind::Ident],
    },
    TriggerKindDef {
        name: "fly",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int, ParamKind::Ident],
    },
    TriggerKindDef {
        name: "reinforce",
        min_args: 2,
        args: &[ParamKind::Int, ParamKind::Int],
    },
];

/// Which tile mutation a command performs, for the batch census.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMutation {
    /// `place:row,col,id` writes an arbitrary tile id.
    Place,
    /// `drill:row,col` clears a wall tile.
    Drill,
}

/// What a capture command rebinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// `save:` rebinds to the entity that fired the trigger; any object
    /// type is acceptable.
    Save,
    /// `lastminer:`/`lastvehicle:`/... rebind to the most recent entity of
    /// one specific kind.
    Last(ObjectKind),
}

/// Schema of one built-in command.
#[derive(Debug, Clone, Copy)]
pub struct CommandDef {
    pub name: &'static str,
    pub min_params: usize,
    /// Parameter kinds by position; its length is the maximum arity.
    pub params: &'static [ParamKind],
    pub tile_mutation: Option<TileMutation>,
    pub capture: Option<CaptureKind>,
    /// Whether the action can fail at runtime, making a following `~`
    /// guard meaningful.
    pub failable: bool,
}

const fn plain(name: &'static str, min: usize, params: &'static [ParamKind]) -> CommandDef {
    CommandDef {
        name,
        min_params: min,
        params,
        tile_mutation: None,
        capture: None,
        failable: false,
    }
}

/// Built-in commands.
pub const COMMANDS: &[CommandDef] = &[
    plain("msg", 1, &[ParamKind::Text]),
    plain("wait", 1, &[ParamKind::Number]),
    plain("win", 0, &[ParamKind::Text]),
    plain("lose", 0, &[ParamKind::Text]),
    plain("pan", 2, &[ParamKind::Int, ParamKind::Int]),
    plain("shake", 1, &[ParamKind::Number]),
    plain("sound", 1, &[ParamKind::Ident]),
    plain("speed", 1, &[ParamKind::Number]),
    plain("resetspeed", 0, &[]),
    plain("enable", 1, &[ParamKind::Ident]),
    plain("disable", 1, &[ParamKind::Ident]),
    plain("starttimer", 1, &[ParamKind::Ident]),
    plain("stoptimer", 1, &[ParamKind::Ident]),
    plain("showarrow", 3, &[ParamKind::Ident, ParamKind::Int, ParamKind::Int]),
    plain("hidearrow", 1, &[ParamKind::Ident]),
    plain(
        "highlightarrow",
        3,
        &[ParamKind::Ident, ParamKind::Int, ParamKind::Int],
    ),
    CommandDef {
        name: "place",
        min_params: 3,
        params: &[ParamKind::Int, ParamKind::Int, ParamKind::Int],
        tile_mutation: Some(TileMutation::Place),
        capture: None,
        failable: false,
    },
    CommandDef {
        name: "drill",
        min_params: 2,
        params: &[ParamKind::Int, ParamKind::Int],
        tile_mutation: Some(TileMutation::Drill),
        capture: None,
        failable: false,
    },
    CommandDef {
        name: "emerge",
        min_params: 5,
        params: &[
            ParamKind::Int,
            ParamKind::Int,
            ParamKind::Ident,
            ParamKind::Ident,
            ParamKind::Int,
        ],
        tile_mutation: None,
        capture: None,
        failable: true,
    },
    CommandDef {
        name: "save",
        min_params: 1,
        params: &[ParamKind::Ident],
        tile_mutation: None,
        capture: Some(CaptureKind::Save),
        failable: false,
    },
    CommandDef {
        name: "lastminer",
        min_params: 1,
        params: &[ParamKind::Ident],
        tile_mutation: None,
        capture: Some(CaptureKind::Last(ObjectKind::Miner)),
        failable: false,
    },
    CommandDef {
        name: "lastvehicle",
        min_params: 1,
        params: &[ParamKind::Ident],
        tile_mutation: None,
        capture: Some(CaptureKind::Last(ObjectKind::Vehicle)),
        failable: false,
    },
    CommandDef {
        name: "lastbuilding",
        min_params: 1,
        params: &[ParamKind::Ident],
        tile_mutation: None,
        capture: Some(CaptureKind::Last(ObjectKind::Building)),
        failable: false,
    },
    CommandDef {
        name: "lastcreature",
        min_params: 1,
        params: &[ParamKind::Ident],
        tile_mutation: None,
        capture: Some(CaptureKind::Last(ObjectKind::Creature)),
        failable: false,
    },
];

/// Look up a trigger kind.
pub fn trigger_kind(name: &str) -> Option<&'static TriggerKindDef> {
    TRIGGER_KINDS.iter().find(|def| def.name == name)
}

/// Look up a built-in command.
pub fn command(name: &str) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|def| def.name == name)
}

/// Trigger kind names for the reserved-word table.
pub fn trigger_kind_names() -> Vec<&'static str> {
    TRIGGER_KINDS.iter().map(|def| def.name).collect()
}

/// Command names for the reserved-word table.
pub fn command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|def| def.name).collect()
}
