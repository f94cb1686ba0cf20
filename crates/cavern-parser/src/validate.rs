//! Semantic validation of the parsed document.
//!
//! Runs after all sections parse. Every check is independent and reports
//! through the shared collector; validation never blocks model production
//! and never throws. Severities follow the engine's observable behavior:
//! things the engine rejects or corrupts are errors, known-nondeterminism
//! hazards are warnings, style-level hazards are infos.

use std::collections::{HashMap, HashSet};

use cavern_core::catalog;
use cavern_core::document::{Document, SectionBody};
use cavern_core::macros::{self, MacroKind};
use cavern_core::objects::{ObjectKey, ObjectKind};
use cavern_core::script::{
    Command, Condition, DeclValue, EventChain, Literal, MathOp, Modifier, Operand, Param,
    ScriptModel, Trigger, TriggerHead, Variable, VarType, SPECIAL_CHAINS,
};
use cavern_core::span::{Span, Spanned};
use cavern_core::symbol::reserved_class;
use cavern_core::tile;

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};
use crate::schema::{self, CaptureKind, ParamKind, TileMutation};

/// Tunable validation policy.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Ceiling on tile mutations reachable from one trigger body. The
    /// engine's scheduler drops writes beyond roughly this many per tick.
    pub max_tile_mutations: usize,
    /// Warn when fluid and solid tile writes mix in one trigger body.
    pub warn_fluid_mixing: bool,
    /// Lint failure guards (`~`) that are not the final statement of their
    /// chain.
    pub lint_failure_guard: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            max_tile_mutations: 630,
            warn_fluid_mixing: true,
            lint_failure_guard: true,
        }
    }
}

/// Validate a parsed document.
pub fn validate(document: &Document, options: &ValidateOptions) -> Vec<Diagnostic> {
    let mut validator = Validator::new(document, options);
    validator.run();
    validator.collector.finish()
}

struct Validator<'a> {
    document: &'a Document,
    options: &'a ValidateOptions,
    collector: DiagnosticCollector,
    trigger_kinds: Vec<&'static str>,
    command_names: Vec<&'static str>,
}

impl<'a> Validator<'a> {
    fn new(document: &'a Document, options: &'a ValidateOptions) -> Self {
        Self {
            document,
            options,
            collector: DiagnosticCollector::new(),
            trigger_kinds: schema::trigger_kind_names(),
            command_names: schema::command_names(),
        }
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        self.collector.emit(diagnostic.with_section("script"));
    }

    fn run(&mut self) {
        self.check_dimensions();
        if let Some(script) = self.document.script() {
            self.check_variables(script);
            self.check_chains(script);
            self.check_triggers(script);
            self.check_commands(script);
            self.check_batch_limits(script);
        }
    }

    // -----------------------------------------------------------------
    // Cross-section checks
    // -----------------------------------------------------------------

    /// Declared `rowcount`/`colcount` must match every grid layer.
    fn check_dimensions(&mut self) {
        let declared = (
            self.document.info_int("rowcount"),
            self.document.info_int("colcount"),
        );
        let (Some(rows), Some(cols)) = declared else {
            return;
        };

        let mut grids: Vec<(&str, Span, usize, usize)> = Vec::new();
        for section in self.document.sections() {
            match &section.body {
                SectionBody::Grid(grid) => {
                    grids.push((
                        section.name.value(),
                        section.name.span(),
                        grid.height(),
                        grid.width(),
                    ));
                }
                SectionBody::Resources(layers) => {
                    grids.push((
                        "resources/crystals",
                        section.name.span(),
                        layers.crystals.height(),
                        layers.crystals.width(),
                    ));
                    grids.push((
                        "resources/ore",
                        section.name.span(),
                        layers.ore.height(),
                        layers.ore.width(),
                    ));
                }
                _ => {}
            }
        }

        for (name, span, height, width) in grids {
            if height == 0 && width == 0 {
                continue;
            }
            if height as i64 != rows || width as i64 != cols {
                self.collector.emit(
                    Diagnostic::warning(format!(
                        "`{name}` is {height}x{width}, but `info` declares {rows}x{cols}"
                    ))
                    .with_code(ErrorCode::E215)
                    .with_label(span, ErrorCode::E215.description())
                    .with_section(name.split('/').next().unwrap_or(name).to_string()),
                );
            }
        }
    }

    // -----------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------

    fn check_variables(&mut self, script: &ScriptModel) {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        // Entity handle -> first variable bound to it.
        let mut bindings: HashMap<(ObjectKind, ObjectKey), (String, Span)> = HashMap::new();

        for variable in &script.variables {
            let name = variable.name.value().as_str();

            if let Some(class) = reserved_class(name, &self.trigger_kinds, &self.command_names) {
                self.emit(
                    Diagnostic::error(format!(
                        "`{name}` cannot be a variable name: it is {}",
                        class.describe()
                    ))
                    .with_code(ErrorCode::E200)
                    .with_label(variable.name.span(), ErrorCode::E200.description()),
                );
            }

            if let Some(first) = seen.get(name) {
                self.emit(
                    Diagnostic::error(format!("variable `{name}` is declared twice"))
                        .with_code(ErrorCode::E201)
                        .with_label(variable.name.span(), "declared again here")
                        .with_secondary_label(*first, "first declared here"),
                );
            } else {
                seen.insert(name, variable.name.span());
            }

            self.check_declared_value(variable);
            self.check_binding(variable, &mut bindings);
        }
    }

    /// Declared values must match the declared type.
    fn check_declared_value(&mut self, variable: &Variable) {
        let Some(value) = &variable.value else {
            return;
        };
        let mismatch = |expected: &str, this: &mut Self| {
            this.emit(
                Diagnostic::error(format!(
                    "`{}` is declared `{}` but its value is not {expected}",
                    variable.name.value(),
                    variable.ty
                ))
                .with_code(ErrorCode::E209)
                .with_label(value.span(), ErrorCode::E209.description()),
            );
        };

        match (variable.ty, value.value()) {
            (VarType::IntArray, _) => {
                self.emit(
                    Diagnostic::error("`intarray` variables cannot take an initializer")
                        .with_code(ErrorCode::E217)
                        .with_label(value.span(), ErrorCode::E217.description()),
                );
            }
            (VarType::Int, DeclValue::Literal(Literal::Int(_))) => {}
            (VarType::Int, _) => mismatch("an integer", self),
            (
                VarType::Float,
                DeclValue::Literal(Literal::Int(_) | Literal::Float(_)),
            ) => {}
            (VarType::Float, _) => mismatch("a number", self),
            (VarType::Bool, DeclValue::Literal(Literal::Bool(_))) => {}
            (VarType::Bool, _) => mismatch("`true` or `false`", self),
            (VarType::Str, DeclValue::Literal(Literal::Str(_))) => {}
            (VarType::Str, _) => mismatch("a quoted string", self),
            (VarType::Arrow, DeclValue::Literal(Literal::Ident(_))) => {}
            (VarType::Arrow, _) => mismatch("a color name", self),
            (
                VarType::Timer,
                DeclValue::Literal(Literal::Int(_) | Literal::Float(_)),
            ) => {}
            (VarType::Timer, _) => mismatch("a delay in seconds", self),
            (
                VarType::Miner | VarType::Vehicle | VarType::Creature,
                DeclValue::Literal(Literal::Int(_)),
            ) => {}
            (VarType::Miner | VarType::Vehicle | VarType::Creature, _) => {
                mismatch("an entity id", self)
            }
            (VarType::Building, DeclValue::Coord { .. }) => {}
            (VarType::Building, _) => mismatch("a `row,col` foot point", self),
        }
    }

    /// Object bindings must resolve to a declared entity, and no entity
    /// may carry two bindings of the same type.
    fn check_binding(
        &mut self,
        variable: &Variable,
        bindings: &mut HashMap<(ObjectKind, ObjectKey), (String, Span)>,
    ) {
        let Some(kind) = variable.ty.object_kind() else {
            return;
        };
        let Some(value) = &variable.value else {
            return;
        };

        let key = match (kind, value.value()) {
            (ObjectKind::Building, DeclValue::Coord { row, col }) => ObjectKey::Foot {
                row: *row,
                col: *col,
            },
            (_, DeclValue::Literal(Literal::Int(id))) => match u32::try_from(*id) {
                Ok(id) => ObjectKey::Id(id),
                Err(_) => return,
            },
            _ => return,
        };

        if self.document.arena().find(kind, key).is_none() {
            self.emit(
                Diagnostic::error(format!(
                    "no {kind} `{key}` is declared in the `{}` section",
                    kind.section_name()
                ))
                .with_code(ErrorCode::E204)
                .with_label(value.span(), ErrorCode::E204.description()),
            );
            return;
        }

        match bindings.get(&(kind, key)) {
            Some((first_name, first_span)) => {
                self.emit(
                    Diagnostic::error(format!(
                        "{kind} `{key}` is already bound to `{first_name}`; an entity carries at most one binding",
                    ))
                    .with_code(ErrorCode::E203)
                    .with_label(value.span(), ErrorCode::E203.description())
                    .with_secondary_label(*first_span, "first bound here"),
                );
            }
            None => {
                bindings.insert(
                    (kind, key),
                    (variable.name.value().clone(), variable.name.span()),
                );
            }
        }
    }

    fn check_chains(&mut self, script: &ScriptModel) {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for chain in &script.chains {
            let name = chain.name.value().as_str();

            // `init` and `tick` are legitimate chain declarations.
            if !SPECIAL_CHAINS.contains(&name) {
                if let Some(class) =
                    reserved_class(name, &self.trigger_kinds, &self.command_names)
                {
                    self.emit(
                        Diagnostic::error(format!(
                            "`{name}` cannot be an event chain name: it is {}",
                            class.describe()
                        ))
                        .with_code(ErrorCode::E200)
                        .with_label(chain.name.span(), ErrorCode::E200.description()),
                    );
                }
            }

            if script.symbols.variable(name).is_some() {
                self.emit(
                    Diagnostic::error(format!(
                        "event chain `{name}` collides with a variable of the same name"
                    ))
                    .with_code(ErrorCode::E202)
                    .with_label(chain.name.span(), ErrorCode::E202.description()),
                );
            }

            if let Some(first) = seen.get(name) {
                self.emit(
                    Diagnostic::error(format!("event chain `{name}` is declared twice"))
                        .with_code(ErrorCode::E202)
                        .with_label(chain.name.span(), "declared again here")
                        .with_secondary_label(*first, "first declared here"),
                );
            } else {
                seen.insert(name, chain.name.span());
            }
        }
    }

    // -----------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------

    fn check_triggers(&mut self, script: &ScriptModel) {
        for trigger in &script.triggers {
            match &trigger.head {
                TriggerHead::Event { kind, args } => {
                    self.check_event_head(script, kind, args);
                }
                TriggerHead::Comparison(condition) => {
                    self.check_condition(script, condition);
                }
            }

            if let Some(condition) = &trigger.condition {
                self.check_condition(script, condition);
            }

            self.check_event_target(script, &trigger.true_event);
            if let Some(false_event) = &trigger.false_event {
                self.check_event_target(script, false_event);
            }
        }

        // Identical heads (occurrence-independent) are engine-undefined;
        // every member of a duplicate group is flagged. `time` is exempt.
        let mut groups: HashMap<String, Vec<&Trigger>> = HashMap::new();
        for trigger in &script.triggers {
            if trigger.head.kind() == Some("time") {
                continue;
            }
            groups.entry(trigger.head.signature()).or_default().push(trigger);
        }
        for (signature, group) in groups {
            if group.len() < 2 {
                continue;
            }
            let first_span = group[0].span;
            for trigger in group {
                let mut diag = Diagnostic::warning(format!(
                    "trigger `{signature}` has duplicates; behavior of identical triggers is engine-undefined"
                ))
                .with_code(ErrorCode::E205)
                .with_label(trigger.span, ErrorCode::E205.description());
                if trigger.span != first_span {
                    diag = diag.with_secondary_label(first_span, "first declared here");
                }
                self.emit(diag);
            }
        }
    }

    fn check_event_head(
        &mut self,
        script: &ScriptModel,
        kind: &Spanned<String>,
        args: &[Spanned<Literal>],
    ) {
        let Some(def) = schema::trigger_kind(kind.value()) else {
            self.emit(
                Diagnostic::error(format!("unknown trigger kind `{}`", kind.value()))
                    .with_code(ErrorCode::E219)
                    .with_label(kind.span(), ErrorCode::E219.description()),
            );
            return;
        };

        if args.len() < def.min_args || args.len() > def.args.len() {
            let expected = if def.min_args == def.args.len() {
                format!("{}", def.min_args)
            } else {
                format!("{} to {}", def.min_args, def.args.len())
            };
            self.emit(
                Diagnostic::error(format!(
                    "`{}` takes {expected} arguments, found {}",
                    kind.value(),
                    args.len()
                ))
                .with_code(ErrorCode::E220)
                .with_label(kind.span(), ErrorCode::E220.description()),
            );
            return;
        }

        for (arg, param_kind) in args.iter().zip(def.args.iter()) {
            let ok = match param_kind {
                ParamKind::Int => matches!(arg.value(), Literal::Int(_)),
                ParamKind::Number => {
                    matches!(arg.value(), Literal::Int(_) | Literal::Float(_))
                }
                ParamKind::Text => matches!(arg.value(), Literal::Str(_)),
                ParamKind::Ident => matches!(arg.value(), Literal::Ident(_)),
            };
            if !ok {
                self.emit(
                    Diagnostic::error(format!(
                        "`{}` argument `{}` has the wrong kind",
                        kind.value(),
                        arg.value()
                    ))
                    .with_code(ErrorCode::E220)
                    .with_label(arg.span(), ErrorCode::E220.description()),
                );
            }
        }

        // A trailing collection argument must name a variable or a
        // canonical type.
        if let Some(arg) = args.get(2) {
            if let Literal::Ident(name) = arg.value() {
                let known = script.symbols.variable(name).is_some()
                    || catalog::is_canonical(name);
                if !known {
                    self.emit(
                        Diagnostic::error(format!(
                            "`{name}` is neither a declared variable nor a known type"
                        ))
                        .with_code(ErrorCode::E210)
                        .with_label(arg.span(), ErrorCode::E210.description()),
                    );
                }
            }
        }
    }

    fn check_event_target(&mut self, script: &ScriptModel, target: &Spanned<String>) {
        let name = target.value().as_str();
        if SPECIAL_CHAINS.contains(&name) {
            self.emit(
                Diagnostic::error(format!(
                    "`{name}` runs automatically and cannot be a trigger target"
                ))
                .with_code(ErrorCode::E211)
                .with_label(target.span(), ErrorCode::E211.description()),
            );
            return;
        }
        if script.symbols.chain(name).is_none() {
            self.emit(
                Diagnostic::error(format!("no event chain named `{name}`"))
                    .with_code(ErrorCode::E210)
                    .with_label(target.span(), ErrorCode::E210.description()),
            );
        }
    }

    // -----------------------------------------------------------------
    // Value reads
    // -----------------------------------------------------------------

    fn check_condition(&mut self, script: &ScriptModel, condition: &Condition) {
        match condition {
            Condition::Compare { lhs, rhs, .. } => {
                self.check_read(script, lhs);
                self.check_read(script, rhs);
            }
            Condition::And(a, b) | Condition::Or(a, b) => {
                self.check_condition(script, a);
                self.check_condition(script, b);
            }
            Condition::Not(inner) => self.check_condition(script, inner),
        }
    }

    /// Validate a value read: declared variable, macro, collection member,
    /// or array element.
    fn check_read(&mut self, script: &ScriptModel, operand: &Operand) {
        match operand {
            Operand::Literal(_) => {}
            Operand::Ref { name, member: None } => {
                let known = script.symbols.variable(name.value()).is_some()
                    || macros::lookup(name.value()).is_some();
                if !known {
                    self.emit(
                        Diagnostic::error(format!(
                            "`{}` is not a declared variable or macro",
                            name.value()
                        ))
                        .with_code(ErrorCode::E210)
                        .with_label(name.span(), ErrorCode::E210.description()),
                    );
                }
            }
            Operand::Ref {
                name,
                member: Some(member),
            } => {
                if !macros::is_collection(name.value()) {
                    self.emit(
                        Diagnostic::error(format!(
                            "`{}` is not a collection; member reads apply to collections only",
                            name.value()
                        ))
                        .with_code(ErrorCode::E210)
                        .with_label(name.span(), ErrorCode::E210.description()),
                    );
                } else if !catalog::is_canonical(member.value()) {
                    self.emit(
                        Diagnostic::error(format!(
                            "`{}` is not a known type name",
                            member.value()
                        ))
                        .with_code(ErrorCode::E210)
                        .with_label(member.span(), ErrorCode::E210.description()),
                    );
                }
            }
            Operand::Index { name, index } => {
                match script.symbols.variable(name.value()) {
                    Some(entry) if entry.ty == VarType::IntArray => {}
                    Some(_) => {
                        self.emit(
                            Diagnostic::error(format!(
                                "`{}` is not an `intarray`; only arrays take an index",
                                name.value()
                            ))
                            .with_code(ErrorCode::E217)
                            .with_label(name.span(), ErrorCode::E217.description()),
                        );
                    }
                    None => {
                        self.emit(
                            Diagnostic::error(format!(
                                "`{}` is not a declared variable",
                                name.value()
                            ))
                            .with_code(ErrorCode::E210)
                            .with_label(name.span(), ErrorCode::E210.description()),
                        );
                    }
                }
                self.check_read(script, index.value());
            }
        }
    }

    // -----------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------

    fn check_commands(&mut self, script: &ScriptModel) {
        for chain in &script.chains {
            for (position, command) in chain.commands.iter().enumerate() {
                self.check_command(script, command);

                let is_last = position + 1 == chain.commands.len();
                if self.options.lint_failure_guard
                    && !is_last
                    && matches!(
                        command.modifier.as_ref().map(|m| *m.value()),
                        Some(Modifier::FailureGuard)
                    )
                {
                    self.emit(
                        Diagnostic::info(
                            "commands after a `~` guard are skipped when the guarded action succeeds",
                        )
                        .with_code(ErrorCode::E214)
                        .with_label(command.span, ErrorCode::E214.description())
                        .with_help("move the `~` line to the end of the chain"),
                    );
                }
            }
        }
    }

    /// Disambiguate a command head by name: built-in command, macro write,
    /// variable assignment, or chain invocation.
    fn check_command(&mut self, script: &ScriptModel, command: &Command) {
        let name = command.name.value().as_str();

        if let Some(def) = schema::command(name) {
            self.check_builtin(script, command, def);
            return;
        }

        if let Some(def) = macros::lookup(name) {
            match def.kind {
                MacroKind::ReadWrite => self.check_assignment_params(
                    script,
                    command,
                    def.value_type,
                    name,
                ),
                MacroKind::ReadOnly => {
                    self.emit(
                        Diagnostic::error(format!("macro `{name}` is read-only"))
                            .with_code(ErrorCode::E206)
                            .with_label(command.name.span(), ErrorCode::E206.description())
                            .with_help("read-only macros may appear in conditions and arithmetic reads"),
                    );
                }
            }
            return;
        }

        if let Some(entry) = script.symbols.variable(name) {
            self.check_assignment(script, command, entry.ty);
            return;
        }

        if script.symbols.chain(name).is_some() {
            if !command.params.is_empty() {
                self.emit(
                    Diagnostic::error(format!("event chain `{name}` takes no parameters"))
                        .with_code(ErrorCode::E218)
                        .with_label(command.span, ErrorCode::E218.description()),
                );
            }
            return;
        }

        self.emit(
            Diagnostic::error(format!("`{name}` is not a command, macro, variable, or chain"))
                .with_code(ErrorCode::E216)
                .with_label(command.name.span(), ErrorCode::E216.description()),
        );
    }

    fn check_builtin(
        &mut self,
        script: &ScriptModel,
        command: &Command,
        def: &schema::CommandDef,
    ) {
        if command.index.is_some() {
            self.emit(
                Diagnostic::error(format!("`{}` does not take an index", def.name))
                    .with_code(ErrorCode::E218)
                    .with_label(command.span, ErrorCode::E218.description()),
            );
        }

        if command.params.len() < def.min_params || command.params.len() > def.params.len() {
            let expected = if def.min_params == def.params.len() {
                format!("{}", def.min_params)
            } else {
                format!("{} to {}", def.min_params, def.params.len())
            };
            self.emit(
                Diagnostic::error(format!(
                    "`{}` takes {expected} parameters, found {}",
                    def.name,
                    command.params.len()
                ))
                .with_code(ErrorCode::E218)
                .with_label(command.span, ErrorCode::E218.description()),
            );
            return;
        }

        for (param, param_kind) in command.params.iter().zip(def.params.iter()) {
            let Param::Value(operand) = param.value() else {
                self.emit(
                    Diagnostic::error(format!(
                        "`{}` parameters take plain values, not arithmetic",
                        def.name
                    ))
                    .with_code(ErrorCode::E218)
                    .with_label(param.span(), ErrorCode::E218.description()),
                );
                continue;
            };

            let ok = match (param_kind, operand) {
                (ParamKind::Ident, Operand::Ref { member: None, .. }) => true,
                (ParamKind::Ident, _) => false,
                (_, Operand::Literal(lit)) => match param_kind {
                    ParamKind::Int => matches!(lit.value(), Literal::Int(_)),
                    ParamKind::Number => {
                        matches!(lit.value(), Literal::Int(_) | Literal::Float(_))
                    }
                    ParamKind::Text => matches!(lit.value(), Literal::Str(_)),
                    ParamKind::Ident => unreachable!(),
                },
                // References resolve lazily; validate the read itself.
                (_, operand) => {
                    self.check_read(script, operand);
                    true
                }
            };
            if !ok {
                self.emit(
                    Diagnostic::error(format!(
                        "`{}` parameter `{operand}` has the wrong kind",
                        def.name
                    ))
                    .with_code(ErrorCode::E218)
                    .with_label(param.span(), ErrorCode::E218.description()),
                );
            }
        }

        if let Some(capture) = def.capture {
            self.check_capture(script, command, def.name, capture);
        }
    }

    /// Capture commands rebind object variables; the target must be a
    /// declared object variable of the matching type.
    fn check_capture(
        &mut self,
        script: &ScriptModel,
        command: &Command,
        command_name: &str,
        capture: CaptureKind,
    ) {
        let Some(param) = command.params.first() else {
            return;
        };
        let Param::Value(Operand::Ref { name, member: None }) = param.value() else {
            self.emit(
                Diagnostic::error(format!(
                    "`{command_name}` targets an object variable by name"
                ))
                .with_code(ErrorCode::E207)
                .with_label(param.span(), ErrorCode::E207.description()),
            );
            return;
        };

        let Some(entry) = script.symbols.variable(name.value()) else {
            self.emit(
                Diagnostic::error(format!("`{}` is not a declared variable", name.value()))
                    .with_code(ErrorCode::E207)
                    .with_label(name.span(), ErrorCode::E207.description()),
            );
            return;
        };

        match (capture, entry.ty.object_kind()) {
            (CaptureKind::Save, Some(_)) => {}
            (CaptureKind::Last(expected), Some(actual)) if expected == actual => {}
            (CaptureKind::Last(expected), Some(actual)) => {
                self.emit(
                    Diagnostic::error(format!(
                        "`{command_name}` captures a {expected}, but `{}` is a {actual} variable",
                        name.value()
                    ))
                    .with_code(ErrorCode::E207)
                    .with_label(name.span(), ErrorCode::E207.description()),
                );
            }
            (_, None) => {
                self.emit(
                    Diagnostic::error(format!(
                        "`{}` is not an object variable; capture targets must be miner/vehicle/building/creature",
                        name.value()
                    ))
                    .with_code(ErrorCode::E207)
                    .with_label(name.span(), ErrorCode::E207.description()),
                );
            }
        }
    }

    /// Assignment to a declared variable.
    fn check_assignment(&mut self, script: &ScriptModel, command: &Command, ty: VarType) {
        let name = command.name.value().as_str();

        if let Some(kind) = ty.object_kind() {
            self.emit(
                Diagnostic::error(format!(
                    "{kind} bindings change only through capture commands (`save:`, `last{kind}:`)"
                ))
                .with_code(ErrorCode::E207)
                .with_label(command.span, ErrorCode::E207.description()),
            );
            return;
        }

        match (ty, &command.index) {
            (VarType::IntArray, None) => {
                self.emit(
                    Diagnostic::error(format!(
                        "`{name}` is an `intarray`; assign to an element: `{name}[0]:...`"
                    ))
                    .with_code(ErrorCode::E217)
                    .with_label(command.span, ErrorCode::E217.description()),
                );
                return;
            }
            (VarType::IntArray, Some(index)) => {
                self.check_read(script, index.value());
                self.check_assignment_params(script, command, VarType::Int, name);
                return;
            }
            (_, Some(index)) => {
                self.emit(
                    Diagnostic::error(format!("`{name}` is not an `intarray`"))
                        .with_code(ErrorCode::E217)
                        .with_label(index.span(), ErrorCode::E217.description()),
                );
                return;
            }
            _ => {}
        }

        self.check_assignment_params(script, command, ty, name);
    }

    /// Check the right-hand side of an assignment-form statement
    /// (variable, array element, or read-write macro).
    fn check_assignment_params(
        &mut self,
        script: &ScriptModel,
        command: &Command,
        ty: VarType,
        name: &str,
    ) {
        if command.params.len() != 1 {
            self.emit(
                Diagnostic::error(format!(
                    "assignment to `{name}` takes exactly one value"
                ))
                .with_code(ErrorCode::E218)
                .with_label(command.span, ErrorCode::E218.description()),
            );
            return;
        }
        let param = &command.params[0];

        match param.value() {
            Param::Value(operand) => {
                self.check_read(script, operand);
                self.check_assigned_kind(ty, name, operand, param.span());
            }
            Param::Math { lhs, op, rhs } => {
                self.check_read(script, lhs);
                self.check_read(script, rhs);

                match ty {
                    VarType::Int | VarType::Float => {
                        for operand in [lhs, rhs] {
                            if matches!(
                                operand,
                                Operand::Literal(lit) if matches!(lit.value(), Literal::Str(_) | Literal::Bool(_))
                            ) {
                                self.emit(
                                    Diagnostic::error(format!(
                                        "arithmetic on `{name}` takes numeric operands"
                                    ))
                                    .with_code(ErrorCode::E208)
                                    .with_label(operand.span(), ErrorCode::E208.description()),
                                );
                            }
                        }
                    }
                    VarType::Str if *op == MathOp::Add => {}
                    VarType::Str => {
                        self.emit(
                            Diagnostic::error(
                                "strings support `+` concatenation only",
                            )
                            .with_code(ErrorCode::E208)
                            .with_label(param.span(), ErrorCode::E208.description()),
                        );
                    }
                    _ => {
                        self.emit(
                            Diagnostic::error(format!(
                                "arithmetic applies to `int` and `float` variables, not `{ty}`"
                            ))
                            .with_code(ErrorCode::E208)
                            .with_label(param.span(), ErrorCode::E208.description()),
                        );
                    }
                }
            }
        }
    }

    /// Literal assigned values must match the target type.
    fn check_assigned_kind(&mut self, ty: VarType, name: &str, operand: &Operand, span: Span) {
        let Operand::Literal(lit) = operand else {
            return;
        };
        let ok = match ty {
            VarType::Int => matches!(lit.value(), Literal::Int(_)),
            VarType::Float | VarType::Timer => {
                matches!(lit.value(), Literal::Int(_) | Literal::Float(_))
            }
            VarType::Bool => matches!(lit.value(), Literal::Bool(_)),
            VarType::Str => matches!(lit.value(), Literal::Str(_)),
            VarType::Arrow => matches!(lit.value(), Literal::Ident(_)),
            // Object types are rejected earlier; arrays recurse as Int.
            _ => true,
        };
        if !ok {
            self.emit(
                Diagnostic::error(format!(
                    "`{name}` is `{ty}`; `{}` does not fit",
                    lit.value()
                ))
                .with_code(ErrorCode::E209)
                .with_label(span, ErrorCode::E209.description()),
            );
        }
    }

    // -----------------------------------------------------------------
    // Tile-mutation batching
    // -----------------------------------------------------------------

    /// Static census of `place`/`drill` commands reachable from each
    /// trigger body. `wait` boundaries cannot be resolved statically, so
    /// both findings stay warnings.
    fn check_batch_limits(&mut self, script: &ScriptModel) {
        let chain_map: HashMap<&str, &EventChain> = script
            .chains
            .iter()
            .map(|chain| (chain.name.value().as_str(), chain))
            .collect();

        for trigger in &script.triggers {
            let mut census = MutationCensus::default();
            let mut visited = HashSet::new();
            for target in [Some(&trigger.true_event), trigger.false_event.as_ref()]
                .into_iter()
                .flatten()
            {
                census_chain(target.value(), &chain_map, &mut visited, &mut census);
            }

            let total = census.total();
            if total > self.options.max_tile_mutations {
                self.emit(
                    Diagnostic::warning(format!(
                        "trigger body schedules {total} tile mutations; the engine drops writes beyond {}",
                        self.options.max_tile_mutations
                    ))
                    .with_code(ErrorCode::E212)
                    .with_label(trigger.span, ErrorCode::E212.description())
                    .with_help("split the work across `wait` boundaries or several triggers"),
                );
            }

            if self.options.warn_fluid_mixing && census.fluid > 0 && census.solid > 0 {
                self.emit(
                    Diagnostic::warning(
                        "fluid and solid tile writes in one trigger body race in the erosion pass",
                    )
                    .with_code(ErrorCode::E213)
                    .with_label(trigger.span, ErrorCode::E213.description()),
                );
            }
        }
    }
}

#[derive(Debug, Default)]
struct MutationCensus {
    fluid: usize,
    solid: usize,
}

impl MutationCensus {
    fn total(&self) -> usize {
        self.fluid + self.solid
    }
}

/// Walk a chain and everything it invokes, counting tile mutations.
fn census_chain<'a>(
    name: &'a str,
    chains: &HashMap<&'a str, &'a EventChain>,
    visited: &mut HashSet<&'a str>,
    census: &mut MutationCensus,
) {
    if !visited.insert(name) {
        return;
    }
    let Some(chain) = chains.get(name) else {
        return;
    };

    for command in &chain.commands {
        match schema::command(command.name.value()).and_then(|def| def.tile_mutation) {
            Some(TileMutation::Place) => {
                let tile_id = command.params.get(2).and_then(|p| match p.value() {
                    Param::Value(Operand::Literal(lit)) => lit.value().as_int(),
                    _ => None,
                });
                match tile_id {
                    Some(id) if u32::try_from(id).is_ok_and(tile::is_fluid) => {
                        census.fluid += 1;
                    }
                    _ => census.solid += 1,
                }
            }
            Some(TileMutation::Drill) => census.solid += 1,
            None => {
                // Chain invocations extend the reachable body.
                if chains.contains_key(command.name.value().as_str()) {
                    census_chain(command.name.value(), chains, visited, census);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;

    fn check(source: &str) -> Vec<Diagnostic> {
        analyze(source, &ValidateOptions::default()).diagnostics
    }

    fn codes(diags: &[Diagnostic]) -> Vec<ErrorCode> {
        diags.iter().filter_map(|d| d.code()).collect()
    }

    fn script(body: &str) -> String {
        format!("script{{\n{body}}}\n")
    }

    #[test]
    fn clean_script_has_no_findings() {
        let source = script(
            "int Count=0\n\nGreet::\nCount:Count+1;\n\nwhen(crystals>50)[Greet]\n",
        );
        let diags = check(&source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn reserved_word_collisions() {
        let diags = check(&script("int crystals=5\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E200]);

        let diags = check(&script("enter::\nmsg:\"hi\";\n"));
        assert!(codes(&diags).contains(&ErrorCode::E200));
    }

    #[test]
    fn reserved_check_is_case_sensitive() {
        let diags = check(&script("int Crystals=5\n"));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn duplicate_variables_and_chains() {
        let diags = check(&script("int A=1\nint A=2\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E201]);

        let diags = check(&script("X::\nmsg:\"a\";\n\nX::\nmsg:\"b\";\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E202]);
    }

    #[test]
    fn binding_uniqueness_yields_exactly_one_diagnostic() {
        let source = format!(
            "miners{{\npilot,3,1,1\n}}\n{}",
            script("miner A=3\nminer B=3\n")
        );
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E203]);
    }

    #[test]
    fn binding_to_missing_entity_is_an_error() {
        let diags = check(&script("miner A=3\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E204]);
    }

    #[test]
    fn building_bindings_key_on_foot_point() {
        let source = format!(
            "buildings{{\ntoolstore,2,3\n}}\n{}",
            script("building Base=2,3\nbuilding Again=2,3\n")
        );
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E203]);
    }

    #[test]
    fn duplicate_triggers_flag_every_member() {
        let source = script(
            "Foo::\nmsg:\"a\";\n\nBar::\nmsg:\"b\";\n\nwhen(enter:4,5)[Foo]\nwhen(enter:4,5)[Bar]\n",
        );
        let diags = check(&source);
        let dups: Vec<_> = diags
            .iter()
            .filter(|d| d.code() == Some(ErrorCode::E205))
            .collect();
        assert_eq!(dups.len(), 2);
    }

    #[test]
    fn time_triggers_are_exempt_from_duplicate_detection() {
        let source = script(
            "A::\nmsg:\"a\";\n\nB::\nmsg:\"b\";\n\nif(time:0)[A]\nif(time:0)[B]\n",
        );
        let diags = check(&source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn write_to_read_only_macro_is_an_error() {
        let diags = check(&script("Tick::\nrowcount:5;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E206]);
    }

    #[test]
    fn read_write_macro_command_form_is_legal() {
        let diags = check(&script("Grant::\ncrystals:10;\nair:air+5;\n"));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn capture_type_mismatch() {
        let source = format!(
            "vehicles{{\nhoverscout,1,2,2\n}}\n{}",
            script("vehicle Scout=1\nGrab::\nlastminer:Scout;\n")
        );
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E207]);
    }

    #[test]
    fn capture_of_matching_type_is_legal() {
        let diags = check(&script("miner Chief\nGrab::\nlastminer:Chief;\nsave:Chief;\n"));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn capture_of_non_object_variable_is_an_error() {
        let diags = check(&script("int Count=0\nGrab::\nsave:Count;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E207]);
    }

    #[test]
    fn assignment_to_object_variable_is_rejected() {
        let source = format!(
            "miners{{\npilot,3,1,1\n}}\n{}",
            script("miner Chief=3\nRebind::\nChief:4;\n")
        );
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E207]);
    }

    #[test]
    fn arithmetic_is_type_restricted() {
        let diags = check(&script("bool Flag=true\nFlip::\nFlag:Flag+1;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E208]);

        let diags = check(&script(
            "string Name=\"a\"\nGrow::\nName:Name+\"b\";\n",
        ));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");

        let diags = check(&script(
            "string Name=\"a\"\nShrink::\nName:Name-\"b\";\n",
        ));
        assert_eq!(codes(&diags), vec![ErrorCode::E208]);
    }

    #[test]
    fn declared_value_type_mismatch() {
        let diags = check(&script("int Count=\"five\"\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E209]);
    }

    #[test]
    fn undeclared_references_in_conditions() {
        let source = script("Go::\nmsg:\"hi\";\n\nwhen(enter:1,1)((Missing>0))[Go]\n");
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E210]);
    }

    #[test]
    fn trigger_target_must_exist() {
        let diags = check(&script("when(enter:1,1)[Nowhere]\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E210]);
    }

    #[test]
    fn init_and_tick_cannot_be_trigger_targets() {
        let source = script("init::\nmsg:\"boot\";\n\nwhen(enter:1,1)[init]\n");
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E211]);
    }

    #[test]
    fn batch_ceiling_above_limit_warns() {
        let mut body = String::from("Flood::\n");
        for i in 0..700 {
            body.push_str(&format!("place:{},{},1;\n", i / 100, i % 100));
        }
        body.push_str("\nif(time:10)[Flood]\n");
        let diags = check(&script(&body));
        assert_eq!(codes(&diags), vec![ErrorCode::E212]);
    }

    #[test]
    fn batch_at_six_hundred_does_not_warn() {
        let mut body = String::from("Flood::\n");
        for i in 0..600 {
            body.push_str(&format!("place:{},{},1;\n", i / 100, i % 100));
        }
        body.push_str("\nif(time:10)[Flood]\n");
        let diags = check(&script(&body));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn batch_census_follows_chain_invocations() {
        let mut body = String::from("Outer::\nInner;\n\nInner::\n");
        for i in 0..700 {
            body.push_str(&format!("drill:{},{};\n", i / 100, i % 100));
        }
        body.push_str("\nif(time:10)[Outer]\n");
        let diags = check(&script(&body));
        assert_eq!(codes(&diags), vec![ErrorCode::E212]);
    }

    #[test]
    fn fluid_and_solid_writes_mixed_in_one_body_warn() {
        let source = script(
            "Mix::\nplace:1,1,11;\nplace:1,2,38;\n\nif(time:5)[Mix]\n",
        );
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E213]);
    }

    #[test]
    fn fluid_only_writes_do_not_warn() {
        let source = script("Flood::\nplace:1,1,11;\nplace:1,2,6;\n\nif(time:5)[Flood]\n");
        let diags = check(&source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn failure_guard_not_last_is_linted() {
        let source = script(
            "Spawn::\nemerge:4,5,N,CreatureRockMonster_C,2;\n~msg:\"failed\";\nmsg:\"after\";\n",
        );
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E214]);
        assert_eq!(diags[0].severity(), crate::error::Severity::Info);
    }

    #[test]
    fn failure_guard_as_final_statement_is_clean() {
        let source = script(
            "Spawn::\nemerge:4,5,N,CreatureRockMonster_C,2;\n~msg:\"failed\";\n",
        );
        let diags = check(&source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn dimension_mismatch_is_a_warning() {
        let source = "info{\nrowcount:3\ncolcount:3\n}\ntiles{\n1,1,\n1,1,\n}\n";
        let diags = check(source);
        assert_eq!(codes(&diags), vec![ErrorCode::E215]);
        assert_eq!(diags[0].severity(), crate::error::Severity::Warning);
    }

    #[test]
    fn unknown_command_or_chain() {
        let diags = check(&script("Go::\nconjure:1;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E216]);
    }

    #[test]
    fn intarray_misuse() {
        let diags = check(&script("intarray Stash\nFill::\nStash:5;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E217]);

        let diags = check(&script("int Count=0\nFill::\nCount[0]:5;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E217]);

        let diags = check(&script("intarray Stash\nFill::\nStash[0]:5;\n"));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn builtin_parameter_schemas() {
        let diags = check(&script("Go::\nplace:1;\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E218]);

        let diags = check(&script("Go::\npan:1,\"two\";\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E218]);
    }

    #[test]
    fn unknown_trigger_kind_and_bad_args() {
        let diags = check(&script("Go::\nmsg:\"x\";\n\nwhen(explode:1,1)[Go]\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E219]);

        let diags = check(&script("Go::\nmsg:\"x\";\n\nwhen(enter:4)[Go]\n"));
        assert_eq!(codes(&diags), vec![ErrorCode::E220]);
    }

    #[test]
    fn chain_invocation_takes_no_parameters() {
        let source = script("A::\nmsg:\"a\";\n\nB::\nA:5;\n");
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E218]);
    }

    #[test]
    fn collection_member_reads_validate_against_the_catalog() {
        let source = script(
            "Go::\nmsg:\"x\";\n\nwhen(buildings.BuildingToolStore_C==0)[Go]\n",
        );
        let diags = check(&source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");

        let source = script("Go::\nmsg:\"x\";\n\nwhen(buildings.NoSuch_C==0)[Go]\n");
        let diags = check(&source);
        assert_eq!(codes(&diags), vec![ErrorCode::E210]);
    }

    #[test]
    fn validation_never_blocks_model_production() {
        let source = script("int crystals=5\nint crystals=6\nwhen(enter:1,1)[Nowhere]\n");
        let outcome = analyze(&source, &ValidateOptions::default());
        assert!(outcome.has_errors());
        assert!(outcome.document.script().is_some());
        assert_eq!(outcome.document.script().unwrap().variables.len(), 2);
    }
}
