//! CLI logic for the Cavern map checker.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use cavern::{Analyzer, CavernError, Severity};

use crate::error_adapter::DiagnosticAdapter;

/// What a check run found, for exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl CheckReport {
    /// Whether the run should gate (nonzero exit).
    pub fn gated(&self, deny_warnings: bool) -> bool {
        self.errors > 0 || (deny_warnings && self.warnings > 0)
    }
}

/// Run the Cavern CLI application.
///
/// Reads the input map, analyzes it, and prints diagnostics: rendered
/// reports by default, JSON with `--json`.
///
/// # Errors
///
/// Returns `CavernError` for file I/O and configuration problems.
/// Findings in the map itself are never errors here; they are printed and
/// summarized in the returned [`CheckReport`].
pub fn run(args: &Args) -> Result<CheckReport, CavernError> {
    info!(input_path = args.input; "Checking map");

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let analyzer = Analyzer::new(app_config);
    let analysis = analyzer.analyze(&source);

    if args.json {
        let resolved = analysis.resolve(&source);
        println!(
            "{}",
            serde_json::to_string_pretty(&resolved).expect("diagnostics serialize")
        );
    } else {
        let reporter = miette::GraphicalReportHandler::new();
        for diagnostic in &analysis.diagnostics {
            let mut rendered = String::new();
            reporter
                .render_report(
                    &mut rendered,
                    &DiagnosticAdapter::new(diagnostic, &source),
                )
                .expect("writing to String buffer is infallible");
            eprintln!("{rendered}");
        }
    }

    let report = CheckReport {
        errors: analysis.count(Severity::Error),
        warnings: analysis.count(Severity::Warning),
        infos: analysis.count(Severity::Info),
    };

    if !args.json {
        eprintln!(
            "{}: {} error(s), {} warning(s), {} note(s)",
            args.input, report.errors, report.warnings, report.infos
        );
    }

    info!(
        errors = report.errors,
        warnings = report.warnings;
        "Check complete"
    );
    Ok(report)
}
