//! End-to-end tests of the public analyzer API.

use cavern::{Analyzer, AnalyzerConfig, ObjectKind, SectionKind, Severity};

const MAP: &str = "\
info{
rowcount:3
colcount:3
levelname:Breach the Seam
}
tiles{
38,38,38,
38,1,38,
38,38,38,
}
height{
0,0,0,
0,0,0,
0,0,0,
}
resources{
crystals:
0,0,0,
0,5,0,
0,0,0,
ore:
0,0,0,
0,2,0,
0,0,0,
}
miners{
pilot,0,1,1
}
script{
int Found=0
miner Chief=0

Celebrate::
Found:Found+1;
msg:\"The seam is open\";

when(drill:0,1)[Celebrate]
}
briefing{
Find the energy seam hidden in the walls.
}
";

#[test]
fn a_complete_map_analyzes_clean() {
    let analyzer = Analyzer::new(AnalyzerConfig::default());
    let analysis = analyzer.analyze(MAP);
    assert!(
        analysis.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        analysis.diagnostics
    );

    let doc = &analysis.document;
    assert_eq!(doc.sections().len(), 8);
    assert_eq!(doc.info_int("rowcount"), Some(3));
    assert_eq!(doc.grid(SectionKind::Tiles).unwrap().get(1, 1), Some(1));
    assert_eq!(doc.objects(ObjectKind::Miner).count(), 1);

    let script = doc.script().unwrap();
    assert_eq!(script.variables.len(), 2);
    assert_eq!(script.chains.len(), 1);
    assert_eq!(script.triggers.len(), 1);
}

#[test]
fn model_is_always_produced_for_broken_input() {
    let analyzer = Analyzer::new(AnalyzerConfig::default());
    let source = "info{\nrowcount:2\nscript{\nint int=1\n}";
    let analysis = analyzer.analyze(source);
    assert!(analysis.has_errors());
    // Worst case is still a document, never a failure.
    assert!(!analysis.document.sections().is_empty());
}

#[test]
fn severity_counts_and_resolution() {
    let analyzer = Analyzer::new(AnalyzerConfig::default());
    // One warning (duplicate triggers are flagged on both members).
    let source = "script{\nGo::\nmsg:\"x\";\n\nwhen(enter:1,1)[Go]\nwhen(enter:1,1)[Go]\n}\n";
    let analysis = analyzer.analyze(source);
    assert_eq!(analysis.count(Severity::Warning), 2);
    assert_eq!(analysis.count(Severity::Error), 0);

    let resolved = analysis.resolve(source);
    assert!(resolved.iter().all(|d| d.section.as_deref() == Some("script")));
    assert!(resolved.windows(2).all(|w| w[0].line <= w[1].line));
}
