//! End-to-end smoke tests driving the CLI `run` path against real files.

use std::io::Write;

use clap::Parser;

use cavern_cli::{Args, run};

fn args_for(path: &str, extra: &[&str]) -> Args {
    let mut argv = vec!["cavern", path];
    argv.extend_from_slice(extra);
    Args::parse_from(argv)
}

fn write_map(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn clean_map_reports_nothing() {
    let map = write_map("info{\nrowcount:1\ncolcount:1\n}\ntiles{\n1,\n}\n");
    let report = run(&args_for(map.path().to_str().unwrap(), &[])).unwrap();
    assert_eq!(report.errors, 0);
    assert_eq!(report.warnings, 0);
    assert!(!report.gated(true));
}

#[test]
fn map_with_errors_gates() {
    let map = write_map("script{\nint crystals=1\n}\n");
    let report = run(&args_for(map.path().to_str().unwrap(), &[])).unwrap();
    assert_eq!(report.errors, 1);
    assert!(report.gated(false));
}

#[test]
fn warnings_gate_only_with_deny_warnings() {
    let map = write_map(
        "script{\nGo::\nmsg:\"x\";\n\nwhen(enter:1,1)[Go]\nwhen(enter:1,1)[Go]\n}\n",
    );
    let report = run(&args_for(map.path().to_str().unwrap(), &[])).unwrap();
    assert_eq!(report.errors, 0);
    assert_eq!(report.warnings, 2);
    assert!(!report.gated(false));
    assert!(report.gated(true));
}

#[test]
fn json_output_mode_runs() {
    let map = write_map("tiles{\n1,x,\n}\n");
    let report = run(&args_for(map.path().to_str().unwrap(), &["--json"])).unwrap();
    assert_eq!(report.errors, 1);
}

#[test]
fn missing_input_is_an_io_error() {
    let result = run(&args_for("/nonexistent/map.dat", &[]));
    assert!(result.is_err());
}

#[test]
fn config_ceiling_applies() {
    let map_body = {
        let mut body = String::from("script{\nDig::\n");
        for i in 0..5 {
            body.push_str(&format!("drill:0,{i};\n"));
        }
        body.push_str("\nif(time:1)[Dig]\n}\n");
        body
    };
    let map = write_map(&map_body);

    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "max_tile_mutations = 2").unwrap();

    let report = run(&args_for(
        map.path().to_str().unwrap(),
        &["--config", config.path().to_str().unwrap()],
    ))
    .unwrap();
    assert_eq!(report.warnings, 1);
}
