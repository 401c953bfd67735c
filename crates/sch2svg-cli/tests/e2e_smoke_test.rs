use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use tempfile::tempdir;

use sch2svg_cli::Args;

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

/// Collects all .sch files from a directory
fn collect_sch_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("sch"))
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args_for(input: &Path, output: &Path, extra: &[&str]) -> Args {
    let mut argv = vec![
        "sch2svg".to_string(),
        input.to_string_lossy().to_string(),
        "--output".to_string(),
        output.to_string_lossy().to_string(),
        "--log-level".to_string(),
        "off".to_string(),
    ];
    argv.extend(extra.iter().map(|arg| arg.to_string()));
    Args::parse_from(argv)
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_sch_files(demos_dir());
    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();
    for demo in &demos {
        let output = temp_dir
            .path()
            .join(format!("{}.svg", demo.file_stem().unwrap().to_string_lossy()));

        match sch2svg_cli::run(&args_for(demo, &output, &[])) {
            Ok(()) => {
                let svg = fs::read_to_string(&output).expect("Output file should exist");
                assert!(svg.starts_with("<svg"), "{}: output is not SVG", demo.display());
                assert!(svg.ends_with("</svg>"), "{}: output is incomplete", demo.display());
            }
            Err(err) => failed.push((demo.clone(), err)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_flags() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("demo.svg");
    let args = args_for(
        &demos_dir().join("demo.sch"),
        &output,
        &["--css-classes", "--pretty", "--show-hidden-pins"],
    );

    sch2svg_cli::run(&args).expect("Failed to render demo");
    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains(r#"class="component""#));
    assert!(svg.contains("\n  <"), "pretty output should be indented");
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_sch_files(demos_dir().join("errors"));
    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for demo in &error_demos {
        let output = temp_dir
            .path()
            .join(format!("error_{}.svg", demo.file_stem().unwrap().to_string_lossy()));

        if sch2svg_cli::run(&args_for(demo, &output, &[])).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!("{} error demo(s) succeeded unexpectedly", unexpectedly_succeeded.len());
    }
}

#[test]
fn e2e_smoke_test_annotated_recovery() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("bad_orientation.svg");
    let args = args_for(
        &demos_dir().join("errors/bad_orientation.sch"),
        &output,
        &["--annotate-errors"],
    );

    sch2svg_cli::run(&args).expect("annotated render should succeed");
    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains("<!-- sch2svg: bad_orientation.sch:2:"), "svg: {svg}");
    assert!(svg.ends_with("</svg>"));
}
