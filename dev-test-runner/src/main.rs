//! Runs the JSON fixtures under `fixtures/` through the lifter and diffs the
//! result against each fixture's `expect` document.
//!
//! Usage: `cargo run -p dev-test-runner [FILTER]`, where `FILTER` is a regex
//! over fixture file names.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use typelift::{File, PipelineConfig, SourceFile};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default)]
    description: Option<String>,
    ast: SourceFile,
    #[serde(default)]
    config: PipelineConfig,
    #[serde(default)]
    package: Option<String>,
    expect: Value,
}

enum Outcome {
    Pass,
    Fail(String),
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("fixtures")
}

fn load_fixture(path: &Path) -> Result<Fixture, String> {
    let src = std::fs::read_to_string(path).map_err(|e| format!("read: {e}"))?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize(de).map_err(|e| format!("at JSON path {} → {}", e.path(), e.inner()))
}

fn run_fixture(fixture: &Fixture) -> Result<Outcome, String> {
    let transforms = fixture.config.build().map_err(|e| e.to_string())?;
    let package = fixture
        .package
        .clone()
        .or_else(|| fixture.config.package.clone())
        .unwrap_or_default();
    let file = File::from_ast(&fixture.ast, &package, transforms);
    let actual = serde_json::to_value(&file).map_err(|e| e.to_string())?;
    if actual == fixture.expect {
        return Ok(Outcome::Pass);
    }
    let pretty = |v: &Value| serde_json::to_string_pretty(v).unwrap_or_default();
    Ok(Outcome::Fail(format!(
        "expected:\n{}\nactual:\n{}",
        pretty(&fixture.expect),
        pretty(&actual)
    )))
}

fn main() -> ExitCode {
    let filter = match std::env::args().nth(1).map(|f| Regex::new(&f)).transpose() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("invalid filter: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dir = fixtures_dir();
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(e) => {
            eprintln!("cannot list {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    };
    paths.sort();

    let (mut passed, mut failed) = (0usize, 0usize);
    for path in paths {
        let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
            continue;
        }
        let outcome = load_fixture(&path).and_then(|fixture| {
            if let Some(description) = fixture.description.as_deref() {
                eprintln!("▶ {name}: {description}");
            }
            run_fixture(&fixture)
        });
        match outcome {
            Ok(Outcome::Pass) => {
                passed += 1;
                println!("PASS {name}");
            }
            Ok(Outcome::Fail(diff)) => {
                failed += 1;
                println!("FAIL {name}\n{diff}");
            }
            Err(e) => {
                failed += 1;
                println!("ERROR {name}: {e}");
            }
        }
    }

    println!("\n{passed} passed, {failed} failed");
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
