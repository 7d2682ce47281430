/* Command Line Tests
 *
 * These tests drive the mspec-gen binary end to end: plan files on disk,
 * the exit status of a failing run and the analyze report.
 */

use mspec_gen::codegen::shared::plan::TypeArtifact;
use mspec_gen::codegen::{generate_all, write_plans, Backend, GeneratorOptions};
use mspec_gen::spec::{SpecFile, TypeRegistry};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const S7_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/s7.yaml");

const WIDE_SPEC: &str = r#"
protocol: demo
types:
  - complex-type:
      name: Measurement
      fields:
        - simple:
            name: value
            type:
              simple:
                base-type: float
                size-in-bits: 128
"#;

/* Helper to run the binary with the given arguments */
fn mspec_gen(args: &[&str]) -> Result<Output, String> {
    Command::new(env!("CARGO_BIN_EXE_mspec-gen"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .map_err(|e| format!("Failed to run mspec-gen: {}", e))
}

fn read_plan(path: &Path) -> Result<TypeArtifact, String> {
    let json = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&json).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[test]
fn test_codegen_writes_one_plan_per_type() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().to_str().expect("utf-8 temp path");

    let output = mspec_gen(&["codegen", "-f", S7_FIXTURE, "-l", "go", "-o", out]).expect("run");
    assert!(
        output.status.success(),
        "codegen failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let plan_dir = dir.path().join("go");
    let plans = fs::read_dir(&plan_dir).expect("plan dir").count();
    assert_eq!(plans, 10);

    let tpkt = read_plan(&plan_dir.join("TPKTPacket.plan.json")).expect("TPKTPacket plan");
    assert_eq!(tpkt.type_name, "TPKTPacket");
    assert!(tpkt.field("payload").is_some());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[✓]"));
}

#[test]
fn test_codegen_c_with_protocol_override() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().to_str().expect("utf-8 temp path");

    let output = mspec_gen(&[
        "codegen", "-f", S7_FIXTURE, "-l", "c", "-o", out, "--protocol", "s7plus",
    ])
    .expect("run");
    assert!(output.status.success());

    let plan = read_plan(&dir.path().join("c").join("S7Message.plan.json")).expect("S7Message plan");
    assert_eq!(plan.target_type, "plc4c_s7plus_read_write_s7_message");
}

#[test]
fn test_codegen_failure_exits_non_zero() {
    let dir = tempfile::tempdir().expect("temp dir");
    let spec = dir.path().join("wide.yaml");
    fs::write(&spec, WIDE_SPEC).expect("write spec");
    let out = dir.path().join("out");

    let output = mspec_gen(&[
        "codegen",
        "-f",
        spec.to_str().expect("utf-8 path"),
        "-l",
        "c",
        "-o",
        out.to_str().expect("utf-8 path"),
    ])
    .expect("run");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Measurement"));
    assert!(stderr.contains("field value"));
}

#[test]
fn test_codegen_missing_file_exits_non_zero() {
    let output = mspec_gen(&["codegen", "-f", "/nonexistent/spec.yaml"]).expect("run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/spec.yaml"));
}

#[test]
fn test_analyze_reports_hierarchy_and_plan() {
    let output = mspec_gen(&["analyze", "-f", S7_FIXTURE, "--print-plan", "TPKTPacket"]).expect("run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("switch on (messageType)"));
    assert!(stdout.contains("S7MessageRequest"));
    assert!(stdout.contains("\"type_name\": \"TPKTPacket\""));
}

#[test]
fn test_analyze_unknown_type_fails() {
    let output = mspec_gen(&["analyze", "-f", S7_FIXTURE, "--print-plan", "NoSuchType"]).expect("run");
    assert!(!output.status.success());
}

#[test]
fn test_write_plans_through_library() {
    let file = SpecFile::load(Path::new(S7_FIXTURE)).expect("fixture should load");
    let registry = TypeRegistry::from_spec_files(&[file]).expect("registry");
    let options = GeneratorOptions {
        backend: Backend::C,
        ..GeneratorOptions::default()
    };
    let report = generate_all(&registry, &options);
    assert!(report.is_success());

    let dir = tempfile::tempdir().expect("temp dir");
    let written = write_plans(&report, dir.path()).expect("plans written");
    assert_eq!(written.len(), report.artifacts.len());
    assert!(written.iter().all(|path| path.starts_with(dir.path().join("c"))));

    let plan = read_plan(&dir.path().join("c").join("COTPPacket.plan.json")).expect("COTPPacket plan");
    assert!(plan.requires_start_pos);
}
