// End-to-end tests for the `opaef` binary: exit codes and the --json stdout contract.
//
// Run with: cargo test -p opaef-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const LEDGER: &str = "\
ENT,C_EJERCICIO,C_CONCEPTO,CLAVE_C,CLAVE_R,C_CARGO,C_DATAS,C_VOLUNTARIA,C_EJECUTIVA,C_PENDIENTE
026,2022,IBI URBANA,2023.102,2022.102,120.00,0,80.00,20.00,20.00
026,2022,IVTM,2022.205,2022.205,300.00,4.00,250.00,30.00,16.00
026,2023,IBI URBANA,2023.102,2023.102,1600.00,0,1400.00,100.00,100.00
026,2023,TASA BASURAS,2023.900,2023.900,65.00,0,65.00,0,0
";

const GROUPING: &str = r#"
group_by_year = true
group_by_concept = true
group_by_custom = true

[[custom_groups]]
name = "Inmuebles"
concept_codes = ["102"]
"#;

const DOCUMENTED_OFF: &str = r#"
[[exercises]]
fiscal_year = 2023
charge = "1665.00"
voluntary = "1465.00"
enforced = "90.00"
pending = "100.00"
"#;

fn opaef() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_opaef"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("OPAEF_GROUPING");
    cmd
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn run(args: &[&Path]) -> Output {
    opaef().args(args).output().expect("run opaef")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &str) -> serde_json::Value {
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be one JSON value.\nParse error: {e}\nstdout:\n{trimmed}"))
}

fn p(s: &str) -> &Path {
    Path::new(s)
}

// ===========================================================================
// opaef tree
// ===========================================================================

#[test]
fn tree_text_output() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);

    let out = run(&[p("tree"), &ledger]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = stdout(&out);
    let lines: Vec<_> = text.lines().collect();
    assert!(lines[1].starts_with("Total"));
    assert!(lines.iter().any(|l| l.starts_with("  2022")));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("TASA BASURAS (900)")));
    assert!(stderr(&out).contains("Entidad 026: 4 records"));
}

#[test]
fn tree_json_contract() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);
    let config = write(&dir, "grouping.toml", GROUPING);

    let out = run(&[p("tree"), &ledger, p("--config"), &config, p("--json")]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let val = assert_single_json(&stdout(&out));
    assert_eq!(val["meta"]["engine_version"], env!("CARGO_PKG_VERSION"));
    assert!(val["meta"]["generated_at"].as_str().unwrap().ends_with('Z'));
    assert_eq!(val["meta"]["entity"], "Entidad 026");

    let tree = &val["tree"];
    assert_eq!(tree["kind"], "root");
    assert_eq!(tree["record_count"], 4);
    assert_eq!(tree["amounts"]["total"], "1945.00");

    let y2023 = &tree["children"][1];
    assert_eq!(y2023["year"], 2023);
    assert_eq!(y2023["children"][0]["kind"], "custom_group");
    assert_eq!(y2023["children"][0]["label"], "Inmuebles");
}

#[test]
fn tree_recognition_adds_accounting_year_node() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);

    let out = run(&[p("tree"), &ledger, p("--recognition"), p("--json")]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let val = assert_single_json(&stdout(&out));
    let y2023 = &val["tree"]["children"][1];
    let last = y2023["children"].as_array().unwrap().last().unwrap();
    assert_eq!(last["kind"], "recognition");
    assert_eq!(last["label"], "Rec. 2023");
    assert_eq!(last["record_count"], 1);
    assert_eq!(val["tree"]["children"][0]["record_count"], 1);
}

#[test]
fn tree_write_offs_to_file() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);
    let target = dir.path().join("datas.json");

    let out = run(&[p("tree"), &ledger, p("--write-offs"), p("--output"), &target]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("- 2022 2022.205 (IVTM) 280.00"));

    let written = std::fs::read_to_string(&target).unwrap();
    let val = assert_single_json(&written);
    assert_eq!(val["tree"]["record_count"], 1);
    assert_eq!(val["tree"]["amounts"]["write_off"], "4.00");
}

// ===========================================================================
// opaef validate
// ===========================================================================

#[test]
fn validate_derived_totals_reconcile() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);

    let out = run(&[p("validate"), &ledger]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("2023 ok"));
}

#[test]
fn validate_mismatch_exits_3() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);
    let documented = write(&dir, "documented.toml", DOCUMENTED_OFF);

    let out = run(&[p("validate"), &ledger, p("--documented"), &documented]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stdout(&out).contains("2023 MISMATCH"));
    assert!(stdout(&out).contains("C_EJECUTIVA: computed 100.00 vs documented 90.00"));
    let err = stderr(&out);
    assert!(err.contains("error: documented totals do not reconcile"));
    assert!(err.contains("hint:  exercises out of tolerance: 2023"));
}

#[test]
fn validate_json_contract() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", LEDGER);
    let documented = write(&dir, "documented.toml", DOCUMENTED_OFF);

    let out = run(&[p("validate"), &ledger, p("-d"), &documented, p("--json")]);
    assert_eq!(out.status.code(), Some(3));

    let val = assert_single_json(&stdout(&out));
    let validation = &val["validation"];
    assert_eq!(validation["discrepancies"].as_array().unwrap().len(), 0);
    let y2023 = &validation["exercises"]["2023"];
    assert_eq!(y2023["is_valid"], false);
    assert_eq!(y2023["errors"].as_array().unwrap().len(), 2);
    assert_eq!(validation["exercises"]["2022"]["is_valid"], true);
}

// ===========================================================================
// opaef check-config
// ===========================================================================

#[test]
fn check_config_reports_lint() {
    let dir = TempDir::new().unwrap();
    let config = write(
        &dir,
        "grouping.toml",
        "group_by_custom = true\n[[custom_groups]]\nname = \"Vacio\"\n",
    );

    let out = run(&[p("check-config"), &config]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("warning: custom group 'Vacio' lists no concept codes"));
}

#[test]
fn check_config_invalid_toml_exits_4() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "grouping.toml", "group_by_year = \"yes\"\n");

    let out = run(&[p("check-config"), &config]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("config parse error"));
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn malformed_ledger_exits_5() {
    let dir = TempDir::new().unwrap();
    let ledger = write(&dir, "ledger.csv", "ENT,C_EJERCICIO\n026,2023\n");

    let out = run(&[p("tree"), &ledger]);
    assert_eq!(out.status.code(), Some(5));
    let err = stderr(&out);
    assert!(err.contains("missing column 'C_CONCEPTO'"));
    assert!(err.contains("hint:"));
}

#[test]
fn missing_file_exits_2() {
    let dir = TempDir::new().unwrap();
    let out = run(&[p("validate"), &dir.path().join("nope.csv")]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).starts_with("error: cannot read"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let out = run(&[p("reconcile")]);
    assert_eq!(out.status.code(), Some(2));
}
