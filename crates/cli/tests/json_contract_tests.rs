// Integration tests enforcing the --json stdout contract and exit codes.
//
// stdout from --json commands must be exactly one JSON value; human
// summaries go to stderr.
//
// Run with: cargo test -p census-cli --test json_contract_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn census() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_census"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env("RUST_LOG", "off");
    cmd.env_remove("CENSUS_REPORT_URL");
    cmd
}

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures().join(name).to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    census().args(args).output().expect("run census")
}

/// Assert stdout is a single, parseable JSON value.
fn assert_single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty\nstderr: {}",
        String::from_utf8_lossy(&output.stderr));

    serde_json::from_str(trimmed).unwrap_or_else(|e| panic!(
        "stdout must be valid JSON.\nParse error: {}\nstdout:\n{}",
        e, trimmed
    ))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

// ===========================================================================
// census merge
// ===========================================================================

#[test]
fn merge_json_unions_rosters() {
    let output = run(&["merge", &fixture("resource.csv"), &fixture("manager.csv"), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output);
    let columns: Vec<&str> = val["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(
        columns,
        vec!["Employee ID", "Name", "Title", "Manager", "email", "Department", "Site"]
    );

    let rows = val["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 7);
    // Numeric ids stay numeric; later roster wins per field
    assert_eq!(rows[0]["Employee ID"], serde_json::json!(1001));
    assert_eq!(rows[0]["Title"], "Senior Analyst");
    // Column order of the object follows the record
    let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "Employee ID");
}

#[test]
fn merge_fill_missing_keeps_primary() {
    let output = run(&[
        "merge",
        &fixture("resource.csv"),
        &fixture("manager.csv"),
        "--policy",
        "fill-missing",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output);
    let rows = val["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["Title"], "Analyst");
    assert_eq!(rows[0]["Department"], "Finance");
}

#[test]
fn merge_refuses_empty_roster() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write(dir.path(), "empty.csv", "Employee ID,Name\n");

    let output = run(&["merge", &fixture("resource.csv"), &empty, "--json"]);
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("missing input"), "{}", stderr(&output));

    // Allowed when fewer sources are required
    let output = run(&["merge", &fixture("resource.csv"), &empty, "--min-sources", "1", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn merge_writes_xlsx_that_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("combined.xlsx");
    let out_str = out.to_string_lossy().into_owned();

    let output = run(&["merge", &fixture("resource.csv"), &fixture("manager.csv"), "-o", &out_str]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.exists());

    let output = run(&["merge", &out_str, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    assert_eq!(val["rows"].as_array().unwrap().len(), 7);
    assert_eq!(val["rows"][1]["Department"], "Engineering");
}

#[test]
fn unsupported_file_type_is_usage_error() {
    let output = run(&["merge", "roster.pdf"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unsupported file type"));
}

#[test]
fn missing_file_is_io_error() {
    let output = run(&["merge", "does-not-exist.csv"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("does-not-exist.csv"));
}

// ===========================================================================
// census diff
// ===========================================================================

#[test]
fn diff_json_reports_differences_and_exits_1() {
    let output = run(&[
        "diff",
        "--current",
        &fixture("census.csv"),
        "--reference",
        &fixture("resource.csv"),
        &fixture("manager.csv"),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output);
    assert_eq!(val["current_rows"], 4);
    assert_eq!(val["matched"], 3);
    assert_eq!(val["unmatched"], 1);
    assert_eq!(val["field_differences"], 5);

    let diffs = val["differences"].as_array().unwrap();
    assert_eq!(diffs.len(), 3);
    assert_eq!(diffs[1]["employee_id"], "1002");
    assert_eq!(diffs[1]["differences"][0]["field"], "Department");
    assert_eq!(diffs[1]["differences"][0]["current_value"], "Platform");
    assert_eq!(diffs[1]["differences"][0]["combined_value"], "Engineering");
    // Hours is not in the reference rosters
    assert_eq!(diffs[1]["differences"][1]["combined_value"], serde_json::Value::Null);
}

#[test]
fn diff_without_differences_exits_0() {
    let output = run(&[
        "diff",
        "--current",
        &fixture("resource.csv"),
        "--reference",
        &fixture("resource.csv"),
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    assert_eq!(val["differences"].as_array().unwrap().len(), 0);
    // The id-less row never matches
    assert_eq!(val["unmatched"], 1);
}

#[test]
fn diff_policy_selects_combined_view() {
    let dir = tempfile::tempdir().unwrap();
    let resource = write(dir.path(), "resource.csv", "Employee ID,Title\n1,Analyst\n");
    let manager = write(
        dir.path(),
        "manager.csv",
        "Employee ID,Title,Site\n1,Lead,North\n2,Clerk,South\n",
    );
    let current = write(
        dir.path(),
        "census.csv",
        "Employee ID,Title,Site\n1,Analyst,North\n2,Clerk,South\n",
    );

    // Overlay: the manager roster's Title wins
    let output = run(&["diff", "--current", &current, "--reference", &resource, &manager, "--json"]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    assert_eq!(val["matched"], 2);
    assert_eq!(val["differences"][0]["differences"][0]["field"], "Title");
    assert_eq!(val["differences"][0]["differences"][0]["combined_value"], "Lead");

    // Fill-missing: resource values stand, manager-only employees drop out
    let output = run(&[
        "diff", "--current", &current, "--reference", &resource, &manager,
        "--policy", "fill-missing", "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    assert_eq!(val["matched"], 1);
    assert_eq!(val["unmatched"], 1);
    assert_eq!(val["differences"].as_array().unwrap().len(), 0);
}

#[test]
fn diff_human_table_on_stdout() {
    let output = run(&[
        "diff",
        "--current",
        &fixture("census.csv"),
        "--reference",
        &fixture("resource.csv"),
        &fixture("manager.csv"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Employee ID"), "{stdout}");
    assert!(stdout.contains("Platform"));
    assert!(stderr(&output).contains("3 with differences"));
}

// ===========================================================================
// census compose
// ===========================================================================

#[test]
fn compose_json_one_draft_per_manager() {
    let output = run(&[
        "compose",
        "--current",
        &fixture("census.csv"),
        "--reference",
        &fixture("resource.csv"),
        &fixture("manager.csv"),
        "--report-url",
        "https://reports.example.com/w42",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output);
    let drafts = val.as_array().unwrap();
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0]["to_name"], "Jenny");
    assert_eq!(drafts[0]["employee_ids"], serde_json::json!(["1001", "1002"]));
    assert_eq!(
        drafts[0]["subject"],
        "Report for Discrepancies in Employee Data - Manager: Jenny"
    );
    assert!(drafts[0]["body"].as_str().unwrap().contains("https://reports.example.com/w42"));
    assert_eq!(drafts[1]["to_name"], "A1");
}

#[test]
fn compose_policy_changes_drafts() {
    let dir = tempfile::tempdir().unwrap();
    let resource = write(
        dir.path(),
        "resource.csv",
        "Employee ID,Name,Title,Manager,email\n1,Ann,Analyst,Jane,jane@example.com\n",
    );
    let manager = write(dir.path(), "manager.csv", "Employee ID,Title\n1,Lead\n");
    let current = write(dir.path(), "census.csv", "Employee ID,Title\n1,Analyst\n");

    let output = run(&["compose", "--current", &current, "--reference", &resource, &manager, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let drafts = assert_single_json(&output);
    assert_eq!(drafts.as_array().unwrap().len(), 1);
    assert_eq!(drafts[0]["to_name"], "Jane");

    let output = run(&[
        "compose", "--current", &current, "--reference", &resource, &manager,
        "--policy", "fill-missing", "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(assert_single_json(&output).as_array().unwrap().len(), 0);
}

#[test]
fn compose_writes_draft_files() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("drafts");

    let output = run(&[
        "compose",
        "--current",
        &fixture("census.csv"),
        "--reference",
        &fixture("resource.csv"),
        &fixture("manager.csv"),
        "--out-dir",
        &out_dir.to_string_lossy(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let jenny = std::fs::read_to_string(out_dir.join("01-jenny.html")).unwrap();
    assert!(jenny.contains("Bob Ortiz"));
    assert!(out_dir.join("02-a1.html").exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Jenny <jenny@example.com>"));
}

// ===========================================================================
// census grant
// ===========================================================================

#[test]
fn grant_json_lists_managed_employees() {
    let output = run(&[
        "grant",
        "--directory",
        &fixture("resource.csv"),
        "--email",
        "jenny.manager@example.com",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output);
    assert_eq!(val["manager_name"], "Jenny");
    assert_eq!(val["manager_email"], "jenny.manager@example.com");
    assert_eq!(val["employee_ids"], serde_json::json!(["1001", "1002"]));
}

#[test]
fn grant_refused_exits_6() {
    let output = run(&[
        "grant",
        "--directory",
        &fixture("resource.csv"),
        "--email",
        "JENNY.MANAGER@example.com",
    ]);
    assert_eq!(output.status.code(), Some(6));
    let err = stderr(&output);
    assert!(err.contains("manager not found"), "{err}");
    assert!(err.contains("hint:"), "{err}");

    let output = run(&["grant", "--directory", &fixture("resource.csv"), "--email", "kandy@example.com"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("no employees found under manager 'Cid Park'"));
}

// ===========================================================================
// census recon
// ===========================================================================

#[test]
fn recon_run_json_contract() {
    let output = run(&["recon", "run", &fixture("census.recon.toml"), "--json"]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output);
    for key in ["meta", "summary", "merged", "differences", "groups", "drafts"] {
        assert!(val.get(key).is_some(), "missing key '{key}'");
    }
    assert_eq!(val["meta"]["config_name"], "South region weekly census");
    assert_eq!(val["summary"]["records_with_differences"], 3);
    assert_eq!(val["summary"]["authorities"], 2);
    assert_eq!(val["groups"][1]["owner_name"], "A1");
    assert!(stderr(&output).contains("3 with differences"));
}

#[test]
fn recon_run_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result.json");

    let output = run(&[
        "recon",
        "run",
        &fixture("census.recon.toml"),
        "--output",
        &out.to_string_lossy(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let val: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(val["drafts"].as_array().unwrap().len(), 2);
}

#[test]
fn recon_validate_accepts_fixture() {
    let output = run(&["recon", "validate", &fixture("census.recon.toml")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("valid: 'South region weekly census' with 2 reference source(s)"));
}

#[test]
fn recon_invalid_config_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "bad.recon.toml",
        "name = \"No current\"\n\n[[sources]]\nname = \"a\"\nrole = \"reference\"\nfile = \"a.csv\"\n",
    );

    let output = run(&["recon", "validate", &config]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("config validation error"));

    let garbage = write(dir.path(), "garbage.recon.toml", "name = [");
    let output = run(&["recon", "run", &garbage]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn recon_missing_source_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "weekly.recon.toml",
        "name = \"Weekly\"\n\n\
         [[sources]]\nname = \"resource\"\nrole = \"reference\"\nfile = \"resource.csv\"\n\n\
         [[sources]]\nname = \"census\"\nrole = \"current\"\nfile = \"census.csv\"\n",
    );

    let output = run(&["recon", "run", &config]);
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("resource.csv"));
}
