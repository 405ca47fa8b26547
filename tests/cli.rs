// Exercises the vss-lookup and vss-validate binaries end to end against the
// bundled sample catalog and temporary catalogs.
mod support;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::io::Write;
use std::process::{Command, Output, Stdio};
use support::{uuid, vehicle, write_catalog};

fn lookup() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vss-lookup"));
    cmd.env_remove("VSS_CATALOG").env_remove("RUST_LOG");
    cmd
}

fn validator() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vss-validate"));
    cmd.env_remove("VSS_CATALOG").env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, stdin: &str) -> Result<Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn helper")?;
    child
        .stdin
        .take()
        .context("stdin not piped")?
        .write_all(stdin.as_bytes())?;
    Ok(child.wait_with_output()?)
}

fn stdout_lines(output: &Output) -> Result<Vec<Value>> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("stdout line is not JSON"))
        .collect()
}

#[test]
fn lookup_prints_node_definition() -> Result<()> {
    let output = lookup().arg("Vehicle.Cabin.DoorCount").output()?;
    assert!(output.status.success(), "{output:?}");
    let node: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(node["path"], "Vehicle.Cabin.DoorCount");
    assert_eq!(node["type"], "attribute");
    assert_eq!(node["datatype"], "uint8");
    assert_eq!(node["default"], 4);
    assert!(node.get("children").is_none());
    Ok(())
}

#[test]
fn lookup_by_uuid_and_children() -> Result<()> {
    let output = lookup()
        .arg("--uuid")
        .arg("64D4F63F9593522A44CACCD547C4CF6A")
        .output()?;
    assert!(output.status.success(), "{output:?}");
    let node: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(node["path"], "Vehicle.Body.Lights.IsBrakeOn");

    let output = lookup()
        .arg("Vehicle.Body.Lights")
        .arg("--children")
        .output()?;
    assert!(output.status.success(), "{output:?}");
    let names: Vec<Value> = stdout_lines(&output)?
        .into_iter()
        .map(|child| child["name"].clone())
        .collect();
    assert_eq!(names, [json!("Beam"), json!("IsBrakeOn")]);

    let output = lookup().arg("Vehicle.Speed").arg("--children").output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("is not a branch"));
    Ok(())
}

#[test]
fn lookup_reports_unknown_paths_and_stats() -> Result<()> {
    let output = lookup().arg("Vehicle.Warp").output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown signal path 'Vehicle.Warp'"));

    let output = lookup().arg("--stats").output()?;
    assert!(output.status.success(), "{output:?}");
    let stats: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(stats["branches"], 32);
    assert_eq!(stats["deprecated"], 1);
    Ok(())
}

#[test]
fn lookup_honors_catalog_env_and_flag() -> Result<()> {
    let doc = vehicle(json!({
        "Speed": {"type": "sensor", "datatype": "double", "uuid": uuid(2)}
    }));
    let file = write_catalog(&doc)?;

    let output = lookup()
        .env("VSS_CATALOG", file.path())
        .arg("--leaves")
        .arg("Vehicle")
        .output()?;
    assert!(output.status.success(), "{output:?}");
    let leaves = stdout_lines(&output)?;
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0]["datatype"], "double");

    let output = lookup()
        .arg("--catalog")
        .arg("/nonexistent/catalog.json")
        .arg("Vehicle")
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading catalog"));
    Ok(())
}

#[test]
fn malformed_catalog_aborts_startup() -> Result<()> {
    let doc = vehicle(json!({
        "A": {"type": "sensor", "datatype": "boolean", "uuid": uuid(7)},
        "B": {"type": "sensor", "datatype": "boolean", "uuid": uuid(7)},
    }));
    let file = write_catalog(&doc)?;
    let output = validator()
        .arg("--catalog")
        .arg(file.path())
        .arg("--path")
        .arg("Vehicle.A")
        .arg("--value")
        .arg("true")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Vehicle.B"), "stderr: {stderr}");
    assert!(stderr.contains("already used by Vehicle.A"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn validate_single_value() -> Result<()> {
    let output = validator()
        .arg("--path")
        .arg("Vehicle.Speed")
        .arg("--value")
        .arg("123.4")
        .output()?;
    assert!(output.status.success(), "{output:?}");
    let records = stdout_lines(&output)?;
    assert_eq!(records[0]["value"], json!(123.4));

    let output = validator()
        .arg("--path")
        .arg("Vehicle.Speed")
        .arg("--value")
        .arg("fast")
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("expected float"));
    Ok(())
}

#[test]
fn validate_stream_reports_each_rejection() -> Result<()> {
    let input = [
        r#"{"path": "Vehicle.Cabin.Seat.Row1.Pos1.Position", "value": 1000}"#,
        r#"{"path": "Vehicle.Cabin.Seat.Row1.Pos1.Position", "value": 1001}"#,
        r#"{"uuid": "fb844e261dbb4b42fe75683720d646bc", "value": "88.5"}"#,
        r#"{"path": "Vehicle.Body.Windshield.Front.Wiping.Mode", "value": "off"}"#,
    ]
    .join("\n");
    let output = run_with_stdin(validator(), &input)?;
    assert!(!output.status.success());

    let records = stdout_lines(&output)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["value"], 1000);
    assert_eq!(records[1]["value"], json!(88.5));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sample 2"), "stderr: {stderr}");
    assert!(stderr.contains("sample 4"), "stderr: {stderr}");
    assert!(stderr.contains("2 of 4 sample(s) rejected"), "stderr: {stderr}");
    Ok(())
}
