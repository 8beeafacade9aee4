#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const SCRIPT: &str = r#"{
    "elements": [
        {
            "id": "v1",
            "kind": "vertex",
            "timestamp": 1,
            "mutations": [
                { "op": "add_property_value", "key": "k", "name": "n", "value": { "int": 5 }, "timestamp": 1 },
                { "op": "add_property_value", "key": "k", "name": "n", "value": { "int": 7 }, "timestamp": 2 },
                { "op": "add_property_value", "key": "k", "name": "secret", "value": { "str": "s" },
                  "visibility": "ops", "timestamp": 2 },
                { "op": "soft_delete_property", "key": "k", "name": "n", "timestamp": 3 },
                { "op": "mark_hidden", "visibility": "ops", "timestamp": 4 }
            ]
        }
    ]
}"#;

fn setup_script() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("script.json");
    fs::write(&path, SCRIPT).expect("write script");
    (dir, path)
}

fn json_output(args: &[&str], script: &PathBuf) -> Value {
    let output = cargo_bin_cmd!("strata-inspect")
        .args(["--format", "json"])
        .args(args)
        .arg(script)
        .arg("v1")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn properties_point_in_time_json() {
    let (_dir, script) = setup_script();
    let json = json_output(&["properties", "--at", "2"], &script);
    let props = json.as_array().expect("array");
    assert_eq!(props.len(), 1);
    assert_eq!(props[0]["name"], "n");
    assert_eq!(props[0]["value"]["int"], 7);

    let now = json_output(&["properties"], &script);
    assert_eq!(now.as_array().map(Vec::len), Some(0));
}

#[test]
fn properties_respect_authorizations() {
    let (_dir, script) = setup_script();
    let json = json_output(&["properties", "--auth", "ops"], &script);
    let names: Vec<_> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_owned())
        .collect();
    assert_eq!(names, vec!["secret"]);
}

#[test]
fn history_is_newest_first() {
    let (_dir, script) = setup_script();
    let json = json_output(&["history", "--name", "n"], &script);
    let entries = json.as_array().expect("array");
    let stamps: Vec<_> = entries.iter().map(|e| e["timestamp"].as_i64()).collect();
    assert_eq!(stamps, vec![Some(3), Some(2), Some(1)]);
    assert_eq!(entries[0]["is_deleted"], true);
}

#[test]
fn status_reports_hidden_for_authorized_reader() {
    let (_dir, script) = setup_script();
    let json = json_output(&["status", "--all-auths"], &script);
    assert_eq!(json["deleted"], false);
    assert_eq!(json["hidden"], true);
    assert_eq!(json["hidden_visibilities"][0], "ops");
}

#[test]
fn manual_clock_config_is_applied() {
    let (dir, script) = setup_script();
    let config = dir.path().join("strata.toml");
    fs::write(&config, "clock = \"manual\"\nmanual_clock_start = 42\n").expect("write config");
    let raw = r#"{ "elements": [ { "id": "v1", "kind": "vertex" } ] }"#;
    fs::write(&script, raw).expect("rewrite script");

    let output = cargo_bin_cmd!("strata-inspect")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "status"])
        .arg(&script)
        .arg("v1")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["first_timestamp"], 42);
}

#[test]
fn text_output_and_missing_element() {
    let (_dir, script) = setup_script();
    let output = cargo_bin_cmd!("strata-inspect")
        .args(["properties"])
        .arg(&script)
        .arg("v1")
        .args(["--at", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("k:n [-] = 7 @2"), "unexpected output: {text}");

    cargo_bin_cmd!("strata-inspect")
        .args(["status"])
        .arg(&script)
        .arg("nope")
        .assert()
        .failure();
}
