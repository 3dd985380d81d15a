// Copyright 2026 Glimpse Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use jsonschema::JSONSchema;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const RECORDS: &str = concat!(
    r#"{"name": "login", "ocr_text": "Login button click here", "visual_description": "A form with a blue button at the top", "created_at": "2024-01-01T09:00:00Z"}"#,
    "\n",
    r#"{"name": "invoice", "ocr_text": "Quarterly invoice total due 1042 USD", "visual_description": "A table with rows of numbers", "created_at": "2024-03-01T09:00:00Z"}"#,
    "\n",
    r#"{"name": "weather", "ocr_text": "Weather forecast for today", "visual_description": "A sunny icon in the center", "created_at": "2024-02-01T09:00:00Z", "evaluation": {"confidence_score": 0.8}}"#,
    "\n",
);

fn glimpse_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("glimpse"))
}

fn glimpse_cmd_with_env(config_root: &Path) -> Command {
    let mut cmd = glimpse_cmd();
    cmd.env("XDG_CONFIG_HOME", config_root);
    cmd.env("HOME", config_root);
    cmd.env("APPDATA", config_root);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn global_config_path(config_root: &Path) -> PathBuf {
    let base = if cfg!(target_os = "macos") {
        config_root.join("Library").join("Application Support")
    } else {
        config_root.to_path_buf()
    };
    base.join("glimpse").join("glimpse.toml")
}

fn write_global_config(config_root: &Path, body: &str) {
    let path = global_config_path(config_root);
    fs::create_dir_all(path.parent().expect("config parent")).expect("config dir");
    fs::write(path, body).expect("write config");
}

fn load_schema() -> JSONSchema {
    let schema_text = include_str!("../schemas/response.schema.json");
    let schema_json: Value = serde_json::from_str(schema_text).expect("schema json");
    JSONSchema::options()
        .compile(&schema_json)
        .expect("compile schema")
}

fn run_json(cmd: &mut Command, cwd: &Path) -> Value {
    let output = cmd.current_dir(cwd).output().expect("run command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("parse json")
}

fn assert_schema(schema: &JSONSchema, value: &Value) {
    if let Err(errors) = schema.validate(value) {
        let msgs: Vec<String> = errors.map(|e| e.to_string()).collect();
        panic!("schema validation failed:\n{}", msgs.join("\n"));
    }
}

fn names(value: &Value) -> Vec<String> {
    value
        .get("results")
        .and_then(|v| v.as_array())
        .expect("results array")
        .iter()
        .filter_map(|item| item.get("name"))
        .filter_map(|name| name.as_str())
        .map(str::to_string)
        .collect()
}

fn seed(root: &Path) {
    fs::create_dir_all(root.join("records")).expect("records dir");
    fs::write(root.join("records/shots.jsonl"), RECORDS).expect("write records");
}

#[test]
fn search_outputs() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    seed(root);

    // lexical
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "login", "--input", "records", "--lexical", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(json["ok"], true);
    assert_eq!(json["query"]["backend"], "lexical");
    assert_eq!(names(&json), vec!["login"]);
    assert_eq!(json["results"][0]["match_type"], "text");
    assert!(json["results"][0].get("signals").is_none());
    assert_eq!(json["stats"]["doc_count"], 3);

    // semantic with explain
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args([
        "search",
        "invoice total",
        "--input",
        "records/shots.jsonl",
        "--json",
        "--explain",
    ]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(json["query"]["backend"], "semantic");
    assert_eq!(names(&json)[0], "invoice");
    assert!(json["results"][0]["signals"]["semantic"].is_number());
    assert_eq!(json["results"][0]["signals"]["text"], 1.0);

    // empty query lists everything newest first, precomputed confidence wins
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "", "--input", "records", "--lexical", "--k", "1", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(names(&json), vec!["invoice", "weather", "login"]);
    assert_eq!(json["results"][1]["confidence_score"], 0.8);

    // text output
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "login", "--input", "records", "--lexical", "--explain"]);
    cmd.current_dir(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("exact=1.000"));
}

#[test]
fn config_selects_backend() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    seed(root);

    write_global_config(config_root, "embedding = \"none\"\n");
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "weather", "--input", "records", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(json["query"]["backend"], "lexical");
    assert!(json.get("warnings").is_none());

    write_global_config(config_root, "embedding = \"bert\"\n");
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "weather", "--input", "records", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(json["query"]["backend"], "lexical");
    let warnings = json["warnings"].as_array().expect("warnings");
    assert!(
        warnings
            .iter()
            .any(|w| w.as_str().unwrap_or_default().contains("embedder unavailable"))
    );

    let explicit = root.join("custom.toml");
    fs::write(&explicit, "default_k = 1\n").expect("write config");
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["--config", explicit.to_string_lossy().as_ref()]);
    cmd.args(["search", "", "--input", "records", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_eq!(json["query"]["k"], 1);
    assert_eq!(json["query"]["backend"], "semantic");
}

#[test]
fn ingest_reports_quality_and_strategy() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    seed(root);

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args([
        "ingest",
        "records/shots.jsonl",
        "records/shots.jsonl",
        "--strategy",
        "ocr_and_visual@2.0",
        "--json",
    ]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);

    let replaced: Vec<bool> = json["results"]
        .as_array()
        .expect("results")
        .iter()
        .filter_map(|r| r["replaced"].as_bool())
        .collect();
    assert_eq!(replaced, vec![false, false, false, true, true, true]);
    assert_eq!(json["results"][2]["quality_level"], Value::Null);
    assert_eq!(json["performance"]["version"], "ocr_and_visual@2.0");
    assert_eq!(json["performance"]["total_uses"], 4);
    assert_eq!(json["performance"]["trend"], "stable");
    assert_eq!(json["stats"]["files"], 2);
    assert_eq!(json["stats"]["doc_count"], 3);

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["ingest", "records", "--ignore", "**/shots.jsonl"]);
    cmd.current_dir(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 0 docs from 0 files"))
        .stdout(predicate::str::contains("trend=no_data"));
}

#[test]
fn evaluate_outputs() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["evaluate", "--ocr", "", "--visual", "Red", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    let confidence = json["evaluation"]["confidence_score"]
        .as_f64()
        .expect("confidence");
    assert!(confidence < 0.5);
    assert_eq!(json["evaluation"]["quality_level"], "Poor");
    assert_eq!(json["actions"].as_array().map(Vec::len), Some(4));

    let visual = root.join("visual.txt");
    fs::write(
        &visual,
        "A blue submit button at the top right next to a search icon in the header. \
         A left sidebar panel with navigation, a grid of rounded cards in the center, \
         white text on a dark modern background with a subtle shadow.",
    )
    .expect("write visual");
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["evaluate", "--ocr", "Click Submit to save your ACME order 1042"]);
    cmd.args(["--visual-file", visual.to_string_lossy().as_ref()]);
    cmd.current_dir(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality:"))
        .stdout(predicate::str::contains("Visual Element Coverage"));

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["evaluate", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(json["ok"], false);
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("nothing to evaluate")
    );
    assert_eq!(
        json["error"]["hint"],
        "pass --ocr/--ocr-file or --visual/--visual-file"
    );
}

#[test]
fn trend_outputs() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();

    let mut lines = String::new();
    for score in [10, 10, 10, 10, 10, 20, 20, 20, 20, 20] {
        lines.push_str(&format!("{{\"strategy\": \"v1\", \"score\": {score}}}\n"));
    }
    lines.push_str("{\"strategy\": \"v2\", \"score\": 0.4, \"metadata\": {\"name\": \"a.png\"}}\n");
    lines.push_str("not json\n");
    fs::write(root.join("scores.jsonl"), lines).expect("write scores");

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["trend", "scores.jsonl", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    let summaries = json["performance"].as_array().expect("summaries");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["version"], "v1");
    assert_eq!(summaries[0]["trend"], "improving");
    assert_eq!(summaries[0]["average_score"], 15.0);
    assert_eq!(summaries[1]["trend"], "stable");
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(1));

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["trend", "scores.jsonl", "--strategy", "v9", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_eq!(json["performance"][0]["trend"], "no_data");
}

#[test]
fn rubric_and_completions() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["rubric", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    let results = json["results"].as_array().expect("results");
    assert_eq!(results.len(), 6);
    let total: f64 = results.iter().filter_map(|r| r["weight"].as_f64()).sum();
    assert!((total - 1.0).abs() < 1e-9);

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.arg("rubric");
    cmd.current_dir(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Color and Style Recognition 0.15"));

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["completions", "bash"]);
    cmd.current_dir(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("glimpse"));
}

#[test]
fn errors_follow_output_mode() {
    let schema = load_schema();
    let config_temp = TempDir::new().expect("config tempdir");
    let config_root = config_temp.path();
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "x", "--input", "missing.jsonl", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_schema(&schema, &json);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "error");
    assert_eq!(json["error"]["hint"], "check --input paths and the config file");

    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["search", "x", "--input", "missing.jsonl"]);
    cmd.current_dir(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input not found"));

    let bad_config = root.join("bad.toml");
    fs::write(&bad_config, "default_k = \"many\"\n").expect("write config");
    let mut cmd = glimpse_cmd_with_env(config_root);
    cmd.args(["--config", bad_config.to_string_lossy().as_ref()]);
    cmd.args(["ingest", "missing.jsonl", "--json"]);
    let json = run_json(&mut cmd, root);
    assert_eq!(json["ok"], false);
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("parse glimpse.toml")
    );
    assert!(
        json["error"]["hint"]
            .as_str()
            .unwrap_or_default()
            .starts_with("check record paths")
    );
}
