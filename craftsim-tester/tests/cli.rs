use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "craftsim-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_dump_config_writes_flat_json() {
    let exe = env!("CARGO_BIN_EXE_craftsim-tester");
    let output_path = temp_path("dump");
    let status = Command::new(exe)
        .args(["--dump-config", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(value["use_reflect_opener"], false);
    assert_eq!(value["mume_min_steps_for_manip"], 2);
}

#[test]
fn cli_json_report_covers_explicit_seeds() {
    let exe = env!("CARGO_BIN_EXE_craftsim-tester");
    let output = Command::new(exe)
        .args(["--preset", "basic", "--seeds", "1,2,3", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json on stdout");
    assert_eq!(value["recipe"], "basic");
    let records = value["summary"]["records"].as_array().expect("records");
    let seeds: Vec<u64> = records
        .iter()
        .map(|record| record["seed"].as_u64().expect("seed"))
        .collect();
    assert_eq!(seeds, vec![1, 2, 3]);
}

#[test]
fn cli_markdown_report_to_file() {
    let exe = env!("CARGO_BIN_EXE_craftsim-tester");
    let output_path = temp_path("markdown");
    let status = Command::new(exe)
        .args(["--attempts", "5", "--report", "markdown", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("# Craftsim Batch Results"));
    assert!(content.contains("| Status | Count | Share |"));
}

#[test]
fn cli_trace_prints_steps() {
    let exe = env!("CARGO_BIN_EXE_craftsim-tester");
    let output = Command::new(exe)
        .args(["--trace", "--seeds", "42"])
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Trace for seed 42"));
    assert!(stdout.contains("[opener]"));
}

#[test]
fn cli_rejects_broken_solver_config() {
    let exe = env!("CARGO_BIN_EXE_craftsim-tester");
    let config_path = temp_path("bad-config");
    std::fs::write(&config_path, r#"{"not_a_setting": true}"#).expect("write config");
    let output = Command::new(exe)
        .args(["--attempts", "1", "--solver-config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not_a_setting"));
}
