use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn bin() -> Command {
    Command::cargo_bin("thermo_cli").expect("binary built")
}

// Minimal valid TOML config pointing at nothing real; sim mode ignores
// the serial section entirely.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[serial]
port = "/dev/ttyUSB0"
baud = 9600
read_timeout_ms = 100

[poll]
interval_ms = 10
error_budget = 10

[delivery]
interval_ms = 20

[buffer]
capacity = 1000

[setpoint]
min_c = -10.0
max_c = 50.0
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[test]
fn self_check_passes_in_sim_mode() {
    bin()
        .args(["--sim", "self-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check ok"));
}

#[test]
fn self_check_emits_json_status() {
    let out = bin()
        .args(["--sim", "--json", "self-check"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let line = String::from_utf8(out).unwrap();
    let obj: serde_json::Value = serde_json::from_str(line.lines().last().unwrap()).unwrap();
    assert_eq!(obj["status"], "ok");
}

#[test]
fn set_sends_directives_against_sim() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    bin()
        .args([
            "--sim",
            "--config",
            cfg.to_str().unwrap(),
            "set",
            "--setpoint",
            "25",
            "--output",
            "on",
            "--pid",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn set_without_directives_is_an_error() {
    bin()
        .args(["--sim", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to send"));
}

#[test]
fn watch_saves_a_session_snapshot() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let save = dir.path().join("session.json");
    bin()
        .args([
            "--sim",
            "--config",
            cfg.to_str().unwrap(),
            "watch",
            "--duration-s",
            "1",
            "--setpoint",
            "25",
            "--save",
            save.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("session complete"));

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&save).unwrap()).unwrap();
    let temps = record["temperature"].as_array().unwrap();
    let times = record["time"].as_array().unwrap();
    assert!(!temps.is_empty(), "a one-second sim session produces samples");
    assert_eq!(temps.len(), times.len());
    assert_eq!(record["metadata"]["samples"], times.len() as u64);
}

#[rstest]
#[case("[poll]\nerror_budget = 0\n", "error_budget")]
#[case("[buffer]\ncapacity = 0\n", "capacity")]
#[case("not toml at all ][", "parse config")]
fn invalid_configs_are_rejected(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();
    bin()
        .args(["--sim", "--config", path.to_str().unwrap(), "self-check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(needle));
}

#[cfg(all(feature = "serial", unix))]
#[test]
fn missing_port_fails_fast_with_exit_code_2() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "[serial]\nport = \"/dev/thermo-test-no-such-port\"\n").unwrap();
    bin()
        .args([
            "--config",
            path.to_str().unwrap(),
            "set",
            "--setpoint",
            "20",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("could not be opened"));
}

#[test]
fn help_names_every_subcommand() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("watch")
                .and(predicate::str::contains("set"))
                .and(predicate::str::contains("ports"))
                .and(predicate::str::contains("self-check")),
        );
}
