// End-to-end tests for the unitcalc command line

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_gravitational_force_in_newtons() {
    cargo_bin_cmd!("unitcalc")
        .args(["32.2 ft/s^2", "5 lb", "x", "--unit=N"])
        .assert()
        .success()
        .stdout(predicate::str::contains("22.259").and(predicate::str::contains(" N")));
}

#[test]
fn test_plain_arithmetic() {
    cargo_bin_cmd!("unitcalc")
        .args(["2", "3", "+"])
        .assert()
        .success()
        .stdout("5\n");

    cargo_bin_cmd!("unitcalc")
        .args(["5", "3", "-"])
        .assert()
        .success()
        .stdout("2\n");

    cargo_bin_cmd!("unitcalc")
        .args(["5", "-3", "plus"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_results_are_comma_joined_top_first() {
    cargo_bin_cmd!("unitcalc")
        .args(["1", "2", "swap"])
        .assert()
        .success()
        .stdout("1, 2\n");

    cargo_bin_cmd!("unitcalc")
        .args(["1000 m", "60 s", "--unit=min,km"])
        .assert()
        .success()
        .stdout("1 min, 1 km\n");
}

#[test]
fn test_mismatch_reports_error() {
    cargo_bin_cmd!("unitcalc")
        .args(["1 m", "1 s", "+"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_exponent_overflow_reports_error() {
    cargo_bin_cmd!("unitcalc")
        .args(["1 m^2", "1073741824", "^"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exponent out of range"));
}

#[test]
fn test_unknown_token_and_underflow() {
    cargo_bin_cmd!("unitcalc")
        .args(["1", "bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown token: bogus"));

    cargo_bin_cmd!("unitcalc")
        .args(["1", "x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_list_prints_definitions() {
    cargo_bin_cmd!("unitcalc")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("N = kg*m/s^2"))
        .stdout(predicate::str::contains("degF = degR-459.67"));
}

#[test]
fn test_selftest_passes() {
    cargo_bin_cmd!("unitcalc")
        .arg("test")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS").and(predicate::str::contains("FAIL").not()));
}

#[test]
fn test_help_lists_operators() {
    cargo_bin_cmd!("unitcalc")
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stack ops"));
}

#[test]
fn test_json_output() {
    let output = cargo_bin_cmd!("unitcalc")
        .args(["1500 m", "--unit=km", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["value"], 1.5);
    assert_eq!(json[0]["unit"], "km");
    assert_eq!(json[0]["text"], "1.5 km");
}

#[test]
fn test_config_defines_units_and_defaults() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("unitcalc.toml");
    fs::write(
        &config_path,
        r#"
[units]
furlong = "660 ft"

[output]
units = ["m"]
"#,
    )
    .unwrap();

    cargo_bin_cmd!("unitcalc")
        .args(["1 furlong", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("201.168 m\n");

    // --unit overrides the configured default
    cargo_bin_cmd!("unitcalc")
        .args(["1 furlong", "--unit=ft", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("660 ft\n");
}

#[test]
fn test_missing_config_file() {
    cargo_bin_cmd!("unitcalc")
        .args(["1", "--config", "/nonexistent/unitcalc.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config"));
}
