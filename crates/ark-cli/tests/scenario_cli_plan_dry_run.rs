use std::fs;
use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

const BASE_YAML: &str = "\
init_balance: 40000
period: day
days_delay: 0
position_ratio: 1.0
universe: [A, B]
";

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ark_cli_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &PathBuf, file: &str, body: &str) -> String {
    let p = dir.join(file);
    fs::write(&p, body).unwrap();
    p.to_string_lossy().to_string()
}

fn plan_json(args: &[&str]) -> Value {
    let out = Command::cargo_bin("ark").unwrap().arg("plan").args(args).output().unwrap();
    assert!(
        out.status.success(),
        "plan failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

fn order_rows(doc: &Value) -> Vec<(String, String, i64)> {
    doc["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| {
            (
                o["symbol"].as_str().unwrap().to_string(),
                o["side"].as_str().unwrap().to_string(),
                o["size"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn cli_plan_tops_up_existing_holdings() {
    // GIVEN A is already held and both symbols trade
    let dir = scratch("topup");
    let cfg = write(&dir, "base.yaml", BASE_YAML);
    let prices = write(&dir, "prices.json", r#"{"A": 10.0, "B": 25.0}"#);
    let holdings = write(&dir, "holdings.json", r#"{"A": 1000}"#);

    // WHEN a plan is computed
    let doc = plan_json(&[
        "--config", &cfg, "--prices", &prices, "--holdings", &holdings, "--date", "20240102",
    ]);

    // THEN the whole 50k is split evenly and only the difference is ordered
    assert_eq!(doc["summary"]["market_value"].as_f64(), Some(10_000.0));
    assert_eq!(doc["summary"]["budget"].as_f64(), Some(50_000.0));
    assert_eq!(
        order_rows(&doc),
        vec![
            ("A".to_string(), "buy".to_string(), 1_500),
            ("B".to_string(), "buy".to_string(), 1_000),
        ]
    );
    assert_eq!(doc["task_id"].as_u64(), Some(202401020001));
    assert!(doc["config_hash"].as_str().unwrap().len() == 64);
}

#[test]
fn cli_plan_leaves_suspended_symbols_alone() {
    let dir = scratch("suspended");
    let cfg = write(&dir, "base.yaml", BASE_YAML);
    let prices = write(&dir, "prices.json", r#"{"A": 10.0, "B": null}"#);
    let holdings = write(&dir, "holdings.json", r#"{"A": 1000}"#);

    let doc = plan_json(&[
        "--config", &cfg, "--prices", &prices, "--holdings", &holdings, "--date", "20240102",
        "--suspended", "B",
    ]);

    assert_eq!(doc["weights"]["A"].as_f64(), Some(1.0));
    assert_eq!(doc["weights"]["B"].as_f64(), Some(0.0));
    assert_eq!(order_rows(&doc), vec![("A".to_string(), "buy".to_string(), 4_000)]);
}

#[test]
fn cli_plan_strict_keys_rejects_unread_config() {
    let dir = scratch("strict");
    let cfg = write(&dir, "base.yaml", BASE_YAML);
    let extra = write(&dir, "extra.yaml", "risk:\n  max_leverage: 2\n");
    let prices = write(&dir, "prices.json", r#"{"A": 10.0, "B": 25.0}"#);

    Command::cargo_bin("ark")
        .unwrap()
        .args([
            "plan", "--config", &cfg, "--config", &extra, "--prices", &prices, "--date",
            "20240102", "--strict-keys",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn cli_config_hash_is_stable_across_runs() {
    let dir = scratch("hash");
    let cfg = write(&dir, "base.yaml", BASE_YAML);

    let run = || {
        let out = Command::cargo_bin("ark")
            .unwrap()
            .args(["config-hash", &cfg])
            .output()
            .unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };
    let first = run();
    assert!(first.starts_with("config_hash="));
    assert_eq!(first, run());
}

#[test]
fn cli_schedule_picks_first_day_of_each_month() {
    let dir = scratch("schedule");
    let cfg = write(
        &dir,
        "base.yaml",
        &BASE_YAML.replace("period: day", "period: month"),
    );

    Command::cargo_bin("ark")
        .unwrap()
        .args([
            "schedule", "--config", &cfg, "20240102", "20240103", "20240201", "20240202",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[20240102,20240201]"));
}
