use assert_cmd::Command;
use chrono::{Duration, NaiveDate};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CATALOG: &str = "name,description,ticker
Fund A,Large caps,AAA
Fund B,Short history,BBB
Fund C,No price file,CCC
Fund D,Bonds,DDD
Fund E,Gold,EEE
Fund F,Silver,FFF
";

fn write_prices(dir: &Path, ticker: &str, rows: usize, start: f64, step: f64) {
    let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for i in 0..rows {
        let date = first + Duration::days(i as i64);
        let close = start + step * i as f64;
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            date.format("%Y-%m-%d"),
            close,
            close + 1.0,
            close - 1.0,
            close,
            1000 + i
        ));
    }
    fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}

/// Temp workspace with a catalog, a price directory and no user config
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("catalog.csv"), CATALOG).unwrap();

    let prices = temp.path().join("prices");
    fs::create_dir(&prices).unwrap();
    write_prices(&prices, "AAA", 300, 100.0, 0.5);
    write_prices(&prices, "BBB", 10, 100.0, 1.0);
    write_prices(&prices, "DDD", 260, 50.0, 0.1);

    temp
}

fn dashboard(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("etf_dashboard").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env_remove("RUST_LOG")
        .arg("--catalog")
        .arg(temp.path().join("catalog.csv"))
        .arg("-d")
        .arg(temp.path().join("prices"))
        .arg("-p")
        .arg("10y");
    cmd
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("etf_dashboard").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("etf_dashboard").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_no_selection() {
    let temp = workspace();
    dashboard(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("No ETFs selected"));
}

#[test]
fn test_builtin_catalog_listing() {
    let temp = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("etf_dashboard").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .arg("-f")
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("SPDR S&P 500 ETF Trust"))
        .stdout(predicate::str::contains("QQQ"));
}

#[test]
fn test_more_than_five_etfs_rejected() {
    let temp = workspace();
    let mut cmd = dashboard(&temp);
    for name in ["Fund A", "Fund B", "Fund C", "Fund D", "Fund E", "Fund F"] {
        cmd.arg("-e").arg(name);
    }
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("At most 5 ETFs"));
}

#[test]
fn test_negative_investment_rejected() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund A", "--investment=-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_details_function() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund A", "-e", "Fund C", "-f", "details"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ticker:      AAA"))
        .stdout(predicate::str::contains("No price file"));
}

#[test]
fn test_stats_skip_etfs_without_data() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund A", "-e", "Fund C", "-e", "Fund B", "-f", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Statistical Analysis"))
        .stdout(predicate::str::contains("Fund A"))
        .stdout(predicate::str::contains("Fund B"))
        .stdout(predicate::str::contains("Fund C").not());
}

#[test]
fn test_unknown_etf_is_skipped_with_warning() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Nonexistent Fund", "-e", "Fund A", "-f", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fund A"))
        .stderr(predicate::str::contains("not in catalog"));
}

#[test]
fn test_returns_function_projects_investment() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund A", "-e", "Fund B", "-a", "1000", "-f", "returns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Returns on $1,000.00"))
        .stdout(predicate::str::contains("NaN"));
}

#[test]
fn test_returns_function_without_investment() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund A", "-f", "returns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--investment"));
}

#[test]
fn test_top_function_orders_by_annual_return() {
    let temp = workspace();
    let output = dashboard(&temp)
        .args(["-e", "Fund D", "-e", "Fund B", "-e", "Fund A", "-f", "top"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top 10 ETFs by Annual Return"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let a = text.find("Fund A").unwrap();
    let d = text.find("Fund D").unwrap();
    let b = text.find("Fund B").unwrap();
    // A gains 0.5 a day from 100, D only 0.1 from 50; B is too short for an annual return
    assert!(a < d);
    assert!(d < b);
}

#[test]
fn test_export_function_csv() {
    let temp = workspace();
    let output_path = temp.path().join("export.csv");

    dashboard(&temp)
        .args(["-e", "Fund A", "-e", "Fund C", "-e", "Fund B", "-f", "export", "-o"])
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 310 rows to:"));

    let content = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Date,Open,High,Low,Close,Volume,ETF");
    assert_eq!(lines.len(), 1 + 300 + 10);
    assert!(lines[1..301].iter().all(|l| l.ends_with(",Fund A")));
    assert!(lines[301..].iter().all(|l| l.ends_with(",Fund B")));
    assert!(lines[1].starts_with("2020-01-01,"));
}

#[test]
fn test_export_default_file_name() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund B", "-f", "export"])
        .assert()
        .success();

    assert!(temp.path().join("Datos_Etfs.csv").exists());
}

#[test]
fn test_export_does_not_overwrite_without_force() {
    let temp = workspace();
    let output_path = temp.path().join("export.csv");
    fs::write(&output_path, "keep me").unwrap();

    dashboard(&temp)
        .args(["-e", "Fund B", "-f", "export", "-o"])
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists, use --force"));
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "keep me");

    dashboard(&temp)
        .args(["-e", "Fund B", "-f", "export", "--force", "-o"])
        .arg(&output_path)
        .assert()
        .success();
    assert!(fs::read_to_string(&output_path).unwrap().starts_with("Date,"));
}

#[test]
fn test_repeated_etf_is_exported_once() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund B", "-e", "Fund B", "-f", "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 10 rows to:"));
}

#[test]
fn test_export_function_parquet() {
    let temp = workspace();
    let output_path = temp.path().join("export.parquet");

    dashboard(&temp)
        .args(["-e", "Fund A", "-f", "export", "-o"])
        .arg(&output_path)
        .assert()
        .success();

    assert!(output_path.exists());
}

#[test]
fn test_export_with_no_data() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund C", "-f", "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No price data to export."));
    assert!(!temp.path().join("Datos_Etfs.csv").exists());
}

#[test]
fn test_all_function_renders_every_section() {
    let temp = workspace();
    dashboard(&temp)
        .args(["-e", "Fund A", "-a", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected ETF Details"))
        .stdout(predicate::str::contains("Price History"))
        .stdout(predicate::str::contains("Statistical Analysis"))
        .stdout(predicate::str::contains("Returns on $500.00"))
        .stdout(predicate::str::contains("Top 10 ETFs by Annual Return"));
    assert!(!temp.path().join("Datos_Etfs.csv").exists());
}

#[test]
fn test_config_file_supplies_selection() {
    let temp = workspace();
    let config_path = temp.path().join("dashboard.toml");
    fs::write(
        &config_path,
        "etfs = [\"Fund D\"]\nfunction = \"stats\"\nperiod = \"1y\"\n",
    ).unwrap();

    let mut cmd = Command::cargo_bin("etf_dashboard").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env_remove("RUST_LOG")
        .arg("-c")
        .arg(&config_path)
        .arg("--catalog")
        .arg(temp.path().join("catalog.csv"))
        .arg("-d")
        .arg(temp.path().join("prices"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Period: 1y"))
        .stdout(predicate::str::contains("Statistical Analysis"))
        .stdout(predicate::str::contains("Fund D"));
}

#[test]
fn test_missing_data_dir_fails() {
    let temp = workspace();
    let mut cmd = Command::cargo_bin("etf_dashboard").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .args(["-e", "Fund A", "-d", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Data directory does not exist"));
}
