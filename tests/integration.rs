use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn oreg_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("oreg");
    path
}

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let records = root.join("records");
    fs::create_dir_all(records.join("2024")).unwrap();
    fs::write(
        records.join("alpha.json"),
        r#"{
            "companyDetails": {
                "orgNo": "C1001", "orgFileNo": "F1001", "orgName": "Island Bank Ltd",
                "categoryDesc": "DOMESTIC", "orgLastStaCd": "Live", "orgNatureCd": "PRIVATE",
                "orgIncorpDate": "12/03/2001", "companyAddress": "Port Louis"
            },
            "officeBearers": [
                {"name": "Director Marie Curie", "country": "France", "position": "DIRECTOR"},
                {"name": "Raj Patel", "country": "Mauritius", "position": "DIRECTOR"}
            ]
        }"#,
    )
    .unwrap();
    fs::write(
        records.join("2024").join("beta.json"),
        r#"{
            "companyDetails": {
                "orgNo": 2002, "orgName": "Lagoon Holdings",
                "categoryDesc": "GLOBAL BUSINESS", "orgLastStaCd": "DEFUNCT",
                "orgIncorpDate": "05/07/2015"
            },
            "officeBearers": null
        }"#,
    )
    .unwrap();
    fs::write(records.join("broken.json"), "{ not json").unwrap();
    fs::write(records.join("readme.txt"), "ignored").unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/registry.sqlite"

[import]
include_globs = ["**/*.json"]

[search]
row_limit = 300
"#,
        root.display()
    );

    let config_path = config_dir.join("oreg.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, records)
}

fn run_oreg(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = oreg_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run oreg binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn import_records(config_path: &Path, records: &Path) -> String {
    let (stdout, stderr, success) =
        run_oreg(config_path, &["import", records.to_str().unwrap(), "--progress", "off"]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    stdout
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path, _) = setup_test_env();

    let (stdout, stderr, success) = run_oreg(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path, _) = setup_test_env();

    let (_, _, success1) = run_oreg(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_oreg(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_reports_summary() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    let stdout = import_records(&config_path, &records);
    assert!(stdout.contains("organizations inserted: 2"), "{}", stdout);
    assert!(stdout.contains("bearers inserted: 2"), "{}", stdout);
    assert!(stdout.contains("files skipped: 1"), "{}", stdout);
    assert!(stdout.contains("broken.json"), "{}", stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn test_import_idempotent() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    import_records(&config_path, &records);
    let stdout = import_records(&config_path, &records);
    assert!(stdout.contains("organizations inserted: 0"), "{}", stdout);
    assert!(stdout.contains("bearers inserted: 0"), "{}", stdout);
    assert!(stdout.contains("files skipped: 3"), "{}", stdout);
}

#[test]
fn test_import_without_init_fails() {
    let (_tmp, config_path, records) = setup_test_env();

    let (_, stderr, success) = run_oreg(
        &config_path,
        &["import", records.to_str().unwrap(), "--progress", "off"],
    );
    assert!(!success, "import should fail before init");
    assert!(stderr.contains("oreg init"), "stderr={}", stderr);
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    let (stdout, _, success) = run_oreg(
        &config_path,
        &["import", records.to_str().unwrap(), "--dry-run", "--progress", "off"],
    );
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("records valid: 2"), "{}", stdout);

    let (stdout, _, success) = run_oreg(&config_path, &["search", "orgs"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_import_with_limit() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    let (stdout, _, success) = run_oreg(
        &config_path,
        &["import", records.to_str().unwrap(), "--limit", "1", "--progress", "off"],
    );
    assert!(success);
    // "2024/beta.json" sorts first.
    assert!(stdout.contains("organizations inserted: 1"), "{}", stdout);
}

#[test]
fn test_search_orgs_with_filters() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    import_records(&config_path, &records);

    let (stdout, stderr, success) = run_oreg(
        &config_path,
        &["search", "orgs", "bank", "--category", "domestic", "--status", "live"],
    );
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("ISLAND BANK LTD"));
    assert!(!stdout.contains("LAGOON HOLDINGS"));

    let (stdout, _, success) = run_oreg(
        &config_path,
        &["search", "orgs", "--from", "01/01/2010", "--to", "2020-12-31", "--json"],
    );
    assert!(success);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "LAGOON HOLDINGS");
}

#[test]
fn test_search_orgs_rejects_unknown_label() {
    let (_tmp, config_path, _) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    let (_, stderr, success) = run_oreg(&config_path, &["search", "orgs", "--status", "zombie"]);
    assert!(!success);
    assert!(stderr.contains("zombie"));
}

#[test]
fn test_search_orgs_rejects_bad_date() {
    let (_tmp, config_path, _) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    let (_, _, success) = run_oreg(&config_path, &["search", "orgs", "--from", "31/02/2020"]);
    assert!(!success);
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    import_records(&config_path, &records);

    let (stdout, _, success) = run_oreg(&config_path, &["search", "orgs", "xyzzy"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_directors() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    import_records(&config_path, &records);

    let (stdout, _, success) = run_oreg(&config_path, &["search", "directors", "curie"]);
    assert!(success);
    assert!(stdout.contains("Marie Curie"));
    assert!(!stdout.contains("Director Marie"));

    let (stdout, _, success) = run_oreg(
        &config_path,
        &["search", "directors", "not like mauritius", "--column", "country"],
    );
    assert!(success);
    assert!(stdout.contains("Marie Curie"));
    assert!(!stdout.contains("Raj Patel"));
}

#[test]
fn test_get_organization() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    import_records(&config_path, &records);

    let (stdout, _, _) = run_oreg(&config_path, &["search", "orgs", "island", "--json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = rows[0]["id"].as_i64().unwrap().to_string();

    let (stdout, stderr, success) = run_oreg(&config_path, &["get", &id]);
    assert!(success, "get failed: {}", stderr);
    assert!(stdout.contains("ISLAND BANK LTD"));
    assert!(stdout.contains("Office bearers (2)"));
    assert!(stdout.contains("Raj Patel"));
}

#[test]
fn test_get_missing_organization() {
    let (_tmp, config_path, _) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    let (_, stderr, success) = run_oreg(&config_path, &["get", "999"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_stats_and_verify() {
    let (_tmp, config_path, records) = setup_test_env();

    run_oreg(&config_path, &["init"]);
    import_records(&config_path, &records);

    let (stdout, _, success) = run_oreg(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Organizations:  2"), "{}", stdout);
    assert!(stdout.contains("Office bearers: 2"), "{}", stdout);
    assert!(stdout.contains("(unclassified)"));

    let (stdout, stderr, success) = run_oreg(&config_path, &["verify"]);
    assert!(success, "verify failed: {} {}", stdout, stderr);
    assert!(stdout.contains("ok"));
}
