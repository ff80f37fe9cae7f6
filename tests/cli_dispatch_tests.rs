use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_starforge")
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn unique_temp_path(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("starforge-{name}-{stamp}"))
}

/// Runs from an empty directory so no stray `starforge.yaml` or env override leaks in.
fn starforge(workdir: &PathBuf) -> Command {
    fs::create_dir_all(workdir).expect("workdir should be created");
    let mut command = Command::new(bin());
    command
        .current_dir(workdir)
        .env_remove("RUST_LOG")
        .env_remove("STARFORGE_ALIASES")
        .env_remove("STARFORGE_NICKNAMES")
        .env_remove("STARFORGE_WORKERS")
        .env_remove("STARFORGE_LOG_LEVEL")
        .env_remove("STARFORGE_LOG_FILE");
    command
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let dir = unique_temp_path("usage");
    let output = starforge(&dir).output().expect("starforge should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.to_lowercase().contains("usage"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn resolve_command_picks_squadron_card() {
    let dir = unique_temp_path("resolve");
    let output = starforge(&dir)
        .args(["resolve", "squadron", "Vader", "--aliases"])
        .arg(fixture("aliases.json"))
        .arg("--nicknames")
        .arg(fixture("nicknames.json"))
        .output()
        .expect("resolve should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Darth Vader (Squadron) (21)"));
    assert!(stdout.contains("id=darth-vader-squadron"));
    assert!(stdout.contains("stage=nickname"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn resolve_command_emits_json_for_unresolved_name() {
    let dir = unique_temp_path("resolve-json");
    let output = starforge(&dir)
        .args(["resolve", "ship", "Death", "Star", "--json", "--aliases"])
        .arg(fixture("aliases.json"))
        .arg("--nicknames")
        .arg(fixture("nicknames.json"))
        .output()
        .expect("resolve should run");

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("resolve should emit json");
    assert_eq!(payload["status"], "unresolved");
    assert_eq!(payload["text"], "Death Star");

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn convert_command_writes_output_and_emits_json_summary() {
    let dir = unique_temp_path("convert");
    let out = dir.join("converted.csv");
    let output = starforge(&dir)
        .args(["convert", "--json", "--no-registry", "--workers", "2", "--input"])
        .arg(fixture("tournament-fleets.csv"))
        .arg("--output")
        .arg(&out)
        .arg("--aliases")
        .arg(fixture("aliases.json"))
        .arg("--nicknames")
        .arg(fixture("nicknames.json"))
        .output()
        .expect("convert should run");

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("convert should emit json");
    assert_eq!(payload["rows_read"], 7);
    assert_eq!(payload["rows_written"], 5);
    assert_eq!(payload["points_mismatches"], 3);
    assert!(out.exists());
    assert!(!dir.join("data").exists(), "registry should not be written");

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn builds_command_reports_counts() {
    let dir = unique_temp_path("builds");
    let out = dir.join("converted.csv");
    let status = starforge(&dir)
        .args(["convert", "--no-registry", "--input"])
        .arg(fixture("tournament-fleets.csv"))
        .arg("--output")
        .arg(&out)
        .arg("--aliases")
        .arg(fixture("aliases.json"))
        .arg("--nicknames")
        .arg(fixture("nicknames.json"))
        .status()
        .expect("convert should run");
    assert!(status.success());

    let output = starforge(&dir)
        .args(["builds", "converted.csv", "--tag", "cli"])
        .output()
        .expect("builds should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("builds complete: tag=cli, fleets=5, builds=7"));
    assert!(dir.join("ship_upgrade_frequencies_cli.csv").exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_lookup_file_returns_non_zero() {
    let dir = unique_temp_path("missing-lookup");
    let output = starforge(&dir)
        .args(["resolve", "ship", "ISD 2", "--aliases", "no-such-aliases.json", "--nicknames"])
        .arg(fixture("nicknames.json"))
        .output()
        .expect("resolve should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lookup load failed"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn config_file_supplies_lookup_paths() {
    let dir = unique_temp_path("config");
    fs::create_dir_all(&dir).expect("workdir should be created");
    fs::write(
        dir.join("starforge.yaml"),
        format!(
            "aliases_path: {:?}\nnicknames_path: {:?}\n",
            fixture("aliases.json"),
            fixture("nicknames.json")
        ),
    )
    .expect("config should be written");

    let output = starforge(&dir)
        .args(["resolve", "commander", "Jerjerrod"])
        .output()
        .expect("resolve should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Moff Jerjerrod (23)\tid=moff-jerjerrod"));

    let _ = fs::remove_dir_all(dir);
}
