//! Integration tests for peercache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn peercache() -> Command {
        cargo_bin_cmd!("peercache")
    }

    /// Write an isolated config whose store root lives inside `dir`
    fn write_config(dir: &TempDir) -> PathBuf {
        let config_path = dir.path().join("config.toml");
        let root = dir.path().join("store");
        std::fs::write(
            &config_path,
            format!(
                "[store]\nroot = \"{}\"\ncapacity_bytes = 1048576\n",
                root.display()
            ),
        )
        .unwrap();
        config_path
    }

    fn with_config(dir: &TempDir, args: &[&str]) -> Command {
        let config = write_config(dir);
        let mut cmd = peercache();
        cmd.arg("--config").arg(&config).args(args);
        cmd
    }

    #[test]
    fn help_displays() {
        peercache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Peer build cache node"));
    }

    #[test]
    fn version_displays() {
        peercache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("peercache"));
    }

    #[test]
    fn config_path_prints_override() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, &["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_is_toml() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, &["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[admission]"));
    }

    #[test]
    fn init_writes_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("fresh").join("config.toml");

        peercache()
            .arg("--config")
            .arg(&config)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        assert!(config.exists());
    }

    #[test]
    fn init_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir);

        peercache()
            .arg("--config")
            .arg(&config)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn status_on_empty_store() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, &["status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("0 entries"))
            .stdout(predicate::str::contains("no evictions recorded"));
    }

    #[test]
    fn ledger_on_empty_store() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, &["ledger"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No content held"));
    }

    #[test]
    fn add_then_ledger_lists_content() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"built output").unwrap();

        with_config(&dir, &["add", artifact.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added sha256:"));

        with_config(&dir, &["ledger"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sha256:"));

        with_config(&dir, &["status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 entries"));
    }

    #[test]
    fn add_twice_reports_available_locally() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"same output").unwrap();

        with_config(&dir, &["add", artifact.to_str().unwrap()])
            .assert()
            .success();
        with_config(&dir, &["add", artifact.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("content available locally"));
    }

    #[test]
    fn check_accepts_unknown_content() {
        let dir = TempDir::new().unwrap();
        let hash = format!("sha256:{}", "ab".repeat(32));

        with_config(&dir, &["check", &hash, "--rank", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Would accept"));
    }

    #[test]
    fn check_rejects_malformed_hash() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, &["check", "not-a-hash"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid content hash"));
    }

    #[test]
    fn delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"deletable").unwrap();

        let output = with_config(&dir, &["add", artifact.to_str().unwrap()])
            .output()
            .unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let hash = stdout
            .split_whitespace()
            .find(|w| w.starts_with("sha256:"))
            .unwrap()
            .to_string();

        with_config(&dir, &["delete", &hash])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted"));

        with_config(&dir, &["delete", &hash])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing held"));
    }

    #[test]
    fn gc_evicts_and_records_ghosts() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"evictable").unwrap();

        with_config(&dir, &["add", artifact.to_str().unwrap()])
            .assert()
            .success();

        with_config(&dir, &["gc", "--free", "1048576"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Evicted"));

        with_config(&dir, &["ledger", "--ghosts"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sha256:"));
    }

    #[test]
    fn verify_clean_store() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, &["verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("agree"));
    }

    #[test]
    fn verify_detects_and_fixes_missing_bytes() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"will lose bytes").unwrap();

        with_config(&dir, &["add", artifact.to_str().unwrap()])
            .assert()
            .success();

        // Bytes vanish behind the ledger's back.
        std::fs::remove_dir_all(dir.path().join("store").join("blobs")).unwrap();

        with_config(&dir, &["verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ledger entry without bytes"));

        with_config(&dir, &["verify", "--fix"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Repaired"));

        with_config(&dir, &["verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("agree"));
    }

    #[test]
    fn completions_generate() {
        peercache()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("peercache"));
    }
}
