//! Integration tests for the CredVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Secrets are supplied through the `CREDVAULT_*` environment variables
//! so no interactive prompt is ever reached.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "Sesame123";
const LOGIN: &str = "login-password";
const EMAIL: &str = "alice@example.com";

/// Helper: get a Command pointing at the credvault binary.
fn credvault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("credvault").expect("binary should exist");
    for var in [
        "CREDVAULT_APP_KEY",
        "CREDVAULT_MASTER",
        "CREDVAULT_PASSWORD",
        "CREDVAULT_ENTRY_PASSWORD",
        "CREDVAULT_BACKUP_PASSPHRASE",
        "CREDVAULT_EMAIL",
        "CREDVAULT_DIR",
        "CREDVAULT_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// A command bound to `dir` with master password, email and login set.
fn vault_cmd(dir: &TempDir) -> Command {
    account_cmd(dir, EMAIL)
}

fn account_cmd(dir: &TempDir, email: &str) -> Command {
    let mut cmd = credvault();
    cmd.arg("--data-dir")
        .arg(dir.path())
        .arg("--email")
        .arg(email)
        .env("CREDVAULT_MASTER", MASTER)
        .env("CREDVAULT_PASSWORD", LOGIN);
    cmd
}

/// Initialise a data directory (with cheap Argon2 settings) and sign up.
fn initialised() -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("credvault.toml")
        .write_str("argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n")
        .unwrap();

    vault_cmd(&dir).arg("init").assert().success();
    vault_cmd(&dir).arg("signup").assert().success();
    dir
}

fn add(dir: &TempDir, service: &str, username: &str, password: &str) {
    vault_cmd(dir)
        .args(["add", service, username])
        .env("CREDVAULT_ENTRY_PASSWORD", password)
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// Non-interactive basics
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    credvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal encrypted credential vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("signup"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("reset-password"));
}

#[test]
fn version_flag_shows_version() {
    credvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("credvault"));
}

#[test]
fn no_args_shows_help() {
    credvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn generate_prints_password_of_requested_length() {
    let out = credvault()
        .args(["generate", "--length", "24"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.trim_end_matches('\n').chars().count(), 24);
}

#[test]
fn generate_rejects_bad_length() {
    credvault()
        .args(["generate", "--length", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 4 and 128"));
}

#[test]
fn completions_for_bash() {
    credvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("credvault"));
}

#[test]
fn get_before_init_fails() {
    let dir = TempDir::new().unwrap();
    vault_cmd(&dir)
        .args(["get", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("credvault init"));
}

// ---------------------------------------------------------------------------
// Full workflow
// ---------------------------------------------------------------------------

#[test]
fn init_creates_key_gate_and_database() {
    let dir = initialised();
    dir.child("app.key").assert(predicate::path::exists());
    dir.child("master.gate").assert(predicate::path::exists());
    dir.child("credvault.db").assert(predicate::path::exists());

    let gate = std::fs::read_to_string(dir.child("master.gate").path()).unwrap();
    assert!(!gate.contains(MASTER));
}

#[test]
fn init_twice_fails() {
    let dir = initialised();
    vault_cmd(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialised"));
}

#[test]
fn wrong_master_password_is_rejected() {
    let dir = initialised();
    vault_cmd(&dir)
        .env("CREDVAULT_MASTER", "not-the-master")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn add_get_list_delete() {
    let dir = initialised();
    add(&dir, "github", "alice", "p@ss1");

    vault_cmd(&dir)
        .args(["get", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("p@ss1"));

    vault_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("github"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("p@ss1").not());

    vault_cmd(&dir)
        .args(["add", "github", "alice"])
        .env("CREDVAULT_ENTRY_PASSWORD", "again")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    vault_cmd(&dir)
        .args(["delete", "github", "alice", "--force"])
        .assert()
        .success();

    vault_cmd(&dir)
        .args(["get", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn add_with_generated_password() {
    let dir = initialised();
    vault_cmd(&dir)
        .args(["add", "mail", "bob", "--generate", "--length", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated password"));
}

#[test]
fn export_then_import_into_fresh_account() {
    let dir = initialised();
    add(&dir, "github", "alice", "p@ss1");
    add(&dir, "gitlab", "alice", "p@ss2");

    let backup = dir.child("out.txt");
    vault_cmd(&dir)
        .args(["export", "--plaintext", "--encrypt-file", "--output"])
        .arg(backup.path())
        .assert()
        .success();
    let sealed = std::fs::read_to_string(backup.path()).unwrap();
    assert!(!sealed.contains("p@ss1"));

    // Re-importing into the same account skips both entries.
    vault_cmd(&dir)
        .arg("import")
        .arg(backup.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 imported, 2 skipped"));

    // A second account gets its own copies.
    account_cmd(&dir, "bob@example.com")
        .arg("signup")
        .assert()
        .success();
    account_cmd(&dir, "bob@example.com")
        .arg("import")
        .arg(backup.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"));
    account_cmd(&dir, "bob@example.com")
        .args(["get", "gitlab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("p@ss2"));
}

#[test]
fn default_export_lands_in_backup_dir() {
    let dir = initialised();
    add(&dir, "github", "alice", "p@ss1");

    vault_cmd(&dir).arg("export").assert().success();

    let entries: Vec<_> = std::fs::read_dir(dir.child("backup").path())
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
    let text = std::fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
    assert!(text.starts_with("# credvault-backup v1 encoding=sealed"));
    assert!(!text.contains("p@ss1"));
}
