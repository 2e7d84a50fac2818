//! Integration tests for the master-secret gate.

use credvault::crypto::{generate_app_key_file, load_app_key_file, AppKey};
use credvault::errors::VaultError;
use credvault::gate::{verify, GateState, MasterSecretGate};
use tempfile::TempDir;

#[test]
fn sesame_scenario() {
    let dir = TempDir::new().unwrap();
    let gate = MasterSecretGate::new(dir.path().join("master.gate"));
    let app_key = AppKey::generate();

    let record = gate.create("Sesame123", &app_key).unwrap();
    assert!(verify("Sesame123", &record, &app_key).unwrap());
    assert!(!verify("wrong", &record, &app_key).unwrap());

    let corrupted = AppKey::generate();
    assert!(matches!(
        verify("Sesame123", &record, &corrupted),
        Err(VaultError::GateCorrupted)
    ));
}

#[test]
fn wrong_candidate_leaves_gate_set() {
    let dir = TempDir::new().unwrap();
    let gate = MasterSecretGate::new(dir.path().join("master.gate"));
    let app_key = AppKey::generate();
    gate.create("Sesame123", &app_key).unwrap();

    for _ in 0..3 {
        assert!(!gate.unlock("guess", &app_key).unwrap());
    }
    assert!(matches!(gate.state().unwrap(), GateState::Set(_)));
    assert!(gate.unlock("Sesame123", &app_key).unwrap());
}

#[test]
fn record_file_does_not_contain_the_secret() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("master.gate");
    let gate = MasterSecretGate::new(&path);
    gate.create("Sesame123", &AppKey::generate()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("Sesame123"));
    assert_eq!(text.lines().count(), 1);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn gate_survives_app_key_reload_from_file() {
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("app.key");
    let gate = MasterSecretGate::new(dir.path().join("master.gate"));

    let key = generate_app_key_file(&key_path).unwrap();
    gate.create("Sesame123", &key).unwrap();
    drop(key);

    let reloaded = load_app_key_file(&key_path).unwrap();
    assert!(gate.unlock("Sesame123", &reloaded).unwrap());
}

#[test]
fn truncated_record_is_corrupted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("master.gate");
    let gate = MasterSecretGate::new(&path);
    let key = AppKey::generate();
    gate.create("Sesame123", &key).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, &text[..20]).unwrap();
    assert!(matches!(gate.unlock("Sesame123", &key), Err(VaultError::GateCorrupted)));
}
