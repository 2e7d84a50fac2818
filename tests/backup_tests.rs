//! Integration tests for backup export and import.

use std::fs;

use chrono::{Local, TimeZone};
use credvault::backup::{default_backup_path, export_all, import_all, ExportOptions};
use credvault::crypto::DerivedKey;
use credvault::errors::VaultError;
use credvault::vault::{CredentialVault, MemoryStore, OwnerId, VaultSession};
use tempfile::TempDir;

fn session() -> VaultSession {
    VaultSession::new(OwnerId::new("U"), DerivedKey::new([0x42; 32]))
}

fn vault_with(n: usize, session: &VaultSession) -> CredentialVault<MemoryStore> {
    let mut vault = CredentialVault::new(MemoryStore::new());
    for i in 0..n {
        vault
            .add_entry(session, &format!("service-{i:03}"), "user", &format!("pw, #{i}"))
            .unwrap();
    }
    vault
}

/// (service, username, password) for every entry, sorted.
fn tuples(
    vault: &CredentialVault<MemoryStore>,
    session: &VaultSession,
) -> Vec<(String, String, String)> {
    vault
        .records(session)
        .unwrap()
        .iter()
        .map(|r| {
            let pw = credvault::vault::reveal_password(session, r).unwrap();
            (r.service_name.clone(), r.username.clone(), pw.to_string())
        })
        .collect()
}

#[test]
fn roundtrip_sealed_export() {
    let dir = TempDir::new().unwrap();
    let s = session();

    for n in [0, 1, 100] {
        let source = vault_with(n, &s);
        let path = dir.path().join(format!("backup-{n}.txt"));
        export_all(&source.records(&s).unwrap(), &ExportOptions::default(), &path).unwrap();

        let mut target = CredentialVault::new(MemoryStore::new());
        let report = import_all(&path, &mut target, &s, None).unwrap();
        assert_eq!(report.imported, n);
        assert!(report.invalid.is_empty() && report.failed.is_empty());
        assert_eq!(tuples(&target, &s), tuples(&source, &s));
    }
}

#[test]
fn sealed_export_contains_no_plaintext() {
    let dir = TempDir::new().unwrap();
    let s = session();
    let source = vault_with(3, &s);
    let path = dir.path().join("b.txt");
    export_all(&source.records(&s).unwrap(), &ExportOptions::default(), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# credvault-backup v1 encoding=sealed\n"));
    assert!(!text.contains("pw, #"));
}

#[test]
fn plaintext_export_roundtrip() {
    let dir = TempDir::new().unwrap();
    let s = session();
    let source = vault_with(2, &s);
    let path = dir.path().join("plain.txt");

    let options = ExportOptions {
        reveal_with: Some(&s),
        file_key: None,
    };
    export_all(&source.records(&s).unwrap(), &options, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("Service: service-000, Username: user, Password: pw, #0"));

    let mut target = CredentialVault::new(MemoryStore::new());
    let report = import_all(&path, &mut target, &s, None).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(tuples(&target, &s), tuples(&source, &s));
}

#[test]
fn separators_in_fields_never_reach_a_backup() {
    let s = session();
    let mut source = CredentialVault::new(MemoryStore::new());

    assert!(matches!(
        source.add_entry(&s, "svc", "bob, Password: x", "realpw"),
        Err(VaultError::InvalidInput(_))
    ));
    assert!(matches!(
        source.add_entry(&s, "svc, Username: eve", "bob", "realpw"),
        Err(VaultError::InvalidInput(_))
    ));
    source
        .add_entry(&s, "svc", "bob", "x, Username: eve, Password: y")
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.txt");
    let options = ExportOptions {
        reveal_with: Some(&s),
        file_key: None,
    };
    export_all(&source.records(&s).unwrap(), &options, &path).unwrap();

    let mut target = CredentialVault::new(MemoryStore::new());
    let report = import_all(&path, &mut target, &s, None).unwrap();
    assert_eq!(report.imported, 1);
    let got = target.retrieve_entry(&s, "svc").unwrap();
    assert_eq!(got.username, "bob");
    assert_eq!(got.password.as_str(), "x, Username: eve, Password: y");
}

#[test]
fn wrapped_export_needs_the_file_key() {
    let dir = TempDir::new().unwrap();
    let s = session();
    let source = vault_with(2, &s);
    let path = dir.path().join("wrapped.txt");

    let options = ExportOptions {
        reveal_with: Some(&s),
        file_key: Some(b"backup passphrase".as_slice()),
    };
    export_all(&source.records(&s).unwrap(), &options, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("Service:"));
    assert!(!text.contains("pw, #"));

    let mut target = CredentialVault::new(MemoryStore::new());
    assert!(matches!(
        import_all(&path, &mut target, &s, None),
        Err(VaultError::InvalidInput(_))
    ));
    assert!(matches!(
        import_all(&path, &mut target, &s, Some(b"wrong".as_slice())),
        Err(VaultError::AuthenticationFailed)
    ));

    let report = import_all(&path, &mut target, &s, Some(b"backup passphrase".as_slice())).unwrap();
    assert_eq!(report.imported, 2);
}

#[test]
fn partial_import_tolerance() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.txt");
    fs::write(
        &path,
        "Service: github, Username: alice, Password: p@ss1\nService: gitlab, Username: bob\n",
    )
    .unwrap();

    let s = session();
    let mut vault = CredentialVault::new(MemoryStore::new());
    let report = import_all(&path, &mut vault, &s, None).unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].line, 2);
    assert_eq!(vault.retrieve_entry(&s, "github").unwrap().password.as_str(), "p@ss1");
}

#[test]
fn existing_entries_are_skipped() {
    let dir = TempDir::new().unwrap();
    let s = session();
    let mut vault = vault_with(3, &s);
    let path = dir.path().join("again.txt");
    export_all(&vault.records(&s).unwrap(), &ExportOptions::default(), &path).unwrap();

    let report = import_all(&path, &mut vault, &s, None).unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.skipped, 3);
}

#[test]
fn legacy_bytes_literal_lines_import() {
    let dir = TempDir::new().unwrap();
    let s = session();
    let source = vault_with(1, &s);
    let record = &source.records(&s).unwrap()[0];

    let path = dir.path().join("legacy.txt");
    fs::write(
        &path,
        format!(
            "Service: {}, Username: {}, Password: b'{}'\n",
            record.service_name, record.username, record.sealed_password
        ),
    )
    .unwrap();

    let mut target = CredentialVault::new(MemoryStore::new());
    let report = import_all(&path, &mut target, &s, None).unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(tuples(&target, &s), tuples(&source, &s));
}

#[test]
fn missing_backup_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut vault = CredentialVault::new(MemoryStore::new());
    assert!(matches!(
        import_all(&dir.path().join("nope.txt"), &mut vault, &session(), None),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn default_backup_file_name() {
    let when = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    let path = default_backup_path(std::path::Path::new("backup"), when);
    assert_eq!(path, std::path::PathBuf::from("backup/2024-03-09-140507.txt"));
}

#[cfg(unix)]
#[test]
fn exports_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("b.txt");
    export_all(&[], &ExportOptions::default(), &path).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
}
