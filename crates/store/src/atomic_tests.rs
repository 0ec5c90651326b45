use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Doc {
    value: u32,
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    write_atomic(&path, &Doc { value: 7 }).unwrap();
    let loaded: Doc = read_json(&path).unwrap();
    assert_eq!(loaded, Doc { value: 7 });
}

#[test]
fn no_tmp_file_left_behind_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    write_atomic(&path, &Doc { value: 1 }).unwrap();
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn read_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let err = read_json::<Doc>(&path).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn quarantines_corrupt_file_and_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    std::fs::write(&path, b"{not valid json").unwrap();

    let result: Option<Doc> = read_json_or_quarantine(&path).unwrap();
    assert!(result.is_none());
    assert!(!path.exists());
    assert!(path.with_extension("bak").exists());
}

#[test]
fn backup_then_restore_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    write_atomic(&path, &Doc { value: 42 }).unwrap();
    backup(&path).unwrap();

    write_atomic(&path, &Doc { value: 99 }).unwrap();

    let restored: Doc = restore_from_backup(&path).unwrap().unwrap();
    assert_eq!(restored, Doc { value: 42 });
}

#[test]
fn bak_rotation_keeps_at_most_three() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    for i in 0..5u32 {
        write_atomic(&path, &Doc { value: i }).unwrap();
        backup(&path).unwrap();
    }
    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());
}
