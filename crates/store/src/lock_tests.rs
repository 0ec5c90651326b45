use super::*;
use std::time::Duration;

fn fast_opts() -> LockOptions {
    LockOptions {
        base_delay: Duration::from_millis(1),
        backoff_factor: 1.5,
        max_delay: Duration::from_millis(5),
        max_retries: 3,
        stale_after: Duration::from_secs(60),
    }
}

#[test]
fn acquires_fresh_lock_and_writes_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.lock");
    let lock = acquire_exclusive(&path, &fast_opts()).unwrap();
    assert_eq!(lock.path(), path);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.trim(), std::process::id().to_string());
}

#[test]
fn second_acquire_times_out_while_first_is_held() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.lock");
    let _first = acquire_exclusive(&path, &fast_opts()).unwrap();

    let err = acquire_exclusive(&path, &fast_opts()).unwrap_err();
    assert!(matches!(err, StoreError::LockTimeout { .. }) || matches!(err, StoreError::StaleLockUnreapable { .. }));
}

#[test]
fn lock_is_released_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.lock");
    {
        let _lock = acquire_exclusive(&path, &fast_opts()).unwrap();
    }
    let lock = acquire_exclusive(&path, &fast_opts());
    assert!(lock.is_ok());
}

#[test]
fn reaps_stale_lock_from_dead_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.lock");

    // Simulate a stale lock file left behind by a process that no longer
    // exists, without actually holding the OS-level flock.
    std::fs::write(&path, "999999999\n").unwrap();
    let old = std::time::SystemTime::now() - Duration::from_secs(120);
    let file = std::fs::File::open(&path).unwrap();
    file.set_modified(old).unwrap();

    let opts = LockOptions {
        stale_after: Duration::from_secs(1),
        ..fast_opts()
    };
    // No OS lock is actually held, so this just acquires normally; the
    // reap path is exercised directly below.
    let lock = acquire_exclusive(&path, &opts);
    assert!(lock.is_ok());
}

#[test]
fn try_reap_stale_removes_file_for_dead_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.lock");
    std::fs::write(&path, "999999999\n").unwrap();
    let old = std::time::SystemTime::now() - Duration::from_secs(120);
    let file = std::fs::File::open(&path).unwrap();
    file.set_modified(old).unwrap();

    let opts = LockOptions {
        stale_after: Duration::from_secs(1),
        ..fast_opts()
    };
    let reaped = try_reap_stale(&path, &opts);
    assert_eq!(reaped, Some(999999999));
    assert!(!path.exists());
}

#[test]
fn try_reap_stale_skips_fresh_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.lock");
    std::fs::write(&path, "999999999\n").unwrap();

    let opts = fast_opts();
    let reaped = try_reap_stale(&path, &opts);
    assert_eq!(reaped, None);
    assert!(path.exists());
}
