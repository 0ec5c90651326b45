use super::*;
use std::process::Command as StdCommand;

fn init_repo(dir: &Path) {
    StdCommand::new("git").arg("init").arg("-q").current_dir(dir).output().unwrap();
    StdCommand::new("git")
        .args(["config", "user.email", "test@example.com"])
        .current_dir(dir)
        .output()
        .unwrap();
    StdCommand::new("git")
        .args(["config", "user.name", "Test"])
        .current_dir(dir)
        .output()
        .unwrap();
    StdCommand::new("git")
        .args(["commit", "--allow-empty", "-q", "-m", "initial"])
        .current_dir(dir)
        .output()
        .unwrap();
}

#[tokio::test]
async fn current_branch_reports_the_checked_out_branch() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let adapter = ProcessGitAdapter;

    let branch = adapter.current_branch(dir.path()).await.unwrap();
    assert!(branch == "master" || branch == "main");
}

#[tokio::test]
async fn branch_exists_is_false_until_created() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let adapter = ProcessGitAdapter;

    assert!(!adapter.branch_exists(dir.path(), "feature-x").await.unwrap());
    adapter.create_branch(dir.path(), "feature-x").await.unwrap();
    assert!(adapter.branch_exists(dir.path(), "feature-x").await.unwrap());
}

#[tokio::test]
async fn has_uncommitted_changes_reflects_working_tree() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let adapter = ProcessGitAdapter;

    assert!(!adapter.has_uncommitted_changes(dir.path()).await.unwrap());
    std::fs::write(dir.path().join("file.txt"), "content").unwrap();
    assert!(adapter.has_uncommitted_changes(dir.path()).await.unwrap());
}

#[tokio::test]
async fn commit_clears_uncommitted_changes() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let adapter = ProcessGitAdapter;

    std::fs::write(dir.path().join("file.txt"), "content").unwrap();
    adapter.commit(dir.path(), "add file").await.unwrap();
    assert!(!adapter.has_uncommitted_changes(dir.path()).await.unwrap());
}

#[tokio::test]
async fn stash_then_pop_restores_working_tree_changes() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let adapter = ProcessGitAdapter;

    std::fs::write(dir.path().join("file.txt"), "content").unwrap();
    adapter.stash(dir.path()).await.unwrap();
    assert!(!adapter.has_uncommitted_changes(dir.path()).await.unwrap());

    adapter.pop(dir.path()).await.unwrap();
    assert!(adapter.has_uncommitted_changes(dir.path()).await.unwrap());
}

#[tokio::test]
async fn commit_on_an_unknown_repo_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = ProcessGitAdapter;

    let err = adapter.commit(dir.path(), "nope").await.unwrap_err();
    assert!(matches!(err, GitError::CommandFailed { .. }));
}
