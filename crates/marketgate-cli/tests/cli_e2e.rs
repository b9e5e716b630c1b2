use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::Command as AssertCommand;
use predicates::str::contains;

fn git(args: &[&str], cwd: &Path) {
    let status = Command::new("git").args(args).current_dir(cwd).status().unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn init_local_repo(root: &Path, manifest: &str) {
    fs::create_dir_all(root.join("commands")).unwrap();
    fs::write(root.join("plugin.json"), manifest).unwrap();
    fs::write(root.join("README.md"), "# readme").unwrap();
    fs::write(root.join("LICENSE"), "MIT").unwrap();
    fs::write(root.join("commands/run.md"), "a command").unwrap();

    git(&["init", "-q"], root);
    git(&["config", "user.email", "test@example.com"], root);
    git(&["config", "user.name", "test"], root);
    git(&["add", "."], root);
    git(&["commit", "-q", "-m", "init"], root);
}

fn write_index(dir: &Path, plugin_url: &str) -> std::path::PathBuf {
    let index_path = dir.join("marketplace.json");
    let contents = format!(
        r#"{{
            "name": "test-marketplace",
            "version": "1.0.0",
            "owner": {{"name": "acme"}},
            "plugins": [
                {{
                    "name": "x",
                    "tier": "curated",
                    "tags": [],
                    "source": {{"url": "{plugin_url}"}}
                }}
            ]
        }}"#
    );
    fs::write(&index_path, contents).unwrap();
    index_path
}

#[test]
fn validate_passes_for_clean_curated_plugin() {
    let source_repo = tempfile::tempdir().unwrap();
    init_local_repo(
        source_repo.path(),
        r#"{"name":"x","version":"1.0.0","description":"d","policyTier":"curated","capabilities":{"network":{"mode":"none"}}}"#,
    );

    let work = tempfile::tempdir().unwrap();
    let index_path = write_index(work.path(), &source_repo.path().to_string_lossy());

    AssertCommand::cargo_bin("marketgate")
        .unwrap()
        .arg("--index")
        .arg(&index_path)
        .assert()
        .success()
        .stdout(contains("1/1 plugins passed"));
}

#[test]
fn validate_fails_when_manifest_is_missing() {
    let source_repo = tempfile::tempdir().unwrap();
    git(&["init", "-q"], source_repo.path());
    git(&["config", "user.email", "test@example.com"], source_repo.path());
    git(&["config", "user.name", "test"], source_repo.path());
    fs::write(source_repo.path().join("README.md"), "# readme").unwrap();
    git(&["add", "."], source_repo.path());
    git(&["commit", "-q", "-m", "init"], source_repo.path());

    let work = tempfile::tempdir().unwrap();
    let index_path = write_index(work.path(), &source_repo.path().to_string_lossy());

    AssertCommand::cargo_bin("marketgate")
        .unwrap()
        .arg("--index")
        .arg(&index_path)
        .assert()
        .failure()
        .stdout(contains("FAIL"));
}

#[test]
fn catalog_check_detects_missing_file() {
    let source_repo = tempfile::tempdir().unwrap();
    init_local_repo(
        source_repo.path(),
        r#"{"name":"x","version":"1.0.0","description":"d","policyTier":"curated","capabilities":{"network":{"mode":"none"}}}"#,
    );

    let work = tempfile::tempdir().unwrap();
    let index_path = write_index(work.path(), &source_repo.path().to_string_lossy());
    let catalog_path = work.path().join("CATALOG.md");

    AssertCommand::cargo_bin("marketgate")
        .unwrap()
        .arg("--index")
        .arg(&index_path)
        .arg("catalog")
        .arg("--output")
        .arg(&catalog_path)
        .assert()
        .success();

    assert!(catalog_path.exists());

    AssertCommand::cargo_bin("marketgate")
        .unwrap()
        .arg("--index")
        .arg(&index_path)
        .arg("catalog")
        .arg("--check")
        .arg("--output")
        .arg(&catalog_path)
        .assert()
        .success();
}
