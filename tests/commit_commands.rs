use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::predicate;

mod common;

use common::fixtures;

const AUTHOR_NAME: &str = "A U Thor";
const AUTHOR_EMAIL: &str = "author@example.com";
const AUTHOR_DATE: &str = "2024-01-15 10:00:00 +0000";

fn init_repository(dir: &assert_fs::TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("grit")?;
    cmd.current_dir(dir.path()).arg("init");
    cmd.assert().success();
    Ok(())
}

fn write_tree_output(dir: &assert_fs::TempDir) -> Result<String, Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("grit")?
        .current_dir(dir.path())
        .arg("write-tree")
        .output()?;
    assert!(output.status.success());
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

fn commit_tree(
    dir: &assert_fs::TempDir,
    tree_hex: &str,
    parent_hex: Option<&str>,
    message: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("grit")?;
    cmd.current_dir(dir.path())
        .env("GIT_AUTHOR_NAME", AUTHOR_NAME)
        .env("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("GIT_AUTHOR_DATE", AUTHOR_DATE)
        .arg("commit-tree")
        .arg(tree_hex);
    if let Some(parent_hex) = parent_hex {
        cmd.arg("-p").arg(parent_hex);
    }
    let output = cmd.arg("-m").arg(message).output()?;
    assert!(output.status.success());
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

#[test]
fn root_commit_hashes_to_the_expected_object() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("a").write_str("hello\n")?;

    let tree_hex = write_tree_output(&dir)?;
    let commit_hex = commit_tree(&dir, &tree_hex, None, "initial commit")?;

    let expected_payload = fixtures::commit_payload(&tree_hex, None, "initial commit\n");
    let expected = fixtures::object_hex(&fixtures::serialize_object("commit", &expected_payload));
    assert_eq!(commit_hex, expected);

    Ok(())
}

#[test]
fn commit_payload_carries_tree_parent_and_identity() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("a").write_str("hello\n")?;

    let tree_hex = write_tree_output(&dir)?;
    let root_hex = commit_tree(&dir, &tree_hex, None, "initial commit")?;
    let child_hex = commit_tree(&dir, &tree_hex, Some(&root_hex), "second commit")?;

    let expected_payload =
        fixtures::commit_payload(&tree_hex, Some(&root_hex), "second commit\n");
    let expected = fixtures::object_hex(&fixtures::serialize_object("commit", &expected_payload));
    assert_eq!(child_hex, expected);

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path())
        .arg("cat-file")
        .arg("-p")
        .arg(&child_hex);

    sut.assert()
        .success()
        .stdout(predicate::eq(String::from_utf8(expected_payload)?));

    Ok(())
}

#[test]
fn messages_gain_a_trailing_newline() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("a").write_str("hello\n")?;

    let tree_hex = write_tree_output(&dir)?;
    let commit_hex = commit_tree(&dir, &tree_hex, None, "no newline")?;

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path())
        .arg("cat-file")
        .arg("-p")
        .arg(&commit_hex);

    sut.assert()
        .success()
        .stdout(predicate::str::ends_with("no newline\n"));

    Ok(())
}

#[test]
fn commit_tree_rejects_a_blob_argument() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("hello.txt").write_str("hello\n")?;

    let output = Command::cargo_bin("grit")?
        .current_dir(dir.path())
        .arg("hash-object")
        .arg("-w")
        .arg("hello.txt")
        .output()?;
    let blob_hex = String::from_utf8(output.stdout)?.trim().to_string();

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path())
        .arg("commit-tree")
        .arg(&blob_hex)
        .arg("-m")
        .arg("not a tree");

    sut.assert()
        .failure()
        .stderr(predicate::str::contains("not a tree"));

    Ok(())
}

#[test]
fn identity_falls_back_when_the_environment_is_unset() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("a").write_str("hello\n")?;

    let tree_hex = write_tree_output(&dir)?;

    let output = Command::cargo_bin("grit")?
        .current_dir(dir.path())
        .env_remove("GIT_AUTHOR_NAME")
        .env_remove("GIT_AUTHOR_EMAIL")
        .arg("commit-tree")
        .arg(&tree_hex)
        .arg("-m")
        .arg("fallback identity")
        .output()?;
    assert!(output.status.success());
    let commit_hex = String::from_utf8(output.stdout)?.trim().to_string();

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path())
        .arg("cat-file")
        .arg("-p")
        .arg(&commit_hex);

    sut.assert()
        .success()
        .stdout(predicate::str::contains("author grit <grit@localhost>"));

    Ok(())
}
