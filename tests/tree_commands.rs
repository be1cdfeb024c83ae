use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::predicate;

mod common;

use common::fixtures;

const HELLO_BLOB_OID: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

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

#[test]
fn single_file_directory_hashes_to_the_expected_tree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("a").write_str("hello\n")?;

    let tree_payload = fixtures::tree_entry("100644", "a", HELLO_BLOB_OID);
    let expected = fixtures::object_hex(&fixtures::serialize_object("tree", &tree_payload));

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path()).arg("write-tree");

    sut.assert()
        .success()
        .stdout(predicate::eq(format!("{}\n", expected)));

    // the tree and its blob both land in the database
    dir.child(format!(".git/objects/{}/{}", &expected[..2], &expected[2..]))
        .assert(predicate::path::is_file());
    dir.child(".git/objects/ce/013625030ba8dba906f756967f9e9ca394464a")
        .assert(predicate::path::is_file());

    Ok(())
}

#[test]
fn nested_directories_hash_to_the_expected_trees() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("foo.txt").write_str("hello\n")?;
    dir.child("foo/bar.txt").write_str("hello\n")?;

    // subdirectory tree first, then the root that references it
    let subtree_payload = fixtures::tree_entry("100644", "bar.txt", HELLO_BLOB_OID);
    let subtree_hex = fixtures::object_hex(&fixtures::serialize_object("tree", &subtree_payload));

    // "foo.txt" sorts before the directory "foo" under the suffix-slash rule
    let mut root_payload = fixtures::tree_entry("100644", "foo.txt", HELLO_BLOB_OID);
    root_payload.extend(fixtures::tree_entry("40000", "foo", &subtree_hex));
    let expected = fixtures::object_hex(&fixtures::serialize_object("tree", &root_payload));

    assert_eq!(write_tree_output(&dir)?, expected);

    Ok(())
}

#[test]
fn ls_tree_prints_names_in_stored_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("foo.txt").write_str("hello\n")?;
    dir.child("foo/bar.txt").write_str("hello\n")?;
    dir.child("alpha").write_str("first\n")?;

    let tree_hex = write_tree_output(&dir)?;

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path()).arg("ls-tree").arg(&tree_hex);

    sut.assert()
        .success()
        .stdout(predicate::eq("alpha\nfoo.txt\nfoo\n"));

    Ok(())
}

#[test]
fn ls_tree_rejects_non_tree_objects() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    init_repository(&dir)?;
    dir.child("hello.txt").write_str("hello\n")?;

    Command::cargo_bin("grit")?
        .current_dir(dir.path())
        .arg("hash-object")
        .arg("-w")
        .arg("hello.txt")
        .assert()
        .success();

    let mut sut = Command::cargo_bin("grit")?;
    sut.current_dir(dir.path()).arg("ls-tree").arg(HELLO_BLOB_OID);

    sut.assert()
        .failure()
        .stderr(predicate::str::contains("not a tree"));

    Ok(())
}

#[test]
fn equal_content_hashes_equally_regardless_of_creation_order()
-> Result<(), Box<dyn std::error::Error>> {
    let first = assert_fs::TempDir::new()?;
    init_repository(&first)?;
    first.child("a.txt").write_str("alpha\n")?;
    first.child("b.txt").write_str("beta\n")?;
    first.child("sub/c.txt").write_str("gamma\n")?;

    let second = assert_fs::TempDir::new()?;
    init_repository(&second)?;
    second.child("sub/c.txt").write_str("gamma\n")?;
    second.child("b.txt").write_str("beta\n")?;
    second.child("a.txt").write_str("alpha\n")?;

    assert_eq!(write_tree_output(&first)?, write_tree_output(&second)?);

    Ok(())
}
