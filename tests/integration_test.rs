#![cfg(unix)]

mod common;

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use assert_fs::prelude::*;
use common::{ContentTree, execute, execute_with_store, is_symlink};
use deckhand::cli::Commands;
use deckhand::error::DeckError;
use miette::IntoDiagnostic;
use predicates::prelude::*;

fn run() -> Commands {
    Commands::Run { dry_run: false }
}

/// Runs the compiled binary from the test workspace.
fn run_deckhand(tree: &ContentTree, args: &[&str]) -> miette::Result<std::process::Output> {
    Command::new(env!("CARGO_BIN_EXE_deckhand"))
        .args(args)
        .current_dir(tree.workspace())
        .env_remove("DECKHAND_ROOT")
        .env_remove("DECKHAND_STORE_PATH")
        .env_remove("DECKHAND_VERBOSE")
        .env_remove("DECKHAND_QUIET")
        .env_remove("DECKHAND_DRY_RUN")
        .output()
        .into_diagnostic()
}

#[test]
fn test_duplicate_pair_becomes_one_file_and_one_link() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x"), ("C", "y")]);

    execute(&tree, run()).unwrap();

    let a = tree.file("A");
    let b = tree.file("B");
    assert_ne!(is_symlink(a.path()), is_symlink(b.path()));
    a.assert("x");
    b.assert("x");
    tree.file("C").assert(predicate::path::is_symlink().not());
    tree.file("C").assert("y");
}

#[test]
fn test_sibling_link_target() {
    let tree = ContentTree::with_files(&[("x/orig.txt", "same"), ("x/y/dup.txt", "same")]);

    execute(&tree, run()).unwrap();

    let dup = tree.file("x/y/dup.txt");
    dup.assert(predicate::path::is_symlink());
    assert_eq!(fs::read_link(dup.path()).unwrap(), PathBuf::from("../orig.txt"));
    dup.assert("same");
}

#[test]
fn test_cousin_link_target() {
    let tree = ContentTree::with_files(&[("a/orig.txt", "same"), ("p/q/dup.txt", "same")]);

    execute(&tree, run()).unwrap();

    let dup = tree.file("p/q/dup.txt");
    assert_eq!(
        fs::read_link(dup.path()).unwrap(),
        PathBuf::from("../../a/orig.txt")
    );
    dup.assert("same");
}

#[test]
fn test_nested_directory_named_like_root() {
    let tree = ContentTree::with_files(&[("a/ROOT/inner.txt", "deep"), ("z/copy.txt", "deep")]);

    execute(&tree, run()).unwrap();

    let copy = tree.file("z/copy.txt");
    assert_eq!(
        fs::read_link(copy.path()).unwrap(),
        PathBuf::from("../a/ROOT/inner.txt")
    );
    copy.assert("deep");
}

#[test]
fn test_links_survive_moving_the_tree() {
    let tree = ContentTree::with_files(&[("keep/one.txt", "payload"), ("more/two.txt", "payload")]);
    execute(&tree, run()).unwrap();

    let moved = tree.workspace().join("elsewhere");
    fs::rename(tree.root(), &moved).unwrap();

    assert!(is_symlink(&moved.join("more/two.txt")));
    assert_eq!(
        fs::read_to_string(moved.join("more/two.txt")).unwrap(),
        "payload"
    );
}

#[test]
fn test_many_copies_share_one_canonical() {
    let files: Vec<(String, &str)> = (0..5).map(|i| (format!("d{i}/copy.bin"), "dup")).collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    let tree = ContentTree::with_files(&refs);

    execute(&tree, run()).unwrap();

    let regular: Vec<_> = files
        .iter()
        .filter(|(p, _)| !is_symlink(tree.file(p).path()))
        .collect();
    assert_eq!(regular.len(), 1);
    assert_eq!(regular[0].0, "d0/copy.bin");
    for (p, _) in &files[1..] {
        assert_eq!(
            fs::read_link(tree.file(p).path()).unwrap(),
            PathBuf::from("../d0/copy.bin")
        );
    }
}

#[test]
fn test_empty_files_are_duplicates_too() {
    let tree = ContentTree::with_files(&[("e1", ""), ("e2", "")]);

    execute(&tree, run()).unwrap();

    tree.file("e2").assert(predicate::path::is_symlink());
    assert_eq!(fs::read_link(tree.file("e2").path()).unwrap(), PathBuf::from("e1"));
}

#[test]
fn test_rerun_on_own_output() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x"), ("C", "y")]);
    execute(&tree, run()).unwrap();
    let target = fs::read_link(tree.file("B").path()).unwrap();

    execute(&tree, run()).unwrap();

    assert_eq!(fs::read_link(tree.file("B").path()).unwrap(), target);
    tree.file("A").assert(predicate::path::is_symlink().not());
    execute(&tree, Commands::Report).unwrap();
}

#[test]
fn test_resolve_twice_then_link() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x")]);

    execute(&tree, Commands::Scan).unwrap();
    execute(&tree, Commands::Resolve).unwrap();
    execute(&tree, Commands::Resolve).unwrap();
    execute(&tree, Commands::Link { dry_run: false }).unwrap();

    assert_eq!(fs::read_link(tree.file("B").path()).unwrap(), PathBuf::from("A"));
}

#[test]
fn test_link_before_resolve_does_nothing() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x")]);

    execute(&tree, Commands::Scan).unwrap();
    // Freshly scanned records are all their own canonical.
    execute(&tree, Commands::Link { dry_run: false }).unwrap();

    tree.file("A").assert(predicate::path::is_symlink().not());
    tree.file("B").assert(predicate::path::is_symlink().not());
}

#[test]
fn test_link_refuses_when_canonical_vanished() {
    let tree = ContentTree::with_files(&[("A", "precious"), ("B", "precious")]);
    execute(&tree, Commands::Scan).unwrap();
    execute(&tree, Commands::Resolve).unwrap();
    fs::remove_file(tree.file("A").path()).unwrap();

    let result = execute(&tree, Commands::Link { dry_run: false });
    assert!(matches!(result, Err(DeckError::ContentChanged { .. })));
    tree.file("B").assert(predicate::path::is_symlink().not());
    tree.file("B").assert("precious");
}

#[test]
fn test_link_keeps_duplicate_edited_after_scan() {
    let tree = ContentTree::with_files(&[("A", "v1"), ("B", "v1")]);
    execute(&tree, Commands::Scan).unwrap();
    execute(&tree, Commands::Resolve).unwrap();
    tree.write("B", "edited after scan");

    let result = execute(&tree, Commands::Link { dry_run: false });
    assert!(matches!(result, Err(DeckError::ContentChanged { .. })));
    tree.file("B").assert("edited after scan");
}

#[test]
fn test_non_utf8_names_are_deduplicated() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tree = ContentTree::with_files(&[("a.txt", "same")]);
    let odd = tree.root().join(OsStr::from_bytes(b"caf\xe9.txt"));
    fs::write(&odd, "same").unwrap();

    execute(&tree, run()).unwrap();

    assert!(is_symlink(&odd));
    assert_eq!(fs::read_link(&odd).unwrap(), PathBuf::from("a.txt"));
    assert_eq!(fs::read_to_string(&odd).unwrap(), "same");
}

#[test]
fn test_dry_run_changes_nothing() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x")]);

    execute(&tree, Commands::Run { dry_run: true }).unwrap();

    tree.file("A").assert(predicate::path::is_symlink().not());
    tree.file("B").assert(predicate::path::is_symlink().not());
    tree.file("B").assert("x");
}

#[test]
fn test_store_outside_root() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x")]);

    execute_with_store(&tree, run(), Some("state/deck.store")).unwrap();

    assert!(tree.workspace().join("state/deck.store").exists());
    assert!(!tree.default_store().exists());
    tree.file("B").assert(predicate::path::is_symlink());
}

#[test]
fn test_clear_removes_store() {
    let tree = ContentTree::with_files(&[("A", "x")]);
    execute(&tree, Commands::Scan).unwrap();
    assert!(tree.default_store().exists());

    execute(&tree, Commands::Clear).unwrap();
    assert!(!tree.default_store().exists());
}

#[test]
fn test_report_on_unresolved_store_fails() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x")]);
    execute(&tree, Commands::Scan).unwrap();

    let result = execute(&tree, Commands::Report);
    assert!(matches!(result, Err(DeckError::Invariant { .. })));
}

#[test]
fn test_missing_root_fails() {
    let tree = ContentTree::new();
    fs::remove_dir(tree.root()).unwrap();

    let result = execute(&tree, Commands::Scan);
    assert!(matches!(result, Err(DeckError::Walk { .. })));
}

#[test]
fn test_binary_run_and_report() {
    let tree = ContentTree::with_files(&[("A", "x"), ("B", "x"), ("C", "y")]);

    let output = run_deckhand(&tree, &["--root", "ROOT", "run"]).unwrap();
    assert!(output.status.success());

    let output = run_deckhand(&tree, &["--root", "ROOT", "report"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(predicate::str::contains("Records:            3").eval(stdout.as_str()));
    assert!(predicate::str::contains("Duplicates:         1").eval(stdout.as_str()));
    assert!(predicate::str::contains("Reclaimable bytes:  0").eval(stdout.as_str()));
}

#[test]
fn test_binary_rejects_quiet_with_verbose() {
    let tree = ContentTree::new();

    let output = run_deckhand(&tree, &["-q", "-v", "scan"]).unwrap();
    assert!(!output.status.success());
    assert!(!tree.default_store().exists());
}
