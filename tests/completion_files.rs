//! Path completion inside `require`/`include` string literals.

mod common;

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tower_lsp::lsp_types::CompletionItemKind;

use phocus::completion::{CancelToken, CandidateRequest, CompletionKind, completion_items};
use phocus::project::WorkspaceTree;

use common::fixture;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.php"), "<?php\n").unwrap();
    fs::write(dir.path().join("index.php"), "<?php\n").unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib/util.php"), "<?php\n").unwrap();
    dir
}

fn items_in(
    fx: &common::Fixture,
    root: &Path,
    document: &Path,
) -> Vec<tower_lsp::lsp_types::CompletionItem> {
    let ctx = fx.classify();
    let tree = WorkspaceTree::new(root.to_path_buf());
    let request = CandidateRequest {
        db: &fx.db,
        config: &fx.config,
        project: Some(&tree),
        document_path: Some(document),
        cancel: CancelToken::new(),
    };
    completion_items(&ctx, &request)
}

#[test]
fn require_literal_lists_workspace_root() {
    let dir = workspace();
    let fx = fixture("<?php require '<|>");

    let ctx = fx.classify();
    assert!(ctx.is_valid());
    assert_eq!(ctx.kind(), CompletionKind::FileChoose);
    assert!(!ctx.is_file_completion_after_dirname());

    let items = items_in(&fx, dir.path(), &dir.path().join("main.php"));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    // The requesting file itself is skipped; `..` rounds off the listing.
    assert_eq!(labels, ["index.php", "lib", ".."]);

    let lib = &items[1];
    assert_eq!(lib.kind, Some(CompletionItemKind::FOLDER));
    assert_eq!(lib.insert_text.as_deref(), Some("lib/"));
}

#[test]
fn subdirectory_path_lists_its_entries() {
    let dir = workspace();
    let fx = fixture("<?php require 'lib/<|>");

    let items = items_in(&fx, dir.path(), &dir.path().join("main.php"));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["util.php"]);
    assert_eq!(items[0].kind, Some(CompletionItemKind::FILE));
}

#[test]
fn partial_name_filters_entries() {
    let dir = workspace();
    let fx = fixture("<?php include 'in<|>");

    let ctx = fx.classify();
    assert_eq!(ctx.kind(), CompletionKind::FileChoose);
    assert_eq!(ctx.expression(), "in");

    let items = items_in(&fx, dir.path(), &dir.path().join("main.php"));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["index.php"]);
}

#[test]
fn dirname_anchors_at_the_documents_directory() {
    let dir = workspace();
    let fx = fixture("<?php require dirname(__FILE__) . '/<|>");

    let ctx = fx.classify();
    assert!(ctx.is_valid());
    assert_eq!(ctx.kind(), CompletionKind::FileChoose);
    assert!(ctx.is_file_completion_after_dirname());

    let items = items_in(&fx, dir.path(), &dir.path().join("main.php"));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["index.php", "lib"]);
}

#[test]
fn path_escapes_outside_the_workspace_are_rejected() {
    let dir = workspace();
    let fx = fixture("<?php require '../<|>");

    let items = items_in(&fx, dir.path(), &dir.path().join("main.php"));
    assert!(items.is_empty());
}

#[test]
fn no_project_means_no_candidates() {
    let fx = fixture("<?php require '<|>");
    assert_eq!(fx.classify().kind(), CompletionKind::FileChoose);
    assert!(fx.items().is_empty());
}

#[test]
fn plain_string_literal_gets_no_completion() {
    let fx = fixture("<?php $x = 'hel<|>");
    assert!(!fx.classify().is_valid());
}
