//! Backend document lifecycle and configuration knobs, end to end.

mod common;

use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::{InitializeParams, Position};

use phocus::Backend;
use phocus::config::ExceptionFallback;

use common::fixture;

const DOC: &str = "file:///ws/user.php";

#[tokio::test]
async fn initialize_advertises_completion_support() {
    let backend = Backend::new_test();
    let result = backend
        .initialize(InitializeParams::default())
        .await
        .unwrap();

    let completion = result.capabilities.completion_provider.unwrap();
    assert!(
        completion
            .trigger_characters
            .unwrap()
            .contains(&">".to_string())
    );
    assert_eq!(result.server_info.unwrap().name, "phocus");
}

#[test]
fn completion_runs_against_open_documents() {
    let backend = Backend::new_test();
    backend.index_document(
        DOC,
        "<?php\nclass User {\n    public $name;\n}\n$u = new User();\n$u->\n",
    );

    // Caret right after `$u->` on line 5.
    let items = backend.completion_at(DOC, Position::new(5, 4));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["name"]);
}

#[test]
fn completion_for_unknown_document_is_empty() {
    let backend = Backend::new_test();
    assert!(backend.completion_at(DOC, Position::new(0, 0)).is_empty());
}

#[test]
fn past_end_position_clamps_to_document_end() {
    let backend = Backend::new_test();
    backend.index_document(DOC, "<?php\n");

    // Clamped to the end of the document, where plain completion applies.
    let items = backend.completion_at(DOC, Position::new(10, 0));
    assert!(items.iter().any(|i| i.label == "$_SERVER"));
}

#[test]
fn documents_share_one_symbol_database() {
    let backend = Backend::new_test();
    backend.index_document("file:///ws/lib.php", "<?php\nclass Widget {\n    public $id;\n}\n");
    backend.index_document(DOC, "<?php\n$w = new Widget();\n$w->\n");

    let items = backend.completion_at(DOC, Position::new(2, 4));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["id"]);
}

#[test]
fn removing_a_document_drops_its_symbols() {
    let backend = Backend::new_test();
    backend.index_document("file:///ws/lib.php", "<?php\nclass Widget {\n    public $id;\n}\n");
    backend.index_document(DOC, "<?php\n$w = new Widget();\n$w->\n");
    backend.remove_document("file:///ws/lib.php");

    assert!(backend.completion_at(DOC, Position::new(2, 4)).is_empty());
}

#[test]
fn superglobals_survive_reindexing() {
    let backend = Backend::new_test();
    backend.index_document(DOC, "<?php\n\n");

    let items = backend.completion_at(DOC, Position::new(1, 0));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert!(labels.contains(&"$_SERVER"));
    assert!(labels.contains(&"$GLOBALS"));
}

#[test]
fn candidate_lists_are_capped() {
    let mut fx = fixture("<?php class C0 {} class C1 {} class C2 {} $x = new <|>");
    fx.config.max_candidates = 2;
    assert_eq!(fx.items().len(), 2);
}

#[test]
fn keyword_items_can_be_disabled() {
    let mut fx = fixture(
        r#"<?php
class A {
    public function hello() {}
}
class B extends A {
    public <|>
}
"#,
    );
    fx.config.keyword_items = false;

    let labels = fx.labels();
    assert!(labels.contains(&"hello()".to_string()));
    assert!(!labels.contains(&"static".to_string()));
    assert!(!labels.contains(&"function".to_string()));
}

#[test]
fn exception_fallback_can_show_untyped_hierarchies() {
    let mut fx = fixture(
        r#"<?php
class Plain {}
try {} catch (<|>
"#,
    );
    assert!(fx.labels().is_empty());

    fx.config.exception_fallback = ExceptionFallback::ShowAll;
    assert_eq!(fx.labels(), ["Plain"]);
}
