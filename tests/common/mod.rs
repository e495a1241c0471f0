//! Shared helpers for the integration tests.
//!
//! Sources mark the caret with `<|>`; the marker is stripped before
//! indexing and classification.

#![allow(dead_code)]

use tower_lsp::lsp_types::CompletionItem;

use phocus::completion::{
    CancelToken, CandidateRequest, CompletionContext, completion_items,
};
use phocus::config::CompletionConfig;
use phocus::expression::SymbolExpressionEvaluator;
use phocus::indexer::Indexer;
use phocus::symbols::SymbolIndex;

pub const MARKER: &str = "<|>";

pub struct Fixture {
    pub db: SymbolIndex,
    pub content: String,
    pub offset: usize,
    pub config: CompletionConfig,
}

/// Index `source` (with the caret marker removed) and remember the caret.
pub fn fixture(source: &str) -> Fixture {
    let offset = source
        .find(MARKER)
        .unwrap_or_else(|| panic!("source has no {MARKER} marker"));
    let content = source.replacen(MARKER, "", 1);
    let db = SymbolIndex::new();
    Indexer::new(&db).index_document(&content);
    Fixture {
        db,
        content,
        offset,
        config: CompletionConfig::default(),
    }
}

impl Fixture {
    /// Classify the completion request at the caret.
    pub fn classify(&self) -> CompletionContext {
        let evaluator = SymbolExpressionEvaluator::new(&self.db);
        let scope = self.db.scope_at(self.offset as u32);
        CompletionContext::classify(
            &self.db,
            &evaluator,
            scope,
            &self.content[..self.offset],
            line_tail(&self.content, self.offset),
            self.offset as u32,
        )
    }

    /// Classify and produce candidates, without a project tree.
    pub fn items(&self) -> Vec<CompletionItem> {
        let ctx = self.classify();
        let request = CandidateRequest {
            db: &self.db,
            config: &self.config,
            project: None,
            document_path: None,
            cancel: CancelToken::new(),
        };
        completion_items(&ctx, &request)
    }

    pub fn labels(&self) -> Vec<String> {
        self.items().into_iter().map(|item| item.label).collect()
    }
}

fn line_tail(content: &str, offset: usize) -> &str {
    let rest = &content[offset..];
    match rest.find('\n') {
        Some(idx) => rest[..idx].trim_end_matches('\r'),
        None => rest,
    }
}
