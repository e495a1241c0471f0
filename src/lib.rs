//! PHP completion-context engine behind an LSP server.
//!
//! The pipeline per completion request: tokenize the text before the caret,
//! classify the completion kind by scanning backward from the last token
//! ([`completion::CompletionContext`]), evaluate the access expression
//! against the symbol database, then produce and filter candidates.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tower_lsp::Client;
use tower_lsp::lsp_types::{CompletionItem, MessageType, Position};
use tracing::debug;

pub mod completion;
pub mod config;
pub mod expression;
pub mod indexer;
pub mod lexer;
pub mod project;
pub mod symbols;

mod server;
mod util;

use crate::completion::{CancelToken, CandidateRequest, CompletionContext, completion_items};
use crate::config::Config;
use crate::expression::SymbolExpressionEvaluator;
use crate::indexer::Indexer;
use crate::project::{ProjectTree, WorkspaceTree};
use crate::symbols::SymbolIndex;

pub struct Backend {
    name: String,
    version: String,
    client: Option<Client>,
    config: Config,
    db: SymbolIndex,
    open_files: Mutex<HashMap<String, String>>,
    workspace_root: Mutex<Option<PathBuf>>,
    /// Cancellation handle of the most recent completion request; a new
    /// request supersedes the one before it.
    active_request: Mutex<Option<CancelToken>>,
}

impl Backend {
    pub fn new(client: Client, config: Config) -> Self {
        let db = SymbolIndex::new();
        indexer::seed_superglobals(&db);
        Self {
            name: "phocus".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client: Some(client),
            config,
            db,
            open_files: Mutex::new(HashMap::new()),
            workspace_root: Mutex::new(None),
            active_request: Mutex::new(None),
        }
    }

    pub fn new_test() -> Self {
        let db = SymbolIndex::new();
        indexer::seed_superglobals(&db);
        Self {
            name: "phocus".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client: None,
            config: Config::default(),
            db,
            open_files: Mutex::new(HashMap::new()),
            workspace_root: Mutex::new(None),
            active_request: Mutex::new(None),
        }
    }

    pub fn db(&self) -> &SymbolIndex {
        &self.db
    }

    pub(crate) async fn log(&self, typ: MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }

    pub(crate) fn set_workspace_root(&self, root: Option<PathBuf>) {
        if let Ok(mut wr) = self.workspace_root.lock() {
            *wr = root;
        }
    }

    pub(crate) fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.lock().ok().and_then(|g| g.clone())
    }

    /// Store (or replace) a document and rebuild the symbol database from
    /// every open document. Documents are small enough that a full rebuild
    /// beats tracking per-document declaration ownership.
    pub fn index_document(&self, uri: &str, text: &str) {
        if let Ok(mut files) = self.open_files.lock() {
            files.insert(uri.to_string(), text.to_string());
        }
        self.rebuild_index();
    }

    /// Insert many documents at once with a single index rebuild, for the
    /// initial workspace scan.
    pub(crate) fn load_documents(&self, documents: Vec<(String, String)>) {
        if let Ok(mut files) = self.open_files.lock() {
            files.extend(documents);
        }
        self.rebuild_index();
    }

    pub fn remove_document(&self, uri: &str) {
        if let Ok(mut files) = self.open_files.lock() {
            files.remove(uri);
        }
        self.rebuild_index();
    }

    fn rebuild_index(&self) {
        self.db.clear();
        indexer::seed_superglobals(&self.db);
        let indexer = Indexer::new(&self.db);
        if let Ok(files) = self.open_files.lock() {
            for text in files.values() {
                indexer.index_document(text);
            }
        }
    }

    /// Classify the request and produce candidates. Supersedes any still
    /// running completion request for this backend.
    pub fn completion_at(&self, uri: &str, position: Position) -> Vec<CompletionItem> {
        let Some(content) = self
            .open_files
            .lock()
            .ok()
            .and_then(|files| files.get(uri).cloned())
        else {
            debug!(uri, "completion for unknown document");
            return Vec::new();
        };
        let Some(offset) = util::position_to_offset(&content, position) else {
            return Vec::new();
        };

        let cancel = CancelToken::new();
        if let Ok(mut active) = self.active_request.lock()
            && let Some(previous) = active.replace(cancel.clone())
        {
            previous.cancel();
        }

        let scope = self.db.scope_at(offset as u32);
        let evaluator = SymbolExpressionEvaluator::new(&self.db);
        let ctx = CompletionContext::classify(
            &self.db,
            &evaluator,
            scope,
            &content[..offset],
            util::line_tail(&content, offset),
            offset as u32,
        );

        let tree = self.workspace_root().map(WorkspaceTree::new);
        let document_path = uri.strip_prefix("file://").map(PathBuf::from);
        let request = CandidateRequest {
            db: &self.db,
            config: &self.config.completion,
            project: tree.as_ref().map(|t| t as &dyn ProjectTree),
            document_path: document_path.as_deref(),
            cancel,
        };
        completion_items(&ctx, &request)
    }
}
