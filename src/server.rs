//! LSP server trait implementation.
//!
//! The `impl LanguageServer for Backend` block: document lifecycle keeps
//! the symbol database in sync, completion runs the classifier pipeline.

use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::Backend;

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());
        self.set_workspace_root(workspace_root);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(
                        ["$", ">", ":", "\\", "(", "'", "\"", "/"]
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    ),
                    all_commit_characters: None,
                    completion_item: None,
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: None,
                    },
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            ..InitializeResult::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        // Pre-index every PHP file in the workspace so cross-file classes
        // resolve before their documents are opened.
        let mut documents = Vec::new();
        if let Some(root) = self.workspace_root() {
            for entry in ignore::WalkBuilder::new(&root).build().flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "php")
                    && let Ok(content) = std::fs::read_to_string(path)
                {
                    documents.push((format!("file://{}", path.display()), content));
                }
            }
        }
        let indexed = documents.len();
        self.load_documents(documents);
        self.log(
            MessageType::INFO,
            format!("phocus initialized, indexed {indexed} workspace file(s)"),
        )
        .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.index_document(doc.uri.as_ref(), &doc.text);
        self.log(MessageType::INFO, format!("opened {}", doc.uri))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the complete document.
        if let Some(change) = params.content_changes.into_iter().next_back() {
            self.index_document(params.text_document.uri.as_ref(), &change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        // Fall back to the on-disk contents so the file's declarations stay
        // resolvable; drop it only when it no longer exists.
        if let Ok(path) = uri.to_file_path()
            && let Ok(content) = std::fs::read_to_string(&path)
        {
            self.index_document(uri.as_ref(), &content);
        } else {
            self.remove_document(uri.as_ref());
        }
        self.log(MessageType::INFO, format!("closed {uri}")).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;
        let items = self.completion_at(&uri, position);
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }
}
