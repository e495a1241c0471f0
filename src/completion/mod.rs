//! Completion engine: backward token scanning, context classification,
//! kind-specific filtering and candidate production.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod context;
pub mod cursor;
pub mod filter;
pub mod items;

pub use context::{CompletionContext, CompletionKind};
pub use filter::CandidateFilter;
pub use items::{CandidateRequest, completion_items};

/// Cooperative cancellation flag shared between an in-flight completion
/// request and whoever supersedes it. Candidate loops poll it and return
/// early once set.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
