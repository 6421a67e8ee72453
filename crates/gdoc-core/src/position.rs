//! Position resolution
//!
//! The insertion point for appends is the index just before the body's
//! trailing newline. Every edit moves it, so it is re-read from the remote
//! document before every append and never cached.

use crate::backend::DocsBackend;
use crate::backoff::BackoffExecutor;
use crate::document::Document;
use crate::error::RemoteError;
use crate::types::DocumentHandle;

/// Index of the start of an empty document
pub const START_OF_DOCUMENT: i64 = 1;

/// End-of-content index of a fetched document
#[must_use]
pub fn end_index_of(document: &Document) -> i64 {
    match document.content().last() {
        None => START_OF_DOCUMENT,
        Some(last) => last.end_index.map_or(START_OF_DOCUMENT, |end| end - 1),
    }
}

/// Resolves insertion points against the remote document
#[derive(Clone, Copy)]
pub struct PositionResolver<'a> {
    backend: &'a dyn DocsBackend,
    executor: &'a BackoffExecutor,
}

impl<'a> PositionResolver<'a> {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new(backend: &'a dyn DocsBackend, executor: &'a BackoffExecutor) -> Self {
        Self { backend, executor }
    }

    /// Fetch the full document through the executor
    ///
    /// # Errors
    /// The last `RemoteError` once retries are exhausted
    pub async fn fetch(&self, handle: &DocumentHandle) -> Result<Document, RemoteError> {
        let backend = self.backend;
        self.executor
            .execute("documents.get", || backend.get_document(handle.as_str()))
            .await
    }

    /// Current end-of-content index, read fresh
    ///
    /// # Errors
    /// The last `RemoteError` once retries are exhausted
    pub async fn resolve_end_index(&self, handle: &DocumentHandle) -> Result<i64, RemoteError> {
        let document = self.fetch(handle).await?;
        let index = end_index_of(&document);
        tracing::debug!(document = %handle, index, "resolved end index");
        Ok(index)
    }
}
