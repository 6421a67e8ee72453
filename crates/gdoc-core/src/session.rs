//! Document session
//!
//! Owns the identity of the active document and the executor every remote
//! call goes through. It is the only component with mutable state.

use crate::backend::DocsBackend;
use crate::backoff::{BackoffExecutor, RetryObserver};
use crate::batcher::EditBatcher;
use crate::config::SessionConfig;
use crate::error::{DocsError, RemoteError};
use crate::position::PositionResolver;
use crate::types::{DocumentHandle, Permission, Role};
use std::fmt;
use std::sync::Arc;

/// Session against one remote document at a time
///
/// Not internally synchronized: mutations against one document must be
/// serialized by the caller, since each append re-reads the end index.
pub struct DocumentSession {
    backend: Arc<dyn DocsBackend>,
    executor: BackoffExecutor,
    config: SessionConfig,
    document: Option<DocumentHandle>,
}

impl DocumentSession {
    /// Create session reporting retries through `tracing`
    #[must_use]
    pub fn new(backend: Arc<dyn DocsBackend>, config: SessionConfig) -> Self {
        let executor = BackoffExecutor::new(config.retry.clone());
        Self {
            backend,
            executor,
            config,
            document: None,
        }
    }

    /// Create session with a custom retry observer
    #[must_use]
    pub fn with_observer(
        backend: Arc<dyn DocsBackend>,
        config: SessionConfig,
        observer: Arc<dyn RetryObserver>,
    ) -> Self {
        let executor = BackoffExecutor::with_observer(config.retry.clone(), observer);
        Self {
            backend,
            executor,
            config,
            document: None,
        }
    }

    /// Target an existing document
    #[inline]
    #[must_use]
    pub fn with_document(mut self, handle: impl Into<DocumentHandle>) -> Self {
        self.document = Some(handle.into());
        self
    }

    /// Replace the active document, returning the previous one
    pub fn set_document(&mut self, handle: impl Into<DocumentHandle>) -> Option<DocumentHandle> {
        self.document.replace(handle.into())
    }

    /// Active document
    #[inline]
    #[must_use]
    pub fn document(&self) -> Option<&DocumentHandle> {
        self.document.as_ref()
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get executor
    #[inline]
    #[must_use]
    pub fn executor(&self) -> &BackoffExecutor {
        &self.executor
    }

    /// Create a document, or keep the active one unless `force` is set
    ///
    /// # Errors
    /// - `DocsError::Remote` once retries are exhausted, or when the
    ///   response carries no document id
    pub async fn create(&mut self, title: &str, force: bool) -> Result<DocumentHandle, DocsError> {
        if let (Some(existing), false) = (&self.document, force) {
            tracing::info!(document = %existing, url = %existing.edit_url(), "document already exists");
            return Ok(existing.clone());
        }

        let backend = &self.backend;
        let created = self
            .executor
            .execute("documents.create", || backend.create_document(title))
            .await?;
        if created.document_id.is_empty() {
            return Err(RemoteError::decode("create response has no documentId").into());
        }

        let handle = DocumentHandle::new(created.document_id);
        tracing::info!(document = %handle, url = %handle.edit_url(), title, "created document");
        if let Some(previous) = self.document.replace(handle.clone()) {
            tracing::debug!(previous = %previous, "replaced active document");
        }
        Ok(handle)
    }

    /// Grant `principal` a `role` on `handle`
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn share(&self, handle: &DocumentHandle, principal: &str, role: Role) -> Result<(), DocsError> {
        let permission = Permission::user(principal, role);
        let backend = &self.backend;
        let permission = &permission;
        self.executor
            .execute("permissions.create", || {
                backend.create_permission(handle.as_str(), permission)
            })
            .await?;
        tracing::info!(document = %handle, principal, %role, "shared document");
        Ok(())
    }

    /// Batcher bound to the active document
    ///
    /// # Errors
    /// - `DocsError::NoActiveDocument` before `create` or `set_document`
    pub fn edits(&self) -> Result<EditBatcher<'_>, DocsError> {
        let handle = self.document.as_ref().ok_or(DocsError::NoActiveDocument)?;
        Ok(EditBatcher::new(
            self.backend.as_ref(),
            &self.executor,
            handle,
            self.config.paragraph_pause(),
        ))
    }

    /// Current end index of the active document
    ///
    /// # Errors
    /// - `DocsError::NoActiveDocument` before `create` or `set_document`
    /// - `DocsError::Remote` once retries are exhausted
    pub async fn resolve_end_index(&self) -> Result<i64, DocsError> {
        let handle = self.document.as_ref().ok_or(DocsError::NoActiveDocument)?;
        Ok(PositionResolver::new(self.backend.as_ref(), &self.executor)
            .resolve_end_index(handle)
            .await?)
    }
}

impl fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSession")
            .field("executor", &self.executor)
            .field("config", &self.config)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}
