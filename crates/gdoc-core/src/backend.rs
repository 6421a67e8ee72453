//! Remote service seam
//!
//! Everything the core needs from the document-editing and file-sharing
//! services. Implementations treat every failure (transport, auth, quota)
//! as a [`RemoteError`]; retrying is the executor's job, not theirs.

use crate::document::Document;
use crate::error::RemoteError;
use crate::ops::EditOperation;
use crate::table::TableRequest;
use crate::types::{BatchUpdateResponse, Permission};

/// Remote documents, permissions and table-creation endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocsBackend: Send + Sync {
    /// `documents.get`
    async fn get_document(&self, document_id: &str) -> Result<Document, RemoteError>;

    /// `documents.create`
    async fn create_document(&self, title: &str) -> Result<Document, RemoteError>;

    /// `documents.batchUpdate`
    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[EditOperation],
    ) -> Result<BatchUpdateResponse, RemoteError>;

    /// `permissions.create`
    async fn create_permission(
        &self,
        document_id: &str,
        permission: &Permission,
    ) -> Result<(), RemoteError>;

    /// Table creation, separate from the batch-edit endpoint
    async fn create_table(
        &self,
        document_id: &str,
        request: &TableRequest,
    ) -> Result<BatchUpdateResponse, RemoteError>;
}
