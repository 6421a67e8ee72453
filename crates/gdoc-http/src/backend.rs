//! reqwest implementation of [`DocsBackend`]

use crate::auth::AccessToken;
use gdoc_core::{
    cell_fill_operations, end_index_of, BatchUpdateResponse, ConfigError, DocsBackend, Document,
    EditOperation, Permission, RemoteError, TableRequest, START_OF_DOCUMENT,
};
use parking_lot::Mutex;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Production Docs API root
pub const DOCS_BASE_URL: &str = "https://docs.googleapis.com";

/// Production Drive API root
pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct BatchUpdateBody<'a> {
    requests: &'a [EditOperation],
}

#[derive(Serialize)]
struct CreateBody<'a> {
    title: &'a str,
}

/// Docs/Drive REST client
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    token: AccessToken,
    docs_base: String,
    drive_base: String,
    // Tables inserted but not yet filled, by document id.
    unfilled_tables: Arc<Mutex<HashMap<String, TableRequest>>>,
}

impl HttpBackend {
    /// Client against the production endpoints
    #[must_use]
    pub fn new(token: AccessToken) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(client, token)
    }

    /// Client with a caller-built `reqwest::Client`
    #[must_use]
    pub fn with_client(client: reqwest::Client, token: AccessToken) -> Self {
        Self {
            client,
            token,
            docs_base: DOCS_BASE_URL.to_string(),
            drive_base: DRIVE_BASE_URL.to_string(),
            unfilled_tables: Arc::default(),
        }
    }

    /// Client with the token from `GDOC_ACCESS_TOKEN`
    ///
    /// # Errors
    /// `ConfigError::Missing` if the token is not set
    pub fn from_env() -> Result<Self, ConfigError> {
        AccessToken::from_env().map(Self::new)
    }

    /// Point at other API roots (emulators, tests)
    #[must_use]
    pub fn with_base_urls(mut self, docs: impl Into<String>, drive: impl Into<String>) -> Self {
        self.docs_base = docs.into().trim_end_matches('/').to_string();
        self.drive_base = drive.into().trim_end_matches('/').to_string();
        self
    }

    fn documents_url(&self) -> String {
        format!("{}/v1/documents", self.docs_base)
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/v1/documents/{document_id}", self.docs_base)
    }

    fn batch_update_url(&self, document_id: &str) -> String {
        format!("{}/v1/documents/{document_id}:batchUpdate", self.docs_base)
    }

    fn permissions_url(&self, document_id: &str) -> String {
        format!("{}/drive/v3/files/{document_id}/permissions", self.drive_base)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = request
            .bearer_auth(self.token.secret())
            .send()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %body, "request rejected");
            return Err(RemoteError::from_status(status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::decode(e.to_string()))
    }

    /// Structural batch of a table creation: optional body delete, then insertTable
    async fn insert_table(&self, document_id: &str, request: &TableRequest) -> Result<(), RemoteError> {
        let mut structure = Vec::with_capacity(2);
        if !request.append {
            let end = end_index_of(&self.get_document(document_id).await?);
            if end > START_OF_DOCUMENT {
                structure.push(EditOperation::delete_range(START_OF_DOCUMENT, end));
            }
        }
        structure.push(EditOperation::append_table(request.rows, request.columns));
        self.batch_update(document_id, &structure).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl DocsBackend for HttpBackend {
    async fn get_document(&self, document_id: &str) -> Result<Document, RemoteError> {
        tracing::trace!(document = document_id, "GET document");
        self.send(self.client.get(self.document_url(document_id))).await
    }

    async fn create_document(&self, title: &str) -> Result<Document, RemoteError> {
        self.send(
            self.client
                .post(self.documents_url())
                .json(&CreateBody { title }),
        )
        .await
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[EditOperation],
    ) -> Result<BatchUpdateResponse, RemoteError> {
        tracing::trace!(document = document_id, requests = requests.len(), "POST batchUpdate");
        self.send(
            self.client
                .post(self.batch_update_url(document_id))
                .json(&BatchUpdateBody { requests }),
        )
        .await
    }

    async fn create_permission(
        &self,
        document_id: &str,
        permission: &Permission,
    ) -> Result<(), RemoteError> {
        self.send::<IgnoredAny>(
            self.client
                .post(self.permissions_url(document_id))
                .json(permission),
        )
        .await
        .map(|_| ())
    }

    /// Insert an empty table, then fill its cells in a second batch
    ///
    /// With `append == false` the existing body is deleted first. The
    /// inserted table is located by re-fetching the document: the last
    /// table when appending, the first otherwise.
    ///
    /// The structural batch is sent once per table. If a later step fails,
    /// the next call with the same request for the same document resumes
    /// at the re-fetch instead of inserting a second table.
    async fn create_table(
        &self,
        document_id: &str,
        request: &TableRequest,
    ) -> Result<BatchUpdateResponse, RemoteError> {
        let resuming = self.unfilled_tables.lock().get(document_id) == Some(request);
        if resuming {
            tracing::debug!(document = document_id, "resuming table fill");
        } else {
            self.insert_table(document_id, request).await?;
            self.unfilled_tables
                .lock()
                .insert(document_id.to_string(), request.clone());
        }

        let document = self.get_document(document_id).await?;
        let table = if request.append {
            document.tables().last()
        } else {
            document.tables().next()
        }
        .ok_or_else(|| RemoteError::decode("inserted table missing from document"))?;

        let fills = cell_fill_operations(table, &request.values);
        let response = if fills.is_empty() {
            BatchUpdateResponse {
                document_id: document_id.to_string(),
                replies: Vec::new(),
            }
        } else {
            tracing::debug!(document = document_id, cells = fills.len(), "filling table");
            self.batch_update(document_id, &fills).await?
        };
        self.unfilled_tables.lock().remove(document_id);
        Ok(response)
    }
}
