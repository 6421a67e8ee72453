//! Testing utilities for the gdoc workspace
//!
//! Shared fakes, recorders and setup helpers.

#![allow(missing_docs)]

use gdoc_core::document::{utf16_len, StructuralElement};
use gdoc_core::{
    BatchUpdateResponse, DocsBackend, Document, DocumentSession, EditOperation, Permission,
    RemoteError, RetryObserver, RetryPolicy, SessionConfig, TableRequest,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Remote endpoint of the fake service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetDocument,
    CreateDocument,
    BatchUpdate,
    CreatePermission,
    CreateTable,
}

/// One call received by [`FakeDocs`], failed attempts included
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetDocument(String),
    CreateDocument(String),
    BatchUpdate {
        document_id: String,
        requests: Vec<EditOperation>,
    },
    CreatePermission {
        document_id: String,
        permission: Permission,
    },
    CreateTable {
        document_id: String,
        request: TableRequest,
    },
}

impl Call {
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Call::GetDocument(_) => Endpoint::GetDocument,
            Call::CreateDocument(_) => Endpoint::CreateDocument,
            Call::BatchUpdate { .. } => Endpoint::BatchUpdate,
            Call::CreatePermission { .. } => Endpoint::CreatePermission,
            Call::CreateTable { .. } => Endpoint::CreateTable,
        }
    }
}

/// Call with the (tokio) instant it arrived
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub call: Call,
}

/// Paragraph style applied through `updateParagraphStyle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStyle {
    pub start_index: i64,
    pub end_index: i64,
    pub named_style_type: String,
}

#[derive(Debug, Clone)]
struct FakeDocument {
    title: String,
    // Body text in UTF-16 units; index `i` of the API is `text[i - 1]`.
    text: Vec<u16>,
    styles: Vec<AppliedStyle>,
}

impl FakeDocument {
    fn new(title: &str, text: &str) -> Self {
        let mut text: Vec<u16> = text.encode_utf16().collect();
        if text.last() != Some(&u16::from(b'\n')) {
            text.push(u16::from(b'\n'));
        }
        Self {
            title: title.to_string(),
            text,
            styles: Vec::new(),
        }
    }

    fn render(&self, id: &str) -> Document {
        let text = String::from_utf16_lossy(&self.text);
        let mut content = vec![StructuralElement::section_break()];
        let mut index = 1;
        for line in text.split_inclusive('\n') {
            content.push(StructuralElement::paragraph(index, line));
            index += utf16_len(line);
        }
        let mut document = Document::with_content(id, content);
        document.title.clone_from(&self.title);
        document
    }

    fn position(&self, index: i64) -> Result<usize, RemoteError> {
        // Insertions must land before the trailing newline.
        usize::try_from(index - 1)
            .ok()
            .filter(|&pos| pos < self.text.len())
            .ok_or_else(|| {
                RemoteError::new(
                    gdoc_core::RemoteErrorKind::InvalidRequest,
                    format!(
                        "index {index} must be in [1, {}]",
                        self.text.len()
                    ),
                )
            })
    }

    fn insert(&mut self, index: i64, units: &[u16]) -> Result<(), RemoteError> {
        let pos = self.position(index)?;
        self.text.splice(pos..pos, units.iter().copied());
        Ok(())
    }

    fn replace_all(&mut self, pattern: &[u16], replacement: &[u16]) {
        if pattern.is_empty() {
            return;
        }
        let mut out = Vec::with_capacity(self.text.len());
        let mut i = 0;
        while i < self.text.len() {
            if self.text[i..].starts_with(pattern) {
                out.extend_from_slice(replacement);
                i += pattern.len();
            } else {
                out.push(self.text[i]);
                i += 1;
            }
        }
        self.text = out;
    }

    fn apply(&mut self, op: &EditOperation) -> Result<(), RemoteError> {
        match op {
            EditOperation::InsertText { location, text } => {
                let units: Vec<u16> = text.encode_utf16().collect();
                self.insert(location.index, &units)
            }
            EditOperation::SetParagraphStyle {
                range,
                paragraph_style,
                ..
            } => {
                self.position(range.start_index)?;
                self.styles.push(AppliedStyle {
                    start_index: range.start_index,
                    end_index: range.end_index,
                    named_style_type: paragraph_style.named_style_type.clone(),
                });
                Ok(())
            }
            EditOperation::InsertImage { location, .. } => {
                self.insert(location.index, &[0xFFFC])
            }
            EditOperation::InsertPageBreak { location } => {
                self.insert(location.index, &[0x000C])
            }
            EditOperation::ReplaceText {
                contains_text,
                replace_text,
            } => {
                let pattern: Vec<u16> = contains_text.text.encode_utf16().collect();
                let replacement: Vec<u16> = replace_text.encode_utf16().collect();
                self.replace_all(&pattern, &replacement);
                Ok(())
            }
            EditOperation::DeleteContentRange { range } => {
                let start = self.position(range.start_index)?;
                let end = self.position(range.end_index)?;
                self.text.drain(start..end.max(start));
                Ok(())
            }
            EditOperation::InsertTable { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    documents: HashMap<String, FakeDocument>,
    next_id: u32,
    calls: Vec<RecordedCall>,
    failures: HashMap<Endpoint, VecDeque<RemoteError>>,
}

impl State {
    fn record(&mut self, call: Call) -> Result<(), RemoteError> {
        let endpoint = call.endpoint();
        self.calls.push(RecordedCall {
            at: Instant::now(),
            call,
        });
        match self.failures.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn document_mut(&mut self, id: &str) -> Result<&mut FakeDocument, RemoteError> {
        self.documents
            .get_mut(id)
            .ok_or_else(|| RemoteError::not_found(format!("document {id} not found")))
    }
}

/// In-memory stand-in for the remote documents service
///
/// Documents are flat text; the end index moves with every insertion, so
/// index-resolution mistakes surface as wrong text or `InvalidRequest`.
#[derive(Debug, Default)]
pub struct FakeDocs {
    state: Mutex<State>,
}

impl FakeDocs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document with body `text` (a trailing newline is added if missing)
    #[must_use]
    pub fn with_document(self, id: &str, text: &str) -> Self {
        self.state
            .lock()
            .documents
            .insert(id.to_string(), FakeDocument::new("", text));
        self
    }

    /// Make the next `count` calls to `endpoint` fail with `error`
    pub fn fail_next(&self, endpoint: Endpoint, count: usize, error: &RemoteError) {
        let mut state = self.state.lock();
        let queue = state.failures.entry(endpoint).or_default();
        queue.extend(std::iter::repeat(error.clone()).take(count));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    #[must_use]
    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.call.endpoint() == endpoint)
            .count()
    }

    /// Endpoints hit, in order
    #[must_use]
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|c| c.call.endpoint())
            .collect()
    }

    /// Requests of every batch received, failed attempts included
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<EditOperation>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match &c.call {
                Call::BatchUpdate { requests, .. } => Some(requests.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current body text
    #[must_use]
    pub fn text(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .documents
            .get(id)
            .map(|d| String::from_utf16_lossy(&d.text))
    }

    /// Styles applied so far
    #[must_use]
    pub fn styles(&self, id: &str) -> Vec<AppliedStyle> {
        self.state
            .lock()
            .documents
            .get(id)
            .map(|d| d.styles.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocsBackend for FakeDocs {
    async fn get_document(&self, document_id: &str) -> Result<Document, RemoteError> {
        let mut state = self.state.lock();
        state.record(Call::GetDocument(document_id.to_string()))?;
        Ok(state.document_mut(document_id)?.render(document_id))
    }

    async fn create_document(&self, title: &str) -> Result<Document, RemoteError> {
        let mut state = self.state.lock();
        state.record(Call::CreateDocument(title.to_string()))?;
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        let document = FakeDocument::new(title, "\n");
        let rendered = document.render(&id);
        state.documents.insert(id, document);
        Ok(rendered)
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[EditOperation],
    ) -> Result<BatchUpdateResponse, RemoteError> {
        let mut state = self.state.lock();
        state.record(Call::BatchUpdate {
            document_id: document_id.to_string(),
            requests: requests.to_vec(),
        })?;

        let document = state.document_mut(document_id)?;
        let mut staged = document.clone();
        for op in requests {
            staged.apply(op)?;
        }
        *document = staged;

        Ok(BatchUpdateResponse {
            document_id: document_id.to_string(),
            replies: vec![serde_json::json!({}); requests.len()],
        })
    }

    async fn create_permission(
        &self,
        document_id: &str,
        permission: &Permission,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock();
        state.record(Call::CreatePermission {
            document_id: document_id.to_string(),
            permission: permission.clone(),
        })?;
        state.document_mut(document_id).map(|_| ())
    }

    async fn create_table(
        &self,
        document_id: &str,
        request: &TableRequest,
    ) -> Result<BatchUpdateResponse, RemoteError> {
        let mut state = self.state.lock();
        state.record(Call::CreateTable {
            document_id: document_id.to_string(),
            request: request.clone(),
        })?;
        state.document_mut(document_id)?;
        Ok(BatchUpdateResponse {
            document_id: document_id.to_string(),
            replies: Vec::new(),
        })
    }
}

/// Retry event seen by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq)]
pub enum RetryEvent {
    Failed { operation: String, attempt: u32 },
    Waiting { operation: String, attempt: u32, wait: Duration },
    GaveUp { operation: String, attempts: u32 },
}

/// Observer that keeps every retry event
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RetryEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn events(&self) -> Vec<RetryEvent> {
        self.events.lock().clone()
    }

    /// Wait durations, in order
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                RetryEvent::Waiting { wait, .. } => Some(*wait),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, RetryEvent::Failed { .. }))
            .count()
    }
}

impl RetryObserver for RecordingObserver {
    fn attempt_failed(&self, operation: &str, attempt: u32, _max_attempts: u32, _error: &RemoteError) {
        self.events.lock().push(RetryEvent::Failed {
            operation: operation.to_string(),
            attempt,
        });
    }

    fn waiting(&self, operation: &str, attempt: u32, wait: Duration) {
        self.events.lock().push(RetryEvent::Waiting {
            operation: operation.to_string(),
            attempt,
            wait,
        });
    }

    fn giving_up(&self, operation: &str, attempts: u32, _error: &RemoteError) {
        self.events.lock().push(RetryEvent::GaveUp {
            operation: operation.to_string(),
            attempts,
        });
    }
}

/// Config with the documented defaults (2s delay, 5 attempts)
#[must_use]
pub fn default_config() -> SessionConfig {
    SessionConfig::new().with_retry(RetryPolicy::new())
}

/// Session over `backend` that records retry events
pub fn setup_session(
    backend: Arc<FakeDocs>,
    config: SessionConfig,
) -> (DocumentSession, Arc<RecordingObserver>) {
    let observer = RecordingObserver::new();
    let session = DocumentSession::with_observer(backend, config, observer.clone());
    (session, observer)
}

/// Install a fmt subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
