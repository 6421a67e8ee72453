//! Edit batcher
//!
//! One method per content type. Appends follow the same pattern:
//! 1. Resolve the current end index (fresh remote read)
//! 2. Build the edit operations against it
//! 3. Submit them as one batch through the backoff executor
//!
//! A multi-paragraph insert repeats this per paragraph, pausing between
//! batches to stay under the service's write quota.

use crate::backend::DocsBackend;
use crate::backoff::BackoffExecutor;
use crate::document::{utf16_len, Document};
use crate::error::{DocsError, RemoteError};
use crate::ops::EditOperation;
use crate::position::PositionResolver;
use crate::table::TabularData;
use crate::types::{BatchUpdateResponse, DocumentHandle, ImageSize, PageBreakOutcome};
use std::time::Duration;

/// Default marker replaced by [`EditBatcher::replace_string_with_page_break`]
pub const DEFAULT_PAGE_BREAK_MARKER: &str = "<pagebreak>";

/// Operations for a heading: the text, then its paragraph style
///
/// The style range covers the heading text only, not the trailing newline.
///
/// # Errors
/// - `DocsError::InvalidHeadingLevel` unless `1 <= level <= 6`
pub fn heading_operations(index: i64, text: &str, level: u8) -> Result<Vec<EditOperation>, DocsError> {
    if !(1..=6).contains(&level) {
        return Err(DocsError::InvalidHeadingLevel(level));
    }
    Ok(vec![
        EditOperation::insert_text(index, format!("{text}\n")),
        EditOperation::heading_style(index, index + utf16_len(text), level),
    ])
}

/// Replace/page-break pairs for every paragraph text run containing `marker`
///
/// Returns the operations and the number of runs that matched. The replace
/// is global while each page break is positional, so with more than one
/// match the later page breaks land at pre-removal indices.
#[must_use]
pub fn page_break_operations(document: &Document, marker: &str) -> (Vec<EditOperation>, usize) {
    if marker.is_empty() {
        return (Vec::new(), 0);
    }
    let mut requests = Vec::new();
    let mut occurrences = 0;
    for run in document.text_runs().filter(|run| run.content.contains(marker)) {
        occurrences += 1;
        requests.push(EditOperation::replace_all(marker, ""));
        requests.push(EditOperation::insert_page_break(run.start_index));
    }
    (requests, occurrences)
}

/// Builds and submits edit batches against one document
#[derive(Clone, Copy)]
pub struct EditBatcher<'a> {
    backend: &'a dyn DocsBackend,
    executor: &'a BackoffExecutor,
    handle: &'a DocumentHandle,
    paragraph_pause: Duration,
}

impl<'a> EditBatcher<'a> {
    /// Create batcher for `handle`
    #[inline]
    #[must_use]
    pub fn new(
        backend: &'a dyn DocsBackend,
        executor: &'a BackoffExecutor,
        handle: &'a DocumentHandle,
        paragraph_pause: Duration,
    ) -> Self {
        Self {
            backend,
            executor,
            handle,
            paragraph_pause,
        }
    }

    /// Target document
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &DocumentHandle {
        self.handle
    }

    fn resolver(&self) -> PositionResolver<'a> {
        PositionResolver::new(self.backend, self.executor)
    }

    /// Submit `requests` as one batch
    ///
    /// # Errors
    /// The last `RemoteError` once retries are exhausted
    pub async fn submit(&self, requests: &[EditOperation]) -> Result<BatchUpdateResponse, RemoteError> {
        tracing::debug!(
            document = %self.handle,
            requests = requests.len(),
            first = requests.first().map_or("-", EditOperation::kind),
            "submitting batch"
        );
        let backend = self.backend;
        let id = self.handle.as_str();
        self.executor
            .execute("documents.batchUpdate", || backend.batch_update(id, requests))
            .await
    }

    async fn end_index(&self) -> Result<i64, RemoteError> {
        self.resolver().resolve_end_index(self.handle).await
    }

    /// Insert `text` at an explicit `index`
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn insert_text(&self, text: &str, index: i64) -> Result<BatchUpdateResponse, DocsError> {
        Ok(self
            .submit(&[EditOperation::insert_text(index, text)])
            .await?)
    }

    /// Append an empty line pair
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn insert_spacer(&self) -> Result<BatchUpdateResponse, DocsError> {
        let index = self.end_index().await?;
        self.insert_text("\n\n", index).await
    }

    /// Append a `HEADING_{level}` paragraph
    ///
    /// # Errors
    /// - `DocsError::InvalidHeadingLevel` unless `1 <= level <= 6`
    /// - `DocsError::Remote` once retries are exhausted
    pub async fn insert_heading(&self, text: &str, level: u8) -> Result<BatchUpdateResponse, DocsError> {
        if !(1..=6).contains(&level) {
            return Err(DocsError::InvalidHeadingLevel(level));
        }
        let index = self.end_index().await?;
        let requests = heading_operations(index, text, level)?;
        Ok(self.submit(&requests).await?)
    }

    /// Append one paragraph
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn insert_paragraph(&self, text: &str) -> Result<BatchUpdateResponse, DocsError> {
        let index = self.end_index().await?;
        self.insert_text(&format!("{text}\n"), index).await
    }

    /// Append paragraphs in order, one batch each, pausing between batches
    ///
    /// # Errors
    /// `DocsError::Remote` from the first paragraph that fails; earlier
    /// paragraphs stay in the document
    pub async fn insert_paragraphs<I, S>(&self, paragraphs: I) -> Result<Vec<BatchUpdateResponse>, DocsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .map(|p| p.as_ref().to_owned())
            .collect();

        let mut responses = Vec::with_capacity(paragraphs.len());
        for (i, paragraph) in paragraphs.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.paragraph_pause).await;
            }
            responses.push(self.insert_paragraph(paragraph).await?);
        }
        tracing::info!(document = %self.handle, count = responses.len(), "inserted paragraphs");
        Ok(responses)
    }

    /// Append an inline image
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn insert_image(&self, uri: &str, size: ImageSize) -> Result<BatchUpdateResponse, DocsError> {
        let index = self.end_index().await?;
        let request = EditOperation::insert_image(index, uri, size.to_object_size());
        Ok(self.submit(&[request]).await?)
    }

    /// Replace every paragraph text run containing `marker` with a page break
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn replace_string_with_page_break(&self, marker: &str) -> Result<PageBreakOutcome, DocsError> {
        if marker.is_empty() {
            return Ok(PageBreakOutcome::NoOccurrences);
        }
        let document = self.resolver().fetch(self.handle).await?;
        let (requests, occurrences) = page_break_operations(&document, marker);
        if requests.is_empty() {
            tracing::info!(document = %self.handle, marker, "no occurrences of marker found");
            return Ok(PageBreakOutcome::NoOccurrences);
        }
        if occurrences > 1 {
            tracing::warn!(
                document = %self.handle,
                occurrences,
                "marker found in several runs; page breaks after the first use pre-removal indices"
            );
        }
        let response = self.submit(&requests).await?;
        Ok(PageBreakOutcome::Applied {
            occurrences,
            response,
        })
    }

    /// Append a page break
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn insert_page_break(&self) -> Result<BatchUpdateResponse, DocsError> {
        let index = self.end_index().await?;
        Ok(self.submit(&[EditOperation::insert_page_break(index)]).await?)
    }

    /// Append a table holding `data`, header row first
    ///
    /// # Errors
    /// `DocsError::Remote` once retries are exhausted
    pub async fn create_table(&self, data: &TabularData) -> Result<BatchUpdateResponse, DocsError> {
        let request = data.to_request(true);
        tracing::debug!(
            document = %self.handle,
            rows = request.rows,
            columns = request.columns,
            "creating table"
        );
        let backend = self.backend;
        let id = self.handle.as_str();
        let request = &request;
        Ok(self
            .executor
            .execute("table.create", || backend.create_table(id, request))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockDocsBackend;
    use crate::config::RetryPolicy;
    use crate::document::StructuralElement;
    use crate::ops::Location;
    use pretty_assertions::assert_eq;

    fn fast_executor() -> BackoffExecutor {
        BackoffExecutor::new(
            RetryPolicy::new()
                .with_initial_delay(Duration::from_millis(1))
                .with_max_jitter(Duration::ZERO),
        )
    }

    /// Single-paragraph document whose last element ends at `end`.
    fn doc_ending_at(end: i64) -> Document {
        let filler = "x".repeat(usize::try_from(end - 2).unwrap());
        Document::with_content(
            "doc-1",
            vec![StructuralElement::paragraph(1, &format!("{filler}\n"))],
        )
    }

    #[test]
    fn heading_range_excludes_newline() {
        let ops = heading_operations(10, "Intro", 1).unwrap();
        assert_eq!(ops[0], EditOperation::insert_text(10, "Intro\n"));
        assert_eq!(ops[1], EditOperation::heading_style(10, 15, 1));
    }

    #[test]
    fn heading_range_counts_utf16_units() {
        let ops = heading_operations(1, "Café 😀", 2).unwrap();
        assert_eq!(ops[1], EditOperation::heading_style(1, 8, 2));
    }

    #[test]
    fn heading_level_validated() {
        assert!(matches!(
            heading_operations(1, "x", 0),
            Err(DocsError::InvalidHeadingLevel(0))
        ));
        assert!(matches!(
            heading_operations(1, "x", 7),
            Err(DocsError::InvalidHeadingLevel(7))
        ));
    }

    #[test]
    fn page_break_pairs_per_matching_run() {
        let doc = Document::with_content(
            "d",
            vec![
                StructuralElement::section_break(),
                StructuralElement::paragraph(1, "intro\n"),
                StructuralElement::paragraph(7, "<pagebreak>\n"),
                StructuralElement::paragraph(19, "tail\n"),
            ],
        );

        let (ops, occurrences) = page_break_operations(&doc, "<pagebreak>");
        assert_eq!(occurrences, 1);
        assert_eq!(
            ops,
            vec![
                EditOperation::replace_all("<pagebreak>", ""),
                EditOperation::insert_page_break(7),
            ]
        );
    }

    #[test]
    fn page_break_without_match() {
        let doc = Document::with_content("d", vec![StructuralElement::paragraph(1, "plain\n")]);
        let (ops, occurrences) = page_break_operations(&doc, "<pagebreak>");
        assert!(ops.is_empty());
        assert_eq!(occurrences, 0);
        assert_eq!(page_break_operations(&doc, "").1, 0);
    }

    #[tokio::test]
    async fn heading_resolves_then_submits_one_batch() {
        let mut backend = MockDocsBackend::new();
        backend
            .expect_get_document()
            .times(1)
            .returning(|_| Ok(doc_ending_at(13)));
        backend
            .expect_batch_update()
            .withf(|id, requests| {
                id == "doc-1"
                    && requests.to_vec()
                        == vec![
                            EditOperation::insert_text(12, "Summary\n"),
                            EditOperation::heading_style(12, 19, 1),
                        ]
            })
            .times(1)
            .returning(|id, _| {
                Ok(BatchUpdateResponse {
                    document_id: id.to_string(),
                    replies: vec![],
                })
            });

        let exec = fast_executor();
        let handle = DocumentHandle::new("doc-1");
        let batcher = EditBatcher::new(&backend, &exec, &handle, Duration::ZERO);

        let response = batcher.insert_heading("Summary", 1).await.unwrap();
        assert_eq!(response.document_id, "doc-1");
    }

    #[tokio::test]
    async fn invalid_heading_makes_no_remote_call() {
        let backend = MockDocsBackend::new();
        let exec = fast_executor();
        let handle = DocumentHandle::new("doc-1");
        let batcher = EditBatcher::new(&backend, &exec, &handle, Duration::ZERO);

        let err = batcher.insert_heading("x", 9).await.unwrap_err();
        assert!(matches!(err, DocsError::InvalidHeadingLevel(9)));
    }

    #[tokio::test]
    async fn image_uses_end_index_and_points() {
        let mut backend = MockDocsBackend::new();
        backend
            .expect_get_document()
            .returning(|_| Ok(Document::default()));
        backend
            .expect_batch_update()
            .withf(|_, requests| match &requests[..] {
                [EditOperation::InsertImage {
                    location: Location { index: 1 },
                    uri,
                    object_size,
                }] => uri == "https://example.com/a.png" && object_size.width.magnitude == 120.0,
                _ => false,
            })
            .times(1)
            .returning(|_, _| Ok(BatchUpdateResponse::default()));

        let exec = fast_executor();
        let handle = DocumentHandle::new("doc-1");
        let batcher = EditBatcher::new(&backend, &exec, &handle, Duration::ZERO);

        batcher
            .insert_image("https://example.com/a.png", ImageSize::new(120.0, 80.0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn table_goes_to_table_endpoint() {
        let mut backend = MockDocsBackend::new();
        backend.expect_batch_update().never();
        backend
            .expect_create_table()
            .withf(|id, request| {
                id == "doc-1"
                    && request.rows == 3
                    && request.columns == 2
                    && request.append
                    && request.values[0] == ["Column1", "Column2"]
            })
            .times(1)
            .returning(|_, _| Ok(BatchUpdateResponse::default()));

        let exec = fast_executor();
        let handle = DocumentHandle::new("doc-1");
        let batcher = EditBatcher::new(&backend, &exec, &handle, Duration::ZERO);
        let data = TabularData::from_display(["Column1", "Column2"], [[1, 3], [2, 4]]).unwrap();

        batcher.create_table(&data).await.unwrap();
    }

    #[tokio::test]
    async fn empty_marker_is_a_no_op() {
        let backend = MockDocsBackend::new();
        let exec = fast_executor();
        let handle = DocumentHandle::new("doc-1");
        let batcher = EditBatcher::new(&backend, &exec, &handle, Duration::ZERO);

        let outcome = batcher.replace_string_with_page_break("").await.unwrap();
        assert_eq!(outcome, PageBreakOutcome::NoOccurrences);
    }
}
