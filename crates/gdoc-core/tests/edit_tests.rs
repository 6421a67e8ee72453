use gdoc_core::{
    DocsError, EditOperation, ImageSize, PageBreakOutcome, RemoteErrorKind, RetryClassification,
    RetryPolicy, SessionConfig, TabularData, DEFAULT_PAGE_BREAK_MARKER,
};
use gdoc_test_utils::{default_config, setup_session, AppliedStyle, Call, Endpoint, FakeDocs};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn end_index_of_fresh_and_seeded_documents() {
    let fake = Arc::new(FakeDocs::new().with_document("seeded", "Hello\nWorld\n"));
    let (mut session, _) = setup_session(fake.clone(), default_config());

    session.create("Fresh", false).await.unwrap();
    assert_eq!(session.resolve_end_index().await.unwrap(), 1);

    session.set_document("seeded");
    // Last paragraph "World\n" spans [7, 13).
    assert_eq!(session.resolve_end_index().await.unwrap(), 12);
}

#[tokio::test(start_paused = true)]
async fn paragraphs_are_separate_batches_in_order_with_pauses() {
    let fake = Arc::new(FakeDocs::new());
    let config = default_config().with_paragraph_pause(Duration::from_secs(3));
    let (mut session, _) = setup_session(fake.clone(), config);
    let doc = session.create("Notes", false).await.unwrap();

    let responses = session
        .edits()
        .unwrap()
        .insert_paragraphs(["one", "two", "three"])
        .await
        .unwrap();

    assert_eq!(responses.len(), 3);
    assert_eq!(
        fake.endpoints(),
        vec![
            Endpoint::CreateDocument,
            Endpoint::GetDocument,
            Endpoint::BatchUpdate,
            Endpoint::GetDocument,
            Endpoint::BatchUpdate,
            Endpoint::GetDocument,
            Endpoint::BatchUpdate,
        ]
    );
    assert_eq!(
        fake.batches(),
        vec![
            vec![EditOperation::insert_text(1, "one\n")],
            vec![EditOperation::insert_text(5, "two\n")],
            vec![EditOperation::insert_text(9, "three\n")],
        ]
    );
    assert_eq!(fake.text(doc.as_str()).unwrap(), "one\ntwo\nthree\n\n");

    let batch_times: Vec<_> = fake
        .calls()
        .into_iter()
        .filter(|c| matches!(c.call, Call::BatchUpdate { .. }))
        .map(|c| c.at)
        .collect();
    for pair in batch_times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(3));
    }
}

#[tokio::test(start_paused = true)]
async fn single_paragraph_has_no_pause() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "\n"));
    let (session, _) = setup_session(fake.clone(), default_config());
    let session = session.with_document("d");
    let start = tokio::time::Instant::now();

    session.edits().unwrap().insert_paragraphs(["only"]).await.unwrap();

    assert!(start.elapsed() < Duration::from_millis(100));
    assert_eq!(fake.text("d").unwrap(), "only\n\n");
}

#[tokio::test(start_paused = true)]
async fn heading_inserts_text_and_style_in_one_batch() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "Intro\n\n"));
    let (session, _) = setup_session(fake.clone(), default_config());
    let session = session.with_document("d");

    session
        .edits()
        .unwrap()
        .insert_heading("Results", 2)
        .await
        .unwrap();

    assert_eq!(fake.batches().len(), 1);
    assert_eq!(fake.text("d").unwrap(), "Intro\nResults\n\n");
    assert_eq!(
        fake.styles("d"),
        vec![AppliedStyle {
            start_index: 7,
            end_index: 14,
            named_style_type: "HEADING_2".to_string(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn appends_land_before_trailing_newline() {
    let fake = Arc::new(FakeDocs::new());
    let (mut session, _) = setup_session(fake.clone(), default_config());
    let doc = session.create("Mixed", false).await.unwrap();
    let edits = session.edits().unwrap();

    edits.insert_heading("Title", 1).await.unwrap();
    edits.insert_spacer().await.unwrap();
    edits.insert_image("https://example.com/chart.png", ImageSize::default()).await.unwrap();
    edits.insert_page_break().await.unwrap();
    edits.insert_paragraph("after").await.unwrap();

    assert_eq!(
        fake.text(doc.as_str()).unwrap(),
        "Title\n\n\n\u{fffc}\u{c}after\n\n"
    );
}

#[tokio::test(start_paused = true)]
async fn explicit_index_insert_skips_resolution() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "world\n"));
    let (session, _) = setup_session(fake.clone(), default_config());
    let session = session.with_document("d");

    session.edits().unwrap().insert_text("hello ", 1).await.unwrap();

    assert_eq!(fake.count(Endpoint::GetDocument), 0);
    assert_eq!(fake.text("d").unwrap(), "hello world\n");
}

#[tokio::test(start_paused = true)]
async fn page_break_without_marker_is_a_no_op() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "nothing here\n"));
    let (session, _) = setup_session(fake.clone(), default_config());
    let session = session.with_document("d");

    let outcome = session
        .edits()
        .unwrap()
        .replace_string_with_page_break(DEFAULT_PAGE_BREAK_MARKER)
        .await
        .unwrap();

    assert_eq!(outcome, PageBreakOutcome::NoOccurrences);
    assert_eq!(fake.count(Endpoint::BatchUpdate), 0);
}

#[tokio::test(start_paused = true)]
async fn single_marker_becomes_page_break() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "intro\n<pagebreak>\ntail\n"));
    let (session, _) = setup_session(fake.clone(), default_config());
    let session = session.with_document("d");

    let outcome = session
        .edits()
        .unwrap()
        .replace_string_with_page_break("<pagebreak>")
        .await
        .unwrap();

    match outcome {
        PageBreakOutcome::Applied { occurrences, .. } => assert_eq!(occurrences, 1),
        PageBreakOutcome::NoOccurrences => panic!("expected a batch"),
    }
    assert_eq!(
        fake.batches(),
        vec![vec![
            EditOperation::replace_all("<pagebreak>", ""),
            EditOperation::insert_page_break(7),
        ]]
    );
    assert_eq!(fake.text("d").unwrap(), "intro\n\u{c}\ntail\n");
}

/// Two markers: the global replace shrinks the document before the second
/// page break, whose index was taken before the replace.
#[tokio::test(start_paused = true)]
async fn multiple_markers_drift_past_end() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "a<pagebreak>\nb<pagebreak>\n"));
    let config = SessionConfig::new().with_retry(
        RetryPolicy::new().with_classification(RetryClassification::TransientOnly),
    );
    let (session, observer) = setup_session(fake.clone(), config);
    let session = session.with_document("d");

    let err = session
        .edits()
        .unwrap()
        .replace_string_with_page_break("<pagebreak>")
        .await
        .unwrap_err();

    assert_eq!(
        err.remote().map(gdoc_core::RemoteError::kind),
        Some(RemoteErrorKind::InvalidRequest)
    );
    let batches = fake.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 4);
    assert_eq!(batches[0][3], EditOperation::insert_page_break(14));
    assert_eq!(observer.failures(), 1);
    // Batch was rejected as a whole.
    assert_eq!(fake.text("d").unwrap(), "a<pagebreak>\nb<pagebreak>\n");
}

#[tokio::test(start_paused = true)]
async fn table_request_carries_header_and_counts() {
    let fake = Arc::new(FakeDocs::new());
    let (mut session, _) = setup_session(fake.clone(), default_config());
    let doc = session.create("Table", false).await.unwrap();
    let data = TabularData::from_display(["Column1", "Column2"], [[1, 3], [2, 4]]).unwrap();

    session.edits().unwrap().create_table(&data).await.unwrap();

    assert_eq!(fake.count(Endpoint::BatchUpdate), 0);
    let request = fake
        .calls()
        .into_iter()
        .find_map(|c| match c.call {
            Call::CreateTable {
                document_id,
                request,
            } => {
                assert_eq!(document_id, doc.as_str());
                Some(request)
            }
            _ => None,
        })
        .expect("table call recorded");
    assert_eq!(request.rows, 3);
    assert_eq!(request.columns, 2);
    assert!(request.append);
    assert_eq!(request.values[0], vec!["Column1", "Column2"]);
    assert_eq!(request.values[1], vec!["1", "3"]);
}

#[tokio::test(start_paused = true)]
async fn heading_level_out_of_range() {
    let fake = Arc::new(FakeDocs::new().with_document("d", "\n"));
    let (session, _) = setup_session(fake.clone(), default_config());
    let session = session.with_document("d");

    let err = session.edits().unwrap().insert_heading("x", 0).await.unwrap_err();

    assert!(matches!(err, DocsError::InvalidHeadingLevel(0)));
    assert!(fake.calls().is_empty());
}
