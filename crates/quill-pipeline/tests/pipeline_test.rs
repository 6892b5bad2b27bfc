//! End-to-end pipeline tests.
//!
//! The database-backed tests skip themselves when no Postgres test
//! database is reachable; the external provider is a wiremock server.

use quill_core::{
    defaults, plain_text, Block, CategoryRepository, CreateNoteRequest, NoteFilter,
    NoteRepository,
};
use quill_db::test_fixtures::TestDatabase;
use quill_inference::{
    BasicSummarizer, GenAiProvider, GenerationStrategy, ProviderConfig,
};
use quill_pipeline::{GenerationPipeline, PdfUpload};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fallback_pipeline(test_db: &TestDatabase) -> GenerationPipeline {
    GenerationPipeline::new(
        test_db.db.clone(),
        GenerationStrategy::Fallback(BasicSummarizer::new()),
    )
}

fn external_pipeline(test_db: &TestDatabase, server: &MockServer) -> GenerationPipeline {
    let provider = GenAiProvider::new(
        ProviderConfig::default()
            .with_api_key("test-key")
            .with_base_url(server.uri()),
    )
    .unwrap();
    GenerationPipeline::new(test_db.db.clone(), GenerationStrategy::External(provider))
}

fn pdf_upload(filename: &str) -> PdfUpload {
    PdfUpload {
        filename: filename.to_string(),
        mime_type: defaults::PDF_MIME.to_string(),
        bytes: b"%PDF-1.4 minimal test document".to_vec(),
    }
}

async fn mount_generation(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_summarize_with_fallback_strategy() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    test_db
        .db
        .notes
        .create(CreateNoteRequest::text(
            "src",
            "alice",
            "Lecture",
            vec![Block::paragraph(
                "paragraph-1",
                "Entropy always increases. Except in your room. Allegedly.",
            )],
        ))
        .await
        .unwrap();

    let pipeline = fallback_pipeline(&test_db);
    let outcome = pipeline.summarize("src").await.unwrap();
    assert!(!outcome.degraded);

    let note = test_db
        .db
        .notes
        .get_by_doc_id(&outcome.doc_id)
        .await
        .unwrap();
    assert_eq!(note.title, "Summary of Lecture");
    assert_eq!(note.owner_id, "alice");
    assert_eq!(note.category.as_deref(), Some(defaults::SUMMARY_CATEGORY));
    assert_eq!(note.tags, vec!["llm", "summary"]);
    assert!(plain_text(&note.content).contains("Entropy always increases."));

    // The pipeline category was auto-provisioned.
    let categories = test_db.db.categories.list("alice").await.unwrap();
    assert!(categories
        .iter()
        .any(|c| c.name == defaults::SUMMARY_CATEGORY));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_summarize_empty_note_still_produces_a_note() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    // Content decodes to empty text: a block with no text runs.
    let empty_block: Block = serde_json::from_str(r#"{"id":"b1","type":"paragraph"}"#).unwrap();
    test_db
        .db
        .notes
        .create(CreateNoteRequest::text(
            "hollow",
            "alice",
            "Empty",
            vec![empty_block],
        ))
        .await
        .unwrap();

    let pipeline = fallback_pipeline(&test_db);
    let outcome = pipeline.summarize("hollow").await.unwrap();

    let note = test_db
        .db
        .notes
        .get_by_doc_id(&outcome.doc_id)
        .await
        .unwrap();
    assert!(plain_text(&note.content).contains(defaults::FALLBACK_INSUFFICIENT_CONTENT));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_summarize_missing_note_is_not_found() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let pipeline = fallback_pipeline(&test_db);
    let err = pipeline.summarize("no-such-doc").await.unwrap_err();
    assert_eq!(err.kind(), "not_found");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_pdf_import_without_provider_creates_placeholder() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let pipeline = fallback_pipeline(&test_db);
    let outcome = pipeline
        .import_pdf("alice", pdf_upload("syllabus.pdf"))
        .await
        .unwrap();
    assert!(outcome.degraded);
    assert!(outcome.message.contains("placeholder"));

    let note = test_db
        .db
        .notes
        .get_by_doc_id(&outcome.doc_id)
        .await
        .unwrap();
    assert_eq!(note.title, "PDF Upload: syllabus");
    assert!(note.tags.contains(&"error".to_string()));
    assert!(note.tags.contains(&"pdf-upload".to_string()));
    assert_eq!(note.preview, defaults::PLACEHOLDER_PREVIEW);
    assert_eq!(note.category.as_deref(), Some(defaults::GENERATED_CATEGORY));

    let categories = test_db.db.categories.list("alice").await.unwrap();
    assert!(categories
        .iter()
        .any(|c| c.name == defaults::GENERATED_CATEGORY));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_pdf_import_rejects_invalid_uploads() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let pipeline = fallback_pipeline(&test_db);

    let mut wrong_mime = pdf_upload("notes.pdf");
    wrong_mime.mime_type = "text/plain".to_string();
    let err = pipeline.import_pdf("alice", wrong_mime).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    let mut not_a_pdf = pdf_upload("fake.pdf");
    not_a_pdf.bytes = b"plain text masquerading".to_vec();
    let err = pipeline.import_pdf("alice", not_a_pdf).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = pipeline
        .import_pdf("", pdf_upload("doc.pdf"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_pdf_import_with_external_provider() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };
    let server = MockServer::start().await;
    mount_generation(&server, "Chapter one begins.\n\nChapter two follows.").await;

    let pipeline = external_pipeline(&test_db, &server);
    let outcome = pipeline
        .import_pdf("alice", pdf_upload("lecture.pdf"))
        .await
        .unwrap();
    assert!(!outcome.degraded);

    let note = test_db
        .db
        .notes
        .get_by_doc_id(&outcome.doc_id)
        .await
        .unwrap();
    assert_eq!(note.title, "Note from PDF: lecture");
    assert_eq!(note.tags, vec!["pdf-import", "genai"]);
    assert!(note.preview.starts_with("Chapter one begins."));
    // Heading block plus one paragraph per non-blank line.
    assert_eq!(note.content.len(), 3);
    assert_eq!(note.content[0].kind, "heading");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_quiz_with_external_provider() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };
    let server = MockServer::start().await;
    mount_generation(&server, "1. What is entropy?\n2. Why does it increase?").await;

    test_db
        .db
        .notes
        .create(CreateNoteRequest::text(
            "src",
            "bob",
            "Thermo",
            vec![Block::paragraph("paragraph-1", "Entropy notes.")],
        ))
        .await
        .unwrap();

    let pipeline = external_pipeline(&test_db, &server);
    let outcome = pipeline.quiz("src").await.unwrap();

    let note = test_db
        .db
        .notes
        .get_by_doc_id(&outcome.doc_id)
        .await
        .unwrap();
    assert_eq!(note.title, "Quiz Questions of Thermo");
    assert_eq!(note.category.as_deref(), Some(defaults::QUIZ_CATEGORY));
    assert_eq!(note.tags, vec!["llm", "quiz"]);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_provider_failure_surfaces_and_creates_nothing() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    test_db
        .db
        .notes
        .create(CreateNoteRequest::text("src", "bob", "T", vec![]))
        .await
        .unwrap();

    let pipeline = external_pipeline(&test_db, &server);
    let err = pipeline.summarize("src").await.unwrap_err();
    assert_eq!(err.kind(), "external_service");

    // No silent degradation: the source note is still the only one.
    let notes = test_db
        .db
        .notes
        .list_by_owner("bob", NoteFilter::All)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);

    test_db.cleanup().await;
}
