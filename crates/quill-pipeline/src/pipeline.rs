//! The content-generation pipeline.
//!
//! Orchestrates fetch → decode → generate → encode → persist for the
//! three entry points: PDF import, summarize, and quiz. The external
//! call is the single long-latency step; no store lock is held while it
//! is in flight (the pipeline only reads before and writes after), and
//! once generation starts the operation runs to completion or typed
//! failure. There is no mid-pipeline cancellation and no automatic
//! retry.

use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use quill_core::{
    blocks_from_plain_text, defaults, plain_text, preview_from_text, CategoryRepository,
    CreateNoteRequest, Error, Note, NoteRepository, Result,
};
use quill_db::Database;
use quill_inference::{GenerationInput, GenerationStrategy, GenerationTask};

/// Pipeline stages, carried in log context so failures name where they
/// happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetching,
    Decoding,
    Generating,
    Encoding,
    Persisting,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Decoding => "decoding",
            Self::Generating => "generating",
            Self::Encoding => "encoding",
            Self::Persisting => "persisting",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document, as delivered by the file transport collaborator.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    /// Original filename, used for the note title.
    pub filename: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    /// Validate type and size before anything else runs.
    ///
    /// The declared MIME type must be a PDF, the bytes must actually
    /// look like one, and the size must stay under the ceiling.
    fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(Error::Validation("uploaded file is empty".to_string()));
        }
        if self.mime_type != defaults::PDF_MIME {
            return Err(Error::Validation(format!(
                "unsupported file type '{}', expected {}",
                self.mime_type,
                defaults::PDF_MIME
            )));
        }
        if self.bytes.len() > defaults::PDF_MAX_BYTES {
            return Err(Error::Validation(format!(
                "file exceeds maximum size of {} bytes",
                defaults::PDF_MAX_BYTES
            )));
        }
        let detected = infer::get(&self.bytes).map(|kind| kind.mime_type());
        if detected != Some(defaults::PDF_MIME) {
            return Err(Error::Validation(format!(
                "file '{}' is not a valid PDF",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Doc id of the newly created note.
    pub doc_id: String,
    /// Storage id of the newly created note.
    pub note_id: Uuid,
    /// Human-readable success message.
    pub message: String,
    /// True when the placeholder path ran instead of real processing.
    pub degraded: bool,
}

/// Orchestrates content generation end to end.
pub struct GenerationPipeline {
    db: Database,
    strategy: GenerationStrategy,
}

impl GenerationPipeline {
    /// Create a pipeline over the given database and strategy.
    pub fn new(db: Database, strategy: GenerationStrategy) -> Self {
        Self { db, strategy }
    }

    /// The configured strategy.
    pub fn strategy(&self) -> &GenerationStrategy {
        &self.strategy
    }

    /// Import a PDF as a new note for `owner_id`.
    ///
    /// With a document-capable strategy, the provider extracts the
    /// text. Otherwise (fallback selected, or provider credentials
    /// missing/placeholder) the pre-flight check routes to a
    /// placeholder note and the call still succeeds, degraded.
    pub async fn import_pdf(&self, owner_id: &str, upload: PdfUpload) -> Result<PipelineOutcome> {
        let start = Instant::now();
        if owner_id.trim().is_empty() {
            return Err(Error::Validation("owner uid is required".to_string()));
        }

        info!(
            subsystem = "pipeline",
            op = "import_pdf",
            stage = %PipelineStage::Fetching,
            owner_id = %owner_id,
            payload_len = upload.bytes.len(),
            "Starting PDF import"
        );
        upload.validate()?;

        if !self.strategy.supports_documents() {
            return self.persist_placeholder(owner_id, &upload).await;
        }

        // Decoding is a no-op for PDF: raw bytes go straight to the strategy.
        let input = GenerationInput::Document {
            mime_type: upload.mime_type.clone(),
            data: upload.bytes.clone(),
        };
        let text = self
            .strategy
            .generate(GenerationTask::PdfExtraction, &input)
            .await?;

        let content = blocks_from_plain_text(&text, "Note from PDF");
        let note = self
            .persist(
                defaults::GENERATED_CATEGORY,
                CreateNoteRequest::from_pdf(
                    owner_id,
                    &upload.filename,
                    content,
                    preview_from_text(&text),
                ),
            )
            .await?;

        info!(
            subsystem = "pipeline",
            op = "import_pdf",
            doc_id = %note.doc_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "PDF import completed"
        );
        Ok(PipelineOutcome {
            doc_id: note.doc_id,
            note_id: note.id,
            message: "Note created successfully from PDF".to_string(),
            degraded: false,
        })
    }

    /// Create a summary note from an existing note.
    pub async fn summarize(&self, doc_id: &str) -> Result<PipelineOutcome> {
        self.derive(doc_id, GenerationTask::Summary).await
    }

    /// Create a quiz-questions note from an existing note.
    pub async fn quiz(&self, doc_id: &str) -> Result<PipelineOutcome> {
        self.derive(doc_id, GenerationTask::Quiz).await
    }

    /// Shared summarize/quiz flow.
    async fn derive(&self, doc_id: &str, task: GenerationTask) -> Result<PipelineOutcome> {
        let start = Instant::now();

        info!(
            subsystem = "pipeline",
            op = task.as_str(),
            stage = %PipelineStage::Fetching,
            doc_id = %doc_id,
            "Starting derivation"
        );
        let source = self.db.notes.get_by_doc_id(doc_id).await?;

        let text = plain_text(&source.content);
        let generated = self
            .strategy
            .generate(task, &GenerationInput::Text(text))
            .await?;

        let (heading, category, message) = match task {
            GenerationTask::Summary => (
                "Summary",
                defaults::SUMMARY_CATEGORY,
                "Summary note created successfully",
            ),
            GenerationTask::Quiz => (
                "Quiz Questions",
                defaults::QUIZ_CATEGORY,
                "Quiz Questions note created successfully",
            ),
            GenerationTask::PdfExtraction => {
                return Err(Error::Internal(
                    "PDF extraction is not a note derivation".to_string(),
                ))
            }
        };

        let content = blocks_from_plain_text(&generated, heading);
        let preview = preview_from_text(&generated);
        let req = match task {
            GenerationTask::Summary => CreateNoteRequest::summary_of(&source, content, preview),
            _ => CreateNoteRequest::quiz_of(&source, content, preview),
        };
        let note = self.persist(category, req).await?;

        info!(
            subsystem = "pipeline",
            op = task.as_str(),
            doc_id = %note.doc_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Derivation completed"
        );
        Ok(PipelineOutcome {
            doc_id: note.doc_id,
            note_id: note.id,
            message: message.to_string(),
            degraded: false,
        })
    }

    /// Placeholder path for document input the strategy cannot process.
    async fn persist_placeholder(
        &self,
        owner_id: &str,
        upload: &PdfUpload,
    ) -> Result<PipelineOutcome> {
        warn!(
            subsystem = "pipeline",
            op = "import_pdf",
            stage = %PipelineStage::Persisting,
            owner_id = %owner_id,
            "Provider unavailable for documents; creating placeholder note"
        );

        let text = format!(
            "PDF processing is currently unavailable. Please check the server \
             configuration.\n\nThe administrator needs to add a valid provider API key to \
             enable PDF processing.\n\nThe file '{}' was uploaded but could not be processed.",
            upload.filename
        );
        let content = blocks_from_plain_text(&text, "Note from PDF");
        let note = self
            .persist(
                defaults::GENERATED_CATEGORY,
                CreateNoteRequest::pdf_placeholder(owner_id, &upload.filename, content),
            )
            .await?;

        Ok(PipelineOutcome {
            doc_id: note.doc_id,
            note_id: note.id,
            message: "Note created with placeholder content. PDF processing unavailable."
                .to_string(),
            degraded: true,
        })
    }

    /// Auto-provision the pipeline category, then create the note.
    async fn persist(&self, category: &str, req: CreateNoteRequest) -> Result<Note> {
        self.db
            .categories
            .ensure_exists(&req.owner_id, category)
            .await?;
        self.db.notes.create(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Fetching.as_str(), "fetching");
        assert_eq!(PipelineStage::Persisting.to_string(), "persisting");
    }

    #[test]
    fn test_upload_validation_rejects_wrong_mime() {
        let upload = PdfUpload {
            filename: "notes.txt".into(),
            mime_type: "text/plain".into(),
            bytes: b"%PDF-1.4 pretend".to_vec(),
        };
        let err = upload.validate().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_upload_validation_rejects_empty_and_oversized() {
        let empty = PdfUpload {
            filename: "a.pdf".into(),
            mime_type: defaults::PDF_MIME.into(),
            bytes: vec![],
        };
        assert!(empty.validate().is_err());

        let oversized = PdfUpload {
            filename: "big.pdf".into(),
            mime_type: defaults::PDF_MIME.into(),
            bytes: vec![b'x'; defaults::PDF_MAX_BYTES + 1],
        };
        let err = oversized.validate().unwrap_err();
        assert!(err.to_string().contains("maximum size"));
    }

    #[test]
    fn test_upload_validation_checks_magic_bytes() {
        let fake = PdfUpload {
            filename: "fake.pdf".into(),
            mime_type: defaults::PDF_MIME.into(),
            bytes: b"this is not a pdf at all".to_vec(),
        };
        let err = fake.validate().unwrap_err();
        assert!(err.to_string().contains("not a valid PDF"));

        let real = PdfUpload {
            filename: "real.pdf".into(),
            mime_type: defaults::PDF_MIME.into(),
            bytes: b"%PDF-1.4 minimal".to_vec(),
        };
        assert!(real.validate().is_ok());
    }
}
