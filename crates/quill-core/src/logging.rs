//! Structured logging schema and field name constants for quill.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized names
//! across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, degraded path taken |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "db", "inference", "pipeline", "events"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "notes", "categories", "pool", "provider", "bus"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "rename", "import_pdf", "generate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Owner identifier the operation is scoped to.
pub const OWNER_ID: &str = "owner_id";

/// Note storage UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Client-visible note document id.
pub const DOC_ID: &str = "doc_id";

/// Category name involved in the operation.
pub const CATEGORY: &str = "category";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of dependent rows touched by a cascade.
pub const CASCADE_COUNT: &str = "cascade_count";

/// Byte length of a prompt or payload.
pub const PAYLOAD_LEN: &str = "payload_len";

/// Byte length of a provider response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Pipeline stage active when an outcome was produced.
pub const STAGE: &str = "stage";

/// Initialize a global tracing subscriber from `RUST_LOG`.
///
/// The HTTP surface that would normally own subscriber setup is out of
/// scope, so library consumers and tests opt in here. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
