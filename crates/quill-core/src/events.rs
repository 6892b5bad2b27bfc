//! Domain events and the notification bus.
//!
//! Every committed store mutation is announced as a [`DomainEvent`] and
//! fanned out synchronously, in subscription order, to the registered
//! observers. An observer is a capability (a single-method callable),
//! not a base type to subclass. A panicking observer never prevents
//! delivery to the observers after it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{Category, Note};

/// Webhook delivery timeout in seconds.
const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// The five mutation kinds an event can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Delete,
    Archive,
    Star,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Archive => "archive",
            Self::Star => "star",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain event dispatched at the moment the owning operation commits.
///
/// Serialized with a `type` tag field for the webhook observer, e.g.
/// `{"type":"NoteCreated","note":{...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    NoteCreated {
        note: Note,
    },
    NoteUpdated {
        note: Note,
    },
    NoteDeleted {
        note_id: Uuid,
        doc_id: String,
        owner_id: String,
    },
    NoteArchived {
        note: Note,
        archived: bool,
    },
    NoteStarred {
        note: Note,
        starred: bool,
    },
    CategoryCreated {
        category: Category,
    },
    CategoryRenamed {
        category: Category,
        old_name: String,
        notes_updated: u64,
    },
    CategoryDeleted {
        category_id: Uuid,
        owner_id: String,
        name: String,
        notes_deleted: u64,
    },
}

impl DomainEvent {
    /// The mutation kind this event reports.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NoteCreated { .. } | Self::CategoryCreated { .. } => EventKind::Create,
            Self::NoteUpdated { .. } | Self::CategoryRenamed { .. } => EventKind::Update,
            Self::NoteDeleted { .. } | Self::CategoryDeleted { .. } => EventKind::Delete,
            Self::NoteArchived { .. } => EventKind::Archive,
            Self::NoteStarred { .. } => EventKind::Star,
        }
    }

    /// The entity type this event relates to.
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::NoteCreated { .. }
            | Self::NoteUpdated { .. }
            | Self::NoteDeleted { .. }
            | Self::NoteArchived { .. }
            | Self::NoteStarred { .. } => "note",
            Self::CategoryCreated { .. }
            | Self::CategoryRenamed { .. }
            | Self::CategoryDeleted { .. } => "category",
        }
    }

    /// The primary entity id this event relates to.
    pub fn entity_id(&self) -> Uuid {
        match self {
            Self::NoteCreated { note }
            | Self::NoteUpdated { note }
            | Self::NoteArchived { note, .. }
            | Self::NoteStarred { note, .. } => note.id,
            Self::NoteDeleted { note_id, .. } => *note_id,
            Self::CategoryCreated { category } | Self::CategoryRenamed { category, .. } => {
                category.id
            }
            Self::CategoryDeleted { category_id, .. } => *category_id,
        }
    }

    /// The owner the affected entity belongs to.
    pub fn owner_id(&self) -> &str {
        match self {
            Self::NoteCreated { note }
            | Self::NoteUpdated { note }
            | Self::NoteArchived { note, .. }
            | Self::NoteStarred { note, .. } => &note.owner_id,
            Self::NoteDeleted { owner_id, .. } | Self::CategoryDeleted { owner_id, .. } => owner_id,
            Self::CategoryCreated { category } | Self::CategoryRenamed { category, .. } => {
                &category.owner_id
            }
        }
    }
}

/// A registered event consumer.
///
/// `on_event` runs synchronously on the mutating caller's task; keep it
/// cheap and hand anything slow to a spawned task.
pub trait EventObserver: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Receive one event.
    fn on_event(&self, event: &DomainEvent);
}

/// Ordered fan-out bus over an explicit list of registered observers.
#[derive(Default)]
pub struct EventBus {
    observers: Mutex<Vec<Arc<dyn EventObserver>>>,
}

impl EventBus {
    /// An empty bus with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus with the always-active log observer already subscribed.
    pub fn with_defaults() -> Self {
        let bus = Self::new();
        bus.subscribe(Arc::new(LogObserver));
        bus
    }

    /// Register an observer. Subscribing the same observer (by
    /// identity) twice has no additional effect.
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) {
        let mut observers = self.observers.lock().unwrap();
        if observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            return;
        }
        observers.push(observer);
    }

    /// Remove an observer by identity. Unknown observers are ignored.
    pub fn unsubscribe(&self, observer: &Arc<dyn EventObserver>) {
        let mut observers = self.observers.lock().unwrap();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    /// Deliver an event to every observer, in subscription order.
    ///
    /// A panicking observer is isolated: the panic is caught, logged,
    /// and delivery continues with the next observer.
    pub fn notify(&self, event: &DomainEvent) {
        let observers: Vec<Arc<dyn EventObserver>> =
            self.observers.lock().unwrap().iter().cloned().collect();

        debug!(
            subsystem = "events",
            component = "bus",
            event_kind = %event.kind(),
            entity_type = event.entity_type(),
            observer_count = observers.len(),
            "Dispatching domain event"
        );

        for observer in observers {
            let result = catch_unwind(AssertUnwindSafe(|| observer.on_event(event)));
            if result.is_err() {
                error!(
                    subsystem = "events",
                    component = "bus",
                    observer = observer.name(),
                    event_kind = %event.kind(),
                    "Observer panicked; continuing delivery"
                );
            }
        }
    }
}

// =============================================================================
// BUILT-IN OBSERVERS
// =============================================================================

/// Always-active observer that writes every event to the log.
pub struct LogObserver;

impl EventObserver for LogObserver {
    fn name(&self) -> &'static str {
        "log"
    }

    fn on_event(&self, event: &DomainEvent) {
        info!(
            subsystem = "events",
            component = "log_observer",
            event_kind = %event.kind(),
            entity_type = event.entity_type(),
            entity_id = %event.entity_id(),
            owner_id = event.owner_id(),
            "Domain event"
        );
    }
}

/// One structured activity record captured by [`ActivityObserver`].
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub kind: EventKind,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub owner_id: String,
    pub at: DateTime<Utc>,
    pub detail: JsonValue,
}

/// Observer that records a structured activity entry per event.
#[derive(Default)]
pub struct ActivityObserver {
    records: Mutex<Vec<ActivityRecord>>,
}

impl ActivityObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded activity, oldest first.
    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().unwrap().clone()
    }
}

fn activity_detail(event: &DomainEvent) -> JsonValue {
    match event {
        DomainEvent::NoteCreated { note } => json!({
            "title": note.title,
            "category": note.category,
        }),
        DomainEvent::NoteUpdated { note } => json!({ "title": note.title }),
        DomainEvent::NoteDeleted { doc_id, .. } => json!({ "docId": doc_id }),
        DomainEvent::NoteArchived { archived, .. } => json!({ "archived": archived }),
        DomainEvent::NoteStarred { starred, .. } => json!({ "starred": starred }),
        DomainEvent::CategoryCreated { category } => json!({ "name": category.name }),
        DomainEvent::CategoryRenamed {
            category,
            old_name,
            notes_updated,
        } => json!({
            "oldName": old_name,
            "newName": category.name,
            "notesUpdated": notes_updated,
        }),
        DomainEvent::CategoryDeleted {
            name, notes_deleted, ..
        } => json!({
            "name": name,
            "notesDeleted": notes_deleted,
        }),
    }
}

impl EventObserver for ActivityObserver {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn on_event(&self, event: &DomainEvent) {
        let record = ActivityRecord {
            kind: event.kind(),
            entity_type: event.entity_type().to_string(),
            entity_id: event.entity_id(),
            owner_id: event.owner_id().to_string(),
            at: Utc::now(),
            detail: activity_detail(event),
        };
        self.records.lock().unwrap().push(record);
    }
}

/// Observer that POSTs events to an external webhook endpoint.
///
/// Without a configured endpoint every event is a silent no-op.
/// Delivery is fire-and-forget on a spawned task so the mutating
/// caller never waits on the remote end.
pub struct WebhookObserver {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl WebhookObserver {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Read the endpoint from `QUILL_WEBHOOK_URL`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("QUILL_WEBHOOK_URL").ok())
    }
}

impl EventObserver for WebhookObserver {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn on_event(&self, event: &DomainEvent) {
        let Some(endpoint) = self.endpoint.clone() else {
            debug!(
                subsystem = "events",
                component = "webhook_observer",
                event_kind = %event.kind(),
                "No webhook endpoint configured, skipping"
            );
            return;
        };

        let body = match serde_json::to_value(event) {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    subsystem = "events",
                    component = "webhook_observer",
                    error = %e,
                    "Failed to serialize event, skipping webhook"
                );
                return;
            }
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(
                subsystem = "events",
                component = "webhook_observer",
                "No async runtime available, skipping webhook delivery"
            );
            return;
        };

        let client = self.client.clone();
        handle.spawn(async move {
            let result = client
                .post(&endpoint)
                .timeout(std::time::Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
                .json(&body)
                .send()
                .await;
            if let Err(e) = result {
                warn!(
                    subsystem = "events",
                    component = "webhook_observer",
                    error = %e,
                    "Webhook delivery failed"
                );
            }
        });
    }
}
