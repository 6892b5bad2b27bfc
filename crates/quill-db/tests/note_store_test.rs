//! Integration tests for the note repository.
//!
//! These tests need a reachable Postgres test database (DATABASE_URL,
//! defaulting to the local test instance) and skip themselves when
//! none is available.

use std::sync::Arc;

use quill_core::{
    ActivityObserver, Block, CreateNoteRequest, EventKind, NoteFilter, NoteRepository,
    UpdateNoteRequest,
};
use quill_db::test_fixtures::TestDatabase;
use uuid::Uuid;

fn simple_content(text: &str) -> Vec<Block> {
    vec![Block::paragraph("paragraph-1", text)]
}

#[tokio::test]
async fn test_create_get_and_doc_id_conflict() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let req = CreateNoteRequest::text("n1", "alice", "First", simple_content("hello"));
    let created = test_db.db.notes.create(req).await.unwrap();
    assert_eq!(created.doc_id, "n1");
    assert_eq!(created.preview, "No preview available.");
    assert!(!created.is_archived);
    assert!(!created.is_starred);

    let fetched = test_db.db.notes.get_by_doc_id("n1").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.title, "First");
    assert_eq!(fetched.content, simple_content("hello"));

    let dup = CreateNoteRequest::text("n1", "alice", "Other", vec![]);
    let err = test_db.db.notes.create(dup).await.unwrap_err();
    assert_eq!(err.kind(), "conflict");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_create_validation_errors() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let missing_title = CreateNoteRequest::text("n2", "alice", "  ", vec![]);
    let err = test_db.db.notes.create(missing_title).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    let missing_owner = CreateNoteRequest::text("n2", "", "Title", vec![]);
    let err = test_db.db.notes.create(missing_owner).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_by_doc_id() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let created = test_db
        .db
        .notes
        .create(CreateNoteRequest::text(
            "n1",
            "alice",
            "Before",
            simple_content("old"),
        ))
        .await
        .unwrap();

    let updated = test_db
        .db
        .notes
        .update(
            "n1",
            UpdateNoteRequest {
                title: "After".into(),
                content: simple_content("new"),
                category: None,
                tags: vec!["edited".into()],
                preview: Some("new preview".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "After");
    assert_eq!(updated.tags, vec!["edited"]);
    assert_eq!(updated.preview, "new preview");
    // The owner never changes on update; the timestamp always does.
    assert_eq!(updated.owner_id, created.owner_id);
    assert!(updated.updated_at >= created.updated_at);

    let err = test_db
        .db
        .notes
        .update(
            "missing",
            UpdateNoteRequest {
                title: "T".into(),
                content: vec![],
                category: None,
                tags: vec![],
                preview: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_toggle_archive_twice_restores_original() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest::text("n1", "alice", "T", vec![]))
        .await
        .unwrap();

    let once = test_db.db.notes.toggle_archive(note.id).await.unwrap();
    assert!(once.is_archived);

    let archived = test_db
        .db
        .notes
        .list_by_owner("alice", NoteFilter::Archived)
        .await
        .unwrap();
    assert_eq!(archived.len(), 1);

    let twice = test_db.db.notes.toggle_archive(note.id).await.unwrap();
    assert_eq!(twice.is_archived, note.is_archived);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_toggle_star_and_list_starred() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let a = test_db
        .db
        .notes
        .create(CreateNoteRequest::text("a", "alice", "A", vec![]))
        .await
        .unwrap();
    test_db
        .db
        .notes
        .create(CreateNoteRequest::text("b", "alice", "B", vec![]))
        .await
        .unwrap();

    let starred = test_db.db.notes.toggle_star(a.id).await.unwrap();
    assert!(starred.is_starred);

    let list = test_db
        .db
        .notes
        .list_by_owner("alice", NoteFilter::Starred)
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].doc_id, "a");

    let all = test_db
        .db
        .notes
        .list_by_owner("alice", NoteFilter::All)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_delete_and_missing_ids() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest::text("n1", "alice", "T", vec![]))
        .await
        .unwrap();

    test_db.db.notes.delete(note.id).await.unwrap();
    assert_eq!(
        test_db.db.notes.delete(note.id).await.unwrap_err().kind(),
        "not_found"
    );
    assert_eq!(
        test_db
            .db
            .notes
            .toggle_archive(Uuid::now_v7())
            .await
            .unwrap_err()
            .kind(),
        "not_found"
    );

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_set_category_validates_target() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    use quill_core::CategoryRepository;
    test_db.db.categories.create("alice", "Work").await.unwrap();

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest::text("n1", "alice", "T", vec![]))
        .await
        .unwrap();

    let moved = test_db
        .db
        .notes
        .set_category(note.id, "alice", Some("Work"))
        .await
        .unwrap();
    assert_eq!(moved.category.as_deref(), Some("Work"));

    let err = test_db
        .db
        .notes
        .set_category(note.id, "alice", Some("Nope"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let cleared = test_db
        .db
        .notes
        .set_category(note.id, "alice", None)
        .await
        .unwrap();
    assert!(cleared.category.is_none());

    // Wrong owner looks like an absent note.
    let err = test_db
        .db
        .notes
        .set_category(note.id, "mallory", Some("Work"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_mutations_emit_domain_events() {
    let Some(test_db) = TestDatabase::try_new().await else {
        return;
    };

    let activity = Arc::new(ActivityObserver::new());
    test_db.db.events.subscribe(activity.clone());

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest::text("n1", "alice", "T", vec![]))
        .await
        .unwrap();
    test_db.db.notes.toggle_archive(note.id).await.unwrap();
    test_db.db.notes.delete(note.id).await.unwrap();

    let kinds: Vec<EventKind> = activity.records().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::Create, EventKind::Archive, EventKind::Delete]
    );

    test_db.cleanup().await;
}
