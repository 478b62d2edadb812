//! Persistence Integration Tests
//!
//! Tests the template repository with a data directory:
//! - Templates saved by one store are loaded by the next
//! - Editing sessions save to and load from the repository
//! - Deletes and duplicates are mirrored on disk
//! - Ids that differ only in punctuation get their own files
//! - Concurrent creates with one id admit a single winner

use std::time::Duration;

use template_core::{
    CanvasElement, EditorSession, ElementKind, MemoryTemplateStore, Position, StoreError, Template,
    TemplateFilter, TemplateRepository, TemplateType,
};

/// Number of JSON files in a directory.
fn json_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .expect("readable dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .count()
}

#[tokio::test]
async fn test_saved_templates_survive_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryTemplateStore::with_data_dir(dir.path()).expect("store");

    let invoice = store
        .create(Template::new("Invoice", TemplateType::Pdf).with_tags(["finance"]))
        .await
        .expect("create");
    store
        .create(Template::new("Welcome", TemplateType::Email))
        .await
        .expect("create");
    assert_eq!(json_files(dir.path()), 2);

    let reopened = MemoryTemplateStore::with_data_dir(dir.path()).expect("reopen");
    assert_eq!(reopened.len(), 2);
    let loaded = reopened.get(&invoice.id).await.expect("get").expect("present");
    assert_eq!(loaded, invoice);

    let emails = reopened
        .list(&TemplateFilter {
            template_type: Some(TemplateType::Email),
            ..TemplateFilter::default()
        })
        .await
        .expect("list");
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].name, "Welcome");
}

#[tokio::test]
async fn test_session_save_and_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryTemplateStore::with_data_dir(dir.path()).expect("store");
    let created = store
        .create(Template::new("Flyer", TemplateType::Pdf))
        .await
        .expect("create");

    let mut session = EditorSession::new();
    session.load_template(created.clone());
    session.add_element(CanvasElement::with_id(
        "headline".into(),
        ElementKind::Title,
        Position::new(20.0, 20.0),
    ));
    session.add_element(CanvasElement::with_id(
        "photo".into(),
        ElementKind::Image,
        Position::new(20.0, 120.0),
    ));
    let saved = store
        .update(session.to_template().expect("template loaded"))
        .await
        .expect("update");
    assert_eq!(saved.created_at, created.created_at);
    assert_eq!(saved.content.len(), 2);

    let reopened = MemoryTemplateStore::with_data_dir(dir.path()).expect("reopen");
    let template = reopened.get(&created.id).await.expect("get").expect("present");
    let mut restored = EditorSession::new();
    restored.load_template(template);
    assert_eq!(restored.document(), session.document());
    assert!(!restored.can_undo());
    assert!(restored.selection().is_empty());
}

#[tokio::test]
async fn test_delete_and_duplicate_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryTemplateStore::with_data_dir(dir.path())
        .expect("store")
        .with_latency(Duration::from_millis(1));
    let original = store
        .create(Template::new("Receipt", TemplateType::Pdf))
        .await
        .expect("create");

    let copy = store.duplicate(&original.id).await.expect("duplicate");
    assert_eq!(copy.name, "Receipt (Copy)");
    assert_ne!(copy.id, original.id);
    assert_eq!(json_files(dir.path()), 2);

    store.delete(&original.id).await.expect("delete");
    assert_eq!(json_files(dir.path()), 1);
    assert!(matches!(
        store.delete(&original.id).await,
        Err(StoreError::NotFound(_))
    ));

    let reopened = MemoryTemplateStore::with_data_dir(dir.path()).expect("reopen");
    assert_eq!(reopened.len(), 1);
    assert!(reopened.get(&copy.id).await.expect("get").is_some());
}

#[tokio::test]
async fn test_corrupt_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("broken.json"), "{ not json").expect("write");
    std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

    let store = MemoryTemplateStore::with_data_dir(dir.path()).expect("store");
    assert!(store.is_empty());
    assert!(matches!(
        store.update(Template::new("Ghost", TemplateType::Email)).await,
        Err(StoreError::NotFound(_))
    ));
}

fn template_with_id(id: &str, name: &str) -> Template {
    let mut template = Template::new(name, TemplateType::Pdf);
    template.id = id.to_string();
    template
}

#[tokio::test]
async fn test_similar_ids_use_separate_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryTemplateStore::with_data_dir(dir.path()).expect("store");
    store
        .create(template_with_id("inv.1", "Dotted"))
        .await
        .expect("create");
    store
        .create(template_with_id("inv_1", "Underscored"))
        .await
        .expect("create");
    assert_eq!(json_files(dir.path()), 2);

    let reopened = MemoryTemplateStore::with_data_dir(dir.path()).expect("reopen");
    assert_eq!(reopened.len(), 2);
    let dotted = reopened.get("inv.1").await.expect("get").expect("present");
    assert_eq!(dotted.name, "Dotted");

    reopened.delete("inv_1").await.expect("delete");
    assert_eq!(json_files(dir.path()), 1);
    let again = MemoryTemplateStore::with_data_dir(dir.path()).expect("reopen");
    assert_eq!(again.len(), 1);
    assert!(again.get("inv.1").await.expect("get").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_with_same_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryTemplateStore::with_data_dir(dir.path())
        .expect("store")
        .with_latency(Duration::from_millis(5));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create(template_with_id("shared", &format!("Writer {i}")))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(_) => created += 1,
            Err(StoreError::AlreadyExists(id)) => {
                assert_eq!(id, "shared");
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
    assert_eq!(store.len(), 1);
    assert_eq!(json_files(dir.path()), 1);
}
