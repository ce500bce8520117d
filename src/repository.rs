use crate::snippet::{Snippet, SnippetId, SnippetRequest, ValidationError, search};
use crate::storage::{KeyValueStore, RECORD_KEY, StorageError};
use chrono::Utc;
use serde_json::Value;
use std::sync::mpsc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("snippet '{0}' not found")]
    NotFound(SnippetId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryChange {
    Loaded,
    Reloaded,
    Created(SnippetId),
    Updated(SnippetId),
    Deleted(SnippetId),
}

pub struct SnippetRepository {
    primary: Box<dyn KeyValueStore>,
    legacy: Option<Box<dyn KeyValueStore>>,
    items: Vec<Snippet>,
    listeners: Vec<mpsc::Sender<RepositoryChange>>,
}

impl SnippetRepository {
    pub fn new(primary: Box<dyn KeyValueStore>, legacy: Option<Box<dyn KeyValueStore>>) -> Self {
        Self {
            primary,
            legacy,
            items: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Read the collection, migrating from the legacy store when the primary is empty.
    pub fn load(&mut self) -> Result<&[Snippet], RepositoryError> {
        let mut records = read_records(self.primary.as_ref())?;

        if records.is_empty()
            && let Some(legacy) = &self.legacy
        {
            let migrated = read_records(legacy.as_ref())?;
            if !migrated.is_empty() {
                info!(count = migrated.len(), "Migrating snippets from legacy store");
                self.primary.set(RECORD_KEY, &Value::Array(migrated.clone()))?;
                records = migrated;
            }
        }

        self.items = normalize(records);
        debug!(count = self.items.len(), "Loaded snippets");
        self.notify(RepositoryChange::Loaded);
        Ok(&self.items)
    }

    /// Re-read the primary store after another process changed it.
    pub fn reload(&mut self) -> Result<(), RepositoryError> {
        let records = read_records(self.primary.as_ref())?;
        self.items = normalize(records);
        self.notify(RepositoryChange::Reloaded);
        Ok(())
    }

    pub fn create(&mut self, input: &SnippetRequest) -> Result<Snippet, RepositoryError> {
        let valid = input.validate()?;
        let now = Utc::now();
        let id = SnippetId::generate(now, |candidate| {
            self.items.iter().any(|s| s.id.as_str() == candidate)
        });

        let snippet = Snippet::new(id.clone(), valid.title, valid.body, now);
        self.items.insert(0, snippet.clone());
        info!(id = %id, kind = %snippet.kind(), "Created snippet");

        self.persist()?;
        self.notify(RepositoryChange::Created(id));
        Ok(snippet)
    }

    pub fn update(&mut self, id: &SnippetId, input: &SnippetRequest) -> Result<Snippet, RepositoryError> {
        let index = self
            .items
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        let valid = input.validate()?;

        let item = &mut self.items[index];
        item.title = valid.title;
        item.body = valid.body;
        let updated = item.clone();
        info!(id = %id, kind = %updated.kind(), "Updated snippet");

        self.persist()?;
        self.notify(RepositoryChange::Updated(id.clone()));
        Ok(updated)
    }

    /// Removing an unknown id is a no-op; the list is persisted either way.
    pub fn delete(&mut self, id: &SnippetId) -> Result<(), RepositoryError> {
        let before = self.items.len();
        self.items.retain(|s| &s.id != id);
        if self.items.len() == before {
            debug!(id = %id, "Delete of unknown snippet ignored");
        } else {
            info!(id = %id, "Deleted snippet");
        }

        self.persist()?;
        self.notify(RepositoryChange::Deleted(id.clone()));
        Ok(())
    }

    /// Write the whole in-memory collection. On failure memory stays ahead of disk.
    pub fn persist(&self) -> Result<(), StorageError> {
        let value = serde_json::to_value(&self.items)?;
        self.primary.set(RECORD_KEY, &value).inspect_err(|e| {
            warn!(error = %e, "Failed to persist snippets");
        })
    }

    pub fn find_by_id(&self, id: &SnippetId) -> Option<&Snippet> {
        self.items.iter().find(|s| &s.id == id)
    }

    pub fn search(&self, term: &str) -> Vec<&Snippet> {
        search::filter(&self.items, term)
    }

    pub fn items(&self) -> &[Snippet] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<RepositoryChange> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    fn notify(&mut self, change: RepositoryChange) {
        self.listeners.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

fn read_records(store: &dyn KeyValueStore) -> Result<Vec<Value>, StorageError> {
    match store.get(RECORD_KEY)? {
        Some(Value::Array(records)) => Ok(records),
        Some(other) => {
            warn!(kind = ?other, "Stored snippet record is not a list, ignoring");
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

/// Default a missing `type` to text, then decode. Undecodable records are dropped.
fn normalize(records: Vec<Value>) -> Vec<Snippet> {
    records
        .into_iter()
        .filter_map(|mut record| {
            if let Value::Object(map) = &mut record {
                map.entry("type").or_insert_with(|| Value::from("text"));
            }
            match serde_json::from_value::<Snippet>(record) {
                Ok(snippet) => Some(snippet),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable snippet record");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{FieldError, ImageKind, SnippetBody, SnippetKind};
    use crate::storage::{JsonFileStore, SqliteStore, seed_welcome_snippet};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    struct TestEnv {
        dir: TempDir,
    }

    impl TestEnv {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn primary(&self) -> SqliteStore {
            SqliteStore::open(self.dir.path().join("quick-copy.db")).unwrap()
        }

        fn legacy(&self) -> JsonFileStore {
            JsonFileStore::new(self.dir.path().join("sync.json"))
        }

        fn repository(&self) -> SnippetRepository {
            let mut repo =
                SnippetRepository::new(Box::new(self.primary()), Some(Box::new(self.legacy())));
            repo.load().unwrap();
            repo
        }
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &Value) -> Result<(), StorageError> {
            Err(StorageError::Io {
                path: "/readonly".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    #[test]
    fn test_create_text_prepends() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let first = repo.create(&SnippetRequest::text("First", "one")).unwrap();
        let second = repo.create(&SnippetRequest::text("Second", "two")).unwrap();

        assert_eq!(second.kind(), SnippetKind::Text);
        assert_ne!(first.id, second.id);
        assert_eq!(repo.items()[0].id, second.id);
        assert_eq!(repo.items()[1].id, first.id);
    }

    #[test]
    fn test_create_image_kinds() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let by_url = repo
            .create(&SnippetRequest::image_url("Logo", "https://x/logo.png"))
            .unwrap();
        let by_file = repo
            .create(&SnippetRequest::image_file("Pic", "data:image/png;base64,AAAA"))
            .unwrap();

        assert!(matches!(
            by_url.body,
            SnippetBody::Image {
                image_kind: ImageKind::Url,
                ..
            }
        ));
        assert!(matches!(
            by_file.body,
            SnippetBody::Image {
                image_kind: ImageKind::DataUrl,
                ..
            }
        ));
    }

    #[test]
    fn test_create_rejects_empty_title_and_leaves_list_unchanged() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let err = repo.create(&SnippetRequest::text("", "Hello")).unwrap_err();
        match err {
            RepositoryError::Validation(v) => assert_eq!(v.fields, vec![FieldError::MissingTitle]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(repo.is_empty());
        assert_eq!(env.primary().get(RECORD_KEY).unwrap(), None);
    }

    #[test]
    fn test_update_preserves_id_and_created_at() {
        let env = TestEnv::new();
        let mut repo = env.repository();
        let original = repo.create(&SnippetRequest::text("Note", "Hello")).unwrap();

        let updated = repo
            .update(
                &original.id,
                &SnippetRequest::image_url("Renamed", "https://x/y.png"),
            )
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.kind(), SnippetKind::Image);
        assert_eq!(repo.find_by_id(&original.id), Some(&updated));
    }

    #[test]
    fn test_update_unknown_id() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let err = repo
            .update(&SnippetId::new("missing"), &SnippetRequest::text("a", "b"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[test]
    fn test_update_invalid_input_keeps_item() {
        let env = TestEnv::new();
        let mut repo = env.repository();
        let original = repo.create(&SnippetRequest::text("Note", "Hello")).unwrap();

        let err = repo
            .update(&original.id, &SnippetRequest::text("Note", "  "))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
        assert_eq!(repo.find_by_id(&original.id), Some(&original));
    }

    #[test]
    fn test_delete_existing_and_unknown() {
        let env = TestEnv::new();
        let mut repo = env.repository();
        let item = repo.create(&SnippetRequest::text("Note", "Hello")).unwrap();

        repo.delete(&item.id).unwrap();
        assert_eq!(repo.find_by_id(&item.id), None);

        let never = SnippetId::new("never-existed");
        repo.delete(&never).unwrap();
        assert_eq!(repo.find_by_id(&never), None);
    }

    #[test]
    fn test_note_scenario() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let note = repo.create(&SnippetRequest::text("Note", "Hello")).unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.items()[0].title, "Note");
        assert_eq!(
            repo.items()[0].body,
            SnippetBody::Text {
                content: "Hello".to_string()
            }
        );

        let found = repo.search("hello");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, note.id);

        repo.delete(&note.id).unwrap();
        assert!(repo.is_empty());
    }

    #[test]
    fn test_load_round_trip() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let a = repo.create(&SnippetRequest::text("A", "alpha")).unwrap();
        let b = repo
            .create(&SnippetRequest::image_url("B", "https://x/b.png"))
            .unwrap();
        repo.update(&a.id, &SnippetRequest::text("A2", "alpha two"))
            .unwrap();
        repo.delete(&b.id).unwrap();

        let reloaded = env.repository();
        assert_eq!(reloaded.items(), repo.items());
    }

    #[test]
    fn test_legacy_record_defaults_to_text() {
        let env = TestEnv::new();
        env.primary()
            .set(RECORD_KEY, &json!([{"id": "x", "title": "Old", "content": "y"}]))
            .unwrap();

        let repo = env.repository();
        let item = repo.find_by_id(&SnippetId::new("x")).unwrap();
        assert_eq!(item.kind(), SnippetKind::Text);
        assert_eq!(item.title, "Old");
        assert_eq!(item.created_at, None);
    }

    #[test]
    fn test_migrates_from_legacy_when_primary_empty() {
        let env = TestEnv::new();
        env.legacy()
            .set(
                RECORD_KEY,
                &json!([{"id": "x", "title": "Old", "content": "y"}]),
            )
            .unwrap();

        let repo = env.repository();
        assert_eq!(repo.len(), 1);

        let copied = env.primary().get(RECORD_KEY).unwrap().unwrap();
        assert_eq!(copied[0]["id"], "x");
    }

    #[test]
    fn test_legacy_ignored_when_primary_has_items() {
        let env = TestEnv::new();
        env.primary()
            .set(
                RECORD_KEY,
                &json!([{"id": "p", "type": "text", "title": "Primary", "content": "c"}]),
            )
            .unwrap();
        env.legacy()
            .set(
                RECORD_KEY,
                &json!([{"id": "l", "title": "Legacy", "content": "c"}]),
            )
            .unwrap();

        let repo = env.repository();
        assert_eq!(repo.len(), 1);
        assert!(repo.find_by_id(&SnippetId::new("p")).is_some());
    }

    #[test]
    fn test_first_run_welcome_flows_through_migration() {
        let env = TestEnv::new();
        seed_welcome_snippet(&env.legacy()).unwrap();

        let repo = env.repository();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.items()[0].id.as_str(), "welcome");
        assert_eq!(repo.items()[0].kind(), SnippetKind::Text);
    }

    #[test]
    fn test_unreadable_records_are_skipped() {
        let env = TestEnv::new();
        env.primary()
            .set(
                RECORD_KEY,
                &json!([
                    {"id": "ok", "title": "Fine", "content": "c"},
                    {"id": "bad", "type": "image", "title": "No source"},
                    "not an object"
                ]),
            )
            .unwrap();

        let repo = env.repository();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.items()[0].id.as_str(), "ok");
    }

    #[test]
    fn test_failed_write_keeps_memory_and_can_retry() {
        let mut repo = SnippetRepository::new(Box::new(FailingStore), None);
        repo.load().unwrap();

        let err = repo
            .create(&SnippetRequest::text("Note", "Hello"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Storage(_)));
        assert_eq!(repo.len(), 1);
        assert!(repo.persist().is_err());
    }

    #[test]
    fn test_change_notifications() {
        let env = TestEnv::new();
        let mut repo = env.repository();
        let rx = repo.subscribe();

        let item = repo.create(&SnippetRequest::text("Note", "Hello")).unwrap();
        repo.update(&item.id, &SnippetRequest::text("Note", "Bye"))
            .unwrap();
        repo.delete(&item.id).unwrap();

        let changes: Vec<RepositoryChange> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![
                RepositoryChange::Created(item.id.clone()),
                RepositoryChange::Updated(item.id.clone()),
                RepositoryChange::Deleted(item.id.clone()),
            ]
        );
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let env = TestEnv::new();
        let mut repo = env.repository();

        let mut other = env.repository();
        other.create(&SnippetRequest::text("Elsewhere", "x")).unwrap();

        assert!(repo.is_empty());
        repo.reload().unwrap();
        assert_eq!(repo.len(), 1);
    }
}
