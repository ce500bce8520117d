use super::{KeyValueStore, RECORD_KEY, StorageError};
use chrono::Utc;
use serde_json::json;
use tracing::info;

pub const WELCOME_ID: &str = "welcome";

/// First-run install hook: if the store has never held a collection, write a
/// welcome snippet in the legacy record shape (no `type`). Returns whether it seeded.
pub fn seed_welcome_snippet(store: &dyn KeyValueStore) -> Result<bool, StorageError> {
    if store.get(RECORD_KEY)?.is_some() {
        return Ok(false);
    }

    let welcome = json!([{
        "id": WELCOME_ID,
        "title": "Welcome to Quick Copy!",
        "content": "This is your first snippet. Select it and press Enter to copy this text to your clipboard.",
        "createdAt": Utc::now().to_rfc3339(),
    }]);
    store.set(RECORD_KEY, &welcome)?;

    info!(id = WELCOME_ID, "Seeded welcome snippet");
    Ok(true)
}
