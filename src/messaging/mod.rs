//! Request/response messages for other processes, tagged by `action`.
//!
//! Desktop shortcuts, scripts and editor plugins talk to a running
//! `qcp serve` with these messages; see [`server`] for the HTTP binding.

pub mod launcher;
pub mod server;

use crate::clipboard::{ClipboardService, CopyOutcome};
use crate::repository::{RepositoryError, SnippetRepository};
use crate::snippet::Snippet;
use launcher::PopupLauncher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const ACTIONS: [&str; 4] = ["getData", "copyToClipboard", "openPopup", "getSelectedText"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MessageRequest {
    GetData,
    CopyToClipboard {
        #[serde(default)]
        content: String,
    },
    OpenPopup,
    GetSelectedText,
}

impl MessageRequest {
    /// Decode a raw message; anything without a known `action` is rejected.
    pub fn parse(raw: Value) -> Result<Self, MessageError> {
        let action = raw
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MessageError::BadRequest("missing action".to_string()))?;

        if !ACTIONS.contains(&action.as_str()) {
            return Err(MessageError::BadRequest(format!("unknown action: {action}")));
        }
        serde_json::from_value(raw)
            .map_err(|e| MessageError::BadRequest(format!("invalid {action} message: {e}")))
    }

    pub fn action(&self) -> &'static str {
        match self {
            MessageRequest::GetData => "getData",
            MessageRequest::CopyToClipboard { .. } => "copyToClipboard",
            MessageRequest::OpenPopup => "openPopup",
            MessageRequest::GetSelectedText => "getSelectedText",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageResponse {
    Data {
        data: Vec<Snippet>,
    },
    Copied(CopyOutcome),
    Popup {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Selection {
        selected_text: String,
    },
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Shared state behind every message: one repository, one clipboard.
#[derive(Clone)]
pub struct MessageHandler {
    repository: Arc<Mutex<SnippetRepository>>,
    clipboard: ClipboardService,
    launcher: PopupLauncher,
}

impl MessageHandler {
    pub fn new(
        repository: SnippetRepository,
        clipboard: ClipboardService,
        launcher: PopupLauncher,
    ) -> Self {
        Self {
            repository: Arc::new(Mutex::new(repository)),
            clipboard,
            launcher,
        }
    }

    pub async fn handle(&self, request: MessageRequest) -> Result<MessageResponse, MessageError> {
        debug!(action = request.action(), "Handling message");

        match request {
            MessageRequest::GetData => {
                let mut repository = self.repository.lock().await;
                // The TUI and CLI write the same database.
                repository.reload()?;
                Ok(MessageResponse::Data {
                    data: repository.items().to_vec(),
                })
            }
            MessageRequest::CopyToClipboard { content } => {
                Ok(MessageResponse::Copied(self.clipboard.copy_text(&content).await))
            }
            MessageRequest::OpenPopup => {
                let launcher = self.launcher.clone();
                let result = tokio::task::spawn_blocking(move || launcher.launch())
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|r| r.map_err(|e| format!("{e:#}")));

                Ok(match result {
                    Ok(()) => MessageResponse::Popup {
                        success: true,
                        error: None,
                    },
                    Err(error) => {
                        warn!(%error, "Failed to open popup");
                        MessageResponse::Popup {
                            success: false,
                            error: Some(error),
                        }
                    }
                })
            }
            MessageRequest::GetSelectedText => {
                let selected_text = self.clipboard.selected_text().await.unwrap_or_else(|e| {
                    warn!(error = %e, "No selection available");
                    String::new()
                });
                Ok(MessageResponse::Selection { selected_text })
            }
        }
    }
}
