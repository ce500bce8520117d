//! Copy snippets to the system clipboard.
//!
//! Every copy goes to the primary backend first and falls back to a secondary
//! one on failure. Image copies that cannot be completed degrade to copying the
//! image source string. Callers always get a [`CopyOutcome`], never an error,
//! and every successful copy is broadcast to subscribers so the UI can flash an
//! acknowledgment.

pub mod backend;
pub mod image;

use crate::snippet::{Snippet, SnippetBody};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub use self::backend::{ArboardBackend, Osc52Backend};
pub use self::image::DecodedImage;

#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard rejected the write: {0}")]
    Rejected(String),
    #[error("not supported: {0}")]
    Unsupported(&'static str),
    #[error("failed to fetch image: {0}")]
    Fetch(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("clipboard task failed: {0}")]
    Task(String),
}

pub trait ClipboardBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
    fn set_image(&self, image: &DecodedImage) -> Result<(), ClipboardError>;
    fn selected_text(&self) -> Result<String, ClipboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CopyMethod {
    Text,
    TextFallback,
    Image,
    /// Pixel copy failed; the image source string was copied instead.
    ImageSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<CopyMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CopyOutcome {
    fn copied(method: CopyMethod) -> Self {
        Self {
            success: true,
            method: Some(method),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            method: None,
            error: Some(error),
        }
    }
}

#[derive(Clone)]
pub struct ClipboardService {
    primary: Arc<dyn ClipboardBackend>,
    fallback: Arc<dyn ClipboardBackend>,
    http: Option<reqwest::Client>,
    copied: broadcast::Sender<CopyOutcome>,
}

impl ClipboardService {
    pub fn new(primary: Arc<dyn ClipboardBackend>, fallback: Arc<dyn ClipboardBackend>) -> Self {
        let (copied, _) = broadcast::channel(16);
        Self {
            primary,
            fallback,
            http: image::http_client(image::FETCH_TIMEOUT),
            copied,
        }
    }

    /// Give up on remote images after `timeout` and copy the URL instead.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.http = image::http_client(timeout);
        self
    }

    /// `arboard` first, OSC 52 when the system clipboard is unavailable.
    pub fn system() -> Self {
        Self::new(Arc::new(ArboardBackend::new()), Arc::new(Osc52Backend))
    }

    /// Like [`system`](Self::system) for processes that exit right after
    /// copying; see [`ArboardBackend::holding`].
    pub fn system_holding(hold: Duration) -> Self {
        Self::new(Arc::new(ArboardBackend::holding(hold)), Arc::new(Osc52Backend))
    }

    /// Receives one message per successful copy.
    pub fn subscribe(&self) -> broadcast::Receiver<CopyOutcome> {
        self.copied.subscribe()
    }

    pub async fn copy_text(&self, content: &str) -> CopyOutcome {
        let outcome = self.write_text(content).await;
        self.announce(&outcome);
        outcome
    }

    pub async fn copy_image(&self, src: &str) -> CopyOutcome {
        let outcome = match self.write_image(src).await {
            Ok(()) => CopyOutcome::copied(CopyMethod::Image),
            Err(e) => {
                warn!(error = %e, "Image copy failed, copying source instead");
                let mut outcome = self.write_text(src).await;
                if outcome.success {
                    outcome.method = Some(CopyMethod::ImageSource);
                }
                outcome
            }
        };
        self.announce(&outcome);
        outcome
    }

    pub async fn copy_snippet(&self, snippet: &Snippet) -> CopyOutcome {
        debug!(id = %snippet.id, kind = %snippet.kind(), "Copying snippet");
        match &snippet.body {
            SnippetBody::Text { content } => self.copy_text(content).await,
            SnippetBody::Image { image_src, .. } => self.copy_image(image_src).await,
        }
    }

    /// Current selection, trimmed. Falls back to the secondary backend too.
    pub async fn selected_text(&self) -> Result<String, ClipboardError> {
        let primary = Arc::clone(&self.primary);
        let fallback = Arc::clone(&self.fallback);
        tokio::task::spawn_blocking(move || {
            primary
                .selected_text()
                .or_else(|_| fallback.selected_text())
                .map(|text| text.trim().to_string())
        })
        .await
        .map_err(|e| ClipboardError::Task(e.to_string()))?
    }

    async fn write_text(&self, content: &str) -> CopyOutcome {
        let primary = Arc::clone(&self.primary);
        let fallback = Arc::clone(&self.fallback);
        let text = content.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let primary_err = match primary.set_text(&text) {
                Ok(()) => return CopyOutcome::copied(CopyMethod::Text),
                Err(e) => e,
            };
            warn!(backend = primary.name(), error = %primary_err, "Clipboard write failed, trying fallback");

            match fallback.set_text(&text) {
                Ok(()) => CopyOutcome::copied(CopyMethod::TextFallback),
                Err(fallback_err) => CopyOutcome::failed(format!(
                    "{}: {primary_err}; {}: {fallback_err}",
                    primary.name(),
                    fallback.name()
                )),
            }
        })
        .await;

        result.unwrap_or_else(|e| CopyOutcome::failed(ClipboardError::Task(e.to_string()).to_string()))
    }

    async fn write_image(&self, src: &str) -> Result<(), ClipboardError> {
        let decoded = image::resolve_image(self.http.as_ref(), src).await?;
        let primary = Arc::clone(&self.primary);

        tokio::task::spawn_blocking(move || primary.set_image(&decoded))
            .await
            .map_err(|e| ClipboardError::Task(e.to_string()))?
    }

    fn announce(&self, outcome: &CopyOutcome) {
        if outcome.success {
            info!(method = ?outcome.method, "Copied to clipboard");
            // no subscribers is fine
            let _ = self.copied.send(outcome.clone());
        } else {
            warn!(error = ?outcome.error, "Copy failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub fail_text: bool,
        pub fail_image: bool,
        pub selection: Option<String>,
        pub texts: Mutex<Vec<String>>,
        pub images: Mutex<Vec<(usize, usize)>>,
    }

    impl RecordingBackend {
        pub fn working() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn broken() -> Arc<Self> {
            Arc::new(Self {
                fail_text: true,
                fail_image: true,
                ..Default::default()
            })
        }

        pub fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().clone()
        }

        pub fn images(&self) -> Vec<(usize, usize)> {
            self.images.lock().unwrap().clone()
        }
    }

    impl ClipboardBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
            if self.fail_text {
                return Err(ClipboardError::Rejected("denied".to_string()));
            }
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn set_image(&self, image: &DecodedImage) -> Result<(), ClipboardError> {
            if self.fail_image {
                return Err(ClipboardError::Unsupported("no images"));
            }
            self.images.lock().unwrap().push((image.width, image.height));
            Ok(())
        }

        fn selected_text(&self) -> Result<String, ClipboardError> {
            self.selection
                .clone()
                .ok_or(ClipboardError::Unsupported("no selection"))
        }
    }
}
