use super::form::{FormTarget, SnippetForm, TextInput};
use super::mode::Mode;
use crate::clipboard::{ClipboardService, CopyOutcome};
use crate::keybindings::{KeyBinding, KeybindingCache};
use crate::repository::{RepositoryChange, RepositoryError, SnippetRepository};
use crate::snippet::{Snippet, SnippetId};
use crate::ui::theme::Theme;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const STATUS_MESSAGE_DURATION: Duration = Duration::from_secs(3);

pub struct AppState {
    pub repository: SnippetRepository,
    changes: mpsc::Receiver<RepositoryChange>,
    clipboard: ClipboardService,
    runtime: Handle,
    copy_acks: broadcast::Receiver<CopyOutcome>,
    copy_results_tx: mpsc::Sender<CopyOutcome>,
    copy_results: mpsc::Receiver<CopyOutcome>,
    /// Ids of the rows currently shown, in list order.
    pub visible: Vec<SnippetId>,
    pub cursor_position: usize,
    pub mode: Mode,
    pub search: TextInput,
    pub form: Option<SnippetForm>,
    pub pending_delete: Option<SnippetId>,
    pub should_quit: bool,
    pub show_help: bool,
    pub theme: Theme,
    pub keybindings: KeybindingCache,
    pub pending_key: Option<KeyBinding>,
    pub pending_key_time: Option<Instant>,
    pub timeoutlen: u64,
    pub ack_duration: Duration,
    pub copied_until: Option<Instant>,
    pub status_message: Option<(String, Instant)>,
    /// Set while memory holds changes the store rejected; cleared by a successful retry.
    pub error_banner: Option<String>,
    pub copy_in_flight: bool,
}

impl AppState {
    pub fn new(
        mut repository: SnippetRepository,
        clipboard: ClipboardService,
        runtime: Handle,
        theme: Theme,
        keybindings: KeybindingCache,
        timeoutlen: u64,
        ack_duration: Duration,
    ) -> Self {
        let changes = repository.subscribe();
        let copy_acks = clipboard.subscribe();
        let (copy_results_tx, copy_results) = mpsc::channel();

        let mut state = Self {
            repository,
            changes,
            clipboard,
            runtime,
            copy_acks,
            copy_results_tx,
            copy_results,
            visible: Vec::new(),
            cursor_position: 0,
            mode: Mode::Navigate,
            search: TextInput::default(),
            form: None,
            pending_delete: None,
            should_quit: false,
            show_help: false,
            theme,
            keybindings,
            pending_key: None,
            pending_key_time: None,
            timeoutlen,
            ack_duration,
            copied_until: None,
            status_message: None,
            error_banner: None,
            copy_in_flight: false,
        };
        state.refresh_view();
        state
    }

    pub fn visible_items(&self) -> Vec<&Snippet> {
        self.visible
            .iter()
            .filter_map(|id| self.repository.find_by_id(id))
            .collect()
    }

    pub fn selected_item(&self) -> Option<&Snippet> {
        self.visible
            .get(self.cursor_position)
            .and_then(|id| self.repository.find_by_id(id))
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_position + 1 < self.visible.len() {
            self.cursor_position += 1;
        }
    }

    pub fn jump_top(&mut self) {
        self.cursor_position = 0;
    }

    pub fn jump_bottom(&mut self) {
        self.cursor_position = self.visible.len().saturating_sub(1);
    }

    pub fn clamp_cursor(&mut self) {
        if self.visible.is_empty() {
            self.cursor_position = 0;
        } else {
            self.cursor_position = self.cursor_position.min(self.visible.len() - 1);
        }
    }

    fn select_id(&mut self, id: &SnippetId) {
        if let Some(pos) = self.visible.iter().position(|v| v == id) {
            self.cursor_position = pos;
        }
    }

    /// Recompute the filtered rows, keeping the cursor on the same snippet if it is still shown.
    pub fn refresh_view(&mut self) {
        let selected = self.visible.get(self.cursor_position).cloned();
        self.visible = self
            .repository
            .search(self.search.as_str())
            .into_iter()
            .map(|s| s.id.clone())
            .collect();

        match selected {
            Some(id) if self.visible.contains(&id) => self.select_id(&id),
            _ => self.clamp_cursor(),
        }
    }

    /// Drain repository notifications; the view is rebuilt once per batch.
    pub fn apply_repository_changes(&mut self) {
        let changes: Vec<RepositoryChange> = self.changes.try_iter().collect();
        if changes.is_empty() {
            return;
        }

        self.refresh_view();
        for change in changes {
            debug!(?change, "Repository changed");
            if let RepositoryChange::Created(id) | RepositoryChange::Updated(id) = change {
                self.select_id(&id);
            }
        }
    }

    /// Another process wrote the database. Unsaved local changes win until retried.
    pub fn reload_from_database(&mut self) {
        if self.error_banner.is_some() {
            debug!("Skipping reload while local changes are unsaved");
            return;
        }
        if let Err(e) = self.repository.reload() {
            warn!(error = %e, "Reload failed");
            self.set_status_message(format!("Reload failed: {e}"));
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn clear_expired_status_message(&mut self) {
        if let Some((_, created)) = &self.status_message
            && created.elapsed() >= STATUS_MESSAGE_DURATION
        {
            self.status_message = None;
        }
        if let Some(until) = self.copied_until
            && Instant::now() >= until
        {
            self.copied_until = None;
        }
    }

    pub fn show_copied(&self) -> bool {
        self.copied_until.is_some()
    }

    pub fn set_search(&mut self, f: impl FnOnce(&mut TextInput)) {
        f(&mut self.search);
        self.refresh_view();
    }

    pub fn clear_search(&mut self) {
        self.set_search(TextInput::clear);
    }

    /// Copy the selected row. Ignored while another copy is still running.
    pub fn copy_selected(&mut self) {
        if self.copy_in_flight {
            debug!("Copy already in flight");
            return;
        }
        let Some(snippet) = self.selected_item().cloned() else {
            return;
        };

        self.copy_in_flight = true;
        let service = self.clipboard.clone();
        let results = self.copy_results_tx.clone();
        self.runtime.spawn(async move {
            let outcome = service.copy_snippet(&snippet).await;
            let _ = results.send(outcome);
        });
    }

    /// Collect finished copies and acknowledgments from the clipboard service.
    pub fn poll_background(&mut self) {
        while let Ok(outcome) = self.copy_results.try_recv() {
            self.copy_in_flight = false;
            if !outcome.success {
                let detail = outcome.error.unwrap_or_else(|| "unknown error".to_string());
                self.set_status_message(format!("Copy failed: {detail}"));
            }
        }

        loop {
            match self.copy_acks.try_recv() {
                Ok(_) => self.copied_until = Some(Instant::now() + self.ack_duration),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }

    pub fn open_create_form(&mut self) {
        self.form = Some(SnippetForm::create());
        self.mode = Mode::Form;
    }

    pub fn open_edit_form(&mut self) {
        if let Some(snippet) = self.selected_item() {
            self.form = Some(SnippetForm::edit(snippet));
            self.mode = Mode::Form;
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.mode = Mode::Navigate;
    }

    /// Validate and save the open form. The save finishes before the next key
    /// is read and a successful save closes the form, so a repeated submit
    /// finds nothing to save.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        form.file_error = None;

        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                form.file_error = Some(e.to_string());
                return;
            }
        };

        let result = match &form.target {
            FormTarget::Create => self.repository.create(&request),
            FormTarget::Update(id) => {
                let id = id.clone();
                self.repository.update(&id, &request)
            }
        };

        match result {
            Ok(_) => self.close_form(),
            Err(RepositoryError::Validation(e)) => {
                if let Some(form) = self.form.as_mut() {
                    form.set_errors(&e);
                }
            }
            Err(RepositoryError::NotFound(id)) => {
                self.close_form();
                self.set_status_message(format!("Snippet {id} no longer exists"));
            }
            Err(RepositoryError::Storage(e)) => {
                self.close_form();
                self.storage_failed(&e.to_string());
            }
        }
        self.apply_repository_changes();
    }

    pub fn request_delete(&mut self) {
        if let Some(snippet) = self.selected_item() {
            self.pending_delete = Some(snippet.id.clone());
            self.mode = Mode::ConfirmDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.mode = Mode::Navigate;
    }

    pub fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            self.mode = Mode::Navigate;
            return;
        };
        self.mode = Mode::Navigate;

        if let Err(e) = self.repository.delete(&id) {
            self.storage_failed(&e.to_string());
        }
        // A failed write has still removed the row from memory.
        self.refresh_view();
        self.apply_repository_changes();
    }

    /// Retry the last failed write.
    pub fn retry_save(&mut self) {
        if self.error_banner.is_none() {
            return;
        }
        match self.repository.persist() {
            Ok(()) => {
                self.error_banner = None;
                self.set_status_message("Saved".to_string());
            }
            Err(e) => self.storage_failed(&e.to_string()),
        }
    }

    fn storage_failed(&mut self, error: &str) {
        warn!(error, "Save failed");
        self.error_banner = Some(format!("Save failed: {error}"));
        self.refresh_view();
    }
}
