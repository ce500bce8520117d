use super::form::{FormField, SnippetForm, TextInput};
use super::mode::Mode;
use super::state::AppState;
use crate::keybindings::{Action, KeyBinding, KeyLookupResult};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) {
    if state.show_help {
        handle_help_overlay(key, state);
        return;
    }

    match state.mode {
        Mode::Navigate => handle_navigate_mode(key, state),
        Mode::Search => handle_search_mode(key, state),
        Mode::Form => handle_form_mode(key, state),
        Mode::ConfirmDelete => handle_confirm_delete(key, state),
    }
}

/// Drop a half-typed sequence once `timeoutlen` has passed.
pub fn expire_pending_key(state: &mut AppState) {
    if let Some(started) = state.pending_key_time
        && started.elapsed() >= Duration::from_millis(state.timeoutlen)
    {
        state.pending_key = None;
        state.pending_key_time = None;
    }
}

fn handle_help_overlay(key: KeyEvent, state: &mut AppState) {
    if matches!(
        state.keybindings.navigate_single_action(&key),
        Some(Action::ToggleHelp | Action::CloseHelp | Action::Quit)
    ) {
        state.show_help = false;
    }
}

fn handle_navigate_mode(key: KeyEvent, state: &mut AppState) {
    expire_pending_key(state);

    let pending = state.pending_key.take();
    state.pending_key_time = None;

    match state.keybindings.lookup_navigate(&key, pending) {
        KeyLookupResult::Action(action) => execute_navigate_action(action, state),
        KeyLookupResult::Pending => {
            state.pending_key = Some(KeyBinding::from_event(&key));
            state.pending_key_time = Some(Instant::now());
        }
        KeyLookupResult::None => {}
    }
}

fn execute_navigate_action(action: Action, state: &mut AppState) {
    match action {
        Action::MoveUp => state.move_cursor_up(),
        Action::MoveDown => state.move_cursor_down(),
        Action::JumpTop => state.jump_top(),
        Action::JumpBottom => state.jump_bottom(),
        Action::Copy => state.copy_selected(),
        Action::NewItem => state.open_create_form(),
        Action::EditItem => state.open_edit_form(),
        Action::Delete => state.request_delete(),
        Action::RetrySave => state.retry_save(),
        Action::FocusSearch => state.mode = Mode::Search,
        Action::ClearSearch => state.clear_search(),
        Action::ToggleHelp => state.show_help = !state.show_help,
        // Esc with nothing to close drops the filter.
        Action::CloseHelp => state.clear_search(),
        Action::Quit => state.should_quit = true,
        _ => {}
    }
}

fn handle_search_mode(key: KeyEvent, state: &mut AppState) {
    match state.keybindings.get_search_action(&key) {
        Some(Action::ClearSearch) => {
            state.clear_search();
            state.mode = Mode::Navigate;
        }
        Some(Action::SearchConfirm) => state.mode = Mode::Navigate,
        Some(Action::MoveUp) => state.move_cursor_up(),
        Some(Action::MoveDown) => state.move_cursor_down(),
        Some(Action::EditBackspace) => state.set_search(|s| s.backspace()),
        Some(Action::EditDelete) => state.set_search(|s| s.delete()),
        Some(Action::EditLeft) => state.search.left(),
        Some(Action::EditRight) => state.search.right(),
        Some(Action::EditHome) => state.search.home(),
        Some(Action::EditEnd) => state.search.end(),
        Some(_) => {}
        None => {
            if let Some(c) = typed_char(&key) {
                state.set_search(|s| s.insert(c));
            }
        }
    }
}

fn handle_form_mode(key: KeyEvent, state: &mut AppState) {
    let action = state.keybindings.get_edit_action(&key);

    match action {
        Some(Action::EditCancel) => {
            state.close_form();
            return;
        }
        Some(Action::EditConfirm) => {
            state.submit_form();
            return;
        }
        _ => {}
    }

    let Some(form) = state.form.as_mut() else {
        state.mode = Mode::Navigate;
        return;
    };

    match action {
        Some(Action::NextField) => form.next_field(),
        Some(Action::PrevField) => form.prev_field(),
        Some(Action::ToggleKind) => form.toggle_kind(),
        Some(Action::InsertNewline) => form.insert_newline(),
        Some(Action::EditBackspace) => form.backspace(),
        Some(Action::EditLeft | Action::EditRight) if form.focus == FormField::Kind => {
            form.toggle_kind()
        }
        Some(Action::EditDelete) => edit_focused(form, TextInput::delete),
        Some(Action::EditLeft) => edit_focused(form, TextInput::left),
        Some(Action::EditRight) => edit_focused(form, TextInput::right),
        Some(Action::EditHome) => edit_focused(form, TextInput::home),
        Some(Action::EditEnd) => edit_focused(form, TextInput::end),
        Some(_) => {}
        None => match (typed_char(&key), form.focus) {
            (Some(' '), FormField::Kind) => form.toggle_kind(),
            (Some(c), _) => edit_focused(form, |input| input.insert(c)),
            (None, _) => {}
        },
    }
}

/// Bracketed paste arrives as one event, so its newlines never submit the form.
pub fn handle_paste(text: &str, state: &mut AppState) {
    match state.mode {
        Mode::Form => {
            if let Some(form) = state.form.as_mut() {
                form.paste(text);
            }
        }
        Mode::Search => {
            let line = text.replace(['\r', '\n'], " ");
            state.set_search(|s| s.insert_str(&line));
        }
        Mode::Navigate | Mode::ConfirmDelete => {}
    }
}

fn edit_focused(form: &mut SnippetForm, f: impl FnOnce(&mut TextInput)) {
    if let Some(input) = form.focused_input_mut() {
        f(input);
    }
}

fn handle_confirm_delete(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => state.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.cancel_delete(),
        _ => {}
    }
}

/// Printable input; control and alt chords are not text.
fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardService;
    use crate::clipboard::testing::RecordingBackend;
    use crate::keybindings::KeybindingCache;
    use crate::repository::SnippetRepository;
    use crate::snippet::SnippetKind;
    use crate::storage::SqliteStore;
    use crate::ui::theme::Theme;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio::runtime::Handle;

    fn test_state(dir: &TempDir) -> AppState {
        let store = SqliteStore::open(dir.path().join("quick-copy.db")).unwrap();
        let mut repository = SnippetRepository::new(Box::new(store), None);
        repository.load().unwrap();
        AppState::new(
            repository,
            ClipboardService::new(RecordingBackend::working(), RecordingBackend::working()),
            Handle::current(),
            Theme::default(),
            KeybindingCache::default(),
            1000,
            Duration::from_millis(2000),
        )
    }

    fn press(state: &mut AppState, code: KeyCode) {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), state);
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn add_text(state: &mut AppState, title: &str, content: &str) {
        press(state, KeyCode::Char('n'));
        type_str(state, title);
        press(state, KeyCode::Tab);
        press(state, KeyCode::Tab);
        type_str(state, content);
        press(state, KeyCode::Enter);
    }

    #[tokio::test]
    async fn test_add_through_keys() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        add_text(&mut state, "Note", "Hello");

        assert_eq!(state.mode, Mode::Navigate);
        let item = state.selected_item().unwrap();
        assert_eq!(item.title, "Note");
        assert_eq!(item.kind(), SnippetKind::Text);
    }

    #[tokio::test]
    async fn test_space_on_kind_toggles_and_ctrl_t_too() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('n'));
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Char(' '));
        assert_eq!(state.form.as_ref().unwrap().kind, SnippetKind::Image);

        handle_key_event(
            KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL),
            &mut state,
        );
        assert_eq!(state.form.as_ref().unwrap().kind, SnippetKind::Text);
    }

    #[tokio::test]
    async fn test_escape_cancels_form() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('n'));
        type_str(&mut state, "half typed");
        press(&mut state, KeyCode::Esc);

        assert_eq!(state.mode, Mode::Navigate);
        assert!(state.form.is_none());
        assert!(state.repository.is_empty());
    }

    #[tokio::test]
    async fn test_dd_then_confirm_deletes() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);
        add_text(&mut state, "Note", "Hello");

        type_str(&mut state, "dd");
        assert_eq!(state.mode, Mode::ConfirmDelete);
        press(&mut state, KeyCode::Char('y'));

        assert!(state.repository.is_empty());
    }

    #[tokio::test]
    async fn test_search_typing_filters() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);
        add_text(&mut state, "Alpha", "one");
        add_text(&mut state, "Beta", "two");

        press(&mut state, KeyCode::Char('/'));
        type_str(&mut state, "bet");
        assert_eq!(state.visible.len(), 1);

        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode, Mode::Navigate);
        assert_eq!(state.search.as_str(), "bet");

        press(&mut state, KeyCode::Esc);
        assert_eq!(state.visible.len(), 2);
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('?'));
        assert!(state.show_help);
        press(&mut state, KeyCode::Char('n'));
        assert!(state.form.is_none());
        press(&mut state, KeyCode::Esc);
        assert!(!state.show_help);
    }

    #[tokio::test]
    async fn test_newline_chord_builds_multi_line_content() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('n'));
        type_str(&mut state, "Sig");
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Tab);
        type_str(&mut state, "Best,");
        handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT), &mut state);
        type_str(&mut state, "Jane");
        handle_key_event(
            KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL),
            &mut state,
        );
        type_str(&mut state, "ACME");
        assert_eq!(state.mode, Mode::Form);

        press(&mut state, KeyCode::Enter);

        let item = state.selected_item().unwrap();
        assert_eq!(item.body.searchable_text(), "Best,\nJane\nACME");
    }

    #[tokio::test]
    async fn test_paste_with_newlines_does_not_submit() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('n'));
        handle_paste("Address", &mut state);
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Tab);
        handle_paste("Jane Doe\n12 Main St\n", &mut state);

        assert_eq!(state.mode, Mode::Form);
        assert!(state.repository.is_empty());
        let form = state.form.as_ref().unwrap();
        assert_eq!(form.title.as_str(), "Address");
        assert_eq!(form.content.as_str(), "Jane Doe\n12 Main St\n");
    }

    #[tokio::test]
    async fn test_paste_into_search_is_one_line() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('/'));
        handle_paste("main\nst", &mut state);
        assert_eq!(state.search.as_str(), "main st");
    }

    #[tokio::test]
    async fn test_quit() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(&dir);

        press(&mut state, KeyCode::Char('q'));
        assert!(state.should_quit);
    }
}
