pub mod components;
pub mod theme;

use crate::app::AppState;
use crate::app::event::{handle_key_event, handle_paste};
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, warn};

struct TerminalGuard {
    keyboard_enhancement: bool,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.keyboard_enhancement {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen);
        let _ = stdout.flush();
    }
}

/// Run the manager until the user quits. `db_path` is watched so writes from
/// `qcp serve` or other `qcp` invocations show up live.
pub fn run_tui(mut state: AppState, db_path: &Path) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let supports_keyboard_enhancement = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    )
    .is_ok();

    let _guard = TerminalGuard {
        keyboard_enhancement: supports_keyboard_enhancement,
    };

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (db_tx, db_rx) = mpsc::channel();
    let _watcher = setup_database_watcher(db_path, db_tx);

    let result = run_app(&mut terminal, &mut state, db_rx);
    terminal.show_cursor()?;

    result
}

fn setup_database_watcher(db_path: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res
                && event.kind.is_modify()
            {
                let _ = tx.send(());
            }
        },
        Config::default(),
    );

    match watcher {
        Ok(mut w) => match w.watch(db_path, RecursiveMode::NonRecursive) {
            Ok(()) => Some(w),
            Err(e) => {
                warn!(path = %db_path.display(), error = %e, "Database watch failed");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "File watcher unavailable");
            None
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    db_rx: mpsc::Receiver<()>,
) -> Result<()> {
    loop {
        state.clear_expired_status_message();
        state.poll_background();
        state.apply_repository_changes();

        terminal.draw(|f| {
            components::render(f, state);
        })?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(key, state),
                Event::Paste(text) => handle_paste(&text, state),
                _ => {}
            }
        }

        let mut should_reload = false;
        while db_rx.try_recv().is_ok() {
            should_reload = true;
        }
        if should_reload {
            debug!("Database changed on disk");
            state.reload_from_database();
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
