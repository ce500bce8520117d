pub mod search_bar;
pub mod snippet_form;
pub mod snippet_list;
pub mod status_bar;

use crate::app::{AppState, Mode};
use crate::keybindings::Action;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render(f: &mut Frame, state: &AppState) {
    let banner_height = u16::from(state.error_banner.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Search box
            Constraint::Min(1),                // Snippet list
            Constraint::Length(banner_height), // Save error banner
            Constraint::Length(1),             // Status bar
        ])
        .split(f.area());

    search_bar::render(f, state, chunks[0]);
    snippet_list::render(f, state, chunks[1]);
    if let Some(banner) = &state.error_banner {
        render_error_banner(f, state, banner, chunks[2]);
    }
    status_bar::render(f, state, chunks[3]);

    if let Some(form) = &state.form {
        snippet_form::render(f, state, form);
    }

    if state.mode == Mode::ConfirmDelete {
        render_delete_confirmation(f, state);
    }

    if state.show_help {
        render_help_overlay(f, state);
    }
}

fn render_error_banner(f: &mut Frame, state: &AppState, banner: &str, area: Rect) {
    let retry_keys = state.keybindings.keys_for(Action::RetrySave).join("/");
    let line = Line::from(vec![
        Span::styled(
            format!(" {banner} "),
            Style::default()
                .fg(state.theme.error)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({retry_keys} to retry)"),
            Style::default().fg(state.theme.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_delete_confirmation(f: &mut Frame, state: &AppState) {
    let title = state
        .pending_delete
        .as_ref()
        .and_then(|id| state.repository.find_by_id(id))
        .map(|s| s.title.as_str())
        .unwrap_or("this snippet");

    let area = centered_rect(50, 20, f.area());
    let text = vec![
        Line::from(""),
        Line::from(format!("Delete \"{title}\"?")),
        Line::from(""),
        Line::from(Span::styled(
            "y: delete    n/Esc: keep",
            Style::default().fg(state.theme.muted),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm ")
        .border_style(Style::default().fg(state.theme.error))
        .style(Style::default().bg(state.theme.background));

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().fg(state.theme.foreground))
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn render_help_overlay(f: &mut Frame, state: &AppState) {
    let bindings = &state.keybindings;
    let row = |action: Action, description: &str| {
        format!("  {:<22}{}", bindings.keys_for(action).join(" "), description)
    };

    let lines = [
        String::new(),
        "  Quick Copy Help".to_string(),
        String::new(),
        "  List:".to_string(),
        row(Action::MoveDown, "Move down"),
        row(Action::MoveUp, "Move up"),
        row(Action::JumpTop, "First snippet"),
        row(Action::JumpBottom, "Last snippet"),
        row(Action::Copy, "Copy to clipboard"),
        row(Action::NewItem, "New snippet"),
        row(Action::EditItem, "Edit snippet"),
        row(Action::Delete, "Delete snippet"),
        row(Action::FocusSearch, "Search"),
        row(Action::RetrySave, "Retry a failed save"),
        row(Action::ToggleHelp, "Toggle help"),
        row(Action::Quit, "Quit"),
        String::new(),
        "  Form:".to_string(),
        "  Tab / S-Tab           Next / previous field".to_string(),
        "  Space on Type, C-t    Switch text / image".to_string(),
        "  A-Enter / C-j         New line in content".to_string(),
        "  Enter                 Save".to_string(),
        "  Esc                   Cancel".to_string(),
        String::new(),
        "  Search:".to_string(),
        "  Enter                 Keep filter".to_string(),
        "  Esc                   Clear filter".to_string(),
    ];

    let area = centered_rect(60, 70, f.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(state.theme.background));

    let paragraph = Paragraph::new(lines.join("\n"))
        .block(block)
        .style(Style::default().fg(state.theme.foreground));

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
